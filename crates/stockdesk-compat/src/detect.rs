// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

pub const DEFAULT_HOST_MARKERS: [&str; 2] = ["wxwork", "micromessenger"];

/// Widest viewport still laid out as a phone.
pub const MOBILE_VIEWPORT_MAX: u32 = 768;

const MOBILE_TOKENS: [&str; 4] = ["mobile", "android", "iphone", "ipad"];
const DESKTOP_TOKENS: [&str; 2] = ["windows", "macintosh"];

/// What the page knows about the browser it runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostProfile {
    pub user_agent: Option<String>,
    pub viewport_width: Option<u32>,
    pub touch_points: Option<u32>,
}

impl HostProfile {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: Some(user_agent.to_owned()),
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, width: u32) -> Self {
        self.viewport_width = Some(width);
        self
    }

    pub fn with_touch_points(mut self, points: u32) -> Self {
        self.touch_points = Some(points);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    Mobile,
    Desktop,
}

impl HostKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether the page runs inside a restricted host browser and, if
/// so, which flavour of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detector {
    markers: Vec<String>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_MARKERS)
    }
}

impl Detector {
    /// Markers match case-insensitively; blank ones are dropped.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|marker| marker.as_ref().trim().to_lowercase())
            .filter(|marker| !marker.is_empty())
            .collect();
        Self { markers }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn is_restricted_host(&self, user_agent: &str) -> bool {
        let agent = user_agent.to_lowercase();
        self.markers.iter().any(|marker| agent.contains(marker))
    }

    /// `None` means the patches should stay inert: no user agent, no host
    /// marker, or no way to tell phone from desktop.
    pub fn detect(&self, profile: &HostProfile) -> Option<HostKind> {
        let agent = profile.user_agent.as_deref()?.to_lowercase();
        if !self.markers.iter().any(|marker| agent.contains(marker)) {
            return None;
        }

        if profile.touch_points.is_some_and(|points| points > 0) {
            return Some(HostKind::Mobile);
        }
        if let Some(width) = profile.viewport_width {
            return Some(if width <= MOBILE_VIEWPORT_MAX {
                HostKind::Mobile
            } else {
                HostKind::Desktop
            });
        }

        if MOBILE_TOKENS.iter().any(|token| agent.contains(token)) {
            Some(HostKind::Mobile)
        } else if DESKTOP_TOKENS.iter().any(|token| agent.contains(token)) {
            Some(HostKind::Desktop)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Detector, HostKind, HostProfile};

    const WXWORK_PHONE: &str = "Mozilla/5.0 (Linux; Android 12; SM-G991B) AppleWebKit/537.36 \
        (KHTML, like Gecko) Mobile Safari/537.36 wxwork/4.1.10 MicroMessenger/7.0.1";
    const WXWORK_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) wxwork/4.1.6 (MicroMessenger/6.2) WindowsWechat";
    const PLAIN_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    #[test]
    fn ordinary_browsers_are_not_hosts() {
        let detector = Detector::default();
        assert_eq!(detector.detect(&HostProfile::new(PLAIN_CHROME)), None);
        assert_eq!(
            detector.detect(&HostProfile::new(PLAIN_CHROME).with_touch_points(5)),
            None
        );
        assert_eq!(detector.detect(&HostProfile::default()), None);
    }

    #[test]
    fn markers_match_case_insensitively() {
        let detector = Detector::new(["WxWork"]);
        assert!(detector.is_restricted_host("... WXWORK/4.0 ..."));
        assert!(!detector.is_restricted_host(PLAIN_CHROME));
        assert_eq!(detector.markers(), ["wxwork".to_owned()]);
    }

    #[test]
    fn device_class_prefers_touch_then_viewport_then_tokens() {
        let detector = Detector::default();
        let desktop = HostProfile::new(WXWORK_DESKTOP);
        assert_eq!(detector.detect(&desktop), Some(HostKind::Desktop));
        assert_eq!(
            detector.detect(&desktop.clone().with_touch_points(2)),
            Some(HostKind::Mobile)
        );
        assert_eq!(
            detector.detect(&desktop.clone().with_viewport(768)),
            Some(HostKind::Mobile)
        );
        assert_eq!(
            detector.detect(&HostProfile::new(WXWORK_PHONE).with_viewport(1280)),
            Some(HostKind::Desktop)
        );
        assert_eq!(
            detector.detect(&HostProfile::new(WXWORK_PHONE)),
            Some(HostKind::Mobile)
        );
    }

    #[test]
    fn undecidable_device_class_stays_inert() {
        let detector = Detector::default();
        assert_eq!(detector.detect(&HostProfile::new("wxwork/4.0")), None);
    }
}
