// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fmt;

use crate::{HostDocument, HostKind, NodeId};

pub const ICON_SELECTOR: &str = ".material-icons";
pub const GLYPH_FIXED_ATTR: &str = "data-glyph-fixed";
pub const HOST_API_ATTR: &str = "data-host-api";

pub const ICON_FONT_STYLE_ID: &str = "stockdesk-icon-font";
pub const MOBILE_MENU_STYLE_ID: &str = "stockdesk-mobile-menu";
pub const TABLE_HOVER_STYLE_ID: &str = "stockdesk-table-hover";

const ICON_FONT_CSS: &str = "\
.material-icons {
  font-family: 'Material Icons' !important;
  font-feature-settings: 'liga' !important;
  -webkit-font-feature-settings: 'liga' !important;
  text-rendering: optimizeLegibility;
  white-space: nowrap;
  overflow: hidden;
  display: inline-block;
  width: 1em;
}
";

const MOBILE_MENU_CSS: &str = "\
.mobile-menu-btn { display: flex !important; touch-action: manipulation; cursor: pointer; }
#sideMenu { transition: transform .25s ease; }
#sideMenu.open { transform: translateX(0) !important; }
#mobileOverlay { display: none; }
#mobileOverlay.active { display: block !important; }
.user-info, .logout-btn { pointer-events: auto !important; }
";

const TABLE_HOVER_CSS: &str = "\
.table-hover tbody tr:hover, .table-hover tbody tr:hover > td {
  background-color: #f5f7fa !important;
  color: inherit !important;
}
";

/// One idempotent repair of the page. Applying a correction to a page it
/// already repaired changes nothing.
pub trait Correction: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Elements whose insertion may undo this correction.
    fn selector(&self) -> Option<&'static str>;

    /// Returns how many nodes or style blocks were changed.
    fn apply(&self, doc: &mut dyn HostDocument) -> Result<usize>;

    fn is_intact(&self, doc: &dyn HostDocument) -> bool;
}

/// Collapses icon ligature text the host rendered more than once, e.g.
/// `"menumenu"` or `"home home"`, and marks each icon as processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IconGlyphDedup;

impl Correction for IconGlyphDedup {
    fn name(&self) -> &'static str {
        "icon-glyph-dedup"
    }

    fn selector(&self) -> Option<&'static str> {
        Some(ICON_SELECTOR)
    }

    fn apply(&self, doc: &mut dyn HostDocument) -> Result<usize> {
        let mut changed = 0;
        for node in doc.query_all(ICON_SELECTOR) {
            let text = doc.text(node).unwrap_or_default();
            let glyph = collapse_glyph(&text);
            let mut touched = false;
            if glyph != text {
                doc.set_text(node, &glyph)
                    .with_context(|| format!("rewrite icon text of {node}"))?;
                touched = true;
            }
            if doc.attribute(node, GLYPH_FIXED_ATTR).is_none() {
                doc.set_attribute(node, GLYPH_FIXED_ATTR, "1")
                    .with_context(|| format!("mark icon {node}"))?;
                touched = true;
            }
            if touched {
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn is_intact(&self, doc: &dyn HostDocument) -> bool {
        doc.query_all(ICON_SELECTOR).into_iter().all(|node| {
            let text = doc.text(node).unwrap_or_default();
            doc.attribute(node, GLYPH_FIXED_ATTR).is_some() && collapse_glyph(&text) == text
        })
    }
}

/// Keeps a literal `<style>` block present and unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleBlock {
    pub id: &'static str,
    pub name: &'static str,
    pub css: &'static str,
}

impl StyleBlock {
    pub const ICON_FONT: Self = Self {
        id: ICON_FONT_STYLE_ID,
        name: "icon-font",
        css: ICON_FONT_CSS,
    };

    pub const MOBILE_MENU: Self = Self {
        id: MOBILE_MENU_STYLE_ID,
        name: "mobile-menu",
        css: MOBILE_MENU_CSS,
    };

    pub const TABLE_HOVER: Self = Self {
        id: TABLE_HOVER_STYLE_ID,
        name: "table-hover",
        css: TABLE_HOVER_CSS,
    };
}

impl Correction for StyleBlock {
    fn name(&self) -> &'static str {
        self.name
    }

    fn selector(&self) -> Option<&'static str> {
        None
    }

    fn apply(&self, doc: &mut dyn HostDocument) -> Result<usize> {
        if self.is_intact(doc) {
            return Ok(0);
        }
        doc.inject_style(self.id, self.css);
        Ok(1)
    }

    fn is_intact(&self, doc: &dyn HostDocument) -> bool {
        doc.style(self.id).as_deref() == Some(self.css)
    }
}

/// Keeps a marker attribute on every element matching `selector`.
///
/// The desktop client has no JS-SDK bridge; page scripts read
/// `data-host-api="limited"` on `<body>` and take their fallback paths
/// instead of calling into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostMarker {
    pub name: &'static str,
    pub selector: &'static str,
    pub attribute: &'static str,
    pub value: &'static str,
}

impl HostMarker {
    pub const DESKTOP_API_SHIM: Self = Self {
        name: "desktop-api-shim",
        selector: "body",
        attribute: HOST_API_ATTR,
        value: "limited",
    };

    fn is_marked(&self, doc: &dyn HostDocument, node: NodeId) -> bool {
        doc.attribute(node, self.attribute).as_deref() == Some(self.value)
    }
}

impl Correction for HostMarker {
    fn name(&self) -> &'static str {
        self.name
    }

    fn selector(&self) -> Option<&'static str> {
        Some(self.selector)
    }

    fn apply(&self, doc: &mut dyn HostDocument) -> Result<usize> {
        let mut changed = 0;
        for node in doc.query_all(self.selector) {
            if self.is_marked(doc, node) {
                continue;
            }
            doc.set_attribute(node, self.attribute, self.value)
                .with_context(|| format!("mark {} {node}", self.selector))?;
            changed += 1;
        }
        Ok(changed)
    }

    fn is_intact(&self, doc: &dyn HostDocument) -> bool {
        doc.query_all(self.selector)
            .into_iter()
            .all(|node| self.is_marked(doc, node))
    }
}

/// The corrections one host needs, applied in order.
#[derive(Debug, Default)]
pub struct CorrectionSet {
    corrections: Vec<Box<dyn Correction>>,
}

impl CorrectionSet {
    pub fn new(corrections: Vec<Box<dyn Correction>>) -> Self {
        Self { corrections }
    }

    pub fn for_host(kind: HostKind) -> Self {
        let mut corrections: Vec<Box<dyn Correction>> =
            vec![Box::new(StyleBlock::ICON_FONT), Box::new(IconGlyphDedup)];
        match kind {
            HostKind::Mobile => corrections.push(Box::new(StyleBlock::MOBILE_MENU)),
            HostKind::Desktop => {
                corrections.push(Box::new(StyleBlock::TABLE_HOVER));
                corrections.push(Box::new(HostMarker::DESKTOP_API_SHIM));
            }
        }
        Self::new(corrections)
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.corrections.iter().map(|c| c.name()).collect()
    }

    /// Whether an insertion of elements matching any of `selectors` can
    /// undo one of the corrections.
    pub fn watches_any(&self, selectors: &[&str]) -> bool {
        self.corrections
            .iter()
            .filter_map(|correction| correction.selector())
            .any(|watched| selectors.contains(&watched))
    }

    /// Runs every correction; a failing one is logged and skipped so the
    /// rest still apply.
    pub fn apply_all(&self, doc: &mut dyn HostDocument) -> usize {
        let mut changed = 0;
        for correction in &self.corrections {
            match correction.apply(doc) {
                Ok(count) => changed += count,
                Err(error) => {
                    tracing::warn!(
                        correction = correction.name(),
                        error = %format!("{error:#}"),
                        "correction failed"
                    );
                }
            }
        }
        changed
    }

    pub fn all_intact(&self, doc: &dyn HostDocument) -> bool {
        self.corrections
            .iter()
            .all(|correction| correction.is_intact(doc))
    }
}

/// Returns the shortest unit `text` is a repetition of, ignoring
/// whitespace between copies. Text that is not repeated comes back
/// trimmed.
pub fn collapse_glyph(text: &str) -> String {
    let trimmed = text.trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() > 1 && words.iter().all(|word| *word == words[0]) {
        return collapse_glyph(words[0]);
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();
    for period in 1..=len / 2 {
        if len % period != 0 {
            continue;
        }
        if chars.chunks(period).all(|chunk| chunk == &chars[..period]) {
            return chars[..period].iter().collect();
        }
    }
    trimmed.to_owned()
}
