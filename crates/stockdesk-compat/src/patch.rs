// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::{
    CorrectionSet, Detector, HostDocument, HostKind, HostProfile, ListenerId, ListenerKind,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
pub const DEFAULT_INTEGRITY_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_STARTUP_PASSES: [Duration; 3] = [
    Duration::from_millis(300),
    Duration::from_millis(1000),
    Duration::from_millis(3000),
];

const PAGE_LISTENERS: [ListenerKind; 4] = [
    ListenerKind::Mutation,
    ListenerKind::Visibility,
    ListenerKind::Resize,
    ListenerKind::Focus,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTimings {
    pub debounce: Duration,
    /// Extra correction passes, measured from the moment the loop armed.
    /// Arming already corrects, so zero offsets are ignored.
    pub startup_passes: Vec<Duration>,
    pub integrity_interval: Duration,
}

impl Default for PatchTimings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            startup_passes: DEFAULT_STARTUP_PASSES.to_vec(),
            integrity_interval: DEFAULT_INTEGRITY_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    Inert,
    Armed,
    Correcting,
}

impl PatchState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inert => "inert",
            Self::Armed => "armed",
            Self::Correcting => "correcting",
        }
    }
}

/// Detects the host once, applies its corrections and keeps re-applying
/// them while the page drifts.
///
/// There are no timers here: the host forwards page events and calls
/// [`PatchLoop::tick`] with a monotonic `now` (any fixed origin works).
#[derive(Debug)]
pub struct PatchLoop {
    detector: Detector,
    timings: PatchTimings,
    state: PatchState,
    detected: Option<Option<HostKind>>,
    corrections: CorrectionSet,
    listeners: Vec<ListenerId>,
    startup_due: Vec<Duration>,
    pending_mutation: Option<Duration>,
    next_integrity: Option<Duration>,
    passes: u64,
}

impl Default for PatchLoop {
    fn default() -> Self {
        Self::new(Detector::default(), PatchTimings::default())
    }
}

impl PatchLoop {
    pub fn new(detector: Detector, timings: PatchTimings) -> Self {
        Self {
            detector,
            timings,
            state: PatchState::Inert,
            detected: None,
            corrections: CorrectionSet::default(),
            listeners: Vec::new(),
            startup_due: Vec::new(),
            pending_mutation: None,
            next_integrity: None,
            passes: 0,
        }
    }

    pub fn state(&self) -> PatchState {
        self.state
    }

    pub fn host(&self) -> Option<HostKind> {
        self.detected.flatten()
    }

    pub fn corrections(&self) -> &CorrectionSet {
        &self.corrections
    }

    pub fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }

    /// Number of correction passes run since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn timings(&self) -> &PatchTimings {
        &self.timings
    }

    /// Detection runs on the first attach only; later calls reuse the
    /// verdict. An inert loop touches nothing in the document.
    pub fn attach(
        &mut self,
        doc: &mut dyn HostDocument,
        profile: &HostProfile,
        now: Duration,
    ) -> PatchState {
        if self.state != PatchState::Inert {
            return self.state;
        }
        let detector = &self.detector;
        let host = *self.detected.get_or_insert_with(|| detector.detect(profile));
        match host {
            Some(kind) => self.arm(doc, kind, now),
            None => {
                tracing::debug!(user_agent = ?profile.user_agent, "not a restricted host");
            }
        }
        self.state
    }

    /// Records DOM additions. Only insertions a correction watches count,
    /// and each one pushes the pending pass back by the debounce delay.
    pub fn on_mutation(&mut self, now: Duration, added_selectors: &[&str]) -> bool {
        if self.state != PatchState::Armed || !self.corrections.watches_any(added_selectors) {
            return false;
        }
        self.pending_mutation = Some(now + self.timings.debounce);
        true
    }

    /// Runs at most one correction pass covering everything due by `now`:
    /// startup passes, a settled mutation burst, or a failed integrity
    /// check. Returns whether a pass ran.
    pub fn tick(&mut self, now: Duration, doc: &mut dyn HostDocument) -> bool {
        if self.state == PatchState::Inert {
            return false;
        }

        let mut reason = None;
        let scheduled = self.startup_due.len();
        self.startup_due.retain(|due| *due > now);
        if self.startup_due.len() < scheduled {
            reason = Some("startup");
        }

        if self.pending_mutation.is_some_and(|due| due <= now) {
            self.pending_mutation = None;
            reason = Some("mutation");
        }

        if let Some(due) = self.next_integrity
            && due <= now
        {
            self.next_integrity = Some(now + self.timings.integrity_interval);
            if !self.corrections.all_intact(doc) {
                tracing::info!("page drifted from corrected state");
                reason = Some("integrity");
            }
        }

        match reason {
            Some(reason) => {
                self.correct(doc, reason);
                true
            }
            None => false,
        }
    }

    /// Re-runs detection after a visibility, resize or focus event; the
    /// viewport may have crossed the phone/desktop boundary.
    pub fn recheck(
        &mut self,
        doc: &mut dyn HostDocument,
        profile: &HostProfile,
        now: Duration,
    ) -> PatchState {
        let previous = self.host();
        let host = self.detector.detect(profile);
        self.detected = Some(host);

        match (self.state, host) {
            (PatchState::Inert, None) => {}
            (PatchState::Inert, Some(kind)) => self.arm(doc, kind, now),
            (_, None) => {
                tracing::info!("host no longer matches; disarming");
                self.disarm(doc);
            }
            (_, Some(kind)) => {
                if previous != Some(kind) {
                    tracing::info!(from = ?previous, to = %kind, "host class changed");
                    self.corrections = CorrectionSet::for_host(kind);
                }
                self.correct(doc, "recheck");
            }
        }
        self.state
    }

    /// Removes every listener this loop registered and forgets the cached
    /// detection. Returns how many listeners were removed.
    pub fn detach(&mut self, doc: &mut dyn HostDocument) -> usize {
        let removed = self.disarm(doc);
        self.detected = None;
        removed
    }

    fn arm(&mut self, doc: &mut dyn HostDocument, kind: HostKind, now: Duration) {
        self.corrections = CorrectionSet::for_host(kind);
        self.correct(doc, "arm");
        self.listeners = PAGE_LISTENERS
            .iter()
            .map(|listener| doc.add_listener(*listener, None))
            .collect();
        self.startup_due = self
            .timings
            .startup_passes
            .iter()
            .filter(|delay| !delay.is_zero())
            .map(|delay| now + *delay)
            .collect();
        self.pending_mutation = None;
        self.next_integrity = Some(now + self.timings.integrity_interval);
        self.state = PatchState::Armed;
        tracing::info!(
            host = %kind,
            corrections = ?self.corrections.names(),
            "compatibility patches armed"
        );
    }

    fn disarm(&mut self, doc: &mut dyn HostDocument) -> usize {
        let removed = self
            .listeners
            .drain(..)
            .filter(|listener| doc.remove_listener(*listener))
            .count();
        self.corrections = CorrectionSet::default();
        self.startup_due.clear();
        self.pending_mutation = None;
        self.next_integrity = None;
        self.state = PatchState::Inert;
        tracing::debug!(removed, "compatibility patches detached");
        removed
    }

    fn correct(&mut self, doc: &mut dyn HostDocument, reason: &'static str) -> usize {
        self.state = PatchState::Correcting;
        let changed = self.corrections.apply_all(doc);
        self.passes += 1;
        self.state = PatchState::Armed;
        tracing::debug!(reason, changed, "correction pass");
        changed
    }
}
