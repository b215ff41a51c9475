// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::time::Duration;
use stockdesk_compat::{
    Correction, CorrectionSet, Detector, GLYPH_FIXED_ATTR, HOST_API_ATTR, HostDocument, HostKind,
    HostMarker, HostProfile, ICON_FONT_STYLE_ID, IconGlyphDedup, ListenerKind, MENU_OPEN_CLASS,
    MOBILE_MENU_STYLE_ID,
    MenuController, OVERLAY_ACTIVE_CLASS, PatchLoop, PatchState, PatchTimings, StyleBlock,
    TABLE_HOVER_STYLE_ID,
};
use stockdesk_testkit::MemoryDocument;

const WXWORK_PHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 wxwork/4.1.20 MicroMessenger/7.0.1";
const WXWORK_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) wxwork/4.1.6 (MicroMessenger/6.2) WindowsWechat";
const PLAIN_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 \
    (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn phone() -> HostProfile {
    HostProfile::new(WXWORK_PHONE).with_viewport(390).with_touch_points(5)
}

fn desktop() -> HostProfile {
    HostProfile::new(WXWORK_DESKTOP).with_viewport(1440)
}

#[test]
fn corrections_are_idempotent() -> Result<()> {
    let mut doc = MemoryDocument::app_shell();
    doc.icon("homehome");
    doc.icon("search search");

    let set = CorrectionSet::for_host(HostKind::Mobile);
    let first = set.apply_all(&mut doc);
    assert!(first > 0);
    assert!(set.all_intact(&doc));

    let snapshot = doc.clone();
    let writes = doc.writes();
    assert_eq!(set.apply_all(&mut doc), 0);
    assert_eq!(doc, snapshot);
    assert_eq!(doc.writes(), writes);

    for correction in [
        &IconGlyphDedup as &dyn Correction,
        &StyleBlock::ICON_FONT,
        &StyleBlock::MOBILE_MENU,
    ] {
        assert_eq!(correction.apply(&mut doc)?, 0, "{}", correction.name());
    }
    Ok(())
}

#[test]
fn glyph_dedup_rewrites_text_and_marks_icons() -> Result<()> {
    let mut doc = MemoryDocument::new();
    let doubled = doc.icon("menumenu");
    let clean = doc.icon("add");

    assert_eq!(IconGlyphDedup.apply(&mut doc)?, 2);
    assert_eq!(doc.text(doubled).as_deref(), Some("menu"));
    assert_eq!(doc.text(clean).as_deref(), Some("add"));
    assert_eq!(doc.attribute(doubled, GLYPH_FIXED_ATTR).as_deref(), Some("1"));
    assert!(IconGlyphDedup.is_intact(&doc));

    doc.set_text(clean, "addadd")?;
    assert!(!IconGlyphDedup.is_intact(&doc));
    Ok(())
}

#[test]
fn ordinary_browser_stays_inert_and_touches_nothing() {
    let mut doc = MemoryDocument::app_shell();
    let before = doc.clone();
    let mut patches = PatchLoop::default();

    let state = patches.attach(&mut doc, &HostProfile::new(PLAIN_SAFARI), ms(0));
    assert_eq!(state, PatchState::Inert);
    assert_eq!(patches.host(), None);
    assert_eq!(doc.style_count(), 0);
    assert_eq!(doc.listener_count(), 0);
    assert_eq!(doc, before);

    assert!(!patches.on_mutation(ms(10), &[".material-icons"]));
    assert!(!patches.tick(ms(5000), &mut doc));
    assert_eq!(patches.passes(), 0);
}

#[test]
fn arming_injects_styles_and_registers_page_listeners() {
    let mut doc = MemoryDocument::app_shell();
    let mut patches = PatchLoop::default();

    assert_eq!(patches.attach(&mut doc, &phone(), ms(0)), PatchState::Armed);
    assert_eq!(patches.host(), Some(HostKind::Mobile));
    assert!(doc.style(ICON_FONT_STYLE_ID).is_some());
    assert!(doc.style(MOBILE_MENU_STYLE_ID).is_some());
    assert!(doc.style(TABLE_HOVER_STYLE_ID).is_none());
    for kind in [
        ListenerKind::Mutation,
        ListenerKind::Visibility,
        ListenerKind::Resize,
        ListenerKind::Focus,
    ] {
        assert_eq!(doc.listeners_of(kind), 1, "{}", kind.as_str());
    }

    assert_eq!(patches.attach(&mut doc, &phone(), ms(50)), PatchState::Armed);
    assert_eq!(doc.listener_count(), 4);
    assert_eq!(patches.passes(), 1);
}

#[test]
fn startup_passes_run_on_schedule() {
    let mut doc = MemoryDocument::app_shell();
    let mut patches = PatchLoop::default();
    patches.attach(&mut doc, &desktop(), ms(1000));
    assert_eq!(patches.passes(), 1);

    assert!(!patches.tick(ms(1000), &mut doc), "arming already corrected");
    assert!(!patches.tick(ms(1200), &mut doc));
    assert!(patches.tick(ms(1300), &mut doc));
    assert!(patches.tick(ms(2000), &mut doc));
    assert!(!patches.tick(ms(2500), &mut doc));
    assert!(patches.tick(ms(4000), &mut doc));
    assert_eq!(patches.passes(), 4);
}

#[test]
fn zero_startup_offset_adds_no_pass_after_arming() {
    let mut doc = MemoryDocument::app_shell();
    let timings = PatchTimings {
        startup_passes: vec![Duration::ZERO, ms(300)],
        ..PatchTimings::default()
    };
    let mut patches = PatchLoop::new(Detector::default(), timings);
    patches.attach(&mut doc, &phone(), ms(500));

    assert!(!patches.tick(ms(500), &mut doc));
    assert!(patches.tick(ms(800), &mut doc));
    assert!(!patches.tick(ms(900), &mut doc));
    assert_eq!(patches.passes(), 2);
}

#[test]
fn desktop_host_marks_body_for_limited_api() -> Result<()> {
    let mut doc = MemoryDocument::app_shell();
    let body = doc.query("body").expect("shell has a body");
    let timings = PatchTimings {
        startup_passes: Vec::new(),
        ..PatchTimings::default()
    };
    let mut patches = PatchLoop::new(Detector::default(), timings);
    patches.attach(&mut doc, &desktop(), ms(0));
    assert_eq!(doc.attribute(body, HOST_API_ATTR).as_deref(), Some("limited"));
    assert_eq!(HostMarker::DESKTOP_API_SHIM.apply(&mut doc)?, 0);

    doc.set_attribute(body, HOST_API_ATTR, "full")?;
    assert!(!HostMarker::DESKTOP_API_SHIM.is_intact(&doc));
    assert!(patches.tick(ms(2000), &mut doc));
    assert_eq!(doc.attribute(body, HOST_API_ATTR).as_deref(), Some("limited"));

    let mut phone_doc = MemoryDocument::app_shell();
    let phone_body = phone_doc.query("body").expect("shell has a body");
    PatchLoop::default().attach(&mut phone_doc, &phone(), ms(0));
    assert_eq!(phone_doc.attribute(phone_body, HOST_API_ATTR), None);
    Ok(())
}

#[test]
fn mutation_bursts_coalesce_into_one_pass() {
    let mut doc = MemoryDocument::app_shell();
    let timings = PatchTimings {
        startup_passes: Vec::new(),
        ..PatchTimings::default()
    };
    let mut patches = PatchLoop::new(Detector::default(), timings);
    patches.attach(&mut doc, &desktop(), ms(0));
    let armed_passes = patches.passes();

    let late = doc.icon("closeclose");
    assert!(patches.on_mutation(ms(10), &[".material-icons"]));
    assert!(patches.on_mutation(ms(60), &[".material-icons"]));
    assert!(patches.on_mutation(ms(120), &["i", ".material-icons"]));
    assert!(!patches.on_mutation(ms(130), &["tr"]));

    assert!(!patches.tick(ms(200), &mut doc));
    assert_eq!(doc.text(late).as_deref(), Some("closeclose"));
    assert!(patches.tick(ms(220), &mut doc));
    assert_eq!(doc.text(late).as_deref(), Some("close"));
    assert!(!patches.tick(ms(400), &mut doc));
    assert_eq!(patches.passes(), armed_passes + 1);
}

#[test]
fn integrity_check_recorrects_drift() {
    let mut doc = MemoryDocument::app_shell();
    let timings = PatchTimings {
        startup_passes: Vec::new(),
        ..PatchTimings::default()
    };
    let mut patches = PatchLoop::new(Detector::default(), timings);
    patches.attach(&mut doc, &desktop(), ms(0));
    let icon = doc.query(".material-icons").expect("shell has icons");

    assert!(!patches.tick(ms(2000), &mut doc), "intact page needs no pass");

    doc.remove_style(TABLE_HOVER_STYLE_ID);
    doc.remove_attribute(icon, GLYPH_FIXED_ATTR);
    assert!(!patches.tick(ms(3000), &mut doc), "not due yet");
    assert!(patches.tick(ms(4000), &mut doc));
    assert!(doc.style(TABLE_HOVER_STYLE_ID).is_some());
    assert!(doc.attribute(icon, GLYPH_FIXED_ATTR).is_some());
}

#[test]
fn recheck_follows_viewport_changes() {
    let mut doc = MemoryDocument::app_shell();
    let mut patches = PatchLoop::default();
    patches.attach(&mut doc, &desktop(), ms(0));
    assert_eq!(patches.host(), Some(HostKind::Desktop));

    let narrowed = HostProfile::new(WXWORK_DESKTOP).with_viewport(700);
    assert_eq!(patches.recheck(&mut doc, &narrowed, ms(100)), PatchState::Armed);
    assert_eq!(patches.host(), Some(HostKind::Mobile));
    assert!(doc.style(MOBILE_MENU_STYLE_ID).is_some());
    assert_eq!(doc.listener_count(), 4);

    let plain = HostProfile::new(PLAIN_SAFARI);
    assert_eq!(patches.recheck(&mut doc, &plain, ms(200)), PatchState::Inert);
    assert_eq!(doc.listener_count(), 0);
}

#[test]
fn detach_removes_every_listener() {
    let mut doc = MemoryDocument::app_shell();
    let mut patches = PatchLoop::default();
    patches.attach(&mut doc, &phone(), ms(0));
    assert_eq!(patches.listeners().len(), 4);

    assert_eq!(patches.detach(&mut doc), 4);
    assert_eq!(patches.state(), PatchState::Inert);
    assert_eq!(patches.host(), None);
    assert_eq!(doc.listener_count(), 0);
    assert!(!patches.tick(ms(10_000), &mut doc));
}

#[test]
fn menu_controller_toggles_and_detaches_cleanly() -> Result<()> {
    let mut doc = MemoryDocument::app_shell();
    let unrelated = doc.add_listener(ListenerKind::Resize, None);
    let menu = doc.query("#sideMenu").expect("side menu");
    let overlay = doc.query("#mobileOverlay").expect("overlay");
    let button = doc.query("#mobileMenuBtn").expect("menu button");
    let close = doc.query("#menuCloseBtn").expect("close button");

    let mut controller = MenuController::new();
    assert_eq!(controller.attach(&mut doc), 3);
    assert_eq!(doc.listeners_of(ListenerKind::Click), 3);

    assert!(controller.handle_click(&mut doc, button)?);
    assert!(controller.is_open(&doc));
    assert!(doc.has_class(menu, MENU_OPEN_CLASS));
    assert!(doc.has_class(overlay, OVERLAY_ACTIVE_CLASS));

    assert!(controller.handle_click(&mut doc, button)?);
    assert!(!controller.is_open(&doc));
    assert!(!doc.has_class(overlay, OVERLAY_ACTIVE_CLASS));

    controller.handle_click(&mut doc, button)?;
    assert!(controller.handle_click(&mut doc, close)?);
    assert!(!controller.is_open(&doc));

    controller.handle_click(&mut doc, button)?;
    assert!(controller.handle_click(&mut doc, overlay)?);
    assert!(!doc.has_class(menu, MENU_OPEN_CLASS));

    assert!(!controller.handle_click(&mut doc, menu)?);

    assert_eq!(controller.attach(&mut doc), 3, "re-attach replaces bindings");
    assert_eq!(doc.listeners_of(ListenerKind::Click), 3);

    assert_eq!(controller.detach(&mut doc), 3);
    assert_eq!(doc.listeners_of(ListenerKind::Click), 0);
    assert_eq!(doc.listener_count(), 1);
    assert!(doc.remove_listener(unrelated));
    Ok(())
}

#[test]
fn menu_controller_skips_missing_controls() {
    let mut doc = MemoryDocument::new();
    doc.element("nav", Some("sideMenu"), &[], "");
    doc.element("button", Some("mobileMenuBtn"), &[], "");

    let mut controller = MenuController::new();
    assert_eq!(controller.attach(&mut doc), 1);
    assert_eq!(controller.detach(&mut doc), 1);
    assert_eq!(doc.listener_count(), 0);
}
