// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{HostDocument, ListenerId, ListenerKind, NodeId, toggle_class};

pub const SIDE_MENU: &str = "#sideMenu";
pub const MENU_BUTTON: &str = "#mobileMenuBtn";
pub const MENU_CLOSE_BUTTON: &str = "#menuCloseBtn";
pub const MENU_OVERLAY: &str = "#mobileOverlay";

pub const MENU_OPEN_CLASS: &str = "open";
pub const OVERLAY_ACTIVE_CLASS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Toggle,
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    listener: ListenerId,
    node: NodeId,
    action: MenuAction,
}

/// Click handling for the slide-in side menu on phones.
#[derive(Debug, Default)]
pub struct MenuController {
    bindings: Vec<Binding>,
}

impl MenuController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub fn listeners(&self) -> Vec<ListenerId> {
        self.bindings.iter().map(|binding| binding.listener).collect()
    }

    /// Binds whichever of the three controls exist. Attaching twice
    /// replaces the earlier bindings instead of stacking handlers.
    pub fn attach(&mut self, doc: &mut dyn HostDocument) -> usize {
        if self.is_attached() {
            self.detach(doc);
        }
        for (selector, action) in [
            (MENU_BUTTON, MenuAction::Toggle),
            (MENU_CLOSE_BUTTON, MenuAction::Close),
            (MENU_OVERLAY, MenuAction::Close),
        ] {
            let Some(node) = doc.query(selector) else {
                tracing::debug!(selector, "menu control missing");
                continue;
            };
            let listener = doc.add_listener(ListenerKind::Click, Some(node));
            self.bindings.push(Binding {
                listener,
                node,
                action,
            });
        }
        self.bindings.len()
    }

    /// Returns `Ok(false)` for clicks on nodes this controller did not bind.
    pub fn handle_click(&mut self, doc: &mut dyn HostDocument, node: NodeId) -> Result<bool> {
        let Some(action) = self
            .bindings
            .iter()
            .find(|binding| binding.node == node)
            .map(|binding| binding.action)
        else {
            return Ok(false);
        };

        let menu = doc.query(SIDE_MENU);
        let overlay = doc.query(MENU_OVERLAY);
        match action {
            MenuAction::Toggle => {
                if let Some(menu) = menu {
                    let open = toggle_class(doc, menu, MENU_OPEN_CLASS)?;
                    if let Some(overlay) = overlay {
                        doc.set_class(overlay, OVERLAY_ACTIVE_CLASS, open)?;
                    }
                    tracing::debug!(open, "side menu toggled");
                }
            }
            MenuAction::Close => {
                if let Some(menu) = menu {
                    doc.set_class(menu, MENU_OPEN_CLASS, false)?;
                }
                if let Some(overlay) = overlay {
                    doc.set_class(overlay, OVERLAY_ACTIVE_CLASS, false)?;
                }
                tracing::debug!("side menu closed");
            }
        }
        Ok(true)
    }

    pub fn is_open(&self, doc: &dyn HostDocument) -> bool {
        doc.query(SIDE_MENU)
            .is_some_and(|menu| doc.has_class(menu, MENU_OPEN_CLASS))
    }

    /// Removes exactly the listeners [`MenuController::attach`] added.
    pub fn detach(&mut self, doc: &mut dyn HostDocument) -> usize {
        self.bindings
            .drain(..)
            .filter(|binding| doc.remove_listener(binding.listener))
            .count()
    }
}
