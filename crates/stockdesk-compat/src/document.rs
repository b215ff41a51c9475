// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle returned by [`HostDocument::add_listener`]; the only way to
/// unregister the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Mutation,
    Visibility,
    Resize,
    Focus,
    Click,
}

impl ListenerKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mutation => "mutation",
            Self::Visibility => "visibilitychange",
            Self::Resize => "resize",
            Self::Focus => "focus",
            Self::Click => "click",
        }
    }
}

/// The page as the compatibility patches see it.
///
/// Selectors are limited to a single `#id`, `.class` or tag name. Element
/// mutators fail when the node no longer exists.
pub trait HostDocument {
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn text(&self, node: NodeId) -> Option<String>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn set_class(&mut self, node: NodeId, class: &str, present: bool) -> Result<()>;

    /// Contents of the injected `<style>` element with this id.
    fn style(&self, id: &str) -> Option<String>;

    /// Creates or replaces the `<style>` element with this id.
    fn inject_style(&mut self, id: &str, css: &str);

    /// `target == None` listens on the document or window.
    fn add_listener(&mut self, kind: ListenerKind, target: Option<NodeId>) -> ListenerId;

    /// Returns whether the listener was still registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}

/// Flips `class` on `node` and returns whether it is now present.
pub fn toggle_class(doc: &mut dyn HostDocument, node: NodeId, class: &str) -> Result<bool> {
    let present = !doc.has_class(node, class);
    doc.set_class(node, class, present)?;
    Ok(present)
}
