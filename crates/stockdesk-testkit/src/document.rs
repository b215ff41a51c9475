// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, BTreeSet};
use stockdesk_compat::{HostDocument, ListenerId, ListenerKind, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

/// Flat in-memory page: elements, injected style blocks and registered
/// listeners. Two documents compare equal when the page looks the same.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: BTreeMap<NodeId, Element>,
    styles: BTreeMap<String, String>,
    listeners: BTreeMap<ListenerId, (ListenerKind, Option<NodeId>)>,
    next_node: u64,
    next_listener: u64,
    writes: usize,
}

impl PartialEq for MemoryDocument {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements && self.styles == other.styles
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page with the side menu controls and a couple of icons.
    pub fn app_shell() -> Self {
        let mut doc = Self::new();
        doc.element("body", None, &[], "");
        doc.element("nav", Some("sideMenu"), &[], "");
        doc.element("button", Some("mobileMenuBtn"), &["mobile-menu-btn"], "");
        doc.element("button", Some("menuCloseBtn"), &[], "");
        doc.element("div", Some("mobileOverlay"), &[], "");
        doc.icon("menu");
        doc.icon("logout");
        doc
    }

    pub fn element(
        &mut self,
        tag: &str,
        id: Option<&str>,
        classes: &[&str],
        text: &str,
    ) -> NodeId {
        self.next_node += 1;
        let node = NodeId::new(self.next_node);
        self.elements.insert(
            node,
            Element {
                tag: tag.to_owned(),
                id: id.map(str::to_owned),
                classes: classes.iter().map(|class| (*class).to_owned()).collect(),
                attributes: BTreeMap::new(),
                text: text.to_owned(),
            },
        );
        node
    }

    pub fn icon(&mut self, text: &str) -> NodeId {
        self.element("i", None, &["material-icons"], text)
    }

    pub fn get(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(&node)
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.attributes.remove(name);
        }
    }

    pub fn remove_style(&mut self, id: &str) {
        self.styles.remove(id);
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners_of(&self, kind: ListenerKind) -> usize {
        self.listeners
            .values()
            .filter(|(registered, _)| *registered == kind)
            .count()
    }

    /// Mutations made through the [`HostDocument`] interface.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut Element> {
        self.elements
            .get_mut(&node)
            .ok_or_else(|| anyhow!("{node} is not in the document"))
    }
}

fn selector_matches(element: &Element, selector: &str) -> bool {
    if let Some(id) = selector.strip_prefix('#') {
        element.id.as_deref() == Some(id)
    } else if let Some(class) = selector.strip_prefix('.') {
        element.classes.contains(class)
    } else {
        element.tag.eq_ignore_ascii_case(selector)
    }
}

impl HostDocument for MemoryDocument {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.elements
            .iter()
            .filter(|(_, element)| selector_matches(element, selector))
            .map(|(node, _)| *node)
            .collect()
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.elements.get(&node).map(|element| element.text.clone())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.element_mut(node)?.text = text.to_owned();
        self.writes += 1;
        Ok(())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.elements
            .get(&node)
            .and_then(|element| element.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(node)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        self.writes += 1;
        Ok(())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements
            .get(&node)
            .is_some_and(|element| element.classes.contains(class))
    }

    fn set_class(&mut self, node: NodeId, class: &str, present: bool) -> Result<()> {
        let element = self.element_mut(node)?;
        if present {
            element.classes.insert(class.to_owned());
        } else {
            element.classes.remove(class);
        }
        self.writes += 1;
        Ok(())
    }

    fn style(&self, id: &str) -> Option<String> {
        self.styles.get(id).cloned()
    }

    fn inject_style(&mut self, id: &str, css: &str) {
        self.styles.insert(id.to_owned(), css.to_owned());
        self.writes += 1;
    }

    fn add_listener(&mut self, kind: ListenerKind, target: Option<NodeId>) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId::new(self.next_listener);
        self.listeners.insert(id, (kind, target));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }
}
