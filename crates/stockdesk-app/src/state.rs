// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{Entity, ViewKind};

/// Records currently on screen, in server order, indexed by id.
#[derive(Debug, Clone)]
pub struct ListState<E: Entity> {
    records: Vec<E>,
    index: BTreeMap<E::Id, usize>,
}

impl<E: Entity> Default for ListState<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<E: Entity> ListState<E> {
    pub fn replace(&mut self, records: Vec<E>) {
        self.index = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id(), position))
            .collect();
        self.records = records;
    }

    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.index.get(&id).and_then(|&pos| self.records.get(pos))
    }

    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which record, if any, the open modal is editing. `None` target while open
/// means a new record is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSession<Id> {
    open: bool,
    target: Option<Id>,
}

impl<Id> Default for EditSession<Id> {
    fn default() -> Self {
        Self {
            open: false,
            target: None,
        }
    }
}

impl<Id: Copy> EditSession<Id> {
    pub fn begin_create(&mut self) {
        self.open = true;
        self.target = None;
    }

    pub fn begin_edit(&mut self, id: Id) {
        self.open = true;
        self.target = Some(id);
    }

    pub fn clear(&mut self) {
        self.open = false;
        self.target = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn target(&self) -> Option<Id> {
        self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_view: ViewKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_view: ViewKind::Packaging,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextView,
    PrevView,
    SelectView(ViewKind),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ViewChanged(ViewKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextView => self.rotate_view(1),
            AppCommand::PrevView => self.rotate_view(-1),
            AppCommand::SelectView(view) => {
                if view == self.active_view {
                    return Vec::new();
                }
                self.active_view = view;
                vec![AppEvent::ViewChanged(view)]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_view(&mut self, delta: isize) -> Vec<AppEvent> {
        let views = ViewKind::ALL;
        let current = views
            .iter()
            .position(|view| *view == self.active_view)
            .unwrap_or(0) as isize;
        let len = views.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_view = views[next];
        vec![AppEvent::ViewChanged(self.active_view)]
    }
}
