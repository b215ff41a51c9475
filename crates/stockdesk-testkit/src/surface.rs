// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use stockdesk_app::{FormField, FormValues, Notice, PageWindow, Surface, TableRow, ViewKind};

/// Pagination as last rendered. `Hidden` is distinct from never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationView {
    Untouched,
    Hidden,
    Shown(PageWindow),
}

/// Surface that remembers what it was asked to show. Confirmation prompts
/// answer with `confirm_answer`.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub view: Option<ViewKind>,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub failure_row: Option<String>,
    pub pagination: PaginationView,
    pub form: FormValues,
    pub form_keys: Vec<String>,
    /// Keys `set_field` refuses, as if the form lacked the input.
    pub missing_fields: BTreeSet<String>,
    pub modal: Option<String>,
    pub notices: Vec<(Notice, String)>,
    pub prompts: Vec<String>,
    pub confirm_answer: bool,
    pub search_cleared: usize,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            view: None,
            columns: Vec::new(),
            rows: Vec::new(),
            failure_row: None,
            pagination: PaginationView::Untouched,
            form: FormValues::new(),
            form_keys: Vec::new(),
            missing_fields: BTreeSet::new(),
            modal: None,
            notices: Vec::new(),
            prompts: Vec::new(),
            confirm_answer: true,
            search_cleared: 0,
        }
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declining() -> Self {
        Self {
            confirm_answer: false,
            ..Self::default()
        }
    }

    /// Types into the open form.
    pub fn fill<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in values {
            self.form.set(key, value);
        }
    }

    pub fn last_notice(&self) -> Option<(Notice, &str)> {
        self.notices
            .last()
            .map(|(notice, message)| (*notice, message.as_str()))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|row| row.cells.get(column))
            .map(String::as_str)
    }

    pub fn row_ids(&self) -> Vec<i64> {
        self.rows.iter().map(|row| row.id).collect()
    }
}

impl Surface for RecordingSurface {
    fn render_rows(&mut self, view: ViewKind, columns: &[&str], rows: Vec<TableRow>) {
        self.view = Some(view);
        self.columns = columns.iter().map(|column| (*column).to_owned()).collect();
        self.rows = rows;
        self.failure_row = None;
    }

    fn render_failure_row(&mut self, view: ViewKind, message: &str) {
        self.view = Some(view);
        self.rows.clear();
        self.failure_row = Some(message.to_owned());
    }

    fn render_pagination(&mut self, _view: ViewKind, window: Option<&PageWindow>) {
        self.pagination = match window {
            Some(window) => PaginationView::Shown(window.clone()),
            None => PaginationView::Hidden,
        };
    }

    fn reset_form(&mut self, _view: ViewKind, fields: &[FormField]) {
        self.form = FormValues::new();
        self.form_keys = fields
            .iter()
            .filter(|field| !self.missing_fields.contains(field.key))
            .map(|field| field.key.to_owned())
            .collect();
        for key in &self.form_keys {
            self.form.set(key.as_str(), "");
        }
    }

    fn set_field(&mut self, _view: ViewKind, key: &str, value: &str) -> Result<()> {
        if !self.form_keys.iter().any(|known| known == key) {
            bail!("form has no field named {key:?}");
        }
        self.form.set(key, value);
        Ok(())
    }

    fn read_form(&mut self, _view: ViewKind) -> FormValues {
        self.form.clone()
    }

    fn clear_search_inputs(&mut self, _view: ViewKind) {
        self.search_cleared += 1;
    }

    fn show_modal(&mut self, _view: ViewKind, title: &str) {
        self.modal = Some(title.to_owned());
    }

    fn hide_modal(&mut self, _view: ViewKind) {
        self.modal = None;
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_owned());
        self.confirm_answer
    }

    fn notify(&mut self, notice: Notice, message: &str) {
        self.notices.push((notice, message.to_owned()));
    }
}
