// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{FormField, FormValues, PageWindow, ViewKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Warning,
    Failure,
}

impl Notice {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Warning => "warning",
            Self::Failure => "error",
        }
    }
}

/// One rendered table row. `cells` line up with the entity's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: i64,
    pub cells: Vec<String>,
}

/// The presentation side of a view: table body, modal form, pagination bar,
/// notifications and confirmation prompts.
pub trait Surface {
    fn render_rows(&mut self, view: ViewKind, columns: &[&str], rows: Vec<TableRow>);

    /// Replaces the table body with a single explanatory row.
    fn render_failure_row(&mut self, view: ViewKind, message: &str);

    /// `None` hides the pagination controls.
    fn render_pagination(&mut self, view: ViewKind, window: Option<&PageWindow>);

    /// Empties every field of the view's modal form and declares its layout.
    fn reset_form(&mut self, view: ViewKind, fields: &[FormField]);

    /// Fails when the form has no field called `key`.
    fn set_field(&mut self, view: ViewKind, key: &str, value: &str) -> Result<()>;

    fn read_form(&mut self, view: ViewKind) -> FormValues;

    fn clear_search_inputs(&mut self, view: ViewKind);

    fn show_modal(&mut self, view: ViewKind, title: &str);

    fn hide_modal(&mut self, view: ViewKind);

    fn confirm(&mut self, prompt: &str) -> bool;

    fn notify(&mut self, notice: Notice, message: &str);
}
