// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    EditSession, Entity, FormInput, FormMode, GENERIC_FAILURE, ListState, Listing, Notice,
    Packaging, Pager, ProductModel, ReferenceData, ResourceApi, SearchParams, Surface, TableRow,
    User, WaterRate, failure_message,
};

pub type PackagingController = CrudController<Packaging>;
pub type ProductModelController = CrudController<ProductModel>;
pub type WaterRateController = CrudController<WaterRate>;
pub type UserController = CrudController<User>;

/// Everything a view operation touches besides its own state.
pub struct ViewContext<'a, A, S> {
    pub api: &'a mut A,
    pub surface: &'a mut S,
    pub refs: &'a ReferenceData,
}

impl<'a, A: ResourceApi, S: Surface> ViewContext<'a, A, S> {
    pub fn new(api: &'a mut A, surface: &'a mut S, refs: &'a ReferenceData) -> Self {
        Self { api, surface, refs }
    }
}

/// List loader, modal form controller and delete action for one view.
/// Views constructed with [`CrudController::paged`] also track page and
/// search state.
///
/// Every operation reports its own failures to the surface and the log and
/// returns whether it succeeded; none of them propagate errors.
#[derive(Debug, Clone)]
pub struct CrudController<E: Entity> {
    list: ListState<E>,
    session: EditSession<E::Id>,
    pager: Option<Pager>,
}

impl<E: Entity> Default for CrudController<E> {
    fn default() -> Self {
        Self {
            list: ListState::default(),
            session: EditSession::default(),
            pager: None,
        }
    }
}

impl<E: Entity> CrudController<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paged(page_size: u32) -> Self {
        Self {
            pager: Some(Pager::new(page_size)),
            ..Self::default()
        }
    }

    pub fn list(&self) -> &ListState<E> {
        &self.list
    }

    pub fn session(&self) -> &EditSession<E::Id> {
        &self.session
    }

    pub fn pager(&self) -> Option<&Pager> {
        self.pager.as_ref()
    }

    pub fn load_list<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
    ) -> bool {
        let Some(pager) = self.pager.as_mut() else {
            return match cx.api.list::<E>() {
                Ok(records) => {
                    tracing::debug!(view = ?E::VIEW, rows = records.len(), "list loaded");
                    self.list.replace(records);
                    render_rows(&self.list, cx);
                    true
                }
                Err(error) => {
                    tracing::error!(
                        view = ?E::VIEW,
                        error = %format!("{error:#}"),
                        "load list failed"
                    );
                    cx.surface.notify(
                        Notice::Failure,
                        &format!("could not load {} list: {}", E::NOUN, failure_message(&error)),
                    );
                    false
                }
            };
        };

        // A page that vanished under us (last row deleted, shorter search
        // result) is clamped by the pager and fetched again once.
        let mut refetched = false;
        loop {
            let requested = pager.current_page();
            match cx.api.list_page::<E>(&pager.query()) {
                Ok(Listing::Paged {
                    count,
                    total_pages,
                    results,
                }) => {
                    pager.apply_page(count, total_pages);
                    if pager.current_page() != requested && !refetched {
                        tracing::debug!(
                            view = ?E::VIEW,
                            requested,
                            page = pager.current_page(),
                            "page out of range; reloading clamped page"
                        );
                        refetched = true;
                        continue;
                    }
                    tracing::debug!(
                        view = ?E::VIEW,
                        page = pager.current_page(),
                        total_pages = pager.total_pages(),
                        count,
                        "page loaded"
                    );
                    self.list.replace(results);
                    render_rows(&self.list, cx);
                    cx.surface.render_pagination(E::VIEW, Some(&pager.window()));
                    return true;
                }
                Ok(Listing::Flat(records)) => {
                    tracing::debug!(view = ?E::VIEW, rows = records.len(), "unpaginated payload");
                    pager.apply_unpaged(records.len());
                    self.list.replace(records);
                    render_rows(&self.list, cx);
                    cx.surface.render_pagination(E::VIEW, None);
                    return true;
                }
                Err(error) => {
                    tracing::error!(
                        view = ?E::VIEW,
                        error = %format!("{error:#}"),
                        "load page failed"
                    );
                    let message = failure_message(&error);
                    cx.surface.notify(
                        Notice::Failure,
                        &format!("could not load {} list: {message}", E::NOUN),
                    );
                    let row = if message == GENERIC_FAILURE {
                        message
                    } else {
                        format!("{GENERIC_FAILURE}: {message}")
                    };
                    cx.surface.render_failure_row(E::VIEW, &row);
                    return false;
                }
            }
        }
    }

    pub fn open_create_modal<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
    ) {
        self.session.begin_create();
        cx.surface.reset_form(E::VIEW, <E::Input as FormInput>::FIELDS);
        cx.surface.show_modal(E::VIEW, &format!("New {}", E::NOUN));
    }

    pub fn open_edit_modal<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
        id: E::Id,
    ) -> bool {
        let record = match self.list.get(id) {
            Some(record) => record.clone(),
            None => match cx.api.get::<E>(id) {
                Ok(record) => record,
                Err(error) => {
                    tracing::error!(
                        view = ?E::VIEW,
                        %id,
                        error = %format!("{error:#}"),
                        "read record failed"
                    );
                    cx.surface.notify(
                        Notice::Failure,
                        &format!("could not open {} #{id}: {}", E::NOUN, failure_message(&error)),
                    );
                    return false;
                }
            },
        };

        self.session.begin_edit(id);
        cx.surface.reset_form(E::VIEW, <E::Input as FormInput>::FIELDS);
        for (key, value) in record.form_values().iter() {
            if let Err(error) = cx.surface.set_field(E::VIEW, key, value) {
                tracing::warn!(view = ?E::VIEW, field = key, %error, "form field skipped");
            }
        }
        cx.surface.show_modal(E::VIEW, &format!("Edit {} #{id}", E::NOUN));
        true
    }

    /// Closes the form without sending anything.
    pub fn cancel_edit<A: ResourceApi, S: Surface>(&mut self, cx: &mut ViewContext<'_, A, S>) {
        self.session.clear();
        cx.surface.hide_modal(E::VIEW);
    }

    pub fn save<A: ResourceApi, S: Surface>(&mut self, cx: &mut ViewContext<'_, A, S>) -> bool {
        if !self.session.is_open() {
            tracing::warn!(view = ?E::VIEW, "save requested with no open form");
            return false;
        }

        let target = self.session.target();
        let mode = if target.is_some() {
            FormMode::Update
        } else {
            FormMode::Create
        };
        let values = cx.surface.read_form(E::VIEW);
        let input = match <E::Input as FormInput>::parse(&values, mode) {
            Ok(input) => input,
            Err(error) => {
                tracing::warn!(view = ?E::VIEW, %error, "form rejected");
                cx.surface.notify(Notice::Failure, &failure_message(&error));
                return false;
            }
        };

        let result = match target {
            None => cx.api.create::<E>(&input),
            Some(id) => cx.api.update::<E>(id, &input),
        };
        match result {
            Ok(mutation) => {
                let verb = if target.is_some() { "updated" } else { "created" };
                let id: Option<i64> = mutation.id.or(target.map(Into::into));
                tracing::info!(view = ?E::VIEW, ?id, "{} {verb}", E::NOUN);
                cx.surface.hide_modal(E::VIEW);
                self.session.clear();
                self.load_list(cx);
                let message = mutation
                    .message
                    .unwrap_or_else(|| format!("{} {verb}", E::NOUN));
                cx.surface.notify(Notice::Success, &message);
                true
            }
            Err(error) => {
                tracing::error!(view = ?E::VIEW, error = %format!("{error:#}"), "save failed");
                cx.surface.notify(Notice::Failure, &failure_message(&error));
                false
            }
        }
    }

    /// Deletes after the user confirms; a declined prompt sends nothing.
    pub fn delete<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
        id: E::Id,
    ) -> bool {
        if !cx
            .surface
            .confirm(&format!("Delete {} #{id}? This cannot be undone.", E::NOUN))
        {
            tracing::debug!(view = ?E::VIEW, %id, "delete declined");
            return false;
        }

        match cx.api.delete::<E>(id) {
            Ok(mutation) => {
                tracing::info!(view = ?E::VIEW, %id, "{} deleted", E::NOUN);
                self.load_list(cx);
                let message = mutation
                    .message
                    .unwrap_or_else(|| format!("{} deleted", E::NOUN));
                cx.surface.notify(Notice::Success, &message);
                true
            }
            Err(error) => {
                tracing::error!(
                    view = ?E::VIEW,
                    %id,
                    error = %format!("{error:#}"),
                    "delete failed"
                );
                cx.surface.notify(Notice::Failure, &failure_message(&error));
                false
            }
        }
    }

    /// Replaces the active filters with the non-blank recognised ones and
    /// reloads from the first page.
    pub fn search<'f, A, S, I>(&mut self, cx: &mut ViewContext<'_, A, S>, filters: I) -> bool
    where
        A: ResourceApi,
        S: Surface,
        I: IntoIterator<Item = (&'f str, &'f str)>,
    {
        let Some(pager) = self.pager.as_mut() else {
            tracing::warn!(view = ?E::VIEW, "search on a view without paging");
            return false;
        };
        pager.search(SearchParams::from_filters(filters));
        self.load_list(cx)
    }

    pub fn clear_search<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
    ) -> bool {
        let Some(pager) = self.pager.as_mut() else {
            return false;
        };
        pager.clear_search();
        cx.surface.clear_search_inputs(E::VIEW);
        self.load_list(cx)
    }

    /// Out-of-range pages are ignored without a request.
    pub fn go_to_page<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
        page: i64,
    ) -> bool {
        let Some(pager) = self.pager.as_mut() else {
            return false;
        };
        if !pager.go_to_page(page) {
            tracing::debug!(
                view = ?E::VIEW,
                page,
                total = pager.total_pages(),
                "page out of range"
            );
            return false;
        }
        self.load_list(cx)
    }

    pub fn change_page<A: ResourceApi, S: Surface>(
        &mut self,
        cx: &mut ViewContext<'_, A, S>,
        delta: i64,
    ) -> bool {
        let Some(current) = self.pager.as_ref().map(Pager::current_page) else {
            return false;
        };
        self.go_to_page(cx, i64::from(current) + delta)
    }
}

fn render_rows<E: Entity, A, S: Surface>(list: &ListState<E>, cx: &mut ViewContext<'_, A, S>) {
    let rows = list
        .records()
        .iter()
        .map(|record| TableRow {
            id: record.id().into(),
            cells: record.cells(cx.refs),
        })
        .collect();
    cx.surface.render_rows(E::VIEW, E::COLUMNS, rows);
}
