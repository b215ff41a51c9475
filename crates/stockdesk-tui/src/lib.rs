// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::time::Duration;
use stockdesk_app::{
    AppCommand, AppEvent, AppState, FormField, FormValues, Notice, PackagingController,
    PageWindow, ProductModelController, ReferenceData, ResourceApi, SEARCH_KEYS, Surface,
    TableRow, UserController, ViewContext, ViewKind, WaterRateController,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const FIELD_CURSOR: &str = "▏";

/// Runs `$body` against the controller of the active view. The body sees
/// the controller as `$controller` and a fresh [`ViewContext`] as `$cx`.
macro_rules! with_active {
    ($console:ident, $api:ident, |$controller:ident, $cx:ident| $body:expr) => {{
        let view = $console.state.active_view;
        let mut $cx = ViewContext::new(&mut *$api, &mut $console.surface, &$console.refs);
        match view {
            ViewKind::Packaging => {
                let $controller = &mut $console.packaging;
                $body
            }
            ViewKind::ProductModels => {
                let $controller = &mut $console.product_models;
                $body
            }
            ViewKind::WaterRates => {
                let $controller = &mut $console.water_rates;
                $body
            }
            ViewKind::Users => {
                let $controller = &mut $console.users;
                $body
            }
        }
    }};
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewScreen {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub failure: Option<String>,
    pub pagination: Option<PageWindow>,
    pub selected: usize,
}

impl ViewScreen {
    pub fn selected_id(&self) -> Option<i64> {
        self.rows.get(self.selected).map(|row| row.id)
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.rows.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormUiState {
    pub view: ViewKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub values: FormValues,
    pub cursor: usize,
    pub visible: bool,
}

impl FormUiState {
    fn focused_key(&self) -> Option<&'static str> {
        self.fields.get(self.cursor).map(|field| field.key)
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(key) = self.focused_key() else {
            return;
        };
        let mut value = self.values.get(key).to_owned();
        edit(&mut value);
        self.values.set(key, value);
    }
}

/// Screen state the controllers draw into.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSurface {
    screens: [ViewScreen; 4],
    form: Option<FormUiState>,
    search: FormValues,
    confirm_answer: Option<bool>,
    notices: Vec<(Notice, String)>,
}

impl ConsoleSurface {
    pub fn screen(&self, view: ViewKind) -> &ViewScreen {
        &self.screens[view_index(view)]
    }

    fn screen_mut(&mut self, view: ViewKind) -> &mut ViewScreen {
        &mut self.screens[view_index(view)]
    }

    pub fn form(&self) -> Option<&FormUiState> {
        self.form.as_ref().filter(|form| form.visible)
    }

    pub fn search_values(&self) -> &FormValues {
        &self.search
    }

    /// The answer the next confirmation prompt receives; prompts without a
    /// prepared answer are declined.
    pub fn prepare_confirm(&mut self, answer: bool) {
        self.confirm_answer = Some(answer);
    }

    fn take_notices(&mut self) -> Vec<(Notice, String)> {
        std::mem::take(&mut self.notices)
    }
}

impl Surface for ConsoleSurface {
    fn render_rows(&mut self, view: ViewKind, columns: &[&str], rows: Vec<TableRow>) {
        let screen = self.screen_mut(view);
        screen.columns = columns.iter().map(|column| (*column).to_owned()).collect();
        screen.rows = rows;
        screen.failure = None;
        screen.move_selection(0);
    }

    fn render_failure_row(&mut self, view: ViewKind, message: &str) {
        let screen = self.screen_mut(view);
        screen.rows.clear();
        screen.selected = 0;
        screen.failure = Some(message.to_owned());
    }

    fn render_pagination(&mut self, view: ViewKind, window: Option<&PageWindow>) {
        self.screen_mut(view).pagination = window.cloned();
    }

    fn reset_form(&mut self, view: ViewKind, fields: &[FormField]) {
        let mut values = FormValues::new();
        for field in fields {
            values.set(field.key, "");
        }
        self.form = Some(FormUiState {
            view,
            title: String::new(),
            fields: fields.to_vec(),
            values,
            cursor: 0,
            visible: false,
        });
    }

    fn set_field(&mut self, view: ViewKind, key: &str, value: &str) -> Result<()> {
        let Some(form) = self.form.as_mut().filter(|form| form.view == view) else {
            bail!("no {} form is open", view.title());
        };
        if !form.fields.iter().any(|field| field.key == key) {
            bail!("{} form has no field {key:?}", view.title());
        }
        form.values.set(key, value);
        Ok(())
    }

    fn read_form(&mut self, view: ViewKind) -> FormValues {
        self.form
            .as_ref()
            .filter(|form| form.view == view)
            .map(|form| form.values.clone())
            .unwrap_or_default()
    }

    fn clear_search_inputs(&mut self, _view: ViewKind) {
        self.search = FormValues::new();
    }

    fn show_modal(&mut self, view: ViewKind, title: &str) {
        if let Some(form) = self.form.as_mut().filter(|form| form.view == view) {
            form.title = title.to_owned();
            form.visible = true;
        }
    }

    fn hide_modal(&mut self, view: ViewKind) {
        if self.form.as_ref().is_some_and(|form| form.view == view) {
            self.form = None;
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        let answer = self.confirm_answer.take().unwrap_or(false);
        tracing::debug!(prompt, answer, "confirmation answered");
        answer
    }

    fn notify(&mut self, notice: Notice, message: &str) {
        self.notices.push((notice, message.to_owned()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Hidden,
    ConfirmDelete { id: i64 },
    GoToPage { input: String },
    Search { cursor: usize },
}

/// Console session: one controller per view plus the screen they draw on.
#[derive(Debug)]
pub struct Console {
    state: AppState,
    surface: ConsoleSurface,
    refs: ReferenceData,
    packaging: PackagingController,
    product_models: ProductModelController,
    water_rates: WaterRateController,
    users: UserController,
    overlay: Overlay,
}

impl Console {
    pub fn new(refs: ReferenceData, page_size: u32) -> Self {
        Self {
            state: AppState::default(),
            surface: ConsoleSurface::default(),
            refs,
            packaging: PackagingController::new(),
            product_models: ProductModelController::new(),
            water_rates: WaterRateController::new(),
            users: UserController::paged(page_size),
            overlay: Overlay::Hidden,
        }
    }

    /// Fetches reference data, then the first view.
    pub fn bootstrap<A: ResourceApi>(api: &mut A, page_size: u32) -> Self {
        let mut surface = ConsoleSurface::default();
        let refs = ReferenceData::bootstrap(api, &mut surface);
        let mut console = Self {
            surface,
            ..Self::new(refs, page_size)
        };
        load_active_view(&mut console, api);
        sync_status(&mut console);
        console
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn surface(&self) -> &ConsoleSurface {
        &self.surface
    }

    pub fn refs(&self) -> &ReferenceData {
        &self.refs
    }

    fn active_screen(&self) -> &ViewScreen {
        self.surface.screen(self.state.active_view)
    }
}

pub fn run_console<A: ResourceApi>(console: &mut Console, api: &mut A) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        if let Err(error) = terminal.draw(|frame| render(frame, console)) {
            result = Err(error).context("draw frame");
            break;
        }

        match event::poll(POLL_INTERVAL).context("poll event") {
            Ok(false) => continue,
            Ok(true) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(console, api, key) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Returns `true` when the console should exit.
pub fn handle_key_event<A: ResourceApi>(console: &mut Console, api: &mut A, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    let quit = if console.surface.form().is_some() {
        handle_form_key(console, api, key);
        false
    } else {
        match console.overlay.clone() {
            Overlay::Hidden => handle_view_key(console, api, key),
            Overlay::ConfirmDelete { id } => {
                handle_confirm_key(console, api, id, key);
                false
            }
            Overlay::GoToPage { input } => {
                handle_go_to_page_key(console, api, input, key);
                false
            }
            Overlay::Search { cursor } => {
                handle_search_key(console, api, cursor, key);
                false
            }
        }
    };
    sync_status(console);
    quit
}

fn handle_view_key<A: ResourceApi>(console: &mut Console, api: &mut A, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char(digit @ '1'..='4') => {
            let index = digit as usize - '1' as usize;
            switch_view(console, api, AppCommand::SelectView(ViewKind::ALL[index]));
        }
        KeyCode::Tab => switch_view(console, api, AppCommand::NextView),
        KeyCode::BackTab => switch_view(console, api, AppCommand::PrevView),
        KeyCode::Char('r') => load_active_view(console, api),
        KeyCode::Char('n') => with_active!(console, api, |controller, cx| {
            controller.open_create_modal(&mut cx)
        }),
        KeyCode::Char('e') | KeyCode::Enter => match console.active_screen().selected_id() {
            Some(id) => {
                with_active!(console, api, |controller, cx| {
                    controller.open_edit_modal(&mut cx, id.into());
                });
            }
            None => set_status(console, "nothing selected"),
        },
        KeyCode::Char('d') => match console.active_screen().selected_id() {
            Some(id) => console.overlay = Overlay::ConfirmDelete { id },
            None => set_status(console, "nothing selected"),
        },
        KeyCode::Char('j') | KeyCode::Down => {
            let view = console.state.active_view;
            console.surface.screen_mut(view).move_selection(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let view = console.state.active_view;
            console.surface.screen_mut(view).move_selection(-1);
        }
        KeyCode::Char(paging @ ('/' | 'c' | '[' | ']' | 'g')) => {
            if console.state.active_view != ViewKind::Users {
                set_status(console, "this view has no search or paging");
                return false;
            }
            let mut cx = ViewContext::new(&mut *api, &mut console.surface, &console.refs);
            match paging {
                '/' => console.overlay = Overlay::Search { cursor: 0 },
                'c' => {
                    console.users.clear_search(&mut cx);
                }
                '[' => {
                    console.users.change_page(&mut cx, -1);
                }
                ']' => {
                    console.users.change_page(&mut cx, 1);
                }
                _ => {
                    console.overlay = Overlay::GoToPage {
                        input: String::new(),
                    }
                }
            }
        }
        _ => {}
    }
    false
}

fn handle_form_key<A: ResourceApi>(console: &mut Console, api: &mut A, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            with_active!(console, api, |controller, cx| controller.cancel_edit(&mut cx));
            set_status(console, "edit cancelled");
        }
        KeyCode::Enter => {
            with_active!(console, api, |controller, cx| {
                controller.save(&mut cx);
            });
        }
        code => {
            let Some(form) = console.surface.form.as_mut() else {
                return;
            };
            match code {
                KeyCode::Tab | KeyCode::Down => form.move_cursor(1),
                KeyCode::BackTab | KeyCode::Up => form.move_cursor(-1),
                KeyCode::Backspace => form.edit_focused(|value| {
                    value.pop();
                }),
                KeyCode::Char(ch) => form.edit_focused(|value| value.push(ch)),
                _ => {}
            }
        }
    }
}

fn handle_confirm_key<A: ResourceApi>(console: &mut Console, api: &mut A, id: i64, key: KeyEvent) {
    let answer = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => true,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
        _ => return,
    };
    console.overlay = Overlay::Hidden;
    console.surface.prepare_confirm(answer);
    let deleted = with_active!(console, api, |controller, cx| {
        controller.delete(&mut cx, id.into())
    });
    if !answer && !deleted {
        set_status(console, "delete cancelled");
    }
}

fn handle_go_to_page_key<A: ResourceApi>(
    console: &mut Console,
    api: &mut A,
    mut input: String,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => console.overlay = Overlay::Hidden,
        KeyCode::Enter => {
            console.overlay = Overlay::Hidden;
            let Ok(page) = input.trim().parse::<i64>() else {
                set_status(console, format!("not a page number: {input:?}"));
                return;
            };
            let mut cx = ViewContext::new(&mut *api, &mut console.surface, &console.refs);
            if !console.users.go_to_page(&mut cx, page) {
                let total = console.users.pager().map_or(1, |pager| pager.total_pages());
                set_status(console, format!("page {page} is outside 1-{total}"));
            }
        }
        KeyCode::Backspace => {
            input.pop();
            console.overlay = Overlay::GoToPage { input };
        }
        KeyCode::Char(digit) if digit.is_ascii_digit() => {
            input.push(digit);
            console.overlay = Overlay::GoToPage { input };
        }
        _ => {}
    }
}

fn handle_search_key<A: ResourceApi>(
    console: &mut Console,
    api: &mut A,
    cursor: usize,
    key: KeyEvent,
) {
    let field = SEARCH_KEYS[cursor.min(SEARCH_KEYS.len() - 1)];
    match key.code {
        KeyCode::Esc => console.overlay = Overlay::Hidden,
        KeyCode::Enter => {
            console.overlay = Overlay::Hidden;
            let filters = console.surface.search.clone();
            let mut cx = ViewContext::new(&mut *api, &mut console.surface, &console.refs);
            console.users.search(&mut cx, filters.iter());
        }
        KeyCode::Tab | KeyCode::Down => {
            console.overlay = Overlay::Search {
                cursor: (cursor + 1) % SEARCH_KEYS.len(),
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            console.overlay = Overlay::Search {
                cursor: (cursor + SEARCH_KEYS.len() - 1) % SEARCH_KEYS.len(),
            };
        }
        KeyCode::Backspace => {
            let mut value = console.surface.search.get(field).to_owned();
            value.pop();
            console.surface.search.set(field, value);
        }
        KeyCode::Char(ch) => {
            let value = format!("{}{ch}", console.surface.search.get(field));
            console.surface.search.set(field, value);
        }
        _ => {}
    }
}

fn switch_view<A: ResourceApi>(console: &mut Console, api: &mut A, command: AppCommand) {
    let events = console.state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::ViewChanged(_)))
    {
        console.overlay = Overlay::Hidden;
        load_active_view(console, api);
    }
}

fn load_active_view<A: ResourceApi>(console: &mut Console, api: &mut A) {
    let loaded = with_active!(console, api, |controller, cx| controller.load_list(&mut cx));
    tracing::debug!(view = ?console.state.active_view, loaded, "view refreshed");
}

fn set_status(console: &mut Console, message: impl Into<String>) {
    console.state.dispatch(AppCommand::SetStatus(message.into()));
}

/// Moves the newest controller notice into the status line.
fn sync_status(console: &mut Console) {
    if let Some((notice, message)) = console.surface.take_notices().pop() {
        set_status(console, format!("{}: {message}", notice.as_str()));
    }
}

fn view_index(view: ViewKind) -> usize {
    ViewKind::ALL
        .iter()
        .position(|candidate| *candidate == view)
        .unwrap_or(0)
}

fn render(frame: &mut ratatui::Frame<'_>, console: &Console) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let active = console.state.active_view;
    let titles = ViewKind::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| format!("{} {}", index + 1, view.title()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("stockdesk").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(view_index(active));
    frame.render_widget(tabs, layout[0]);

    render_table(frame, layout[1], active, console.active_screen());

    let pagination = console
        .active_screen()
        .pagination
        .as_ref()
        .map(render_pagination_text)
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(pagination).style(Style::default().fg(Color::Gray)),
        layout[2],
    );

    let status = console
        .state
        .status_line
        .clone()
        .unwrap_or_else(|| key_hint(active).to_owned());
    let status_widget = Paragraph::new(status)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[3]);

    if let Some(form) = console.surface.form() {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(render_form_text(form))
            .block(Block::default().title(form.title.as_str()).borders(Borders::ALL));
        frame.render_widget(modal, area);
        return;
    }

    let overlay = match &console.overlay {
        Overlay::Hidden => None,
        Overlay::ConfirmDelete { id } => Some((
            "confirm",
            format!("Delete {} #{id}?\n\n[y] delete   [n] keep", active.title()),
        )),
        Overlay::GoToPage { input } => Some(("go to page", format!("page: {input}{FIELD_CURSOR}"))),
        Overlay::Search { cursor } => Some((
            "search users",
            render_search_text(&console.surface.search, *cursor),
        )),
    };
    if let Some((title, body)) = overlay {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);
        let widget =
            Paragraph::new(body).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(widget, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view: ViewKind, screen: &ViewScreen) {
    let block = Block::default().title(view.title()).borders(Borders::ALL);
    if let Some(failure) = &screen.failure {
        let body = Paragraph::new(failure.as_str())
            .style(Style::default().fg(Color::Red))
            .block(block);
        frame.render_widget(body, area);
        return;
    }

    let widths = vec![Constraint::Min(6); screen.columns.len().max(1)];
    let header = Row::new(screen.columns.iter().map(|column| {
        Cell::from(column.as_str()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = screen.rows.iter().enumerate().map(|(index, row)| {
        let style = if index == screen.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(row.cells.iter().map(|cell| Cell::from(cell.as_str()))).style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn render_pagination_text(window: &PageWindow) -> String {
    let mut parts = Vec::new();
    parts.push(if window.has_previous() { "‹" } else { " " }.to_owned());
    for (page, active) in window.buttons() {
        parts.push(if active {
            format!("[{page}]")
        } else {
            page.to_string()
        });
    }
    parts.push(if window.has_next() { "›" } else { " " }.to_owned());
    format!(
        "{}   page {} of {}",
        parts.join(" "),
        window.current,
        window.total_pages.max(1)
    )
}

fn render_form_text(form: &FormUiState) -> String {
    let mut lines = Vec::with_capacity(form.fields.len() + 2);
    for (index, field) in form.fields.iter().enumerate() {
        let focused = index == form.cursor;
        let marker = if focused { "›" } else { " " };
        let required = if field.required { "*" } else { "" };
        let cursor = if focused { FIELD_CURSOR } else { "" };
        lines.push(format!(
            "{marker} {}{required}: {}{cursor}",
            field.label,
            form.values.get(field.key)
        ));
    }
    lines.push(String::new());
    lines.push("tab/arrows move · enter save · esc cancel".to_owned());
    lines.join("\n")
}

fn render_search_text(values: &FormValues, cursor: usize) -> String {
    let mut lines = SEARCH_KEYS
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let marker = if index == cursor { "›" } else { " " };
            format!("{marker} {key}: {}", values.get(key))
        })
        .collect::<Vec<String>>();
    lines.push(String::new());
    lines.push("status: active or inactive · enter search · esc close".to_owned());
    lines.join("\n")
}

fn key_hint(view: ViewKind) -> &'static str {
    match view {
        ViewKind::Users => {
            "1-4 views · n new · e edit · d delete · / search · [ ] page · g goto · q quit"
        }
        _ => "1-4 views · r reload · n new · e edit · d delete · j/k move · q quit",
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
