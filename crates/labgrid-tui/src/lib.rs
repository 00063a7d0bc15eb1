// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use labgrid_app::validation::{format_cell, infer_cell, parse_cell};
use labgrid_app::{
    AppCommand, AppMode, CellValue, Dataset, FocusPane, RowId, Session, TableSchema, View,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const SIDEBAR_WIDTH: u16 = 34;
const ID_COLUMN_WIDTH: u16 = 6;
const ALL_LABEL: &str = "all";
const BLANK_LABEL: &str = "(blank)";
const CURSOR_MARK: &str = "›";

/// Persistence seam between the UI and wherever the table lives.
pub trait AppRuntime {
    fn save_dataset(&mut self, dataset: &Dataset) -> Result<()>;
    fn reload_dataset(&mut self) -> Result<Dataset>;
    fn source_label(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

/// The presented view and the user's working copy of it while edit mode is on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    presented: View,
    edited: View,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CellInput {
    row: usize,
    column: usize,
    buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TableUiState {
    selected_row: usize,
    selected_col: usize,
    // First row drawn; kept between frames so scrolling is stable.
    offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct SidebarUiState {
    filter_cursor: usize,
    column_cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorMove {
    Row(isize),
    Column(isize),
    FirstRow,
    LastRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    view: Option<View>,
    draft: Option<Draft>,
    input: Option<CellInput>,
    table: TableUiState,
    sidebar: SidebarUiState,
    help_visible: bool,
    source_label: String,
    status_token: u64,
}

impl ViewData {
    fn displayed(&self) -> Option<&View> {
        match &self.draft {
            Some(draft) => Some(&draft.edited),
            None => self.view.as_ref(),
        }
    }
}

pub fn run_app<R: AppRuntime>(session: &mut Session, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        source_label: runtime.source_label(),
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view(session, &mut view_data) {
        session
            .state_mut()
            .set_status(&format!("load failed: {error}"));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(session, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, session, &mut view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(session, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    session: &mut Session,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                session.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    session.state_mut().set_status(&message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn refresh_view(session: &mut Session, view_data: &mut ViewData) -> Result<()> {
    let view = session.view()?;
    let rows = view.len();
    let columns = view.columns.len();
    view_data.view = Some(view);
    clamp_cursor(&mut view_data.table, rows, columns);
    Ok(())
}

fn refresh_or_report(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_view(session, view_data) {
        emit_status(session, view_data, internal_tx, format!("view failed: {error}"));
    }
}

fn clamp_cursor(table: &mut TableUiState, rows: usize, columns: usize) {
    table.selected_row = table.selected_row.min(rows.saturating_sub(1));
    table.selected_col = table.selected_col.min(columns.saturating_sub(1));
}

fn handle_key_event<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.input.is_some() {
        handle_input_key(session, view_data, internal_tx, key);
        return false;
    }

    match session.state().mode {
        AppMode::Edit => {
            handle_edit_key(session, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Nav => handle_nav_key(session, runtime, view_data, internal_tx, key),
    }
}

fn handle_nav_key<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Tab, _) => {
            session.dispatch(AppCommand::NextFocus);
        }
        (KeyCode::BackTab, _) => {
            session.dispatch(AppCommand::PrevFocus);
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => open_draft(session, view_data, internal_tx),
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            reload_dataset(session, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('w'), KeyModifiers::NONE) => {
            let message = write_dataset(session, runtime);
            emit_status(session, view_data, internal_tx, message);
        }
        _ => match session.state().focus {
            FocusPane::Table => {
                if let Some(movement) = cursor_move_for_key(key) {
                    apply_cursor_move(view_data, movement);
                }
            }
            FocusPane::Filters => handle_filter_key(session, view_data, internal_tx, key),
            FocusPane::Columns => handle_column_key(session, view_data, internal_tx, key),
        },
    }
    false
}

fn handle_edit_key<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => discard_draft(session, view_data, internal_tx),
        (KeyCode::Enter, _) => match cell_input_for_selection(session.schema(), view_data) {
            Ok(input) => view_data.input = Some(input),
            Err(message) => emit_status(session, view_data, internal_tx, message),
        },
        (KeyCode::Char('a'), KeyModifiers::NONE) => add_draft_row(session, view_data, internal_tx),
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            delete_draft_row(session, view_data, internal_tx);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            commit_draft(session, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('q'), KeyModifiers::NONE) => emit_status(
            session,
            view_data,
            internal_tx,
            "draft is open -- press s to save or esc to discard before quitting",
        ),
        _ => {
            if let Some(movement) = cursor_move_for_key(key) {
                apply_cursor_move(view_data, movement);
            }
        }
    }
}

fn handle_input_key(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.input = None;
            emit_status(session, view_data, internal_tx, "cell edit canceled");
        }
        KeyCode::Enter => apply_cell_input(session, view_data, internal_tx),
        KeyCode::Backspace => {
            if let Some(input) = view_data.input.as_mut() {
                input.buffer.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(input) = view_data.input.as_mut() {
                input.buffer.push(ch);
            }
        }
        _ => {}
    }
}

fn cursor_move_for_key(key: KeyEvent) -> Option<CursorMove> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(CursorMove::Row(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(CursorMove::Row(-1)),
        KeyCode::Char('h') | KeyCode::Left => Some(CursorMove::Column(-1)),
        KeyCode::Char('l') | KeyCode::Right => Some(CursorMove::Column(1)),
        KeyCode::Char('g') => Some(CursorMove::FirstRow),
        KeyCode::Char('G') => Some(CursorMove::LastRow),
        _ => None,
    }
}

fn apply_cursor_move(view_data: &mut ViewData, movement: CursorMove) {
    let (rows, columns) = view_data
        .displayed()
        .map_or((0, 0), |view| (view.len(), view.columns.len()));
    let table = &mut view_data.table;
    match movement {
        CursorMove::Row(delta) => {
            table.selected_row = table.selected_row.saturating_add_signed(delta);
        }
        CursorMove::Column(delta) => {
            table.selected_col = table.selected_col.saturating_add_signed(delta);
        }
        CursorMove::FirstRow => table.selected_row = 0,
        CursorMove::LastRow => table.selected_row = rows.saturating_sub(1),
    }
    clamp_cursor(table, rows, columns);
}

fn open_draft(session: &mut Session, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    let Some(view) = view_data.view.clone() else {
        emit_status(session, view_data, internal_tx, "nothing to edit");
        return;
    };
    debug!(rows = view.len(), "draft opened");
    view_data.draft = Some(Draft {
        presented: view.clone(),
        edited: view,
    });
    session.dispatch(AppCommand::EnterEditMode);
}

fn discard_draft(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    view_data.draft = None;
    view_data.input = None;
    session.dispatch(AppCommand::ExitToNav);
    refresh_or_report(session, view_data, internal_tx);
    emit_status(session, view_data, internal_tx, "draft discarded");
}

fn cell_input_for_selection(
    schema: &TableSchema,
    view_data: &ViewData,
) -> std::result::Result<CellInput, String> {
    let Some(draft) = &view_data.draft else {
        return Err("no draft open".to_owned());
    };
    let TableUiState {
        selected_row,
        selected_col,
        ..
    } = view_data.table;
    let Some(column) = draft.edited.columns.names().get(selected_col) else {
        return Err("no visible columns to edit".to_owned());
    };
    if schema.is_read_only(column) {
        return Err(format!("{} is read-only", schema.label(column)));
    }
    let Some(value) = draft
        .edited
        .rows
        .get(selected_row)
        .and_then(|row| row.values.get(selected_col))
    else {
        return Err("no row selected -- press a to add one".to_owned());
    };
    Ok(CellInput {
        row: selected_row,
        column: selected_col,
        buffer: value.display(),
    })
}

fn apply_cell_input(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(input) = view_data.input.take() else {
        return;
    };
    let Some(draft) = view_data.draft.as_mut() else {
        return;
    };
    let Some(column) = draft.edited.columns.names().get(input.column).cloned() else {
        return;
    };

    let schema = session.schema();
    let label = schema.label(&column).to_owned();
    let parsed = match schema.kind(&column) {
        Some(kind) => parse_cell(kind, &input.buffer),
        None => Ok(infer_cell(&input.buffer)),
    };
    match parsed {
        Ok(value) => {
            draft.edited.set_value(input.row, input.column, value);
            emit_status(session, view_data, internal_tx, format!("{label} updated"));
        }
        Err(error) => {
            view_data.input = Some(input);
            emit_status(session, view_data, internal_tx, format!("{label}: {error}"));
        }
    }
}

fn next_draft_row_id(dataset: &Dataset, edited: &View) -> RowId {
    edited
        .rows
        .iter()
        .map(|row| row.id.next())
        .fold(dataset.next_row_id(), RowId::max)
}

fn add_draft_row(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = view_data.draft.as_mut() else {
        return;
    };
    let id = next_draft_row_id(session.dataset(), &draft.edited);
    draft.edited.push_blank_row(id);
    view_data.table.selected_row = draft.edited.len().saturating_sub(1);
    emit_status(
        session,
        view_data,
        internal_tx,
        format!("row {id} added to draft"),
    );
}

fn delete_draft_row(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = view_data.draft.as_mut() else {
        return;
    };
    let Some(removed) = draft.edited.remove_row(view_data.table.selected_row) else {
        emit_status(session, view_data, internal_tx, "no row selected");
        return;
    };
    let remaining = draft.edited.len();
    let columns = draft.edited.columns.len();
    clamp_cursor(&mut view_data.table, remaining, columns);
    emit_status(
        session,
        view_data,
        internal_tx,
        format!("row {} removed from draft", removed.id),
    );
}

fn commit_draft<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = &view_data.draft else {
        return;
    };
    let summary = match session.commit(&draft.presented, &draft.edited) {
        Ok(summary) => summary,
        Err(error) => {
            emit_status(
                session,
                view_data,
                internal_tx,
                format!("edit rejected: {error}"),
            );
            return;
        }
    };

    view_data.draft = None;
    session.dispatch(AppCommand::ExitToNav);
    refresh_or_report(session, view_data, internal_tx);
    let message = if summary.is_empty() {
        "no changes".to_owned()
    } else {
        let outcome = write_dataset(session, runtime);
        if session.has_unsaved_changes() {
            outcome
        } else {
            format!("saved: {}", summary.describe())
        }
    };
    emit_status(session, view_data, internal_tx, message);
}

fn write_dataset<R: AppRuntime>(session: &mut Session, runtime: &mut R) -> String {
    if !session.has_unsaved_changes() {
        return "nothing to save".to_owned();
    }
    match runtime.save_dataset(session.dataset()) {
        Ok(()) => {
            session.mark_saved();
            "saved".to_owned()
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "save failed");
            format!("save failed: {error:#} -- press w to retry")
        }
    }
}

fn reload_dataset<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if session.has_unsaved_changes() {
        emit_status(
            session,
            view_data,
            internal_tx,
            "unsaved changes -- press w to save before reloading",
        );
        return;
    }
    match runtime.reload_dataset() {
        Ok(dataset) => {
            session.replace_dataset(dataset);
            view_data.table = TableUiState::default();
            refresh_or_report(session, view_data, internal_tx);
            let message = format!("reloaded {}", view_data.source_label);
            emit_status(session, view_data, internal_tx, message);
        }
        Err(error) => emit_status(
            session,
            view_data,
            internal_tx,
            format!("reload failed: {error:#}"),
        ),
    }
}

fn handle_filter_key(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let count = session.filter_columns().len();
    if count == 0 {
        emit_status(
            session,
            view_data,
            internal_tx,
            "no filter columns -- set [data] filter_columns in the config",
        );
        return;
    }
    let cursor = &mut view_data.sidebar.filter_cursor;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => *cursor = (*cursor + 1).min(count - 1),
        KeyCode::Char('k') | KeyCode::Up => *cursor = cursor.saturating_sub(1),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => {
            cycle_filter(session, view_data, internal_tx, 1);
        }
        KeyCode::Char('h') | KeyCode::Left => cycle_filter(session, view_data, internal_tx, -1),
        KeyCode::Char('c') => select_filter(session, view_data, internal_tx, None),
        _ => {}
    }
}

fn selected_filter_value(session: &Session, column: &str) -> Option<CellValue> {
    session
        .filters()
        .get(column)
        .filter(|predicate| predicate.allowed.len() == 1)
        .and_then(|predicate| predicate.allowed.iter().next().cloned())
}

fn cycle_filter(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let Some(column) = session
        .filter_columns()
        .get(view_data.sidebar.filter_cursor)
        .cloned()
    else {
        return;
    };
    let options = match session.filter_options(&column) {
        Ok(options) => options,
        Err(error) => {
            emit_status(session, view_data, internal_tx, error.to_string());
            return;
        }
    };

    let current = selected_filter_value(session, &column)
        .and_then(|value| options.iter().position(|option| *option == value))
        .map_or(0, |index| index + 1);
    let len = options.len() as isize + 1;
    let next = (current as isize + delta).rem_euclid(len) as usize;
    let choice = next.checked_sub(1).and_then(|index| options.get(index).cloned());
    select_filter(session, view_data, internal_tx, choice);
}

fn select_filter(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    choice: Option<CellValue>,
) {
    let Some(column) = session
        .filter_columns()
        .get(view_data.sidebar.filter_cursor)
        .cloned()
    else {
        return;
    };
    let shown = choice.as_ref().map_or_else(|| ALL_LABEL.to_owned(), option_label);
    match session.select_filter_value(&column, choice) {
        Ok(()) => {
            view_data.table = TableUiState::default();
            refresh_or_report(session, view_data, internal_tx);
            let message = format!("{}: {shown}", session.schema().label(&column));
            emit_status(session, view_data, internal_tx, message);
        }
        Err(error) => emit_status(session, view_data, internal_tx, error.to_string()),
    }
}

fn handle_column_key(
    session: &mut Session,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let columns = session.dataset().columns().to_vec();
    if columns.is_empty() {
        return;
    }
    let cursor = &mut view_data.sidebar.column_cursor;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => *cursor = (*cursor + 1).min(columns.len() - 1),
        KeyCode::Char('k') | KeyCode::Up => *cursor = cursor.saturating_sub(1),
        KeyCode::Enter | KeyCode::Char(' ') => {
            let Some(column) = columns.get(*cursor) else {
                return;
            };
            match session.toggle_column(column) {
                Ok(shown) => {
                    refresh_or_report(session, view_data, internal_tx);
                    let verb = if shown { "shown" } else { "hidden" };
                    let message = format!("{} {verb}", session.schema().label(column));
                    emit_status(session, view_data, internal_tx, message);
                }
                Err(error) => emit_status(session, view_data, internal_tx, error.to_string()),
            }
        }
        KeyCode::Char('A') => match session.set_visible_columns(&columns) {
            Ok(()) => {
                refresh_or_report(session, view_data, internal_tx);
                emit_status(session, view_data, internal_tx, "all columns shown");
            }
            Err(error) => emit_status(session, view_data, internal_tx, error.to_string()),
        },
        _ => {}
    }
}

fn option_label(value: &CellValue) -> String {
    if value.is_empty() {
        BLANK_LABEL.to_owned()
    } else {
        value.display()
    }
}

fn render(frame: &mut ratatui::Frame<'_>, session: &Session, view_data: &mut ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(session, view_data))
        .block(Block::default().title("labgrid").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(layout[1]);
    render_sidebar(frame, body[0], session, view_data);
    render_table(frame, body[1], session, view_data);

    let status_widget = Paragraph::new(status_text(session, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(input) = &view_data.input {
        let area = centered_rect(60, 20, frame.area());
        frame.render_widget(Clear, area);
        let editor = Paragraph::new(render_input_text(session, view_data, input)).block(
            Block::default()
                .title("edit cell")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(editor, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn pane_block(title: &'static str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn render_sidebar(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    session: &Session,
    view_data: &ViewData,
) {
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Min(3),
            Constraint::Length(6),
        ])
        .split(area);
    let focus = session.state().focus;

    let filters = Paragraph::new(render_filter_text(session, view_data))
        .block(pane_block("filters", focus == FocusPane::Filters));
    frame.render_widget(filters, panes[0]);

    let columns = Paragraph::new(render_column_text(session, view_data))
        .block(pane_block("columns", focus == FocusPane::Columns));
    frame.render_widget(columns, panes[1]);

    let stats = Paragraph::new(render_stats_text(session)).block(pane_block("stats", false));
    frame.render_widget(stats, panes[2]);
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    session: &Session,
    view_data: &mut ViewData,
) {
    let focused = session.state().focus == FocusPane::Table;
    let Some(view) = view_data.displayed() else {
        let empty = Paragraph::new("no data").block(pane_block("table", focused));
        frame.render_widget(empty, area);
        return;
    };
    let schema = session.schema();

    let mut widths = vec![Constraint::Length(ID_COLUMN_WIDTH)];
    widths.extend(std::iter::repeat_n(Constraint::Min(8), view.columns.len()));

    let header_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(
        std::iter::once(Cell::from("id").style(header_style)).chain(
            view.columns
                .iter()
                .map(|column| Cell::from(schema.label(column).to_owned()).style(header_style)),
        ),
    );

    let rows = view.rows.iter().enumerate().map(|(row_index, row)| {
        let selected_row = row_index == view_data.table.selected_row;
        let row_style = if selected_row {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let id_cell = Cell::from(row.id.to_string()).style(row_style.fg(Color::Gray));
        let cells = view
            .columns
            .iter()
            .zip(&row.values)
            .enumerate()
            .map(|(column_index, (column, value))| {
                let style = if selected_row && column_index == view_data.table.selected_col {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    row_style
                };
                Cell::from(cell_text(schema, column, value)).style(style)
            });
        Row::new(std::iter::once(id_cell).chain(cells))
    });

    let mut block = pane_block("table", focused).title(table_title(view_data));
    if view_data.draft.is_some() {
        block = block.border_style(Style::default().fg(Color::Yellow));
    }
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    let mut state = TableState::default()
        .with_offset(view_data.table.offset)
        .with_selected(Some(view_data.table.selected_row));
    frame.render_stateful_widget(table, area, &mut state);
    view_data.table.offset = state.offset();
}

fn cell_text(schema: &TableSchema, column: &str, value: &CellValue) -> String {
    match schema.kind(column) {
        Some(kind) => format_cell(kind, value),
        None => value.display(),
    }
}

fn table_title(view_data: &ViewData) -> String {
    let rows = view_data.displayed().map_or(0, View::len);
    match &view_data.draft {
        Some(_) => format!(" DRAFT {rows} rows -- unsaved, s save, esc discard "),
        None => format!(" {rows} rows "),
    }
}

fn header_text(session: &Session, view_data: &ViewData) -> String {
    let unsaved = if session.has_unsaved_changes() {
        " | unsaved changes"
    } else {
        ""
    };
    format!(
        "{} | version {}{unsaved}",
        view_data.source_label,
        session.dataset().version()
    )
}

fn render_filter_text(session: &Session, view_data: &ViewData) -> String {
    if session.filter_columns().is_empty() {
        return "no filter columns".to_owned();
    }
    let focused = session.state().focus == FocusPane::Filters;
    session
        .filter_columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mark = if focused && index == view_data.sidebar.filter_cursor {
                CURSOR_MARK
            } else {
                " "
            };
            let selected = selected_filter_value(session, column)
                .map_or_else(|| ALL_LABEL.to_owned(), |value| option_label(&value));
            format!("{mark} {}: {selected}", session.schema().label(column))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_column_text(session: &Session, view_data: &ViewData) -> String {
    let focused = session.state().focus == FocusPane::Columns;
    session
        .dataset()
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mark = if focused && index == view_data.sidebar.column_cursor {
                CURSOR_MARK
            } else {
                " "
            };
            let check = if session.visible_columns().contains(column) {
                "[x]"
            } else {
                "[ ]"
            };
            format!("{mark} {check} {}", session.schema().label(column))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_stats_text(session: &Session) -> String {
    let stats = session.stats();
    [
        format!("rows: {} / {}", stats.filtered_rows, stats.total_rows),
        format!(
            "columns: {} / {}",
            stats.visible_columns, stats.total_columns
        ),
        format!("filters: {}", session.filters().predicates().len()),
        format!("version: {}", session.dataset().version()),
    ]
    .join("\n")
}

fn render_input_text(session: &Session, view_data: &ViewData, input: &CellInput) -> String {
    let column = view_data
        .displayed()
        .and_then(|view| view.columns.names().get(input.column))
        .map_or("", String::as_str);
    format!(
        "{}\n> {}_\n\nenter apply | esc cancel",
        session.schema().label(column),
        input.buffer
    )
}

fn status_text(session: &Session, view_data: &ViewData) -> String {
    let state = session.state();
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Edit => "EDIT",
    };
    let hints = if view_data.input.is_some() {
        "enter apply | esc cancel".to_owned()
    } else {
        match state.mode {
            AppMode::Nav => format!(
                "tab focus:{} | j/k/h/l | e edit | r reload | w write | ? help | q quit",
                state.focus.label()
            ),
            AppMode::Edit => {
                "enter cell | a add | x delete | s save | esc discard".to_owned()
            }
        }
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "tab / shift+tab  move focus between table, filters and columns\n\
     j k h l          move the cursor\n\
     g G              first / last row\n\
     filters: h l     cycle the selected value, c clears\n\
     columns: space   toggle visibility, A shows all\n\
     e                open an editable draft of the current view\n\
     enter            edit the selected cell (draft)\n\
     a x              add / delete a row (draft)\n\
     s                merge the draft and save\n\
     esc              discard the draft\n\
     r w              reload / write the table file\n\
     q                quit"
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
