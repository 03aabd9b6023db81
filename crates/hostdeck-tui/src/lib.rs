// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use hostdeck_app::{
    BrowserCommand, BrowserEvent, BrowserState, DetailRequest, InstanceId, PageNav,
    PaginationToolbar, Query, ResultPage, RowKey, TableRowView, TaskEvent, TaskStatus,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const ANY_GROUP_LABEL: &str = "(any)";
const EXPANDED_MARK: &str = "▾";
const COLLAPSED_MARK: &str = "▸";
const PICKER_WINDOW: usize = 12;

/// Collaborators the browser calls out to. The host owns storage; the
/// browser only describes what it wants.
pub trait AppRuntime {
    fn refresh(&mut self, instance_id: &InstanceId, query: &Query) -> Result<ResultPage>;
    fn load_host_groups(&mut self, instance_id: &InstanceId) -> Result<Vec<String>>;
    fn load_host_tasks(&mut self, request: &DetailRequest) -> Result<Vec<TaskEvent>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Table,
    HostFilter,
    GroupPicker,
}

impl Focus {
    const fn label(self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::HostFilter => "FILTER",
            Self::GroupPicker => "GROUP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupChoice {
    Any,
    Group(String),
}

impl GroupChoice {
    fn label(&self) -> &str {
        match self {
            Self::Any => ANY_GROUP_LABEL,
            Self::Group(group) => group,
        }
    }

    fn filter_value(&self) -> &str {
        match self {
            Self::Any => "",
            Self::Group(group) => group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct GroupPickerUiState {
    query: String,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DetailTasks {
    Loaded(Vec<TaskEvent>),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableStatus {
    NoRows,
    NoDetailsOpen,
    DetailsClosed(usize),
    PageUnavailable(PageNav),
    GroupUnchanged,
    HelpShown,
    HelpHidden,
}

impl TableStatus {
    fn message(self) -> String {
        match self {
            Self::NoRows => "no host selected".to_owned(),
            Self::NoDetailsOpen => "no details open".to_owned(),
            Self::DetailsClosed(count) => format!("closed {count} detail view(s)"),
            Self::PageUnavailable(PageNav::Next) => "already on the last page".to_owned(),
            Self::PageUnavailable(_) => "already on the first page".to_owned(),
            Self::GroupUnchanged => "group filter unchanged".to_owned(),
            Self::HelpShown => "help shown".to_owned(),
            Self::HelpHidden => "help hidden".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    focus: Focus,
    selected_row: usize,
    page_offset: u64,
    picker: GroupPickerUiState,
    detail_tasks: BTreeMap<RowKey, DetailTasks>,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut BrowserState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = load_initial_view(state, runtime, &mut view_data) {
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            format!("load failed: {error:#}"),
        );
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
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

fn load_initial_view<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let groups = runtime
        .load_host_groups(state.instance_id())
        .context("load host groups")?;
    state.set_host_groups(groups);
    load_page(state, runtime, view_data, &Query::first_page())
}

fn process_internal_events(
    state: &mut BrowserState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(BrowserCommand::ClearStatus);
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
    state: &mut BrowserState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(BrowserCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut BrowserState,
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
            emit_status(
                state,
                view_data,
                internal_tx,
                TableStatus::HelpHidden.message(),
            );
        }
        return false;
    }

    match view_data.focus {
        Focus::HostFilter => {
            handle_host_filter_key(state, runtime, view_data, internal_tx, key);
            false
        }
        Focus::GroupPicker => {
            handle_group_picker_key(state, runtime, view_data, internal_tx, key);
            false
        }
        Focus::Table => handle_table_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_table_key<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let row_count = state.props.rows.len();
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            if row_count > 0 {
                view_data.selected_row = (view_data.selected_row + 1).min(row_count - 1);
            }
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            view_data.selected_row = view_data.selected_row.saturating_sub(1);
        }
        (KeyCode::Enter, _) => match selected_row_key(state, view_data) {
            Some(row_key) => {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    BrowserCommand::ToggleDetail(row_key),
                    internal_tx,
                );
            }
            None => emit_status(state, view_data, internal_tx, TableStatus::NoRows.message()),
        },
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            let open = state.details.len();
            if open == 0 {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    TableStatus::NoDetailsOpen.message(),
                );
            } else {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    BrowserCommand::CloseAllDetails,
                    internal_tx,
                );
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    TableStatus::DetailsClosed(open).message(),
                );
            }
        }
        (KeyCode::Char('/'), KeyModifiers::NONE) => {
            view_data.focus = Focus::HostFilter;
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => open_group_picker(state, view_data),
        (KeyCode::Char('n'), KeyModifiers::NONE) => {
            navigate(state, runtime, view_data, internal_tx, PageNav::Next);
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) => {
            navigate(state, runtime, view_data, internal_tx, PageNav::Prev);
        }
        (KeyCode::Char('0'), KeyModifiers::NONE) => {
            navigate(state, runtime, view_data, internal_tx, PageNav::First);
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
            emit_status(state, view_data, internal_tx, TableStatus::HelpShown.message());
        }
        _ => {}
    }
    false
}

fn navigate<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    nav: PageNav,
) {
    if state.toolbar().is_disabled(nav) {
        emit_status(
            state,
            view_data,
            internal_tx,
            TableStatus::PageUnavailable(nav).message(),
        );
        return;
    }
    let command = match nav {
        PageNav::First => BrowserCommand::FirstPage,
        PageNav::Prev => BrowserCommand::PrevPage,
        PageNav::Next => BrowserCommand::NextPage,
    };
    dispatch_and_refresh(state, runtime, view_data, command, internal_tx);
}

fn handle_host_filter_key<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mut text = state.filters.text_filter.clone().unwrap_or_default();
    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) | (KeyCode::Esc, _) | (KeyCode::Tab, _) => {
            view_data.focus = Focus::Table;
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                BrowserCommand::TextCommitted,
                internal_tx,
            );
            return;
        }
        (KeyCode::Backspace, _) => {
            text.pop();
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            text.clear();
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            text.push(ch);
        }
        _ => return,
    }
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        BrowserCommand::TextChanged(text),
        internal_tx,
    );
}

fn open_group_picker(state: &BrowserState, view_data: &mut ViewData) {
    view_data.focus = Focus::GroupPicker;
    view_data.picker = GroupPickerUiState::default();
    let choices = group_choices(&state.props.host_groups, "");
    view_data.picker.cursor = choices
        .iter()
        .position(|choice| match (choice, &state.filters.category_filter) {
            (GroupChoice::Any, None) => true,
            (GroupChoice::Group(group), Some(current)) => group == current,
            _ => false,
        })
        .unwrap_or(0);
}

fn handle_group_picker_key<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            close_group_picker(view_data);
            return;
        }
        (KeyCode::Up, _) => {
            view_data.picker.cursor = view_data.picker.cursor.saturating_sub(1);
        }
        (KeyCode::Char('p'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.picker.cursor = view_data.picker.cursor.saturating_sub(1);
        }
        (KeyCode::Down, _) => {
            view_data.picker.cursor = view_data.picker.cursor.saturating_add(1);
        }
        (KeyCode::Char('n'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.picker.cursor = view_data.picker.cursor.saturating_add(1);
        }
        (KeyCode::Backspace, _) => {
            view_data.picker.query.pop();
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.picker.query.clear();
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            view_data.picker.query.push(ch);
        }
        (KeyCode::Enter, _) => {
            let choices = group_choices(&state.props.host_groups, &view_data.picker.query);
            let index = view_data.picker.cursor.min(choices.len().saturating_sub(1));
            let value = choices
                .get(index)
                .map(|choice| choice.filter_value().to_owned())
                .unwrap_or_default();
            close_group_picker(view_data);
            let events = dispatch_and_refresh(
                state,
                runtime,
                view_data,
                BrowserCommand::CategoryChanged(value),
                internal_tx,
            );
            if events.is_empty() {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    TableStatus::GroupUnchanged.message(),
                );
            }
            return;
        }
        _ => {}
    }

    let choices = group_choices(&state.props.host_groups, &view_data.picker.query);
    view_data.picker.cursor = view_data.picker.cursor.min(choices.len().saturating_sub(1));
}

fn close_group_picker(view_data: &mut ViewData) {
    view_data.picker = GroupPickerUiState::default();
    view_data.focus = Focus::Table;
}

/// "(any)" always leads so the filter can be cleared from any query.
fn group_choices(host_groups: &[String], query: &str) -> Vec<GroupChoice> {
    std::iter::once(GroupChoice::Any)
        .chain(
            host_groups
                .iter()
                .filter(|group| group_matches_query(group, query))
                .cloned()
                .map(GroupChoice::Group),
        )
        .collect()
}

fn group_matches_query(label: &str, query: &str) -> bool {
    let mut needle = query.chars().filter(|ch| !ch.is_whitespace());
    let mut target = needle.next();
    if target.is_none() {
        return true;
    }

    for label_char in label.chars() {
        let Some(needle_char) = target else {
            break;
        };
        if label_char.eq_ignore_ascii_case(&needle_char) {
            target = needle.next();
            if target.is_none() {
                return true;
            }
        }
    }
    false
}

fn selected_row_key(state: &BrowserState, view_data: &ViewData) -> Option<RowKey> {
    state
        .props
        .rows
        .get(view_data.selected_row)
        .map(|row| row.key())
}

/// Dispatches a command and fulfils whatever the resulting events ask of
/// the runtime.
fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: BrowserCommand,
    internal_tx: &Sender<InternalEvent>,
) -> Vec<BrowserEvent> {
    let events = state.dispatch(command);
    for event in &events {
        match event {
            BrowserEvent::RefreshRequested(query) => {
                if let Err(error) = load_page(state, runtime, view_data, query) {
                    tracing::warn!(error = %format!("{error:#}"), ?query, "refresh failed");
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("load failed: {error:#}"),
                    );
                }
            }
            BrowserEvent::DetailOpened(request) => {
                let tasks = match runtime.load_host_tasks(request) {
                    Ok(tasks) => DetailTasks::Loaded(tasks),
                    Err(error) => {
                        tracing::warn!(host = %request.host, error = %format!("{error:#}"), "detail load failed");
                        DetailTasks::Failed(format!("{error:#}"))
                    }
                };
                view_data.detail_tasks.insert(request.key(), tasks);
            }
            BrowserEvent::DetailClosed(key) => {
                view_data.detail_tasks.remove(key);
            }
            BrowserEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            BrowserEvent::TextFilterChanged(_)
            | BrowserEvent::TextFilterCommitted(_)
            | BrowserEvent::CategoryFilterChanged(_)
            | BrowserEvent::StatusCleared => {}
        }
    }
    events
}

fn load_page<R: AppRuntime>(
    state: &mut BrowserState,
    runtime: &mut R,
    view_data: &mut ViewData,
    query: &Query,
) -> Result<()> {
    let page = runtime
        .refresh(state.instance_id(), query)
        .with_context(|| format!("refresh hosts at offset {}", query.offset.unwrap_or(0)))?;
    tracing::debug!(
        offset = query.offset.unwrap_or(0),
        rows = page.rows.len(),
        "page loaded"
    );
    state.apply_page(page);
    view_data.page_offset = query.offset.unwrap_or(0);
    view_data.selected_row = 0;
    Ok(())
}

fn render(frame: &mut ratatui::Frame<'_>, state: &BrowserState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let filter_style = if view_data.focus == Focus::HostFilter {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let filter_bar = Paragraph::new(filter_bar_text(state, view_data)).block(
        Block::default()
            .title(format!("hostdeck · {}", state.instance_id()))
            .borders(Borders::ALL)
            .style(filter_style),
    );
    frame.render_widget(filter_bar, layout[0]);

    render_table(frame, layout[1], state, view_data);

    frame.render_widget(
        Paragraph::new(toolbar_line(state.toolbar(), view_data.page_offset, state)),
        layout[2],
    );

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if view_data.focus == Focus::GroupPicker {
        let area = centered_rect(48, 58, frame.area());
        frame.render_widget(Clear, area);
        let picker = Paragraph::new(render_group_picker_text(state, view_data)).block(
            Block::default()
                .title("host group")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(picker, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn filter_bar_text(state: &BrowserState, view_data: &ViewData) -> String {
    let text = state.filters.text_filter.as_deref().unwrap_or_default();
    let cursor = if view_data.focus == Focus::HostFilter {
        "▏"
    } else {
        ""
    };
    let pending = if state.has_pending_text() {
        " (enter to apply)"
    } else {
        ""
    };
    let group = state
        .filters
        .category_filter
        .as_deref()
        .unwrap_or(ANY_GROUP_LABEL);
    format!("host: {text}{cursor}{pending} | group: {group}")
}

fn toolbar_line(toolbar: PaginationToolbar, offset: u64, state: &BrowserState) -> Line<'static> {
    let mut spans = Vec::new();
    for (nav, key, label) in [
        (PageNav::First, "0", "« first"),
        (PageNav::Prev, "p", "‹ prev"),
        (PageNav::Next, "n", "next ›"),
    ] {
        let style = if toolbar.is_disabled(nav) {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(format!(" {key} {label} "), style));
    }
    spans.push(Span::raw(format!(" {}", page_range_label(offset, state.props.rows.len()))));
    Line::from(spans)
}

fn page_range_label(offset: u64, row_count: usize) -> String {
    if row_count == 0 {
        return "no hosts".to_owned();
    }
    format!("hosts {}-{}", offset + 1, offset + row_count as u64)
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &BrowserState,
    view_data: &ViewData,
) {
    let views = state.table_rows();
    let header = Row::new(["", "host", "group", "duration"].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let mut rows = Vec::new();
    let mut selected_display = None;
    for (index, view) in views.iter().enumerate() {
        let selected = index == view_data.selected_row;
        if selected {
            selected_display = Some(rows.len());
        }
        let style = if selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        rows.push(Row::new(host_row_cells(view)).style(style));
        if view.expanded {
            for cells in detail_row_cells(view_data.detail_tasks.get(&view.key)) {
                rows.push(Row::new(cells).style(Style::default().fg(Color::Gray)));
            }
        }
    }

    let widths = [
        Constraint::Length(2),
        Constraint::Min(16),
        Constraint::Min(12),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state))
                .borders(Borders::ALL),
        );
    let mut table_state = TableState::default().with_selected(selected_display);
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn table_title(state: &BrowserState) -> String {
    let open = state.details.len();
    if open == 0 {
        "hosts".to_owned()
    } else {
        format!("hosts · {open} expanded")
    }
}

fn host_row_cells(view: &TableRowView) -> [String; 4] {
    let mark = if view.expanded {
        EXPANDED_MARK
    } else {
        COLLAPSED_MARK
    };
    [
        mark.to_owned(),
        view.host.clone(),
        view.host_group.clone(),
        view.duration.map(format_duration).unwrap_or_default(),
    ]
}

fn detail_row_cells(tasks: Option<&DetailTasks>) -> Vec<[String; 4]> {
    match tasks {
        None => vec![[String::new(), "  loading…".to_owned(), String::new(), String::new()]],
        Some(DetailTasks::Failed(error)) => vec![[
            String::new(),
            format!("  load failed: {error}"),
            String::new(),
            String::new(),
        ]],
        Some(DetailTasks::Loaded(tasks)) if tasks.is_empty() => vec![[
            String::new(),
            "  (no tasks recorded)".to_owned(),
            String::new(),
            String::new(),
        ]],
        Some(DetailTasks::Loaded(tasks)) => tasks
            .iter()
            .map(|task| {
                let label = match &task.message {
                    Some(message) => format!("  {}: {message}", task.task),
                    None => format!("  {}", task.task),
                };
                [
                    String::new(),
                    label,
                    status_label(task.status).to_owned(),
                    (task.duration_millis != 0)
                        .then(|| format_duration(task.duration_millis))
                        .unwrap_or_default(),
                ]
            })
            .collect(),
    }
}

const fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Ok => "ok",
        TaskStatus::Changed => "changed",
        TaskStatus::Skipped => "skip",
        TaskStatus::Failed => "FAILED",
        TaskStatus::Unreachable => "UNREACH",
    }
}

/// Compact elapsed time: `850ms`, `12.4s`, `3m 05s`, `1h 02m`.
fn format_duration(millis: u64) -> String {
    const SECOND: u64 = 1_000;
    const MINUTE: u64 = 60 * SECOND;
    const HOUR: u64 = 60 * MINUTE;

    if millis < SECOND {
        format!("{millis}ms")
    } else if millis < MINUTE {
        let tenths = millis / 100;
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else if millis < HOUR {
        format!("{}m {:02}s", millis / MINUTE, (millis % MINUTE) / SECOND)
    } else {
        format!("{}h {:02}m", millis / HOUR, (millis % HOUR) / MINUTE)
    }
}

fn render_group_picker_text(state: &BrowserState, view_data: &ViewData) -> String {
    let mut lines = Vec::new();
    lines.push(format!("query: {}", view_data.picker.query));
    lines.push(String::new());

    let choices = group_choices(&state.props.host_groups, &view_data.picker.query);
    let cursor = view_data.picker.cursor.min(choices.len().saturating_sub(1));
    let start = cursor.saturating_sub(PICKER_WINDOW / 2);
    let end = (start + PICKER_WINDOW).min(choices.len());
    for (index, choice) in choices.iter().enumerate().take(end).skip(start) {
        let prefix = if index == cursor { "> " } else { "  " };
        let current = match (choice, &state.filters.category_filter) {
            (GroupChoice::Any, None) => " *",
            (GroupChoice::Group(group), Some(active)) if group == active => " *",
            _ => "",
        };
        lines.push(format!("{prefix}{}{current}", choice.label()));
    }
    if choices.len() == 1 && !view_data.picker.query.is_empty() {
        lines.push("  (no matching groups)".to_owned());
    }

    lines.push(String::new());
    lines.push("type filter | up/down pick | enter apply | esc cancel".to_owned());
    lines.join("\n")
}

fn status_text(state: &BrowserState, view_data: &ViewData) -> String {
    let hints = match view_data.focus {
        Focus::Table => "j/k move | enter detail | x close all | / host | c group | n/p/0 page | ? help | q quit",
        Focus::HostFilter => "type to edit | enter/esc/tab apply",
        Focus::GroupPicker => "enter apply | esc cancel",
    };
    let focus = view_data.focus.label();
    match &state.status_line {
        Some(status) => format!("{focus} | {status} | {hints}"),
        None => format!("{focus} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "table: j/k or up/down move | enter toggle detail | x close all details\n\
filter: / edit host filter | typing, backspace, ctrl+u edit | enter, esc or tab apply\n\
group: c open picker | type to search | up/down pick | enter apply | esc cancel\n\
pages: n next | p prev | 0 first\n\
global: ? help | q quit | ctrl+q quit from anywhere"
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
