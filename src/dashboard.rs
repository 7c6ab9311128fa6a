use crate::{
    block::BlockSink,
    config::Config,
    input::InputEvent,
    logger::CycleLogger,
    poller::Poller,
    presentation::PresentationState,
    snapshot::{ConnectionId, Snapshot},
    view::{build_lines, ViewLine},
};
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::time::Duration;

/// What the cursor was on before a rebuild, so a refresh does not yank
/// the selection somewhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectionKey {
    Group(String),
    Row(ConnectionId),
}

pub struct DashboardState {
    snapshot: Option<Snapshot>,
    pub presentation: PresentationState,
    lines: Vec<ViewLine>,
    selected: usize,
    list_state: ListState,
    pub paused: bool,
    pub show_help: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            presentation: PresentationState::new(),
            lines: Vec::new(),
            selected: 0,
            list_state: ListState::default(),
            paused: false,
            show_help: false,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[ViewLine] {
        &self.lines
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Applies a fresh snapshot: prune presentation state against it,
    /// replace the held snapshot wholesale, rebuild the visible lines.
    /// Presentation state survives the rebuild by construction.
    pub fn update(&mut self, snapshot: Snapshot) {
        self.presentation.prune(&snapshot);
        self.snapshot = Some(snapshot);
        self.rebuild();
    }

    /// Flips the expansion of whatever the cursor is on. Works entirely
    /// from the held snapshot; no refetch.
    pub fn toggle_selected(&mut self) {
        match self.lines.get(self.selected) {
            Some(ViewLine::GroupHeader { name, .. }) => {
                let name = name.clone();
                self.presentation.toggle_group(&name);
            }
            Some(ViewLine::Row { id, .. }) => {
                let id = id.clone();
                self.presentation.toggle_row(&id);
            }
            _ => return,
        }
        self.rebuild();
    }

    /// Emits one block intent for the row under the cursor. The intent
    /// is fire-and-forget: no snapshot or presentation mutation happens
    /// here, success is never assumed, and the outcome goes to the log.
    pub fn request_block(&mut self, sink: &mut dyn BlockSink, logger: &mut CycleLogger) -> bool {
        let Some(ViewLine::Row { pid, .. }) = self.lines.get(self.selected) else {
            return false;
        };
        let pid = pid.clone();

        let outcome = match sink.request_block(&pid) {
            Ok(()) => "dispatched".to_string(),
            Err(e) => format!("error:{e}"),
        };
        logger.log_block_intent(&pid, &sink.describe(), &outcome);
        true
    }

    pub fn next_item(&mut self) {
        if let Some(index) = self.find_selectable(self.selected as i64 + 1, 1) {
            self.select(index);
        }
    }

    pub fn prev_item(&mut self) {
        if let Some(index) = self.find_selectable(self.selected as i64 - 1, -1) {
            self.select(index);
        }
    }

    pub fn first_item(&mut self) {
        if let Some(index) = self.find_selectable(0, 1) {
            self.select(index);
        }
    }

    pub fn last_item(&mut self) {
        if let Some(index) = self.find_selectable(self.lines.len() as i64 - 1, -1) {
            self.select(index);
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.list_state.select(Some(index));
    }

    fn find_selectable(&self, from: i64, step: i64) -> Option<usize> {
        let mut i = from;
        while i >= 0 && (i as usize) < self.lines.len() {
            if self.lines[i as usize].is_selectable() {
                return Some(i as usize);
            }
            i += step;
        }
        None
    }

    fn selection_key(&self) -> Option<SelectionKey> {
        match self.lines.get(self.selected) {
            Some(ViewLine::GroupHeader { name, .. }) => Some(SelectionKey::Group(name.clone())),
            Some(ViewLine::Row { id, .. }) => Some(SelectionKey::Row(id.clone())),
            _ => None,
        }
    }

    fn rebuild(&mut self) {
        let key = self.selection_key();

        self.lines = match &self.snapshot {
            Some(snapshot) => build_lines(snapshot, &self.presentation),
            None => Vec::new(),
        };

        if self.lines.is_empty() {
            self.selected = 0;
            self.list_state.select(None);
            return;
        }

        let restored = key.and_then(|key| {
            self.lines.iter().position(|line| match (&key, line) {
                (SelectionKey::Group(name), ViewLine::GroupHeader { name: n, .. }) => name == n,
                (SelectionKey::Row(id), ViewLine::Row { id: i, .. }) => id == i,
                _ => false,
            })
        });

        let index = restored
            .or_else(|| self.find_selectable(self.selected.min(self.lines.len() - 1) as i64, -1))
            .or_else(|| self.find_selectable(0, 1))
            .unwrap_or(0);
        self.select(index);
    }
}

pub fn run_dashboard(config: Config, log_file: Option<String>) -> Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut state = DashboardState::new();
    let mut poller = Poller::new(
        &config.base_url,
        Duration::from_millis(config.refresh_interval),
    );
    let mut logger = if log_file.is_some() {
        CycleLogger::new(log_file)?
    } else {
        CycleLogger::disabled()
    };
    let mut sink: Box<dyn BlockSink> = match &config.block_endpoint {
        Some(endpoint) => Box::new(crate::block::HttpBlockSink::new(endpoint)),
        None => Box::new(crate::block::LogBlockSink),
    };

    let mut needs_redraw = true;

    loop {
        // Event polling stays well below the refresh interval so keys
        // feel immediate even on slow refresh settings
        let poll_interval = (config.refresh_interval / 10).clamp(50, 100);
        if event::poll(Duration::from_millis(poll_interval))? {
            if let Event::Key(key) = event::read()? {
                match InputEvent::from_key_event(key) {
                    InputEvent::Quit => break,
                    InputEvent::NextItem => {
                        state.next_item();
                        needs_redraw = true;
                    }
                    InputEvent::PrevItem => {
                        state.prev_item();
                        needs_redraw = true;
                    }
                    InputEvent::First => {
                        state.first_item();
                        needs_redraw = true;
                    }
                    InputEvent::Last => {
                        state.last_item();
                        needs_redraw = true;
                    }
                    InputEvent::Toggle => {
                        state.toggle_selected();
                        needs_redraw = true;
                    }
                    InputEvent::Block => {
                        if state.request_block(sink.as_mut(), &mut logger) {
                            needs_redraw = true;
                        }
                    }
                    InputEvent::Pause => {
                        state.paused = !state.paused;
                        needs_redraw = true;
                    }
                    InputEvent::Refresh => {
                        poller.force_due();
                    }
                    InputEvent::Help => {
                        state.show_help = !state.show_help;
                        needs_redraw = true;
                    }
                    InputEvent::Unknown => {}
                }
            }
        }

        if !state.paused && poller.tick_due() {
            match poller.fetch() {
                Ok(Some(snapshot)) => {
                    logger.log_cycle_ok(
                        snapshot.group_count(),
                        snapshot.connection_count(),
                        poller.stats(),
                    );
                    state.update(snapshot);
                    needs_redraw = true;
                }
                Ok(None) => {
                    logger.log_cycle_stale(poller.stats());
                }
                Err(e) => {
                    // The view stays on the last good snapshot; only the
                    // status line changes
                    logger.log_cycle_failure(poller.stats(), &e.to_string());
                    needs_redraw = true;
                }
            }
        }

        if needs_redraw {
            terminal.draw(|f| draw_dashboard(f, &mut state, &poller))?;
            needs_redraw = false;
        }
    }

    Ok(())
}

fn draw_dashboard(f: &mut Frame, state: &mut DashboardState, poller: &Poller) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Connection list
            Constraint::Length(3), // Status line
        ])
        .split(f.area());

    draw_title_bar(f, chunks[0], state, poller);
    draw_connection_list(f, chunks[1], state);
    draw_status_line(f, chunks[2], state, poller);

    if state.show_help {
        draw_help_overlay(f);
    }
}

fn draw_title_bar(f: &mut Frame, area: Rect, state: &DashboardState, poller: &Poller) {
    let mut spans = vec![
        Span::styled(
            "connwatch",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(poller.endpoint_url(), Style::default().fg(Color::Gray)),
    ];
    if state.paused {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "[PAUSED]",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let title = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(title, area);
}

fn draw_connection_list(f: &mut Frame, area: Rect, state: &mut DashboardState) {
    if state.lines().is_empty() {
        let placeholder = if state.snapshot().is_some() {
            "Backend reported no active connections."
        } else {
            "Waiting for the first snapshot..."
        };
        let paragraph = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Connections"));
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = state.lines().iter().map(line_to_item).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Connections"))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(list, area, &mut state.list_state);
}

fn line_to_item(line: &ViewLine) -> ListItem<'static> {
    match line {
        ViewLine::GroupHeader {
            name,
            expanded,
            count,
        } => {
            let marker = if *expanded { "▼" } else { "▶" };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{marker} {name}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({count})"),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        }
        ViewLine::Row {
            expanded,
            label,
            country,
            process,
            destination_ip,
            arrow,
            ..
        } => {
            let marker = if *expanded { "-" } else { "+" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {marker} "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{label:<28}"),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(format!("{country:<4}"), Style::default().fg(Color::Yellow)),
                Span::raw(format!("{process:<16}")),
                Span::styled(
                    format!("{destination_ip} {arrow}"),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        }
        ViewLine::Detail { name, value } => ListItem::new(Line::from(vec![
            Span::styled(
                format!("      {name}: "),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(value.clone(), Style::default().fg(Color::Gray)),
        ])),
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, state: &DashboardState, poller: &Poller) {
    let stats = poller.stats();

    let freshness = match (&stats.last_success, stats.consecutive_failures) {
        (_, n) if n > 0 => Span::styled(
            format!("connection lost ({n} failed)"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        (Some(at), _) => Span::styled(
            format!("updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::Green),
        ),
        (None, _) => Span::styled("no data yet", Style::default().fg(Color::DarkGray)),
    };

    let counts = match state.snapshot() {
        Some(s) => format!(
            "  {} groups / {} connections",
            s.group_count(),
            s.connection_count()
        ),
        None => String::new(),
    };

    let status = Paragraph::new(Line::from(vec![
        freshness,
        Span::styled(counts, Style::default().fg(Color::Gray)),
        Span::raw("    "),
        Span::styled(
            "j/k move  enter toggle  b block  p pause  r refresh  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  j / Down     next group or connection"),
        Line::from("  k / Up       previous group or connection"),
        Line::from("  g / Home     first entry"),
        Line::from("  G / End      last entry"),
        Line::from("  Enter/Space  expand or collapse"),
        Line::from("  b            block the selected connection's process"),
        Line::from("  p            pause/resume polling"),
        Line::from("  r            refresh now"),
        Line::from("  ?            toggle this help"),
        Line::from("  q / Esc      quit"),
    ];

    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockSink;
    use crate::error::Result as ConnwatchResult;
    use crate::snapshot::Snapshot;

    struct RecordingSink {
        intents: Vec<String>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { intents: Vec::new() }
        }
    }

    impl BlockSink for RecordingSink {
        fn request_block(&mut self, pid: &str) -> ConnwatchResult<()> {
            self.intents.push(pid.to_string());
            Ok(())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn two_group_snapshot() -> Snapshot {
        Snapshot::from_json_str(
            r#"{
                "chrome.exe": [
                    {"PID": 1, "Process": "chrome.exe", "Direction": "Outgoing",
                     "Domain": "example.com", "DestinationCountry": "us",
                     "DestinationIP": "93.184.216.34"}
                ],
                "svc": [
                    {"PID": 2, "Process": "svc", "Direction": "Incoming",
                     "DestinationCountry": "", "DestinationIP": "192.168.1.5"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_update_is_idempotent() {
        let snapshot = two_group_snapshot();
        let mut state = DashboardState::new();

        state.update(snapshot.clone());
        let first = state.lines().to_vec();
        state.update(snapshot);
        assert_eq!(state.lines(), &first[..]);
    }

    #[test]
    fn test_toggle_survives_refresh() {
        let mut state = DashboardState::new();
        state.update(two_group_snapshot());

        // Collapse the first group, then apply a fresh equal snapshot
        state.toggle_selected();
        assert!(matches!(
            state.lines()[0],
            ViewLine::GroupHeader { expanded: false, .. }
        ));

        state.update(two_group_snapshot());
        assert!(matches!(
            state.lines()[0],
            ViewLine::GroupHeader { expanded: false, .. }
        ));
    }

    #[test]
    fn test_failed_cycle_leaves_view_untouched() {
        let mut state = DashboardState::new();
        state.update(two_group_snapshot());
        let before = state.lines().to_vec();

        // A cycle whose fetch fails never reaches state.update; the
        // rendered lines stay exactly as they were
        let mut poller = Poller::new("http://127.0.0.1:1", Duration::from_millis(5000));
        assert!(poller.fetch().is_err());
        assert_eq!(state.lines(), &before[..]);
    }

    #[test]
    fn test_block_emits_exactly_one_intent_without_mutation() {
        let mut state = DashboardState::new();
        state.update(two_group_snapshot());

        // Cursor: chrome header -> chrome row -> svc header -> svc row
        state.next_item();
        state.next_item();
        state.next_item();
        let before = state.lines().to_vec();

        let mut sink = RecordingSink::new();
        let mut logger = CycleLogger::disabled();
        assert!(state.request_block(&mut sink, &mut logger));

        assert_eq!(sink.intents, vec!["2".to_string()]);
        assert_eq!(state.lines(), &before[..]);
        assert_eq!(state.presentation.tracked_entries(), 0);
    }

    #[test]
    fn test_block_on_group_header_is_a_no_op() {
        let mut state = DashboardState::new();
        state.update(two_group_snapshot());

        let mut sink = RecordingSink::new();
        let mut logger = CycleLogger::disabled();
        assert!(!state.request_block(&mut sink, &mut logger));
        assert!(sink.intents.is_empty());
    }

    #[test]
    fn test_selection_restored_across_update() {
        let mut state = DashboardState::new();
        state.update(two_group_snapshot());

        // Move to the "svc" group header
        state.next_item();
        state.next_item();
        assert!(matches!(
            state.lines()[state.selected],
            ViewLine::GroupHeader { ref name, .. } if name == "svc"
        ));

        state.update(two_group_snapshot());
        assert!(matches!(
            state.lines()[state.selected],
            ViewLine::GroupHeader { ref name, .. } if name == "svc"
        ));
    }

    #[test]
    fn test_navigation_skips_detail_lines() {
        let mut state = DashboardState::new();
        state.update(two_group_snapshot());

        // Expand the chrome row's detail panel
        state.next_item();
        state.toggle_selected();
        assert!(matches!(
            state.lines()[state.selected],
            ViewLine::Row { expanded: true, .. }
        ));

        // Next stop is the svc group header, not a detail line
        state.next_item();
        assert!(matches!(
            state.lines()[state.selected],
            ViewLine::GroupHeader { ref name, .. } if name == "svc"
        ));
    }

    #[test]
    fn test_empty_state_has_no_selection() {
        let mut state = DashboardState::new();
        assert!(state.lines().is_empty());
        state.next_item();
        state.toggle_selected();

        let empty = Snapshot::from_json_str("{}").unwrap();
        state.update(empty);
        assert!(state.lines().is_empty());
    }
}
