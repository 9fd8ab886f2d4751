use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::collections::VecDeque;

use crate::actions::Action;
use crate::config::AppConfig;
use crate::store::{RecordEntry, RecordStore};
use crate::timer::{format_elapsed, Phase, SessionTimer, SystemClock, Toggle};

const RUNNING_LABEL: &str = "Running...";
const PAUSED_LABEL: &str = "Paused";

/// Fixed colour palette
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(217, 119, 87),
            dim: Color::Rgb(100, 100, 100),
            success: Color::Rgb(80, 200, 120),
            warning: Color::Rgb(255, 193, 7),
            error: Color::Rgb(220, 53, 69),
        }
    }
}

/// Input mode for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingSubject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Error,
}

/// A modal message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub body: String,
}

/// Main application state
pub struct App {
    pub timer: SessionTimer,
    pub store: RecordStore,
    /// Record texts as last loaded, oldest first
    pub records: Vec<String>,
    pub list_state: ListState,
    /// Subject the next session will be started with
    pub subject: String,
    /// Text input buffer while editing the subject
    pub input_buffer: String,
    pub input_mode: InputMode,
    /// Contents of the elapsed-time display
    pub elapsed_label: String,
    /// Dialogs waiting to be dismissed, front is shown
    pub dialogs: VecDeque<Dialog>,
    pub theme: Theme,
    /// Pending action queue
    pub pending_actions: Vec<Action>,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            SessionTimer::new(Box::new(SystemClock)),
            RecordStore::new(&config.record_file),
        )
    }

    pub fn with_parts(timer: SessionTimer, store: RecordStore) -> Self {
        Self {
            timer,
            store,
            records: Vec::new(),
            list_state: ListState::default(),
            subject: String::new(),
            input_buffer: String::new(),
            input_mode: InputMode::Normal,
            elapsed_label: String::new(),
            dialogs: VecDeque::new(),
            theme: Theme::default(),
            pending_actions: Vec::new(),
        }
    }

    /// Take pending actions (drains the queue)
    pub fn take_pending_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }

    pub fn show_dialog(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.dialogs.push_back(Dialog {
            kind: DialogKind::Info,
            title: title.into(),
            body: body.into(),
        });
    }

    pub fn show_error(&mut self, body: impl Into<String>) {
        self.dialogs.push_back(Dialog {
            kind: DialogKind::Error,
            title: "Error".to_string(),
            body: body.into(),
        });
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => self.handle_key(key),
            Action::Tick(epoch) => {
                if let Some(elapsed) = self.timer.tick(epoch) {
                    self.elapsed_label = format!("Running Time: {}", format_elapsed(elapsed));
                }
                Ok(false)
            }
            Action::Error(msg) => {
                self.show_error(msg);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        if !self.dialogs.is_empty() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.dialogs.pop_front();
            }
            return Ok(false);
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::EditingSubject => self.handle_editing_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('e') | KeyCode::Char('i') => {
                self.input_buffer = self.subject.clone();
                self.input_mode = InputMode::EditingSubject;
            }
            KeyCode::Char('s') => self.start(),
            KeyCode::Char('p') | KeyCode::Char(' ') => self.pause_or_resume(),
            KeyCode::Char('x') => self.stop(),
            KeyCode::Char('j') | KeyCode::Down => self.next_record(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_record(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Enter => {
                self.subject = std::mem::take(&mut self.input_buffer);
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Char(c) if !c.is_control() => self.input_buffer.push(c),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
        Ok(false)
    }

    fn start(&mut self) {
        // Start needs a subject; send the user to the field first.
        if self.subject.is_empty() && self.timer.phase() == Phase::Idle {
            self.input_buffer.clear();
            self.input_mode = InputMode::EditingSubject;
            return;
        }

        match self.timer.start(&self.subject) {
            Ok(epoch) => {
                self.elapsed_label = RUNNING_LABEL.to_string();
                self.pending_actions.push(Action::StartTicker(epoch));
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn pause_or_resume(&mut self) {
        match self.timer.pause_or_resume() {
            Ok(Toggle::Paused) => {
                self.pending_actions.push(Action::CancelTicker);
                self.elapsed_label = PAUSED_LABEL.to_string();
            }
            Ok(Toggle::Resumed(epoch)) => {
                self.elapsed_label = RUNNING_LABEL.to_string();
                self.pending_actions.push(Action::StartTicker(epoch));
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn stop(&mut self) {
        let record = match self.timer.stop() {
            Ok(record) => record,
            Err(e) => {
                self.show_error(e.to_string());
                return;
            }
        };

        self.show_dialog("Timer Stopped", record.summary());
        if let Err(e) = self.store.append(&record) {
            tracing::warn!(error = %e, path = %self.store.path().display(), "record lost");
            self.show_error(e.to_string());
        }
        self.refresh_records();

        self.pending_actions.push(Action::CancelTicker);
        self.elapsed_label.clear();
    }

    /// Reload the record list from the store
    pub fn refresh_records(&mut self) {
        match self.store.load_all() {
            Ok(records) => self.records = records,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.store.path().display(), "record reload failed");
                self.records.clear();
                self.show_error(e.to_string());
            }
        }

        // Keep the newest record in view.
        let last = self.records.len().checked_sub(1);
        self.list_state.select(last);
    }

    fn next_record(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.records.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous_record(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Subject
                Constraint::Length(3), // Controls
                Constraint::Length(3), // Elapsed time
                Constraint::Min(0),    // Records
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_subject(frame, chunks[1]);
        self.render_controls(frame, chunks[2]);
        self.render_elapsed(frame, chunks[3]);
        self.render_records(frame, chunks[4]);
        self.render_footer(frame, chunks[5]);

        if let Some(dialog) = self.dialogs.front() {
            self.render_dialog(frame, dialog);
        }
    }

    fn bordered(&self, title: &str, color: Color) -> Block<'static> {
        Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                " Session Timer ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("│ {}", self.store.path().display()),
                Style::default().fg(self.theme.dim),
            ),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(title, area);
    }

    fn render_subject(&self, frame: &mut Frame, area: Rect) {
        let line = if self.input_mode == InputMode::EditingSubject {
            Line::from(Span::styled(
                format!("▶ {}_", self.input_buffer),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        } else if self.subject.is_empty() {
            Line::from(Span::styled(
                "Enter Subject (press 'e')",
                Style::default().fg(self.theme.dim),
            ))
        } else {
            Line::from(Span::styled(&self.subject, Style::default().fg(self.theme.fg)))
        };

        let border = if self.input_mode == InputMode::EditingSubject {
            self.theme.accent
        } else {
            self.theme.dim
        };
        frame.render_widget(Paragraph::new(line).block(self.bordered("Subject", border)), area);
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect) {
        let phase = self.timer.phase();
        let pause_label = if phase == Phase::Paused {
            "[p] Resume Timer"
        } else {
            "[p] Pause Timer"
        };

        let line = Line::from(vec![
            self.control("[s] Start Timer", phase == Phase::Idle && !self.subject.is_empty()),
            Span::raw("   "),
            self.control(pause_label, phase != Phase::Idle),
            Span::raw("   "),
            self.control("[x] Stop Timer", phase != Phase::Idle),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(self.bordered("Controls", self.theme.dim)),
            area,
        );
    }

    fn control(&self, label: &'static str, enabled: bool) -> Span<'static> {
        let style = if enabled {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.dim)
        };
        Span::styled(label, style)
    }

    fn render_elapsed(&self, frame: &mut Frame, area: Rect) {
        let color = match self.timer.phase() {
            Phase::Running => self.theme.success,
            Phase::Paused => self.theme.warning,
            Phase::Idle => self.theme.fg,
        };
        let title = match self.timer.state().session() {
            Some(session) => format!("Elapsed │ {}", session.subject),
            None => "Elapsed".to_string(),
        };
        let elapsed = Paragraph::new(Line::from(Span::styled(
            self.elapsed_label.as_str(),
            Style::default().fg(color),
        )))
        .block(self.bordered(&title, self.theme.dim));
        frame.render_widget(elapsed, area);
    }

    fn render_records(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = if self.records.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "  No records yet.",
                Style::default().fg(self.theme.dim),
            )))]
        } else {
            self.records
                .iter()
                .map(|text| ListItem::new(self.record_text(text)))
                .collect()
        };

        let list = List::new(items)
            .block(self.bordered("Record", self.theme.dim))
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(50, 50, 50))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn record_text(&self, text: &str) -> Text<'static> {
        let dim = Style::default().fg(self.theme.dim);
        let mut lines = match RecordEntry::parse(text) {
            Some(entry) => vec![
                Line::from(vec![
                    Span::styled("Subject: ", dim),
                    Span::styled(
                        entry.subject,
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Start Time: ", dim),
                    Span::styled(entry.start_time, Style::default().fg(self.theme.fg)),
                ]),
                Line::from(vec![
                    Span::styled("Time spent: ", dim),
                    Span::styled(entry.time_spent, Style::default().fg(self.theme.success)),
                ]),
            ],
            None => text
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(self.theme.fg))))
                .collect(),
        };
        lines.push(Line::from(""));
        Text::from(lines)
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help_text = match self.input_mode {
            InputMode::EditingSubject => " Enter: Confirm │ Esc: Cancel ",
            InputMode::Normal if !self.dialogs.is_empty() => " Enter/Esc: Close ",
            InputMode::Normal => {
                " q: Quit │ e: Subject │ s: Start │ p: Pause/Resume │ x: Stop │ j/k: Scroll "
            }
        };

        let footer = Paragraph::new(Line::from(Span::styled(
            help_text,
            Style::default().fg(self.theme.dim),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(footer, area);
    }

    fn render_dialog(&self, frame: &mut Frame, dialog: &Dialog) {
        let area = centered_rect(60, 40, frame.area());

        frame.render_widget(Clear, area);

        let border = if dialog.kind == DialogKind::Error {
            self.theme.error
        } else {
            self.theme.accent
        };
        let block = self.bordered(&dialog.title, border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut text: Vec<Line> = vec![Line::from("")];
        text.extend(dialog.body.lines().map(|l| {
            Line::from(Span::styled(l.to_string(), Style::default().fg(self.theme.fg)))
        }));
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "Press Enter to close",
            Style::default().fg(self.theme.dim),
        )));

        let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
