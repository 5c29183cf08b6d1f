use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use doodle_sdk::{
    Alignment, ApiClient, ChatSession, ErrorOrigin, PollTimer, Request, SessionPhase,
    TranscriptEntry,
};
use ratatui::{
    layout::{Alignment as TextAlign, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::{centered_rect, to_u16, wrap};
use crate::app_state::{AppController, SharedIdentity, Transition};
use crate::tui::Action;

const MAX_COMPOSE_ROWS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Compose,
    Transcript,
}

/// Transcript, error banner and compose field of one chat session.
///
/// Dropping the view drops its [`PollTimer`], which stops polling.
pub struct ChatView {
    session: ChatSession<ApiClient, SharedIdentity>,
    poller: PollTimer,
    generation: u64,
    tx: UnboundedSender<Action>,
    focus: Focus,
    /// Rows scrolled up from the newest entry.
    scroll_back: u16,
}

impl ChatView {
    /// Mount a session: issue the first fetch and start polling.
    pub fn start(
        api: Arc<ApiClient>,
        identity: SharedIdentity,
        poll_interval: Duration,
        generation: u64,
        tx: UnboundedSender<Action>,
    ) -> Self {
        let poll_tx = tx.clone();
        let poller = PollTimer::start(poll_interval, move || {
            poll_tx.send(Action::Poll { generation }).is_ok()
        });

        let mut view = Self {
            session: ChatSession::new(api, identity),
            poller,
            generation,
            tx,
            focus: Focus::Compose,
            scroll_back: 0,
        };
        let mount = view.session.mount();
        view.spawn(mount);
        view
    }

    #[cfg(test)]
    pub fn session(&self) -> &ChatSession<ApiClient, SharedIdentity> {
        &self.session
    }

    fn spawn(&self, request: Request) {
        let tx = self.tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let event = request.await;
            if tx.send(Action::Session { generation, event }).is_err() {
                debug!("event loop closed, dropping session event");
            }
        });
    }

    fn edit_draft(&mut self, edit: impl FnOnce(&mut String)) {
        let mut draft = self.session.draft().to_string();
        edit(&mut draft);
        self.session.set_draft(&draft);
    }

    fn on_key(&mut self, key: KeyEvent) -> Transition {
        match key.code {
            KeyCode::Esc => return Transition::BackToEntry,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Compose => Focus::Transcript,
                    Focus::Transcript => Focus::Compose,
                };
            }
            KeyCode::PageUp => self.scroll_back = self.scroll_back.saturating_add(10),
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(10),
            _ => match self.focus {
                Focus::Transcript => self.on_transcript_key(key),
                Focus::Compose => self.on_compose_key(key),
            },
        }
        Transition::Stay
    }

    fn on_transcript_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_back = self.scroll_back.saturating_add(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_back = self.scroll_back.saturating_sub(1);
            }
            KeyCode::End => self.scroll_back = 0,
            _ => {}
        }
    }

    fn on_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter if key.modifiers.is_empty() => {
                if let Some(request) = self.session.submit() {
                    self.spawn(request);
                }
            }
            KeyCode::Enter => self.edit_draft(|d| d.push('\n')),
            KeyCode::Backspace => self.edit_draft(|d| {
                d.pop();
            }),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.edit_draft(|d| d.push(c));
            }
            _ => {}
        }
    }

    fn render_loading(f: &mut Frame) {
        let area = centered_rect(40, 20, f.area());
        let loading = Paragraph::new("Loading messages...")
            .alignment(TextAlign::Center)
            .block(Block::default().borders(Borders::ALL).title(" Doodle Chat "));
        f.render_widget(loading, area);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let (label, color) = match self.session.phase() {
            SessionPhase::Loading => ("loading", Color::Yellow),
            SessionPhase::Sending => ("sending", Color::LightBlue),
            SessionPhase::Idle => ("connected", Color::Green),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::raw("Signed in as "),
            Span::styled(
                self.session.author().trim().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(label, Style::default().fg(color)),
            Span::styled(
                format!("  refresh every {}", poll_label(self.poller.period())),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Doodle Chat "));
        f.render_widget(header, area);
    }

    fn render_banner(&self, f: &mut Frame, area: Rect) {
        let Some(banner) = self.session.banner() else {
            return;
        };
        let title = match banner.origin {
            ErrorOrigin::Fetch => " Could not load messages ",
            ErrorOrigin::Send => " Message not sent ",
        };
        let widget = Paragraph::new(banner.message.as_str())
            .style(Style::default().fg(Color::White).bg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(widget, area);
    }

    fn render_transcript(&mut self, f: &mut Frame, area: Rect) {
        let border_style = if self.focus == Focus::Transcript {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("Messages");

        if self.session.messages().is_empty() {
            let empty = Paragraph::new("No messages yet. Say hello!")
                .alignment(TextAlign::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let width = usize::from(area.width.saturating_sub(2));
        let rows = self.session.transcript(Utc::now(), &Local);
        let lines = transcript_lines(&rows, width);

        let visible = area.height.saturating_sub(2);
        let max_back = to_u16(lines.len()).saturating_sub(visible);
        self.scroll_back = self.scroll_back.min(max_back);
        let offset = max_back - self.scroll_back;

        let transcript = Paragraph::new(lines).block(block).scroll((offset, 0));
        f.render_widget(transcript, area);
    }

    fn render_compose(&self, f: &mut Frame, area: Rect) {
        let width = usize::from(area.width.saturating_sub(2));
        let rows = wrap(self.session.draft(), width.max(1));

        let (title, border_style) = match (self.focus, self.session.is_sending()) {
            (_, true) => (" Sending... ", Style::default().fg(Color::LightBlue)),
            (Focus::Compose, false) => (" Message ", Style::default().fg(Color::Yellow)),
            (Focus::Transcript, false) => (" Message ", Style::default()),
        };
        let compose = Paragraph::new(rows.iter().map(|r| Line::from(r.as_str())).collect::<Vec<_>>())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            );
        f.render_widget(compose, area);

        if self.focus == Focus::Compose {
            let last = rows.len().saturating_sub(1);
            let x = area.x + 1 + to_u16(rows.last().map_or(0, |r| r.chars().count()));
            let y = area.y + 1 + to_u16(last);
            f.set_cursor_position((
                x.min(area.right().saturating_sub(2)),
                y.min(area.bottom().saturating_sub(2)),
            ));
        }
    }
}

/// Poll period for the header: whole seconds, milliseconds below one second.
fn poll_label(period: Duration) -> String {
    if period < Duration::from_secs(1) {
        format!("{}ms", period.as_millis())
    } else if period.subsec_millis() == 0 {
        format!("{}s", period.as_secs())
    } else {
        format!("{:.1}s", period.as_secs_f64())
    }
}

/// Render-ready lines: label, wrapped body and time for each message.
fn transcript_lines(rows: &[TranscriptEntry<'_>], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for row in rows {
        let (align, body_style) = match row.alignment {
            Alignment::Right => (TextAlign::Right, Style::default().fg(Color::Green)),
            Alignment::Left => (TextAlign::Left, Style::default()),
        };

        if let Some(author) = row.author_label {
            lines.push(
                Line::from(Span::styled(
                    author.to_string(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(align),
            );
        }
        for chunk in wrap(row.text, width) {
            lines.push(Line::from(Span::styled(chunk, body_style)).alignment(align));
        }
        lines.push(
            Line::from(Span::styled(
                row.time_label.clone(),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(align),
        );
        lines.push(Line::default());
    }
    lines
}

impl AppController for ChatView {
    fn update(&mut self, action: Action) -> Transition {
        match action {
            Action::Key(key) => return self.on_key(key),
            Action::Poll { generation } if generation == self.generation => {
                let request = self.session.refresh();
                self.spawn(request);
            }
            Action::Session { generation, event } if generation == self.generation => {
                let reaction = self.session.apply(event);
                if let Some(request) = reaction.follow_up {
                    self.spawn(request);
                }
                if reaction.scroll_to_latest {
                    self.scroll_back = 0;
                }
                if reaction.focus_input {
                    self.focus = Focus::Compose;
                }
            }
            Action::Poll { generation } | Action::Session { generation, .. } => {
                debug!(generation, current = self.generation, "event from a closed chat view");
            }
            Action::Tick | Action::Resize(..) => {}
        }
        Transition::Stay
    }

    fn render(&mut self, f: &mut Frame) {
        if self.session.is_loading() {
            Self::render_loading(f);
            return;
        }

        let width = usize::from(f.area().width.saturating_sub(2)).max(1);
        let compose_rows = wrap(self.session.draft(), width).len().clamp(1, MAX_COMPOSE_ROWS);
        let banner_height = if self.session.banner().is_some() { 3 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(banner_height),
                Constraint::Min(3),
                Constraint::Length(to_u16(compose_rows) + 2),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_banner(f, chunks[1]);
        self.render_transcript(f, chunks[2]);
        self.render_compose(f, chunks[3]);

        let help = Paragraph::new(
            "Enter send  Alt+Enter newline  Tab focus  PgUp/PgDn scroll  Esc change name  Ctrl+C quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[4]);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use doodle_sdk::models::{Message, MessageId};
    use doodle_sdk::{ClientConfig, MemoryIdentityStore, SessionEvent};
    use tokio::sync::mpsc;

    use super::*;

    async fn dead_api() -> Arc<ApiClient> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let config = ClientConfig::default().with_base_url(format!("http://{addr}/api/v1"));
        Arc::new(ApiClient::new(&config).unwrap())
    }

    fn hello() -> Message {
        Message {
            id: MessageId::from("1"),
            author: "Bob".into(),
            text: "hello".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 5, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn unreachable_service_shows_banner() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let identity: SharedIdentity = Arc::new(MemoryIdentityStore::with_author("Alice"));
        let mut view = ChatView::start(dead_api().await, identity, Duration::from_secs(30), 1, tx);

        let action = rx.recv().await.unwrap();
        assert!(matches!(action, Action::Session { generation: 1, .. }));
        view.update(action);

        assert!(!view.session().is_loading());
        assert_eq!(
            view.session().error(),
            Some(doodle_sdk::error::UNREACHABLE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn events_from_an_older_view_are_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let identity: SharedIdentity = Arc::new(MemoryIdentityStore::with_author("Alice"));
        let mut view = ChatView::start(dead_api().await, identity, Duration::from_secs(30), 2, tx);

        view.update(Action::Session {
            generation: 1,
            event: SessionEvent::Listed {
                seq: 1,
                result: Ok(vec![hello()]),
            },
        });
        assert!(view.session().is_loading());
        assert!(view.session().messages().is_empty());
    }

    #[tokio::test]
    async fn escape_leaves_the_chat() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let identity: SharedIdentity = Arc::new(MemoryIdentityStore::with_author("Alice"));
        let mut view = ChatView::start(dead_api().await, identity, Duration::from_secs(30), 1, tx);

        let esc = Action::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(view.update(esc), Transition::BackToEntry);
    }

    #[test]
    fn poll_label_keeps_sub_second_intervals_readable() {
        assert_eq!(poll_label(Duration::from_millis(500)), "500ms");
        assert_eq!(poll_label(Duration::from_secs(30)), "30s");
        assert_eq!(poll_label(Duration::from_millis(1500)), "1.5s");
    }

    #[test]
    fn own_lines_are_right_aligned_without_label() {
        let id = MessageId::from("1");
        let rows = [
            TranscriptEntry {
                id: &id,
                alignment: Alignment::Left,
                own: false,
                author_label: Some("Bob"),
                text: "hey",
                time_label: "09:05".into(),
            },
            TranscriptEntry {
                id: &id,
                alignment: Alignment::Right,
                own: true,
                author_label: None,
                text: "hi",
                time_label: "09:06".into(),
            },
        ];
        let lines = transcript_lines(&rows, 40);

        // Bob: label, body, time, spacer. Own: body, time, spacer.
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0].alignment, Some(TextAlign::Left));
        assert_eq!(lines[4].alignment, Some(TextAlign::Right));
        assert_eq!(lines[4].spans[0].content, "hi");
    }
}
