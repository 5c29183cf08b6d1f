use crossterm::event::{KeyCode, KeyModifiers};
use doodle_sdk::EntryForm;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{centered_rect, to_u16};
use crate::app_state::{AppController, SharedIdentity, Transition};
use crate::tui::Action;

/// Name prompt shown before the chat.
pub struct EntryView {
    form: EntryForm<SharedIdentity>,
}

impl EntryView {
    pub fn new(identity: SharedIdentity) -> Self {
        Self {
            form: EntryForm::new(identity),
        }
    }

    pub fn name(&self) -> &str {
        self.form.name()
    }
}

impl AppController for EntryView {
    fn update(&mut self, action: Action) -> Transition {
        let Action::Key(key) = action else {
            return Transition::Stay;
        };

        match key.code {
            KeyCode::Enter => {
                if self.form.can_proceed() {
                    Transition::EnterChat
                } else {
                    Transition::Stay
                }
            }
            KeyCode::Esc => Transition::Quit,
            KeyCode::Backspace => {
                let mut name = self.form.name().to_string();
                name.pop();
                self.form.set_name(&name);
                Transition::Stay
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let name = format!("{}{c}", self.form.name());
                self.form.set_name(&name);
                Transition::Stay
            }
            _ => Transition::Stay,
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let area = centered_rect(50, 40, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Doodle Chat ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        f.render_widget(Paragraph::new("What should we call you?"), rows[0]);

        let input = Paragraph::new(self.form.name())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Name"));
        f.render_widget(input, rows[1]);
        let cursor_x = rows[1].x + 1 + to_u16(self.form.name().chars().count());
        f.set_cursor_position((cursor_x.min(rows[1].right().saturating_sub(2)), rows[1].y + 1));

        let hint_style = if self.form.can_proceed() {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let hint = Line::from(vec![
            Span::styled("Enter", hint_style),
            Span::raw(" join  "),
            Span::styled("Esc", Style::default().fg(Color::DarkGray)),
            Span::raw(" quit"),
        ]);
        f.render_widget(Paragraph::new(hint), rows[3]);
    }
}
