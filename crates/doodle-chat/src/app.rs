use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use doodle_sdk::ApiClient;
use ratatui::Frame;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::app_state::{AppController, SharedIdentity, Transition};
use crate::tui::Action;
use crate::ui::chat::ChatView;
use crate::ui::entry::EntryView;

enum Screen {
    Entry(EntryView),
    Chat(ChatView),
}

/// Top-level navigation between the entry and chat screens.
pub struct App {
    api: Arc<ApiClient>,
    identity: SharedIdentity,
    poll_interval: Duration,
    tx: UnboundedSender<Action>,
    screen: Screen,
    /// Bumped every time a chat view is mounted.
    generation: u64,
    should_quit: bool,
}

impl App {
    pub fn new(
        api: Arc<ApiClient>,
        identity: SharedIdentity,
        poll_interval: Duration,
        tx: UnboundedSender<Action>,
    ) -> Self {
        let screen = Screen::Entry(EntryView::new(Arc::clone(&identity)));
        Self {
            api,
            identity,
            poll_interval,
            tx,
            screen,
            generation: 0,
            should_quit: false,
        }
    }

    /// Go straight to the chat (name given on the command line).
    pub fn enter_chat(&mut self) {
        self.generation += 1;
        info!(generation = self.generation, "opening chat");
        self.screen = Screen::Chat(ChatView::start(
            Arc::clone(&self.api),
            Arc::clone(&self.identity),
            self.poll_interval,
            self.generation,
            self.tx.clone(),
        ));
    }

    fn back_to_entry(&mut self) {
        info!(generation = self.generation, "leaving chat");
        self.screen = Screen::Entry(EntryView::new(Arc::clone(&self.identity)));
    }

    pub fn update(&mut self, action: Action) {
        if let Action::Key(key) = &action {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                self.should_quit = true;
                return;
            }
        }

        let transition = match &mut self.screen {
            Screen::Entry(view) => view.update(action),
            Screen::Chat(view) => view.update(action),
        };

        match transition {
            Transition::Stay => {}
            Transition::EnterChat => self.enter_chat(),
            Transition::BackToEntry => self.back_to_entry(),
            Transition::Quit => self.should_quit = true,
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        match &mut self.screen {
            Screen::Entry(view) => view.render(f),
            Screen::Chat(view) => view.render(f),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
