use std::sync::Arc;

use doodle_sdk::IdentityStore;

use crate::tui::Action;

/// Identity store shared by the entry and chat screens.
pub type SharedIdentity = Arc<dyn IdentityStore>;

/// Where the app goes after a screen handled an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    EnterChat,
    BackToEntry,
    Quit,
}

pub trait AppController {
    fn update(&mut self, action: Action) -> Transition;
    fn render(&mut self, f: &mut ratatui::Frame);
}
