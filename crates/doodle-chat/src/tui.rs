use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use doodle_sdk::SessionEvent;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::debug;

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub fn init() -> io::Result<Tui> {
    execute!(io::stdout(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    Terminal::new(CrosstermBackend::new(io::stdout()))
}

pub fn restore() -> io::Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Everything the event loop reacts to.
///
/// `generation` identifies the chat view that issued a poll or request, so
/// results arriving after the view was left are dropped.
#[derive(Debug)]
pub enum Action {
    Tick,
    Resize(u16, u16),
    Key(event::KeyEvent),
    Poll { generation: u64 },
    Session { generation: u64, event: SessionEvent },
}

pub struct EventHandler {
    sender: mpsc::UnboundedSender<Action>,
    receiver: mpsc::UnboundedReceiver<Action>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        // Tick loop, redraws relative timestamps.
        let tick_sender = sender.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                interval.tick().await;
                if tick_sender.send(Action::Tick).is_err() {
                    break;
                }
            }
        });

        // Input loop, blocking thread.
        let event_sender = sender.clone();
        std::thread::spawn(move || {
            loop {
                let action = match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Action::Key(key),
                    Ok(Event::Resize(w, h)) => Action::Resize(w, h),
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "terminal input closed");
                        break;
                    }
                };
                if event_sender.send(action).is_err() {
                    break;
                }
            }
        });

        Self { sender, receiver }
    }

    pub async fn next(&mut self) -> Option<Action> {
        self.receiver.recv().await
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Action> {
        self.sender.clone()
    }
}
