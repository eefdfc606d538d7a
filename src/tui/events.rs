//! Event handling for the TUI.

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// Key press.
    Key(KeyEvent),
    /// Tick event for periodic redraws.
    Tick,
    /// Resize event.
    Resize(u16, u16),
}

/// Event handler that forwards terminal input over a channel.
pub struct EventHandler {
    _tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        // crossterm polling blocks, keep it off the async workers
        tokio::task::spawn_blocking(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    // Release/repeat events show up on some platforms
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    _ => continue,
                }
            } else {
                Event::Tick
            };

            if event_tx.send(event).is_err() {
                break;
            }
        });

        Self { _tx: tx, rx }
    }

    /// Receive the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Check if a key event matches a specific key code.
pub fn is_key(event: &KeyEvent, code: KeyCode) -> bool {
    event.code == code && (event.modifiers == KeyModifiers::NONE || event.modifiers == KeyModifiers::SHIFT)
}

/// Check if a key event is Ctrl+C or `q`.
pub fn is_quit(event: &KeyEvent) -> bool {
    event.code == KeyCode::Char('c') && event.modifiers == KeyModifiers::CONTROL
        || event.code == KeyCode::Char('q')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_is_key_ignores_control_chords() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert!(!is_key(&key, KeyCode::Char('a')));
        assert!(is_key(
            &KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE),
            KeyCode::Char('a')
        ));
    }
}
