use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;

use crate::app::App;
use crate::ui::TerminalRenderer;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event. Returns true when the screen should be redrawn.
pub fn handle_key_event<B: Backend>(
    app: &mut App,
    renderer: &mut TerminalRenderer<B>,
    key: KeyEvent,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }

    // Ctrl-C always quits, even with the help overlay open
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return false;
    }

    // If help is shown, any key closes it
    if renderer.show_help() {
        renderer.toggle_help();
        return true;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit();
            false
        }
        KeyCode::Char('?') => {
            renderer.toggle_help();
            true
        }
        KeyCode::Char('s') => {
            if app.toggle_simulator().is_none() {
                return false;
            }
            renderer.update_feed(app.feed_status());
            true
        }
        _ => false,
    }
}
