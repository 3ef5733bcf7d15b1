//! Event handling for the Sakura TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use sakura_core::GameState;

use crate::app::{App, PendingAction};
use crate::ui::Overlay;

/// Result of handling an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    Action(PendingAction),
}

impl EventResult {
    fn from_action(action: Option<PendingAction>) -> Self {
        action.map_or(EventResult::NeedsRedraw, EventResult::Action)
    }
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    // Alerts block everything until dismissed
    if app.alert().is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                app.dismiss_alert();
                EventResult::NeedsRedraw
            }
            _ => EventResult::Continue,
        };
    }

    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match app.state() {
        GameState::Menu => handle_menu_key(app, key),
        GameState::Playing => handle_playing_key(app, key),
        GameState::Ending => handle_ending_key(app, key),
        // Input is gated while the narrator works
        GameState::Loading => EventResult::Continue,
    }
}

/// Handle keys while an overlay is open
fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Char('h') => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle keys on the title screen (name entry)
fn handle_menu_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter => EventResult::from_action(app.submit_name()),
        KeyCode::Esc => EventResult::Quit,
        KeyCode::Backspace => {
            app.delete_char();
            EventResult::NeedsRedraw
        }
        KeyCode::Left => {
            app.cursor_left();
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cursor_right();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.enter_char(c);
            app.clear_status();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle keys while a scene is showing
fn handle_playing_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => {
            app.select_previous();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => EventResult::from_action(app.choose(app.selected_choice)),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            EventResult::from_action(app.choose(index))
        }
        KeyCode::Char('h') => {
            app.toggle_overlay(Overlay::History);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_overlay(Overlay::Help);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('q') => EventResult::Quit,
        _ => EventResult::Continue,
    }
}

/// Handle keys on the ending screen
fn handle_ending_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter | KeyCode::Char('r') => {
            app.restart();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('h') => {
            app.toggle_overlay(Overlay::History);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('q') | KeyCode::Esc => EventResult::Quit,
        _ => EventResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sakura_core::{MockNarrator, SessionController};
    use std::sync::Arc;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app() -> App {
        App::new(SessionController::new(Arc::new(MockNarrator::new())))
    }

    #[test]
    fn test_menu_typing_and_submit() {
        let mut app = app();
        for c in "Aki".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.name_input(), "Aki");

        let result = handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(result, EventResult::Action(PendingAction::Start("Aki".to_string())));
    }

    #[test]
    fn test_menu_enter_without_name() {
        let mut app = app();
        let result = handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(result, EventResult::NeedsRedraw);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        let event = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut app, event), EventResult::Quit);
    }

    #[tokio::test]
    async fn test_number_keys_pick_choices() {
        let mut app = app();
        let result = app.perform(PendingAction::Start("Aki".to_string())).await;
        app.finish(result);

        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('2'))),
            EventResult::Action(PendingAction::Choose(1))
        );
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('9'))),
            EventResult::NeedsRedraw
        );
    }

    #[tokio::test]
    async fn test_alert_blocks_input_until_dismissed() {
        let narrator = Arc::new(MockNarrator::new());
        narrator.fail_next(sakura_core::narrator::Operation::InitialScene);
        let mut app = App::new(SessionController::new(narrator));
        let result = app.perform(PendingAction::Start("Aki".to_string())).await;
        app.finish(result);

        assert_eq!(handle_event(&mut app, key(KeyCode::Char('x'))), EventResult::Continue);
        assert_eq!(app.name_input(), "");
        assert_eq!(handle_event(&mut app, key(KeyCode::Enter)), EventResult::NeedsRedraw);
        assert!(app.alert().is_none());
    }
}
