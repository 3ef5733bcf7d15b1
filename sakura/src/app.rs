//! Main application state and logic

use sakura_core::{Alert, GameState, Outcome, SessionController, SessionError};

use crate::ui::theme::GameTheme;
use crate::ui::Overlay;

/// Longest player name accepted by the name field
const MAX_NAME_CHARS: usize = 24;

/// A player action that needs the narrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Start(String),
    Choose(usize),
}

/// Main application state
pub struct App {
    pub session: SessionController,

    // UI state
    pub theme: GameTheme,
    overlay: Option<Overlay>,
    alert: Option<Alert>,

    // Name entry on the menu screen
    name_input: String,
    cursor_position: usize,

    // Choice highlighted on the playing screen
    pub selected_choice: usize,

    // Status
    status_message: Option<String>,

    // Animation
    pub animation_frame: u8,
}

impl App {
    pub fn new(session: SessionController) -> Self {
        Self {
            session,
            theme: GameTheme::default(),
            overlay: None,
            alert: None,
            name_input: String::new(),
            cursor_position: 0,
            selected_choice: 0,
            status_message: None,
            animation_frame: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.session.state()
    }

    // ========================================================================
    // Name input
    // ========================================================================

    pub fn name_input(&self) -> &str {
        &self.name_input
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Insert a character at the cursor
    pub fn enter_char(&mut self, c: char) {
        if self.name_input.chars().count() >= MAX_NAME_CHARS {
            return;
        }
        let byte_index = self.byte_index();
        self.name_input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor
    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let byte_index = self.byte_index();
        self.name_input.remove(byte_index);
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.name_input.chars().count());
    }

    fn byte_index(&self) -> usize {
        self.name_input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.name_input.len())
    }

    /// Take the typed name for a new game, if there is one
    pub fn submit_name(&mut self) -> Option<PendingAction> {
        let name = self.name_input.trim();
        if name.is_empty() {
            self.set_status("Please enter your name first");
            return None;
        }
        Some(PendingAction::Start(name.to_string()))
    }

    // ========================================================================
    // Choices
    // ========================================================================

    pub fn choice_count(&self) -> usize {
        self.session
            .current_scene()
            .map(|s| s.choices.len())
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let count = self.choice_count();
        if count > 0 {
            self.selected_choice = (self.selected_choice + 1) % count;
        }
    }

    pub fn select_previous(&mut self) {
        let count = self.choice_count();
        if count > 0 {
            self.selected_choice = (self.selected_choice + count - 1) % count;
        }
    }

    /// Pick a choice by its zero-based index
    pub fn choose(&mut self, index: usize) -> Option<PendingAction> {
        if index < self.choice_count() {
            self.selected_choice = index;
            Some(PendingAction::Choose(index))
        } else {
            None
        }
    }

    /// Back to the title screen, keeping the typed name
    pub fn restart(&mut self) {
        self.session.reset();
        self.selected_choice = 0;
        self.overlay = None;
        self.clear_status();
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Run an action against the session
    pub async fn perform(&mut self, action: PendingAction) -> Result<Outcome, SessionError> {
        tracing::debug!(?action, "performing action");
        match action {
            PendingAction::Start(name) => self.session.start(&name).await,
            PendingAction::Choose(index) => self.session.choose_option(index).await,
        }
    }

    /// Apply the result of a finished action to the UI
    pub fn finish(&mut self, result: Result<Outcome, SessionError>) {
        self.clear_status();
        match result {
            Ok(Outcome::Failed(alert)) => {
                tracing::warn!(cause = %alert.cause, "showing alert");
                self.alert = Some(alert);
            }
            Ok(Outcome::Started) | Ok(Outcome::Advanced) => {
                self.selected_choice = 0;
            }
            Ok(Outcome::Ended) => {}
            Err(e) => {
                tracing::error!(error = %e, "rejected action");
                self.set_status(e.to_string());
            }
        }
    }

    // ========================================================================
    // Overlays and alerts
    // ========================================================================

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn toggle_overlay(&mut self, overlay: Overlay) {
        if self.overlay.as_ref() == Some(&overlay) {
            self.overlay = None;
        } else {
            self.overlay = Some(overlay);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Advance animations
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sakura_core::MockNarrator;
    use std::sync::Arc;

    fn app() -> App {
        App::new(SessionController::new(Arc::new(MockNarrator::new())))
    }

    #[test]
    fn test_name_editing_is_char_based() {
        let mut app = app();
        for c in "春子".chars() {
            app.enter_char(c);
        }
        app.cursor_left();
        app.enter_char('x');
        assert_eq!(app.name_input(), "春x子");

        app.cursor_right();
        app.delete_char();
        assert_eq!(app.name_input(), "春x");
    }

    #[test]
    fn test_blank_name_not_submitted() {
        let mut app = app();
        app.enter_char(' ');
        assert_eq!(app.submit_name(), None);
        assert!(app.status_message().is_some());
    }

    #[test]
    fn test_name_is_capped() {
        let mut app = app();
        for _ in 0..40 {
            app.enter_char('a');
        }
        assert_eq!(app.name_input().chars().count(), MAX_NAME_CHARS);
    }

    #[tokio::test]
    async fn test_start_and_cycle_choices() {
        let mut app = app();
        let result = app.perform(PendingAction::Start("Aki".to_string())).await;
        app.finish(result);
        assert_eq!(app.state(), GameState::Playing);

        app.select_previous();
        assert_eq!(app.selected_choice, 2);
        app.select_next();
        assert_eq!(app.selected_choice, 0);
        assert_eq!(app.choose(5), None);
        assert_eq!(app.choose(1), Some(PendingAction::Choose(1)));
    }

    #[tokio::test]
    async fn test_failure_raises_alert() {
        let narrator = Arc::new(MockNarrator::new());
        narrator.fail_next(sakura_core::narrator::Operation::InitialScene);
        let mut app = App::new(SessionController::new(narrator));

        let result = app.perform(PendingAction::Start("Aki".to_string())).await;
        app.finish(result);

        assert_eq!(app.state(), GameState::Menu);
        assert_eq!(app.alert().map(|a| a.reverted_to), Some(GameState::Menu));
        app.dismiss_alert();
        assert!(app.alert().is_none());
    }
}
