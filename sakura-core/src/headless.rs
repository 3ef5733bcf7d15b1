//! Headless game interface for programmatic use.
//!
//! This module provides a simplified interface for playing without a TUI.
//! It's designed for:
//! - Automated testing with real AI responses
//! - Coding agents playing the game
//! - Script-driven playthroughs
//!
//! # Example
//!
//! ```ignore
//! use sakura_core::headless::{HeadlessConfig, HeadlessGame};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut game = HeadlessGame::with_gemini(HeadlessConfig::from_env("Aki"))?;
//!
//!     let response = game.start().await?;
//!     println!("{}", response.text);
//!
//!     while !game.is_over() {
//!         let response = game.choose(0).await?;
//!         println!("{}", response.text);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use crate::affection::Affection;
use crate::narrator::{GeminiNarrator, Narrator, NarratorConfig};
use crate::session::{GameState, Outcome, SessionConfig, SessionController, SessionError};
use crate::story::EndingCard;

/// Configuration for a headless session.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Player name.
    pub name: String,
    /// Session settings.
    pub session: SessionConfig,
    /// Narrator settings, used by [`HeadlessGame::with_gemini`].
    pub narrator: NarratorConfig,
}

impl HeadlessConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session: SessionConfig::default(),
            narrator: NarratorConfig::default(),
        }
    }

    /// Defaults, with narrator settings read from `SAKURA_*` variables.
    pub fn from_env(name: impl Into<String>) -> Self {
        Self::new(name).with_narrator(NarratorConfig::from_env())
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_narrator(mut self, narrator: NarratorConfig) -> Self {
        self.narrator = narrator;
        self
    }
}

/// A simplified response from the game.
#[derive(Debug, Clone)]
pub struct GameResponse {
    /// Dialogue, ending text, or the alert message after a failure.
    pub text: String,
    /// Who is speaking, if a scene is showing.
    pub speaker: Option<String>,
    /// Choice texts of the current scene.
    pub choices: Vec<String>,
    /// State after the action.
    pub state: GameState,
    /// Turn after the action.
    pub turn: u32,
    /// Tally after the action.
    pub affection: Affection,
    /// Whether the action failed and the session was reverted.
    pub failed: bool,
}

/// An entry in the game transcript.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// Turn the choice was made on.
    pub turn: u32,
    /// Text of the chosen option.
    pub choice: String,
    /// What the game answered.
    pub response: String,
}

/// A headless game that can be controlled programmatically.
///
/// This wraps [`SessionController`] with a simpler interface for automated use.
pub struct HeadlessGame {
    session: SessionController,
    name: String,
    transcript: Vec<TranscriptEntry>,
}

impl HeadlessGame {
    /// Create a game driven by any narrator.
    pub fn new(config: HeadlessConfig, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            session: SessionController::with_config(narrator, config.session),
            name: config.name,
            transcript: Vec::new(),
        }
    }

    /// Create a game that calls the Gemini API directly.
    ///
    /// Requires `GEMINI_API_KEY` (or `API_KEY`) to be set.
    pub fn with_gemini(config: HeadlessConfig) -> Result<Self, gemini::Error> {
        let narrator = GeminiNarrator::from_env()?.with_config(config.narrator.clone());
        Ok(Self::new(config, Arc::new(narrator)))
    }

    /// Start the story.
    pub async fn start(&mut self) -> Result<GameResponse, SessionError> {
        let outcome = self.session.start(&self.name).await?;
        Ok(self.respond(&outcome))
    }

    /// Pick the choice at `index` of the current scene.
    pub async fn choose(&mut self, index: usize) -> Result<GameResponse, SessionError> {
        let turn = self.session.current_turn();
        let choice = self
            .session
            .current_scene()
            .and_then(|s| s.choices.get(index))
            .map(|c| c.text.clone())
            .unwrap_or_default();

        let outcome = self.session.choose_option(index).await?;
        let response = self.respond(&outcome);

        self.transcript.push(TranscriptEntry {
            turn,
            choice,
            response: response.text.clone(),
        });

        Ok(response)
    }

    /// Abandon the current story and start over with the same name.
    pub async fn restart(&mut self) -> Result<GameResponse, SessionError> {
        self.session.reset();
        self.transcript.clear();
        self.start().await
    }

    fn respond(&self, outcome: &Outcome) -> GameResponse {
        let scene = self.session.current_scene();
        let text = match (outcome, self.session.ending()) {
            (Outcome::Failed(alert), _) => alert.message.clone(),
            (Outcome::Ended, Some(card)) => {
                format!("{}\n\n{}", card.ending.ending_title, card.ending.ending_text)
            }
            _ => scene.map(|s| s.dialogue.clone()).unwrap_or_default(),
        };

        GameResponse {
            text,
            speaker: scene
                .filter(|_| self.session.state() == GameState::Playing)
                .map(|s| s.speaker.to_string()),
            choices: self.choices(),
            state: self.session.state(),
            turn: self.session.current_turn(),
            affection: *self.session.affection(),
            failed: outcome.is_failure(),
        }
    }

    // ========================================================================
    // Game State Queries
    // ========================================================================

    pub fn player_name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> GameState {
        self.session.state()
    }

    /// Whether the story has reached its ending.
    pub fn is_over(&self) -> bool {
        self.session.state() == GameState::Ending
    }

    pub fn turn(&self) -> u32 {
        self.session.current_turn()
    }

    pub fn affection(&self) -> Affection {
        *self.session.affection()
    }

    /// Choice texts of the current scene, empty outside `Playing`.
    pub fn choices(&self) -> Vec<String> {
        if self.session.state() != GameState::Playing {
            return Vec::new();
        }
        self.session
            .current_scene()
            .map(|s| s.choices.iter().map(|c| c.text.clone()).collect())
            .unwrap_or_default()
    }

    pub fn ending(&self) -> Option<&EndingCard> {
        self.session.ending()
    }

    /// Get the transcript of all choices made.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn last_response(&self) -> Option<&str> {
        self.transcript.last().map(|e| e.response.as_str())
    }

    /// Get the underlying session for advanced use.
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Get mutable access to the underlying session.
    pub fn session_mut(&mut self) -> &mut SessionController {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrator::Operation;
    use crate::testing::MockNarrator;

    fn game() -> (HeadlessGame, Arc<MockNarrator>) {
        let mock = Arc::new(MockNarrator::new());
        (HeadlessGame::new(HeadlessConfig::new("Aki"), mock.clone()), mock)
    }

    #[test]
    fn test_config_builder() {
        let config = HeadlessConfig::new("Aki")
            .with_session(SessionConfig::new().with_max_turns(3))
            .with_narrator(NarratorConfig::new().with_language("English"));
        assert_eq!(config.name, "Aki");
        assert_eq!(config.session.max_turns, 3);
        assert_eq!(config.narrator.language, "English");
    }

    #[test]
    fn test_only_from_env_reads_environment() {
        std::env::set_var("SAKURA_LANGUAGE", "Esperanto");

        let plain = HeadlessConfig::new("Aki");
        let from_env = HeadlessConfig::from_env("Aki");

        std::env::remove_var("SAKURA_LANGUAGE");

        assert_eq!(plain.narrator, NarratorConfig::default());
        assert_eq!(from_env.narrator.language, "Esperanto");
        assert_eq!(from_env.name, "Aki");
    }

    #[tokio::test]
    async fn test_start_and_choose() {
        let (mut game, _) = game();

        let response = game.start().await.unwrap();
        assert_eq!(response.state, GameState::Playing);
        assert_eq!(response.turn, 1);
        assert_eq!(response.choices.len(), 3);
        assert_eq!(response.speaker.as_deref(), Some("Narrator"));

        let response = game.choose(1).await.unwrap();
        assert_eq!(response.turn, 2);
        assert_eq!(response.affection.haruka, 10);

        let entry = &game.transcript()[0];
        assert_eq!(entry.turn, 1);
        assert_eq!(entry.choice, "Walk with Haruka");
        assert_eq!(game.last_response(), Some(response.text.as_str()));
    }

    #[tokio::test]
    async fn test_plays_to_ending() {
        let (mut game, _) = game();
        game.start().await.unwrap();

        while !game.is_over() {
            game.choose(2).await.unwrap();
        }

        assert_eq!(game.transcript().len(), 7);
        assert_eq!(game.affection().aoi, 70);
        assert!(game.choices().is_empty());
        let card = game.ending().unwrap();
        assert!(card.ending.ending_title.contains("Aoi"));
    }

    #[tokio::test]
    async fn test_failure_reported_in_response() {
        let (mut game, mock) = game();
        game.start().await.unwrap();
        mock.fail_next(Operation::NextScene);

        let response = game.choose(0).await.unwrap();
        assert!(response.failed);
        assert_eq!(response.state, GameState::Playing);
        assert_eq!(response.turn, 1);
        assert!(response.text.contains("try again"));
    }

    #[tokio::test]
    async fn test_restart_clears_transcript() {
        let (mut game, _) = game();
        game.start().await.unwrap();
        game.choose(0).await.unwrap();

        let response = game.restart().await.unwrap();
        assert_eq!(response.turn, 1);
        assert_eq!(response.affection, Affection::new());
        assert!(game.transcript().is_empty());
    }
}
