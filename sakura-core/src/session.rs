//! SessionController - the primary public API for a playthrough.
//!
//! The controller owns every piece of session state (screen, roster,
//! affection tally, turn counter, story history, current scene, ending)
//! and drives the narrator through the four screens:
//!
//! ```text
//! Menu ──start──▶ Loading ──▶ Playing ──choose──▶ Loading ──▶ Playing ... ──▶ Ending
//!   ▲                │                               │  │                      │
//!   └────failure─────┘         Playing ◀──failure────┘  └──ending failure──▶ Menu
//! ```
//!
//! Generation failures never escape as errors. Each one is logged, turned
//! into an [`Alert`] for the player, and followed by a deterministic state
//! reversion. [`SessionError`] is reserved for calls made in the wrong
//! state or with bad arguments.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::affection::Affection;
use crate::narrator::{GenerationError, ImageHandle, Narrator, Operation};
use crate::roster::{self, default_roster, Character, CharacterId, PLACEHOLDER_PORTRAIT};
use crate::story::{EndingCard, Scene, StoryHistory};

/// Number of accepted choices before the ending triggers.
pub const MAX_TURNS: u32 = 7;

/// Background shown before the first scene is painted.
pub const DEFAULT_BACKGROUND: &str = "https://picsum.photos/1920/1080?blur=5";

const ALERT_START_FAILED: &str =
    "The game failed to start. Check your API key and try again.";
const ALERT_SCENE_FAILED: &str = "Loading the next scene failed. Please try again.";
const ALERT_ENDING_FAILED: &str =
    "Something went wrong while writing your ending. Returning to the main menu.";

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Menu,
    Loading,
    Playing,
    Ending,
}

/// Errors from calling the controller incorrectly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while in the {state:?} state")]
    InvalidState {
        action: &'static str,
        state: GameState,
    },

    #[error("player name must not be empty")]
    EmptyName,

    #[error("no choice at index {index} (scene has {available})")]
    NoSuchChoice { index: usize, available: usize },
}

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Accepted choices before the ending.
    pub max_turns: u32,

    /// Starting cast, in tie-break order.
    pub roster: Vec<Character>,

    /// Portrait used when generation fails.
    pub placeholder_portrait: ImageHandle,

    /// Background used before the first scene.
    pub default_background: ImageHandle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: MAX_TURNS,
            roster: default_roster(),
            placeholder_portrait: ImageHandle::new(PLACEHOLDER_PORTRAIT),
            default_background: ImageHandle::new(DEFAULT_BACKGROUND),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of turns before the ending (at least one).
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns.max(1);
        self
    }

    pub fn with_placeholder_portrait(mut self, image: ImageHandle) -> Self {
        self.placeholder_portrait = image;
        self
    }

    pub fn with_default_background(mut self, image: ImageHandle) -> Self {
        self.default_background = image;
        self
    }
}

/// What the loading screen should show right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingStatus {
    pub message: String,
    pub characters: Vec<Character>,
}

/// A blocking notification for the player after a failed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// What to tell the player.
    pub message: String,
    /// The state the session fell back to.
    pub reverted_to: GameState,
    /// The underlying failure, for logs and debugging.
    pub cause: String,
}

/// Result of a player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The opening scene is ready.
    Started,
    /// A new scene replaced the current one.
    Advanced,
    /// The ending is ready.
    Ended,
    /// Generation failed and the session was reverted.
    Failed(Alert),
}

impl Outcome {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Outcome::Failed(alert) => Some(alert),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Drives one playthrough at a time.
pub struct SessionController {
    narrator: Arc<dyn Narrator>,
    config: SessionConfig,
    progress: watch::Sender<LoadingStatus>,

    state: GameState,
    player_name: String,
    characters: Vec<Character>,
    affection: Affection,
    current_scene: Option<Scene>,
    current_turn: u32,
    history: StoryHistory,
    background: ImageHandle,
    ending: Option<EndingCard>,
    loading_message: String,
}

impl SessionController {
    /// Create a controller with the default configuration.
    pub fn new(narrator: Arc<dyn Narrator>) -> Self {
        Self::with_config(narrator, SessionConfig::default())
    }

    /// Create a controller with a custom configuration.
    pub fn with_config(narrator: Arc<dyn Narrator>, config: SessionConfig) -> Self {
        let (progress, _) = watch::channel(LoadingStatus::default());
        Self {
            narrator,
            characters: config.roster.clone(),
            background: config.default_background.clone(),
            config,
            progress,
            state: GameState::Menu,
            player_name: String::new(),
            affection: Affection::new(),
            current_scene: None,
            current_turn: 0,
            history: StoryHistory::new(),
            ending: None,
            loading_message: String::new(),
        }
    }

    /// Subscribe to loading-screen updates.
    ///
    /// The receiver stays valid across resets, so a front end can render
    /// the loading screen while an action is still awaiting the narrator.
    pub fn subscribe(&self) -> watch::Receiver<LoadingStatus> {
        self.progress.subscribe()
    }

    // ========================================================================
    // Player actions
    // ========================================================================

    /// Begin a new story for `player_name`.
    ///
    /// Paints every portrait (substituting a placeholder for any that fail),
    /// then requests the opening scene and its background.
    pub async fn start(&mut self, player_name: &str) -> Result<Outcome, SessionError> {
        self.require(GameState::Menu, "start")?;

        let name = player_name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        tracing::info!(player = name, "starting new story");
        self.player_name = name.to_string();
        self.state = GameState::Loading;

        self.preload_portraits().await;

        match self.open_story().await {
            Ok(()) => {
                tracing::info!(turn = self.current_turn, "story started");
                Ok(Outcome::Started)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to start game");
                self.reset();
                Ok(Outcome::Failed(Alert {
                    message: ALERT_START_FAILED.to_string(),
                    reverted_to: GameState::Menu,
                    cause: e.to_string(),
                }))
            }
        }
    }

    /// Pick the choice at `index` in the current scene.
    ///
    /// The choice's affection deltas and text are committed before the
    /// narrator is called. If the next scene then fails, the session goes
    /// back to `Playing` on the same turn but keeps that mutation, so
    /// retrying the same choice applies its deltas a second time.
    pub async fn choose_option(&mut self, index: usize) -> Result<Outcome, SessionError> {
        self.require(GameState::Playing, "choose")?;

        let choice = {
            let choices = self
                .current_scene
                .as_ref()
                .map(|s| s.choices.as_slice())
                .unwrap_or_default();
            choices
                .get(index)
                .cloned()
                .ok_or(SessionError::NoSuchChoice {
                    index,
                    available: choices.len(),
                })?
        };

        self.state = GameState::Loading;
        self.affection.apply(&choice.affection_effect);
        self.history.push(choice.text.clone());

        tracing::info!(
            turn = self.current_turn,
            choice = %choice.text,
            affection = ?self.affection,
            "choice accepted"
        );

        if self.current_turn + 1 > self.config.max_turns {
            self.conclude().await
        } else {
            self.advance().await
        }
    }

    /// Throw away the session and return to the menu.
    pub fn reset(&mut self) {
        tracing::debug!(from = ?self.state, "resetting session");
        self.state = GameState::Menu;
        self.player_name.clear();
        self.characters = self.config.roster.clone();
        self.affection = Affection::new();
        self.current_scene = None;
        self.current_turn = 0;
        self.history.clear();
        self.background = self.config.default_background.clone();
        self.ending = None;
        self.loading_message.clear();
        self.progress.send_replace(LoadingStatus::default());
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    async fn preload_portraits(&mut self) {
        self.set_loading("Drawing the characters...");

        for i in 0..self.characters.len() {
            let prompt = self.characters[i].portrait_prompt();
            let image = match self.narrator.portrait(&prompt).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(
                        character = %self.characters[i].name,
                        error = %e,
                        "portrait generation failed; using placeholder"
                    );
                    self.config.placeholder_portrait.clone()
                }
            };
            self.characters[i] = self.characters[i].with_portrait(image);
            self.publish();
        }
    }

    async fn open_story(&mut self) -> Result<(), GenerationError> {
        self.set_loading("Writing the opening of the story...");
        // Portraits stay out of the request body
        let cast: Vec<Character> = self
            .characters
            .iter()
            .map(Character::without_portrait)
            .collect();
        let scene = self
            .narrator
            .initial_scene(&self.player_name, &cast)
            .await
            .and_then(|scene| validate_scene(Operation::InitialScene, scene))?;

        self.set_loading("Painting the background...");
        let background = self
            .narrator
            .background(&scene.background_description)
            .await?;

        self.history = StoryHistory::from(vec![scene.dialogue.clone()]);
        self.current_scene = Some(scene);
        self.background = background;
        self.current_turn = 1;
        self.enter(GameState::Playing);
        Ok(())
    }

    async fn advance(&mut self) -> Result<Outcome, SessionError> {
        match self.fetch_next_scene().await {
            Ok((scene, background)) => {
                self.history.push(scene.dialogue.clone());
                self.current_scene = Some(scene);
                self.background = background;
                self.current_turn += 1;
                self.enter(GameState::Playing);
                tracing::info!(turn = self.current_turn, "scene advanced");
                Ok(Outcome::Advanced)
            }
            Err(e) => {
                tracing::error!(error = %e, turn = self.current_turn, "failed to fetch next scene");
                self.enter(GameState::Playing);
                Ok(Outcome::Failed(Alert {
                    message: ALERT_SCENE_FAILED.to_string(),
                    reverted_to: GameState::Playing,
                    cause: e.to_string(),
                }))
            }
        }
    }

    async fn fetch_next_scene(&mut self) -> Result<(Scene, ImageHandle), GenerationError> {
        self.set_loading("The story continues...");
        let scene = self
            .narrator
            .next_scene(&self.player_name, &self.affection, &self.history)
            .await
            .and_then(|scene| validate_scene(Operation::NextScene, scene))?;

        self.set_loading("Changing the scene...");
        let background = self
            .narrator
            .background(&scene.background_description)
            .await?;

        Ok((scene, background))
    }

    async fn conclude(&mut self) -> Result<Outcome, SessionError> {
        let favorite = self.affection.favorite();
        tracing::info!(character = %favorite, affection = ?self.affection, "story concluding");

        match self.fetch_ending(favorite).await {
            Ok(card) => {
                self.background = card.image.clone();
                self.ending = Some(card);
                self.enter(GameState::Ending);
                Ok(Outcome::Ended)
            }
            Err(e) => {
                // The tally was already mutated above; the reset discards it.
                tracing::error!(error = %e, "failed to generate ending");
                self.reset();
                Ok(Outcome::Failed(Alert {
                    message: ALERT_ENDING_FAILED.to_string(),
                    reverted_to: GameState::Menu,
                    cause: e.to_string(),
                }))
            }
        }
    }

    async fn fetch_ending(&mut self, favorite: CharacterId) -> Result<EndingCard, GenerationError> {
        self.set_loading("Meeting your fate...");
        let character = self.character(favorite).cloned().ok_or_else(|| {
            GenerationError::new(
                Operation::Ending,
                format!("{favorite} is missing from the roster"),
            )
        })?;

        let ending = self
            .narrator
            .ending(&self.player_name, &character, &self.history)
            .await?;

        self.set_loading("Painting the ending...");
        let image = self
            .narrator
            .background(&ending.background_image_description)
            .await?;

        Ok(EndingCard {
            ending,
            image,
            character: favorite,
        })
    }

    fn require(&self, expected: GameState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    fn enter(&mut self, state: GameState) {
        self.state = state;
        self.loading_message.clear();
    }

    fn set_loading(&mut self, message: &str) {
        self.loading_message = message.to_string();
        self.publish();
    }

    fn publish(&self) {
        self.progress.send_replace(LoadingStatus {
            message: self.loading_message.clone(),
            characters: self.characters.clone(),
        });
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// The cast, with portraits once they are painted.
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        roster::find(&self.characters, id)
    }

    pub fn affection(&self) -> &Affection {
        &self.affection
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current_scene.as_ref()
    }

    /// The character speaking in the current scene, if it is a heroine.
    pub fn active_character(&self) -> Option<&Character> {
        self.current_scene
            .as_ref()
            .and_then(|s| s.speaker.character())
            .and_then(|id| self.character(id))
    }

    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn max_turns(&self) -> u32 {
        self.config.max_turns
    }

    /// Turn badge, e.g. `"3/7"`.
    pub fn turn_label(&self) -> String {
        format!("{}/{}", self.current_turn, self.config.max_turns)
    }

    pub fn history(&self) -> &StoryHistory {
        &self.history
    }

    /// The background currently on screen.
    pub fn background(&self) -> &ImageHandle {
        &self.background
    }

    pub fn ending(&self) -> Option<&EndingCard> {
        self.ending.as_ref()
    }

    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Reject scenes the player could not act on.
fn validate_scene(operation: Operation, scene: Scene) -> Result<Scene, GenerationError> {
    if scene.choices.is_empty() {
        return Err(GenerationError::new(
            operation,
            format!("scene '{}' has no choices", scene.scene_id),
        ));
    }
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNarrator;

    #[test]
    fn test_session_config() {
        let config = SessionConfig::new()
            .with_max_turns(3)
            .with_default_background(ImageHandle::new("bg.png"));

        assert_eq!(config.max_turns, 3);
        assert_eq!(config.default_background.as_str(), "bg.png");
        assert_eq!(config.roster.len(), 3);
        assert_eq!(SessionConfig::new().with_max_turns(0).max_turns, 1);
    }

    #[test]
    fn test_new_controller_is_at_menu() {
        let session = SessionController::new(Arc::new(MockNarrator::new()));
        assert_eq!(session.state(), GameState::Menu);
        assert_eq!(session.current_turn(), 0);
        assert_eq!(session.turn_label(), "0/7");
        assert!(session.history().is_empty());
        assert_eq!(session.background().as_str(), DEFAULT_BACKGROUND);
        assert!(session.characters().iter().all(|c| c.image.is_none()));
    }

    #[tokio::test]
    async fn test_start_rejects_blank_name() {
        let mut session = SessionController::new(Arc::new(MockNarrator::new()));
        assert_eq!(session.start("   ").await, Err(SessionError::EmptyName));
        assert_eq!(session.state(), GameState::Menu);
    }

    #[tokio::test]
    async fn test_choose_requires_playing() {
        let mut session = SessionController::new(Arc::new(MockNarrator::new()));
        let err = session.choose_option(0).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidState {
                state: GameState::Menu,
                ..
            }
        ));
    }

    #[test]
    fn test_outcome_alert() {
        let alert = Alert {
            message: "m".to_string(),
            reverted_to: GameState::Menu,
            cause: "c".to_string(),
        };
        assert!(Outcome::Failed(alert.clone()).is_failure());
        assert_eq!(Outcome::Failed(alert.clone()).alert(), Some(&alert));
        assert!(Outcome::Advanced.alert().is_none());
    }
}
