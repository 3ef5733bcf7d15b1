//! Testing utilities for Sakura Memories.
//!
//! This module provides tools for integration testing:
//! - `MockNarrator` for deterministic testing without API calls
//! - `TestHarness` for scripted playthroughs
//! - Assertion helpers for verifying session state

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::affection::{Affection, AffectionDelta};
use crate::narrator::{GenerationError, ImageHandle, Narrator, Operation};
use crate::roster::{Character, CharacterId};
use crate::session::{GameState, Outcome, SessionConfig, SessionController, SessionError};
use crate::story::{Choice, Ending, Scene, Speaker, StoryHistory};

/// A call the mock narrator received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    InitialScene {
        player_name: String,
        characters: Vec<Character>,
    },
    NextScene {
        player_name: String,
        affection: Affection,
        history: StoryHistory,
    },
    Ending {
        player_name: String,
        character: CharacterId,
        history: StoryHistory,
    },
    Portrait {
        prompt: String,
    },
    Background {
        prompt: String,
    },
}

impl MockCall {
    pub fn operation(&self) -> Operation {
        match self {
            MockCall::InitialScene { .. } => Operation::InitialScene,
            MockCall::NextScene { .. } => Operation::NextScene,
            MockCall::Ending { .. } => Operation::Ending,
            MockCall::Portrait { .. } => Operation::Portrait,
            MockCall::Background { .. } => Operation::Background,
        }
    }
}

#[derive(Default)]
struct Script {
    scenes: VecDeque<Scene>,
    endings: VecDeque<Ending>,
    /// Operations that fail on their next call, consumed in order.
    fail_once: Vec<Operation>,
    /// Operations that fail on every call.
    fail_always: Vec<Operation>,
    calls: Vec<MockCall>,
    images: usize,
}

impl Script {
    fn record(&mut self, call: MockCall) -> Result<(), GenerationError> {
        let operation = call.operation();
        self.calls.push(call);

        if self.fail_always.contains(&operation) {
            return Err(GenerationError::new(operation, "scripted failure"));
        }
        if let Some(pos) = self.fail_once.iter().position(|op| *op == operation) {
            self.fail_once.remove(pos);
            return Err(GenerationError::new(operation, "scripted failure"));
        }
        Ok(())
    }

    fn image(&mut self, kind: &str) -> ImageHandle {
        self.images += 1;
        ImageHandle::new(format!("mock://{kind}/{}", self.images))
    }
}

/// A narrator that returns scripted scenes and endings.
///
/// Once the script runs out it falls back to [`MockNarrator::default_scene`]
/// and [`MockNarrator::default_ending`], so a full playthrough never stalls.
/// Images are numbered `mock://portrait/N` and `mock://background/N`.
#[derive(Default)]
pub struct MockNarrator {
    script: Mutex<Script>,
}

impl MockNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scene for the next scene request.
    pub fn queue_scene(&self, scene: Scene) -> &Self {
        self.script().scenes.push_back(scene);
        self
    }

    /// Queue an ending for the next ending request.
    pub fn queue_ending(&self, ending: Ending) -> &Self {
        self.script().endings.push_back(ending);
        self
    }

    /// Make the next call of `operation` fail.
    pub fn fail_next(&self, operation: Operation) -> &Self {
        self.script().fail_once.push(operation);
        self
    }

    /// Make every call of `operation` fail.
    pub fn fail_always(&self, operation: Operation) -> &Self {
        self.script().fail_always.push(operation);
        self
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: Operation) -> &Self {
        let mut script = self.script();
        script.fail_always.retain(|op| *op != operation);
        script.fail_once.retain(|op| *op != operation);
        drop(script);
        self
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.script().calls.clone()
    }

    /// How many times `operation` was called.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// The most recent call of `operation`.
    pub fn last_call(&self, operation: Operation) -> Option<MockCall> {
        self.script()
            .calls
            .iter()
            .rev()
            .find(|c| c.operation() == operation)
            .cloned()
    }

    /// Scene used when the script is empty.
    pub fn default_scene(n: usize) -> Scene {
        Scene {
            scene_id: format!("mock_scene_{n}"),
            speaker: Speaker::Narrator,
            dialogue: format!("Scene {n}. The cherry blossoms drift past the window."),
            background_description: format!("School courtyard, spring, scene {n}"),
            choices: vec![
                Choice::new("Talk to Yuki", AffectionDelta::single(CharacterId::Yuki, 10)),
                Choice::new("Walk with Haruka", AffectionDelta::single(CharacterId::Haruka, 10)),
                Choice::new("Read with Aoi", AffectionDelta::single(CharacterId::Aoi, 10)),
            ],
        }
    }

    /// Ending used when the script is empty.
    pub fn default_ending(character: &Character) -> Ending {
        Ending {
            ending_title: format!("Spring with {}", character.name),
            ending_text: format!("Under the cherry tree, {} smiles.", character.name),
            background_image_description: "Anime couple under a cherry blossom tree".to_string(),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_scene_or_default(script: &mut Script) -> Scene {
        // The current request is already in the call log.
        let n = script
            .calls
            .iter()
            .filter(|c| matches!(c.operation(), Operation::InitialScene | Operation::NextScene))
            .count()
            .saturating_sub(1);
        script
            .scenes
            .pop_front()
            .unwrap_or_else(|| Self::default_scene(n))
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn initial_scene(
        &self,
        player_name: &str,
        characters: &[Character],
    ) -> Result<Scene, GenerationError> {
        let mut script = self.script();
        script.record(MockCall::InitialScene {
            player_name: player_name.to_string(),
            characters: characters.to_vec(),
        })?;
        Ok(Self::next_scene_or_default(&mut script))
    }

    async fn next_scene(
        &self,
        player_name: &str,
        affection: &Affection,
        history: &StoryHistory,
    ) -> Result<Scene, GenerationError> {
        let mut script = self.script();
        script.record(MockCall::NextScene {
            player_name: player_name.to_string(),
            affection: *affection,
            history: history.clone(),
        })?;
        Ok(Self::next_scene_or_default(&mut script))
    }

    async fn ending(
        &self,
        player_name: &str,
        final_character: &Character,
        history: &StoryHistory,
    ) -> Result<Ending, GenerationError> {
        let mut script = self.script();
        script.record(MockCall::Ending {
            player_name: player_name.to_string(),
            character: final_character.id,
            history: history.clone(),
        })?;
        Ok(script
            .endings
            .pop_front()
            .unwrap_or_else(|| Self::default_ending(final_character)))
    }

    async fn portrait(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        let mut script = self.script();
        script.record(MockCall::Portrait {
            prompt: prompt.to_string(),
        })?;
        Ok(script.image("portrait"))
    }

    async fn background(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        let mut script = self.script();
        script.record(MockCall::Background {
            prompt: prompt.to_string(),
        })?;
        Ok(script.image("background"))
    }
}

/// Build a scene whose every choice carries the given deltas.
pub fn scene_with_choices(id: &str, choices: Vec<(&str, AffectionDelta)>) -> Scene {
    Scene {
        scene_id: id.to_string(),
        speaker: Speaker::Narrator,
        dialogue: format!("Dialogue of {id}"),
        background_description: format!("Background of {id}"),
        choices: choices
            .into_iter()
            .map(|(text, delta)| Choice::new(text, delta))
            .collect(),
    }
}

/// Test harness for running scripted playthroughs.
pub struct TestHarness {
    /// The mock narrator, shared with the session.
    pub narrator: Arc<MockNarrator>,
    /// The session under test.
    pub session: SessionController,
}

impl TestHarness {
    /// Create a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a harness with a custom session configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        let narrator = Arc::new(MockNarrator::new());
        let session = SessionController::with_config(narrator.clone(), config);
        Self { narrator, session }
    }

    /// Queue a scene.
    pub fn expect_scene(&mut self, scene: Scene) -> &mut Self {
        self.narrator.queue_scene(scene);
        self
    }

    /// Queue a scene whose single choice applies `delta`.
    pub fn expect_choice(&mut self, text: &str, delta: AffectionDelta) -> &mut Self {
        let n = self.narrator.calls().len();
        self.narrator
            .queue_scene(scene_with_choices(&format!("scripted_{n}"), vec![(text, delta)]));
        self
    }

    /// Queue an ending.
    pub fn expect_ending(&mut self, ending: Ending) -> &mut Self {
        self.narrator.queue_ending(ending);
        self
    }

    pub async fn start(&mut self, name: &str) -> Result<Outcome, SessionError> {
        self.session.start(name).await
    }

    pub async fn choose(&mut self, index: usize) -> Result<Outcome, SessionError> {
        self.session.choose_option(index).await
    }

    /// Pick the first choice `times` times, stopping at the first failure.
    pub async fn choose_first(&mut self, times: usize) -> Result<Vec<Outcome>, SessionError> {
        let mut outcomes = Vec::with_capacity(times);
        for _ in 0..times {
            let outcome = self.choose(0).await?;
            let failed = outcome.is_failure();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }
        Ok(outcomes)
    }

    pub fn state(&self) -> GameState {
        self.session.state()
    }

    pub fn turn(&self) -> u32 {
        self.session.current_turn()
    }

    pub fn affection(&self) -> Affection {
        *self.session.affection()
    }

    pub fn history(&self) -> &[String] {
        self.session.history().entries()
    }

    /// The character the current ending is about.
    pub fn ending_character(&self) -> Option<CharacterId> {
        self.session.ending().map(|card| card.character)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the session is in the given state.
#[track_caller]
pub fn assert_state(harness: &TestHarness, state: GameState) {
    assert_eq!(
        harness.state(),
        state,
        "Expected state {state:?}, got {:?}",
        harness.state()
    );
}

/// Assert the session is on the given turn.
#[track_caller]
pub fn assert_turn(harness: &TestHarness, turn: u32) {
    assert_eq!(
        harness.turn(),
        turn,
        "Expected turn {turn}, got {}",
        harness.turn()
    );
}

/// Assert the affection tally is exactly `(yuki, haruka, aoi)`.
#[track_caller]
pub fn assert_affection(harness: &TestHarness, yuki: i32, haruka: i32, aoi: i32) {
    let actual = harness.affection();
    assert_eq!(
        (actual.yuki, actual.haruka, actual.aoi),
        (yuki, haruka, aoi),
        "Expected affection {{yuki:{yuki}, haruka:{haruka}, aoi:{aoi}}}, got {actual:?}"
    );
}

/// Assert the session sits at the menu with nothing left over.
#[track_caller]
pub fn assert_pristine(harness: &TestHarness) {
    assert_state(harness, GameState::Menu);
    assert_turn(harness, 0);
    assert_affection(harness, 0, 0, 0);
    assert!(
        harness.history().is_empty(),
        "Expected empty history, got {:?}",
        harness.history()
    );
    assert!(harness.session.current_scene().is_none(), "Expected no scene");
    assert!(harness.session.ending().is_none(), "Expected no ending");
}

/// Assert the outcome is a failure that reverted to `state`.
#[track_caller]
pub fn assert_failed_to(outcome: &Outcome, state: GameState) {
    match outcome {
        Outcome::Failed(alert) => assert_eq!(
            alert.reverted_to, state,
            "Expected reversion to {state:?}, got {:?}",
            alert.reverted_to
        ),
        other => panic!("Expected a failed outcome, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockNarrator::new();
        mock.portrait("silver hair").await.unwrap();
        mock.background("rooftop").await.unwrap();

        assert_eq!(mock.call_count(Operation::Portrait), 1);
        assert_eq!(
            mock.last_call(Operation::Background),
            Some(MockCall::Background {
                prompt: "rooftop".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_mock_images_are_numbered() {
        let mock = MockNarrator::new();
        let a = mock.portrait("a").await.unwrap();
        let b = mock.background("b").await.unwrap();
        assert_eq!(a.as_str(), "mock://portrait/1");
        assert_eq!(b.as_str(), "mock://background/2");
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let mock = MockNarrator::new();
        mock.fail_next(Operation::Background);

        assert!(mock.background("x").await.is_err());
        assert!(mock.background("x").await.is_ok());
        assert_eq!(mock.call_count(Operation::Background), 2);
    }

    #[tokio::test]
    async fn test_fail_always_until_recovered() {
        let mock = MockNarrator::new();
        mock.fail_always(Operation::Portrait);
        assert!(mock.portrait("x").await.is_err());
        assert!(mock.portrait("x").await.is_err());

        mock.recover(Operation::Portrait);
        assert!(mock.portrait("x").await.is_ok());
    }

    #[tokio::test]
    async fn test_scripted_scene_then_default() {
        let mock = MockNarrator::new();
        mock.queue_scene(scene_with_choices(
            "opening",
            vec![("Hello", AffectionDelta::none())],
        ));

        let first = mock.initial_scene("Aki", &[]).await.unwrap();
        assert_eq!(first.scene_id, "opening");

        let second = mock
            .next_scene("Aki", &Affection::new(), &StoryHistory::new())
            .await
            .unwrap();
        assert_eq!(second.scene_id, "mock_scene_1");
        assert_eq!(second.choices.len(), 3);
    }

    #[tokio::test]
    async fn test_harness_start() {
        let mut harness = TestHarness::new();
        let outcome = harness.start("Aki").await.unwrap();

        assert_eq!(outcome, Outcome::Started);
        assert_state(&harness, GameState::Playing);
        assert_turn(&harness, 1);
        assert_affection(&harness, 0, 0, 0);
        assert_eq!(harness.history().len(), 1);
    }

    #[tokio::test]
    async fn test_harness_expect_choice() {
        let mut harness = TestHarness::new();
        harness
            .expect_choice("Hi", AffectionDelta::single(CharacterId::Aoi, 5))
            .expect_choice("Bye", AffectionDelta::single(CharacterId::Aoi, -2));

        harness.start("Aki").await.unwrap();
        harness.choose(0).await.unwrap();

        assert_affection(&harness, 0, 0, 5);
        assert_eq!(harness.history(), ["Dialogue of scripted_0", "Hi", "Dialogue of scripted_0"]);
    }

    #[test]
    #[should_panic(expected = "Expected a failed outcome")]
    fn test_assert_failed_to_rejects_success() {
        assert_failed_to(&Outcome::Advanced, GameState::Playing);
    }
}
