//! Sakura Memories: a school romance visual novel written by AI.
//!
//! This crate provides:
//! - The three-heroine roster and the affection tally that picks the ending
//! - A session controller that walks the menu, loading, playing and ending screens
//! - The `Narrator` trait with Gemini and proxy implementations
//! - A headless driver and test doubles
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sakura_core::{GeminiNarrator, Outcome, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let narrator = GeminiNarrator::from_env()?;
//!     let mut session = SessionController::new(Arc::new(narrator));
//!
//!     session.start("Aki").await?;
//!     if let Some(scene) = session.current_scene() {
//!         println!("{}: {}", scene.speaker, scene.dialogue);
//!     }
//!
//!     if let Outcome::Failed(alert) = session.choose_option(0).await? {
//!         eprintln!("{}", alert.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod affection;
pub mod headless;
pub mod narrator;
pub mod roster;
pub mod session;
pub mod story;
pub mod testing;

// Primary public API
pub use affection::{Affection, AffectionDelta};
pub use headless::{HeadlessConfig, HeadlessGame};
pub use narrator::{
    GeminiNarrator, GenerationError, ImageHandle, Narrator, NarratorConfig, ProxyNarrator,
};
pub use roster::{default_roster, Character, CharacterId};
pub use session::{
    Alert, GameState, LoadingStatus, Outcome, SessionConfig, SessionController, SessionError,
    MAX_TURNS,
};
pub use story::{Choice, Ending, EndingCard, Scene, Speaker, StoryHistory};
pub use testing::{MockNarrator, TestHarness};
