//! The narrative and image generation collaborator.
//!
//! The session controller never talks to a model directly; it goes through
//! the [`Narrator`] trait. Two implementations ship here: [`GeminiNarrator`]
//! calls the Gemini API itself, [`ProxyNarrator`] forwards every request to
//! an HTTP endpoint that holds the API key.

mod direct;
pub mod prompts;
mod proxy;

pub use direct::GeminiNarrator;
pub use proxy::ProxyNarrator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::affection::Affection;
use crate::roster::Character;
use crate::story::{Ending, Scene, StoryHistory};

/// Opaque reference to a generated image (a URL or `data:` URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the image is inline data rather than a remote URL.
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inline() {
            // Inline payloads run to hundreds of kilobytes.
            let header = self.0.split(',').next().unwrap_or("data:");
            write!(f, "{header},…")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Which collaborator operation was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InitialScene,
    NextScene,
    Ending,
    Portrait,
    Background,
}

impl Operation {
    /// Action name used on the wire by the proxy protocol.
    pub fn action(self) -> &'static str {
        match self {
            Operation::InitialScene => "generateInitialScene",
            Operation::NextScene => "generateNextScene",
            Operation::Ending => "generateEnding",
            Operation::Portrait => "generateImage",
            Operation::Background => "generateBackgroundImage",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// The single failure kind of every generation call.
///
/// Network trouble, malformed output and service-side errors all collapse
/// into this; callers only ever need to know that generation failed.
#[derive(Debug, Clone, Error)]
#[error("{operation} failed: {message}")]
pub struct GenerationError {
    pub operation: Operation,
    pub message: String,
}

impl GenerationError {
    pub fn new(operation: Operation, cause: impl fmt::Display) -> Self {
        Self {
            operation,
            message: cause.to_string(),
        }
    }
}

/// Generates every scene, ending and image of a playthrough.
///
/// Implementations must tolerate the same call being repeated: the
/// controller never retries on its own, but the player may re-issue a
/// choice after a failure.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// The opening scene introducing the whole cast.
    async fn initial_scene(
        &self,
        player_name: &str,
        characters: &[Character],
    ) -> Result<Scene, GenerationError>;

    /// The next scene, shaped by the current tally and everything so far.
    async fn next_scene(
        &self,
        player_name: &str,
        affection: &Affection,
        history: &StoryHistory,
    ) -> Result<Scene, GenerationError>;

    /// The ending with the character the player grew closest to.
    async fn ending(
        &self,
        player_name: &str,
        final_character: &Character,
        history: &StoryHistory,
    ) -> Result<Ending, GenerationError>;

    /// A 3:4 standing portrait.
    async fn portrait(&self, prompt: &str) -> Result<ImageHandle, GenerationError>;

    /// A 16:9 scene or ending background.
    async fn background(&self, prompt: &str) -> Result<ImageHandle, GenerationError>;
}

/// Generation settings shared by the narrators.
#[derive(Debug, Clone, PartialEq)]
pub struct NarratorConfig {
    /// Text model; `None` uses the client default (gemini-2.5-flash).
    pub model: Option<String>,

    /// Image model; `None` uses the client default (imagen-3.0-generate-002).
    pub image_model: Option<String>,

    /// Language the story is written in.
    pub language: String,

    /// Sampling temperature for scene text.
    pub temperature: Option<f32>,

    /// Output cap for scene text.
    pub max_output_tokens: Option<u32>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            image_model: None,
            language: "Traditional Chinese".to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl NarratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SAKURA_TEXT_MODEL`, `SAKURA_IMAGE_MODEL`
    /// and `SAKURA_LANGUAGE` when they are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(model) = non_empty_env("SAKURA_TEXT_MODEL") {
            config.model = Some(model);
        }
        if let Some(model) = non_empty_env("SAKURA_IMAGE_MODEL") {
            config.image_model = Some(model);
        }
        if let Some(language) = non_empty_env("SAKURA_LANGUAGE") {
            config.language = language;
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_handle_display_truncates_inline() {
        let inline = ImageHandle::new("data:image/jpeg;base64,AAAABBBBCCCC");
        assert!(inline.is_inline());
        assert_eq!(inline.to_string(), "data:image/jpeg;base64,…");

        let remote = ImageHandle::new("https://picsum.photos/600/800");
        assert!(!remote.is_inline());
        assert_eq!(remote.to_string(), "https://picsum.photos/600/800");
    }

    #[test]
    fn test_generation_error_message() {
        let err = GenerationError::new(Operation::NextScene, "timeout");
        assert_eq!(err.to_string(), "generateNextScene failed: timeout");
    }

    #[test]
    fn test_config_builder() {
        let config = NarratorConfig::new()
            .with_model("gemini-2.5-pro")
            .with_language("English")
            .with_temperature(1.0);
        assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.language, "English");
        assert_eq!(config.temperature, Some(1.0));
        assert!(config.image_model.is_none());
    }
}
