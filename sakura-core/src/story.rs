//! Scenes, choices, endings and the running story transcript.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::affection::AffectionDelta;
use crate::narrator::ImageHandle;
use crate::roster::CharacterId;

/// Who is speaking in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    Character(CharacterId),
    Narrator,
}

impl Speaker {
    pub fn character(self) -> Option<CharacterId> {
        match self {
            Speaker::Character(id) => Some(id),
            Speaker::Narrator => None,
        }
    }
}

impl From<String> for Speaker {
    fn from(s: String) -> Self {
        CharacterId::parse_loose(&s).map_or(Speaker::Narrator, Speaker::Character)
    }
}

impl From<Speaker> for String {
    fn from(speaker: Speaker) -> Self {
        speaker.to_string()
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Character(id) => write!(f, "{id}"),
            Speaker::Narrator => f.write_str("Narrator"),
        }
    }
}

/// A player-facing option and its affection consequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub affection_effect: AffectionDelta,
}

impl Choice {
    pub fn new(text: impl Into<String>, affection_effect: AffectionDelta) -> Self {
        Self {
            text: text.into(),
            affection_effect,
        }
    }
}

/// One generated narrative beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub scene_id: String,
    #[serde(rename = "character")]
    pub speaker: Speaker,
    pub dialogue: String,
    /// Fed to the background painter; never shown to the player.
    #[serde(default)]
    pub background_description: String,
    pub choices: Vec<Choice>,
}

/// The concluding beat of a playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ending {
    pub ending_title: String,
    pub ending_text: String,
    #[serde(default)]
    pub background_image_description: String,
}

/// An ending together with its painted background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndingCard {
    pub ending: Ending,
    pub image: ImageHandle,
    pub character: CharacterId,
}

/// Ordered transcript of generated dialogue and chosen choice text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryHistory(Vec<String>);

impl StoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.0.push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// History as prompt context: `a -> b -> c`.
    pub fn summary(&self) -> String {
        self.0.join(" -> ")
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<String>> for StoryHistory {
    fn from(entries: Vec<String>) -> Self {
        Self(entries)
    }
}
