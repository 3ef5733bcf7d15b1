//! The fixed cast of the story.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::narrator::ImageHandle;

/// Image shown when a portrait could not be generated.
pub const PLACEHOLDER_PORTRAIT: &str = "https://picsum.photos/600/800";

/// Appended to every character description when requesting a portrait.
pub const PORTRAIT_OUTFIT: &str = ", wearing a Japanese school uniform";

/// Identity key of one of the three heroines.
///
/// The declaration order is the roster order, which is also the
/// tie-break order when choosing the ending character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterId {
    Yuki,
    Haruka,
    Aoi,
}

impl CharacterId {
    /// All ids in roster order.
    pub const ALL: [CharacterId; 3] = [CharacterId::Yuki, CharacterId::Haruka, CharacterId::Aoi];

    /// The lowercase key used in JSON (`"yuki"`).
    pub fn key(self) -> &'static str {
        match self {
            CharacterId::Yuki => "yuki",
            CharacterId::Haruka => "haruka",
            CharacterId::Aoi => "aoi",
        }
    }

    /// Capitalised name the model uses for the speaker (`"Yuki"`).
    pub fn speaker_name(self) -> &'static str {
        match self {
            CharacterId::Yuki => "Yuki",
            CharacterId::Haruka => "Haruka",
            CharacterId::Aoi => "Aoi",
        }
    }

    /// Match a loosely formatted name such as `"yuki"`, `"Yuki"` or `"Yuki (雪)"`.
    pub fn parse_loose(s: &str) -> Option<Self> {
        let head = s
            .trim()
            .split(|c: char| c.is_whitespace() || c == '(' || c == '（')
            .next()
            .unwrap_or("")
            .to_lowercase();
        CharacterId::ALL.into_iter().find(|id| id.key() == head)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.speaker_name())
    }
}

/// A heroine as shown to the player and described to the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: String,
    /// Portrait handle; `None` until generation finishes.
    pub image: Option<ImageHandle>,
}

impl Character {
    pub fn new(id: CharacterId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            image: None,
        }
    }

    /// Prompt used to draw this character's portrait.
    pub fn portrait_prompt(&self) -> String {
        format!("{}{PORTRAIT_OUTFIT}", self.description)
    }

    /// Copy of this character with the portrait filled in.
    pub fn with_portrait(&self, image: ImageHandle) -> Self {
        Self {
            image: Some(image),
            ..self.clone()
        }
    }

    /// Copy of this character with the portrait dropped.
    pub fn without_portrait(&self) -> Self {
        Self {
            image: None,
            ..self.clone()
        }
    }
}

/// The static starting roster, in roster order, without portraits.
pub fn default_roster() -> Vec<Character> {
    vec![
        Character::new(
            CharacterId::Yuki,
            "Yuki (雪)",
            "Ice-cold beauty and student council president with long silver hair; \
             distant on the surface but gentle inside.",
        ),
        Character::new(
            CharacterId::Haruka,
            "Haruka (陽菜)",
            "Cheerful childhood friend and ace of the athletics club, \
             always bursting with energy.",
        ),
        Character::new(
            CharacterId::Aoi,
            "Aoi (碧)",
            "Quiet library committee member who loves books and peaceful places; \
             a little shy.",
        ),
    ]
}

/// Find a character in a roster by id.
pub fn find(roster: &[Character], id: CharacterId) -> Option<&Character> {
    roster.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_order() {
        let roster = default_roster();
        let ids: Vec<_> = roster.iter().map(|c| c.id).collect();
        assert_eq!(ids, CharacterId::ALL.to_vec());
        assert!(roster.iter().all(|c| c.image.is_none()));
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(CharacterId::parse_loose("Yuki"), Some(CharacterId::Yuki));
        assert_eq!(CharacterId::parse_loose(" haruka "), Some(CharacterId::Haruka));
        assert_eq!(CharacterId::parse_loose("Aoi (碧)"), Some(CharacterId::Aoi));
        assert_eq!(CharacterId::parse_loose("Aoi（碧）"), Some(CharacterId::Aoi));
        assert_eq!(CharacterId::parse_loose("Narrator"), None);
        assert_eq!(CharacterId::parse_loose(""), None);
    }

    #[test]
    fn test_portrait_prompt() {
        let roster = default_roster();
        let prompt = roster[2].portrait_prompt();
        assert!(prompt.starts_with("Quiet library"));
        assert!(prompt.ends_with("wearing a Japanese school uniform"));
    }

    #[test]
    fn test_without_portrait() {
        let painted =
            default_roster()[0].with_portrait(ImageHandle::new("data:image/jpeg;base64,AAAA"));
        let bare = painted.without_portrait();
        assert_eq!(bare.image, None);
        assert_eq!(bare.name, painted.name);
    }

    #[test]
    fn test_serde_key() {
        let json = serde_json::to_string(&CharacterId::Haruka).unwrap();
        assert_eq!(json, "\"haruka\"");
    }
}
