//! Prompt text and response schemas for the story model.

use serde_json::{json, Value};

use crate::affection::Affection;
use crate::roster::Character;
use crate::story::StoryHistory;

/// Style line prepended to every portrait prompt.
pub const PORTRAIT_STYLE: &str = "Full body portrait, beautiful Japanese anime character, \
high-quality digital art, detailed face and eyes, vibrant colors, clean lines. \
Style of a modern visual novel.";

/// Style line prepended to every background prompt.
pub const BACKGROUND_STYLE: &str = "Lush, beautiful anime background art, vibrant colors, \
detailed scenery. Style of a high-budget visual novel.";

/// System instruction for scene generation.
pub fn scene_system(language: &str) -> String {
    format!(
        "You are a creative storyteller for a Japanese anime-style high school romance visual novel. \
         Generate content in {language} and follow the requested JSON schema. \
         The story should be engaging and romantic."
    )
}

/// System instruction for ending generation.
pub fn ending_system(language: &str) -> String {
    format!(
        "You are a creative storyteller for a Japanese anime-style high school romance visual novel. \
         Generate a conclusive and emotional ending in {language} based on the provided character \
         and context. Follow the requested JSON schema."
    )
}

/// Opening prompt introducing the whole cast.
pub fn initial_scene(player_name: &str, characters: &[Character]) -> String {
    let cast = characters
        .iter()
        .map(|c| format!("{}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "This is the opening of a romance visual novel. The player's name is {player_name}. \
         The story takes place at a Japanese high school. The heroines are:\n{cast}\n\
         Write the first scene, introduce every heroine, and let the player make a first choice."
    )
}

/// Prompt for the scene after a choice.
pub fn next_scene(player_name: &str, affection: &Affection, history: &StoryHistory) -> String {
    let tally = serde_json::to_string(affection).unwrap_or_default();
    format!(
        "Player name: {player_name}\n\
         Current affection: {tally}\n\
         Story so far: {}\n\n\
         Based on the above, write the next scene and its choices. \
         Let the story shift subtly according to the affection scores.",
        history.summary()
    )
}

/// Prompt for the ending with the chosen heroine.
pub fn ending(player_name: &str, final_character: &Character, history: &StoryHistory) -> String {
    format!(
        "The story of {player_name} is over. The bond with {} ({}) grew the deepest. \
         Story so far: {}\n\n\
         Write a romantic, conclusive ending for the two of them.",
        final_character.name,
        final_character.description,
        history.summary()
    )
}

pub fn portrait(prompt: &str) -> String {
    format!("{PORTRAIT_STYLE} {prompt}")
}

pub fn background(prompt: &str) -> String {
    format!("{BACKGROUND_STYLE} {prompt}")
}

/// Response schema for a scene.
pub fn scene_schema(language: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "sceneId": {
                "type": "STRING",
                "description": "A unique ID for this scene, e.g., 'yuki_path_2'."
            },
            "character": {
                "type": "STRING",
                "description": "Name of the character featured/speaking (Yuki, Haruka, Aoi, or Narrator for general descriptions)."
            },
            "dialogue": {
                "type": "STRING",
                "description": format!("The dialogue or narrative text for the scene. Must be in {language}.")
            },
            "backgroundDescription": {
                "type": "STRING",
                "description": "A brief description of the background in English for image generation, e.g., 'High school classroom, afternoon sun'."
            },
            "choices": {
                "type": "ARRAY",
                "description": "An array of 2-3 choices for the player.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": {
                            "type": "STRING",
                            "description": format!("The text for the player's choice, in {language}.")
                        },
                        "affectionEffect": {
                            "type": "OBJECT",
                            "properties": {
                                "yuki": { "type": "INTEGER", "description": "Affection change for Yuki, e.g. 10, -5, 0." },
                                "haruka": { "type": "INTEGER", "description": "Affection change for Haruka." },
                                "aoi": { "type": "INTEGER", "description": "Affection change for Aoi." }
                            },
                            "required": ["yuki", "haruka", "aoi"]
                        }
                    },
                    "required": ["text", "affectionEffect"]
                }
            }
        },
        "required": ["sceneId", "character", "dialogue", "backgroundDescription", "choices"]
    })
}

/// Response schema for an ending.
pub fn ending_schema(language: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "endingTitle": {
                "type": "STRING",
                "description": format!("The title of the ending in {language}.")
            },
            "endingText": {
                "type": "STRING",
                "description": format!("The final, conclusive narration for the ending in {language}.")
            },
            "backgroundImageDescription": {
                "type": "STRING",
                "description": "A detailed English description for a romantic final image, e.g., 'Anime couple under a cherry blossom tree at night'."
            }
        },
        "required": ["endingTitle", "endingText", "backgroundImageDescription"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::default_roster;

    #[test]
    fn test_initial_scene_lists_cast() {
        let prompt = initial_scene("Aki", &default_roster());
        assert!(prompt.contains("Aki"));
        assert!(prompt.contains("Yuki (雪): "));
        assert!(prompt.contains("Haruka (陽菜): "));
        assert!(prompt.contains("Aoi (碧): "));
    }

    #[test]
    fn test_next_scene_includes_tally_and_history() {
        let history = StoryHistory::from(vec!["Hi".to_string(), "Wave".to_string()]);
        let affection = Affection { yuki: 10, haruka: 0, aoi: -5 };
        let prompt = next_scene("Aki", &affection, &history);
        assert!(prompt.contains(r#"{"yuki":10,"haruka":0,"aoi":-5}"#));
        assert!(prompt.contains("Hi -> Wave"));
    }

    #[test]
    fn test_schemas_require_fields() {
        let schema = scene_schema("English");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
        assert_eq!(schema["properties"]["choices"]["type"], "ARRAY");

        let schema = ending_schema("English");
        assert_eq!(schema["required"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_image_prompts_prefixed() {
        assert!(portrait("silver hair").starts_with(PORTRAIT_STYLE));
        assert!(background("rooftop").ends_with("rooftop"));
    }
}
