//! Integration tests that call the real Gemini API.
//!
//! These tests require GEMINI_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p sakura-core --test api_integration -- --ignored --nocapture`
//!
//! These are marked #[ignore] by default to avoid API costs in CI and slow runs.

use sakura_core::headless::{HeadlessConfig, HeadlessGame};
use sakura_core::{
    default_roster, Affection, GameState, GeminiNarrator, Narrator, NarratorConfig, StoryHistory,
};

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

/// Check if API key is available
fn has_api_key() -> bool {
    std::env::var("GEMINI_API_KEY").is_ok() || std::env::var("API_KEY").is_ok()
}

fn narrator() -> GeminiNarrator {
    GeminiNarrator::from_env()
        .expect("Failed to create narrator")
        .with_config(NarratorConfig::from_env())
}

#[tokio::test]
#[ignore]
async fn test_initial_scene_has_choices() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return;
    }

    let scene = narrator()
        .initial_scene("Aki", &default_roster())
        .await
        .expect("initial scene should generate");

    println!("{}: {}", scene.speaker, scene.dialogue);
    for choice in &scene.choices {
        println!("  - {} {:?}", choice.text, choice.affection_effect);
    }

    assert!(!scene.dialogue.is_empty());
    assert!(!scene.choices.is_empty(), "scene should offer choices");
    assert!(!scene.background_description.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_next_scene_uses_context() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return;
    }

    let history = StoryHistory::from(vec![
        "Yuki looks up from her book as you enter the library.".to_string(),
        "Ask Yuki what she is reading".to_string(),
    ]);
    let affection = Affection {
        yuki: 10,
        haruka: 0,
        aoi: 0,
    };

    let scene = narrator()
        .next_scene("Aki", &affection, &history)
        .await
        .expect("next scene should generate");

    println!("{}: {}", scene.speaker, scene.dialogue);
    assert!(!scene.choices.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_background_image() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return;
    }

    let image = narrator()
        .background("High school rooftop at sunset")
        .await
        .expect("background should generate");

    println!("Image: {image}");
    assert!(image.is_inline());
    assert!(image.as_str().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
#[ignore]
async fn test_headless_full_playthrough() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return;
    }

    let mut game = HeadlessGame::with_gemini(HeadlessConfig::from_env("Aki"))
        .expect("Failed to create game");

    let response = game.start().await.expect("start should not misuse the session");
    assert!(!response.failed, "start failed: {}", response.text);

    while !game.is_over() {
        let response = game.choose(0).await.expect("choice should be valid");
        println!("[{}] {}", response.turn, response.text);
        assert_ne!(response.state, GameState::Menu, "ending failed: {}", response.text);
    }

    let card = game.ending().expect("ending should be present");
    println!("\n{}\n{}", card.ending.ending_title, card.ending.ending_text);
    assert!(game.turn() <= 7);
}
