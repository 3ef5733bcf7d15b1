//! Narrator backed directly by the Gemini API.

use async_trait::async_trait;
use gemini::{AspectRatio, Gemini, ImageRequest, Request};
use serde::de::DeserializeOwned;

use super::{prompts, GenerationError, ImageHandle, Narrator, NarratorConfig, Operation};
use crate::affection::Affection;
use crate::roster::Character;
use crate::story::{Ending, Scene, StoryHistory};

/// Generates story text with a Gemini text model and images with Imagen.
#[derive(Clone)]
pub struct GeminiNarrator {
    client: Gemini,
    config: NarratorConfig,
}

impl GeminiNarrator {
    /// Create a narrator with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Gemini::new(api_key))
    }

    /// Create a narrator from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, gemini::Error> {
        Ok(Self::with_client(Gemini::from_env()?))
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Gemini) -> Self {
        Self {
            client,
            config: NarratorConfig::default(),
        }
    }

    /// Configure the narrator.
    pub fn with_config(mut self, config: NarratorConfig) -> Self {
        if let Some(ref model) = config.model {
            self.client = self.client.with_model(model);
        }
        if let Some(ref model) = config.image_model {
            self.client = self.client.with_image_model(model);
        }
        self.config = config;
        self
    }

    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        system: String,
        prompt: String,
        schema: serde_json::Value,
    ) -> Result<T, GenerationError> {
        let mut request = Request::prompt(prompt)
            .with_system(system)
            .with_json_schema(schema);

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }
        if let Some(tokens) = self.config.max_output_tokens {
            request = request.with_max_output_tokens(tokens);
        }

        let response = self
            .client
            .generate_content(request)
            .await
            .map_err(|e| GenerationError::new(operation, e))?;

        tracing::debug!(
            %operation,
            prompt_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.output_tokens,
            "story text generated"
        );

        response.json().map_err(|e| GenerationError::new(operation, e))
    }

    async fn generate_image(
        &self,
        operation: Operation,
        prompt: String,
        aspect_ratio: AspectRatio,
    ) -> Result<ImageHandle, GenerationError> {
        let request = ImageRequest::new(prompt).with_aspect_ratio(aspect_ratio);

        let images = self
            .client
            .generate_images(request)
            .await
            .map_err(|e| GenerationError::new(operation, e))?;

        images
            .first()
            .map(|image| ImageHandle::new(image.data_url()))
            .ok_or_else(|| GenerationError::new(operation, "no image returned"))
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn initial_scene(
        &self,
        player_name: &str,
        characters: &[Character],
    ) -> Result<Scene, GenerationError> {
        let language = &self.config.language;
        self.generate_json(
            Operation::InitialScene,
            prompts::scene_system(language),
            prompts::initial_scene(player_name, characters),
            prompts::scene_schema(language),
        )
        .await
    }

    async fn next_scene(
        &self,
        player_name: &str,
        affection: &Affection,
        history: &StoryHistory,
    ) -> Result<Scene, GenerationError> {
        let language = &self.config.language;
        self.generate_json(
            Operation::NextScene,
            prompts::scene_system(language),
            prompts::next_scene(player_name, affection, history),
            prompts::scene_schema(language),
        )
        .await
    }

    async fn ending(
        &self,
        player_name: &str,
        final_character: &Character,
        history: &StoryHistory,
    ) -> Result<Ending, GenerationError> {
        let language = &self.config.language;
        self.generate_json(
            Operation::Ending,
            prompts::ending_system(language),
            prompts::ending(player_name, final_character, history),
            prompts::ending_schema(language),
        )
        .await
    }

    async fn portrait(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        self.generate_image(
            Operation::Portrait,
            prompts::portrait(prompt),
            AspectRatio::Portrait,
        )
        .await
    }

    async fn background(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        self.generate_image(
            Operation::Background,
            prompts::background(prompt),
            AspectRatio::Wide,
        )
        .await
    }
}
