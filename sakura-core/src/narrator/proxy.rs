//! Narrator that forwards every call to a generation proxy.
//!
//! The proxy speaks a single-endpoint protocol: `POST {"action", "payload"}`.
//! Successful calls answer with the scene/ending JSON, or `{"imageUrl"}`
//! for the image actions. Failures answer non-2xx with `{"message"}`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{GenerationError, ImageHandle, Narrator, Operation};
use crate::affection::Affection;
use crate::roster::Character;
use crate::story::{Ending, Scene, StoryHistory};

/// Narrator that delegates to a remote generation endpoint.
#[derive(Clone)]
pub struct ProxyNarrator {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ProxyRequest {
    action: &'static str,
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageReply {
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    message: Option<String>,
}

impl ProxyNarrator {
    /// Create a narrator that posts to `endpoint` (e.g. `https://host/api/gemini`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: Operation,
        payload: serde_json::Value,
    ) -> Result<T, GenerationError> {
        let body = ProxyRequest {
            action: operation.action(),
            payload,
        };

        tracing::debug!(%operation, endpoint = %self.endpoint, "proxy call");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::new(operation, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::new(
                operation,
                format!("status {status}: {}", error_message(&text)),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::new(operation, e))
    }

    async fn image(&self, operation: Operation, prompt: &str) -> Result<ImageHandle, GenerationError> {
        let reply: ImageReply = self.call(operation, json!({ "prompt": prompt })).await?;
        Ok(ImageHandle::new(reply.image_url))
    }
}

/// Message carried by a failed proxy reply.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorReply>(body)
        .ok()
        .and_then(|r| r.message)
        .unwrap_or_else(|| "could not fetch data from the server".to_string())
}

#[async_trait]
impl Narrator for ProxyNarrator {
    async fn initial_scene(
        &self,
        player_name: &str,
        characters: &[Character],
    ) -> Result<Scene, GenerationError> {
        self.call(
            Operation::InitialScene,
            json!({ "playerName": player_name, "characters": characters }),
        )
        .await
    }

    async fn next_scene(
        &self,
        player_name: &str,
        affection: &Affection,
        history: &StoryHistory,
    ) -> Result<Scene, GenerationError> {
        self.call(
            Operation::NextScene,
            json!({
                "playerName": player_name,
                "currentAffection": affection,
                "storyHistory": history,
            }),
        )
        .await
    }

    async fn ending(
        &self,
        player_name: &str,
        final_character: &Character,
        history: &StoryHistory,
    ) -> Result<Ending, GenerationError> {
        self.call(
            Operation::Ending,
            json!({
                "playerName": player_name,
                "finalCharacter": final_character,
                "storyHistory": history,
            }),
        )
        .await
    }

    async fn portrait(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        self.image(Operation::Portrait, prompt).await
    }

    async fn background(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        self.image(Operation::Background, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::default_roster;

    #[test]
    fn test_request_envelope() {
        let roster = default_roster();
        let body = ProxyRequest {
            action: Operation::InitialScene.action(),
            payload: json!({ "playerName": "Aki", "characters": roster }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["action"], "generateInitialScene");
        assert_eq!(value["payload"]["playerName"], "Aki");
        assert_eq!(value["payload"]["characters"][0]["id"], "yuki");
        assert!(value["payload"]["characters"][0]["image"].is_null());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message": "Server error: quota exceeded"}"#),
            "Server error: quota exceeded"
        );
        assert_eq!(
            error_message("<html>502</html>"),
            "could not fetch data from the server"
        );
    }

    #[test]
    fn test_image_reply_shape() {
        let reply: ImageReply =
            serde_json::from_str(r#"{"imageUrl": "data:image/jpeg;base64,AAAA"}"#).unwrap();
        assert_eq!(reply.image_url, "data:image/jpeg;base64,AAAA");
    }
}
