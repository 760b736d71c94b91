//! Single-shot call to an OpenAI-compatible chat completions endpoint.

use crate::error::{AppError, AppResult};
use crate::settings::AiSettings;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(settings: &AiSettings) -> AppResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(AppError::MissingApiKey);
        }
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        })
    }

    /// Send `prompt` and return the reply text. No retries.
    pub async fn complete(&self, prompt: &str) -> AppResult<String> {
        tracing::info!(
            endpoint = %self.endpoint,
            model = %self.model,
            chars = prompt.len(),
            "sending prompt"
        );

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(prompt))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "AI endpoint rejected the request");
            return Err(AppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = res.json().await?;
        extract_content(&body)
    }
}

/// `choices[0].message.content`, if present and non-blank.
pub fn extract_content(body: &Value) -> AppResult<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or(AppError::EmptyResponse)
}
