use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{DubError, Result};
use super::Translator;

/// Google Translate client on the public `translate_a/single` endpoint
pub struct GoogleTranslator {
    client: Client,
    config: TranslateConfig,
}

impl GoogleTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("redub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }
}

/// Concatenate the translated fragments of a `translate_a/single` response.
/// The body is `[[["translated", "source", ...], ...], null, "detected-lang", ...]`.
pub fn parse_translation(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| DubError::Translation(format!("Unexpected response shape: {}", body)))?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    Ok(translated)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        debug!("Sending translation request to: {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("client", "gtx"), ("sl", "auto"), ("tl", target_code), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DubError::Translation(format!(
                "Translation API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response.json().await?;
        parse_translation(&body)
    }
}
