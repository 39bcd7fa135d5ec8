use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslationConfig;
use crate::error::{PipelineError, Result};
use crate::language::language_name;
use super::TranslationEngine;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    /// Upper bound on generated tokens
    pub num_predict: u32,
    pub temperature: f32,
}

/// Request that evicts the model from accelerator memory
#[derive(Debug, Clone, Serialize)]
struct UnloadRequest<'a> {
    model: &'a str,
    keep_alive: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translation through a local Ollama server
pub struct OllamaEngine {
    client: Client,
    config: TranslationConfig,
    model: String,
}

impl OllamaEngine {
    pub fn new(config: TranslationConfig, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::TranslationEngine(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, model })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'))
    }

    /// Prompt asking for a JSON object `{"text": ...}` in the target language
    pub fn build_prompt(&self, text: &str, source_lang: &str, target_lang: &str) -> String {
        let source_name = language_name(source_lang);
        let target_name = language_name(target_lang);

        format!(
            "You are a professional subtitle translator.\n\
             \n\
             Translate the text from {} to {} ONLY. Keep it short enough to read as a subtitle.\n\
             The target language is: {} (language code: {})\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             Text to translate: \"{}\"\n",
            source_name, target_name, target_name, target_lang, target_name, text
        )
    }

    /// Extract the translation from a raw model reply
    pub fn parse_response(raw: &str) -> Result<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PipelineError::TranslationEngine("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
            return Ok(result.text.trim().to_string());
        }

        Ok(clean_translation_response(raw))
    }
}

/// First line that looks like a translation rather than commentary
fn clean_translation_response(response: &str) -> String {
    let is_commentary = |line: &str| {
        line.starts_with("Here is")
            || line.starts_with("Here are")
            || line.starts_with("Translation:")
            || line.starts_with("- ")
            || line.starts_with("* ")
            || (line.starts_with("**") && line.ends_with("**"))
    };

    response
        .lines()
        .map(str::trim)
        .find(|line| line.chars().count() > 3 && !is_commentary(line))
        .or_else(|| response.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or(response)
        .to_string()
}

#[async_trait]
impl TranslationEngine for OllamaEngine {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: self.build_prompt(text, source_lang, target_lang),
            stream: false,
            format: "json".to_string(),
            options: GenerateOptions {
                num_predict: self.config.max_length,
                temperature: 0.0,
            },
        };

        let url = self.generate_url();
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::TranslationEngine(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::TranslationEngine(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::TranslationEngine(format!("Failed to parse response: {}", e)))?;

        debug!("Raw Ollama response (done: {}): {}", generated.done, generated.response);
        Self::parse_response(&generated.response)
    }

    async fn release(&self) -> Result<()> {
        let request = UnloadRequest {
            model: &self.model,
            keep_alive: 0,
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::TranslationEngine(format!("Failed to unload model: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::TranslationEngine(format!(
                "Failed to unload model '{}': HTTP {}",
                self.model,
                response.status()
            )));
        }

        info!("Unloaded translation model '{}'", self.model);
        Ok(())
    }
}
