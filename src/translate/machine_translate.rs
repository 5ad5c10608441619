//! Public web translation endpoints (Google gtx-style API)

use async_trait::async_trait;
use std::time::Duration;

use super::TranslationResult;
use super::adapter::TranslationAdapter;
use super::engine;
use super::error::{TranslateError, TranslateResult};
use super::language;

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct MachineTranslateConfig {
    pub engine_key: String,
    pub endpoint: String,
    pub confidence: f32,
    pub timeout: Duration,
}

impl MachineTranslateConfig {
    pub fn new(engine_key: &str) -> Self {
        Self {
            engine_key: engine_key.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            confidence: engine::confidence(engine_key),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if let Some(e) = endpoint {
            self.endpoint = e;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct MachineTranslateAdapter {
    config: MachineTranslateConfig,
    client: reqwest::Client,
}

/// Translated text plus the source language the endpoint reported.
#[derive(Debug, PartialEq)]
pub struct ParsedResponse {
    pub text: String,
    pub detected_language: Option<String>,
}

impl MachineTranslateAdapter {
    pub fn new(config: MachineTranslateConfig) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TranslateError::Http(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn request_url(&self, text: &str, source_code: &str, target_code: &str) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.config.endpoint,
            source_code,
            target_code,
            urlencoding::encode(text)
        )
    }

    /// Parse `[[["fragment","original",...],...],null,"src",...]`.
    pub fn parse_response(body: &str) -> Result<ParsedResponse, String> {
        let parsed: serde_json::Value =
            serde_json::from_str(body).map_err(|e| format!("malformed response: {}", e))?;

        let segments = parsed
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| "unexpected response format".to_string())?;

        let mut text = String::new();
        for segment in segments {
            if let Some(fragment) = segment.get(0).and_then(|v| v.as_str()) {
                text.push_str(fragment);
            }
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err("empty translation".to_string());
        }

        let detected_language = parsed
            .get(2)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(ParsedResponse {
            text,
            detected_language,
        })
    }
}

#[async_trait]
impl TranslationAdapter for MachineTranslateAdapter {
    fn engine_key(&self) -> &str {
        &self.config.engine_key
    }

    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> TranslateResult<TranslationResult> {
        let engine = self.config.engine_key.as_str();
        let source = language::resolve_source(text, source_lang);
        let source_code = language::map_code(engine, &source);
        let target_code = language::map_code(engine, target_lang);

        tracing::debug!("[{}] {} -> {}", engine, source_code, target_code);

        let response = self
            .client
            .get(self.request_url(text, &source_code, &target_code))
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| TranslateError::adapter(engine, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TranslateError::adapter(
                engine,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::adapter(engine, format!("failed to read response: {}", e)))?;

        let parsed = Self::parse_response(&body).map_err(|e| TranslateError::adapter(engine, e))?;
        if let Some(detected) = &parsed.detected_language {
            tracing::debug!("[{}] provider detected {}", engine, detected);
        }

        // Results carry canonical codes, never the provider's dialect
        Ok(TranslationResult::new(
            &parsed.text,
            engine,
            self.config.confidence,
            &source,
            target_lang,
        ))
    }
}
