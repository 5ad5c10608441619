//! Chat-completion adapter for the primary AI translation engine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TranslationResult;
use super::adapter::TranslationAdapter;
use super::engine::{self, ZHIPU};
use super::error::{TranslateError, TranslateResult};
use super::language::{self, language_name};

pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_MODEL: &str = "glm-4-flash";

const TEMPERATURE: f32 = 0.1;
const TOP_P: f32 = 0.9;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub engine_key: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn zhipu() -> Self {
        Self {
            engine_key: ZHIPU.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        // Blank keys count as missing
        self.api_key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self
    }

    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        if let Some(u) = url {
            self.base_url = u.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(m) = model {
            self.model = m;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

pub struct LlmAdapter {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmAdapter {
    pub fn new(config: LlmConfig) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TranslateError::Http(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn build_prompt(text: &str, target_lang: &str, source_lang: &str) -> String {
        format!(
            "Translate the following text from {} to {}.\n\n\
             Requirements:\n\
             1. Keep the meaning and tone of the original.\n\
             2. Make the translation natural and fluent.\n\
             3. Use accurate equivalents for technical terms.\n\
             4. Only return the translation, without explanations or extra content.\n\
             5. Keep code and special formatting unchanged.\n\n\
             Original:\n{}\n\nTranslation:",
            language_name(source_lang),
            language_name(target_lang),
            text
        )
    }

    async fn complete(&self, api_key: &str, prompt: String) -> TranslateResult<String> {
        let engine = self.config.engine_key.as_str();
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslateError::adapter(engine, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::adapter(
                engine,
                format!("API request failed ({}): {}", status, body),
            ));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            TranslateError::adapter(engine, format!("failed to parse API response: {}", e))
        })?;

        if let Some(usage) = &result.usage {
            tracing::debug!("[{}] completion used {} tokens", engine, usage.total_tokens);
        }

        let text = result
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| TranslateError::adapter(engine, "no choices in API response"))?;

        if text.is_empty() {
            return Err(TranslateError::adapter(engine, "empty translation"));
        }

        Ok(text)
    }
}

#[async_trait]
impl TranslationAdapter for LlmAdapter {
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
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| TranslateError::CredentialMissing {
                engine: engine.to_string(),
            })?;

        let source = language::resolve_source(text, source_lang);
        if source == target_lang {
            return Ok(TranslationResult::new(text, engine, 1.0, &source, target_lang));
        }

        tracing::debug!("[{}] {} -> {} ({} chars)", engine, source, target_lang, text.len());
        let prompt = Self::build_prompt(text, target_lang, &source);
        let translated = self.complete(api_key, prompt).await?;

        Ok(TranslationResult::new(
            &translated,
            engine,
            engine::confidence(engine),
            &source,
            target_lang,
        ))
    }
}
