//! Translation engine registry

use serde::{Deserialize, Serialize};

pub const ZHIPU: &str = "zhipu";
pub const GOOGLE: &str = "google";
pub const ALIBABA: &str = "alibaba";
pub const BAIDU: &str = "baidu";

/// Fixed per-engine confidence reported with every result.
const CONFIDENCE: &[(&str, f32)] = &[
    (ZHIPU, 0.95),
    (GOOGLE, 0.90),
    (ALIBABA, 0.88),
    (BAIDU, 0.85),
];

const DEFAULT_CONFIDENCE: f32 = 0.85;

pub fn confidence(engine_key: &str) -> f32 {
    CONFIDENCE
        .iter()
        .find(|(key, _)| *key == engine_key)
        .map(|(_, c)| *c)
        .unwrap_or(DEFAULT_CONFIDENCE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDescriptor {
    pub key: String,
    pub name: String,
    pub description: String,
    pub url: String,
    /// Lower is tried first; ties go to registry order.
    pub priority: i32,
    pub available: bool,
    pub languages: u32,
    #[serde(rename = "type")]
    pub engine_type: EngineType,
}

impl EngineDescriptor {
    pub fn new(key: &str, name: &str, priority: i32, engine_type: EngineType) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: String::new(),
            url: String::new(),
            priority,
            available: true,
            languages: 0,
            engine_type,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinEngine {
    Zhipu,
    Google,
    Alibaba,
    Baidu,
}

impl BuiltinEngine {
    pub const ALL: [BuiltinEngine; 4] = [Self::Zhipu, Self::Google, Self::Alibaba, Self::Baidu];

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            ZHIPU | "glm" => Some(Self::Zhipu),
            GOOGLE => Some(Self::Google),
            ALIBABA | "ali" => Some(Self::Alibaba),
            BAIDU => Some(Self::Baidu),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Zhipu => ZHIPU,
            Self::Google => GOOGLE,
            Self::Alibaba => ALIBABA,
            Self::Baidu => BAIDU,
        }
    }

    pub fn is_ai_model(&self) -> bool {
        matches!(self, Self::Zhipu)
    }

    pub fn descriptor(&self) -> EngineDescriptor {
        let (name, description, url, priority, languages, engine_type) = match self {
            Self::Zhipu => (
                "Zhipu GLM",
                "Zhipu AI GLM-4-Flash model, free high-quality AI translation",
                "https://bigmodel.cn/",
                1,
                100,
                EngineType::Primary,
            ),
            Self::Google => (
                "Google Translate",
                "Google Translate, 134 languages",
                "https://translate.google.com",
                2,
                134,
                EngineType::Fallback,
            ),
            Self::Alibaba => (
                "Alibaba Translate",
                "Alibaba translation, 221 languages",
                "https://translate.alibaba.com",
                3,
                221,
                EngineType::Fallback,
            ),
            Self::Baidu => (
                "Baidu Translate",
                "Baidu translation, 201 languages",
                "https://fanyi.baidu.com",
                4,
                201,
                EngineType::Fallback,
            ),
        };

        EngineDescriptor {
            key: self.key().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            url: url.to_string(),
            priority,
            available: true,
            languages,
            engine_type,
        }
    }
}

pub fn builtin_registry() -> Vec<EngineDescriptor> {
    BuiltinEngine::ALL.iter().map(|e| e.descriptor()).collect()
}
