//! Error types for translation engines and the failover manager

use thiserror::Error;

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslateError {
    /// Input rejected before any engine was contacted.
    #[error("Translation text must not be empty")]
    Validation,

    #[error("{engine}: API key is not configured")]
    CredentialMissing { engine: String },

    #[error("{engine}: {message}")]
    Adapter { engine: String, message: String },

    #[error("{engine}: request timed out after {secs}s")]
    Timeout { engine: String, secs: u64 },

    #[error("All translation engines are unavailable after {attempts} attempt(s). Last error: {last_error}")]
    AllEnginesExhausted { attempts: usize, last_error: String },

    #[error("Unknown translation engine: {0}")]
    UnknownEngine(String),

    #[error("Failed to create HTTP client: {0}")]
    Http(String),
}

impl TranslateError {
    pub fn adapter(engine: &str, message: impl Into<String>) -> Self {
        Self::Adapter {
            engine: engine.to_string(),
            message: message.into(),
        }
    }

    /// Errors that say nothing about the engine's reachability and should
    /// take it out of rotation right away.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::CredentialMissing { .. })
    }
}
