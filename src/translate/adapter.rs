//! Common interface for translation engines

use async_trait::async_trait;

use super::TranslationResult;
use super::error::TranslateResult;

/// Text used by health probes.
pub const PROBE_TEXT: &str = "test";

/// One remote translation provider.
///
/// Adapters make a single attempt and report failure; retries and engine
/// failover belong to [`super::manager::TranslationManager`].
#[async_trait]
pub trait TranslationAdapter: Send + Sync {
    fn engine_key(&self) -> &str;

    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> TranslateResult<TranslationResult>;

    /// Cheap reachability check used by the health monitor.
    async fn probe(&self) -> TranslateResult<()> {
        self.translate(PROBE_TEXT, "zh", "en").await.map(|_| ())
    }
}
