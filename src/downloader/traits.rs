// Seams to the external extraction engine

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{ExtractionOutput, ExtractionProfile, UpdateOutcome};

/// Something that turns a URL and a profile into a file on disk
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Check if this engine can run at all
    fn is_available(&self) -> bool;

    /// Run one extraction. Blocks the calling task until the engine exits.
    async fn extract(
        &self,
        url: &str,
        profile: &ExtractionProfile,
    ) -> Result<ExtractionOutput, DownloadError>;
}

/// Upgrades the extraction engine in place
#[async_trait]
pub trait EngineUpgrade: Send + Sync {
    /// Best-effort; failures are reported in the outcome, never raised
    async fn update(&self) -> UpdateOutcome;
}
