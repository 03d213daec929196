// CLI engine - uses native `yt-dlp` binary
//
// Used when the Python module is missing, or when forced via YDL_ENGINE_MODE=cli.

use async_trait::async_trait;
use std::process::Command as StdCommand;

use super::profile_args;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{ExtractionOutput, ExtractionProfile};
use crate::downloader::traits::ExtractionEngine;
use crate::downloader::utils::{combined_output, find_ytdlp, parse_engine_output, run_output};

/// CLI-based engine using yt-dlp binary
pub struct CliEngine {
    ytdlp_path: String,
}

impl CliEngine {
    pub fn new() -> Self {
        Self::with_path(find_ytdlp())
    }

    pub fn with_path(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.ytdlp_path
    }

    /// Check if yt-dlp binary is available
    fn has_ytdlp_binary(&self) -> bool {
        match StdCommand::new(&self.ytdlp_path).arg("--version").output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }
}

impl Default for CliEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionEngine for CliEngine {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn is_available(&self) -> bool {
        self.has_ytdlp_binary()
    }

    async fn extract(
        &self,
        url: &str,
        profile: &ExtractionProfile,
    ) -> Result<ExtractionOutput, DownloadError> {
        let args = profile_args(url, profile);
        tracing::debug!(engine = self.name(), "Running: {} {}", self.ytdlp_path, args.join(" "));

        let output = run_output(&self.ytdlp_path, &args)
            .await
            .map_err(DownloadError::extraction)?;

        if !output.status.success() {
            return Err(DownloadError::from(combined_output(&output)));
        }

        Ok(parse_engine_output(&String::from_utf8_lossy(&output.stdout)))
    }
}
