// EngineSelector - picks the Python or CLI engine once and sticks to it
//
// Auto mode prefers Python because that is the install the updater upgrades.
// There is no fallback after a failed run: one dispatch is one engine call.

use async_trait::async_trait;

use super::cli::CliEngine;
use super::mode::ExtractorMode;
use super::python::PythonEngine;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{ExtractionOutput, ExtractionProfile};
use crate::downloader::tools::VersionProbe;
use crate::downloader::traits::ExtractionEngine;

/// Engine chosen from an ExtractorMode
pub struct EngineSelector {
    python: PythonEngine,
    cli: CliEngine,
    active: ExtractorMode,
}

impl EngineSelector {
    /// Probe availability and settle on Python or CLI
    pub fn new(mode: ExtractorMode) -> Self {
        Self::from_engines(mode, PythonEngine::new(), CliEngine::new())
    }

    pub fn from_engines(mode: ExtractorMode, python: PythonEngine, cli: CliEngine) -> Self {
        let active = match mode {
            ExtractorMode::Auto => {
                if python.is_available() {
                    ExtractorMode::Python
                } else {
                    ExtractorMode::Cli
                }
            }
            forced => forced,
        };

        tracing::info!(requested = %mode, active = %active, "Extraction engine selected");

        Self { python, cli, active }
    }

    /// Python or Cli; never Auto
    pub fn active_mode(&self) -> ExtractorMode {
        self.active
    }

    /// `--version` invocation matching the active engine
    pub fn version_probe(&self) -> VersionProbe {
        match self.active {
            ExtractorMode::Python => VersionProbe::new(
                self.python.interpreter(),
                vec!["-m".to_string(), "yt_dlp".to_string(), "--version".to_string()],
            ),
            _ => VersionProbe::new(self.cli.path(), vec!["--version".to_string()]),
        }
    }

    fn engine(&self) -> &dyn ExtractionEngine {
        match self.active {
            ExtractorMode::Python => &self.python,
            _ => &self.cli,
        }
    }
}

#[async_trait]
impl ExtractionEngine for EngineSelector {
    fn name(&self) -> &'static str {
        self.engine().name()
    }

    fn is_available(&self) -> bool {
        self.engine().is_available()
    }

    async fn extract(
        &self,
        url: &str,
        profile: &ExtractionProfile,
    ) -> Result<ExtractionOutput, DownloadError> {
        self.engine().extract(url, profile).await
    }
}
