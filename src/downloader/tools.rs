// Engine maintenance: upgrading yt-dlp and reporting its version

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::errors::DownloadError;
use super::models::{UpdateAck, UpdateOutcome};
use super::traits::EngineUpgrade;
use super::utils::{combined_output, python_cmd, run_output, run_output_with_timeout};

/// Runs `<python> -m pip install --upgrade yt-dlp`
pub struct EngineUpdater {
    program: String,
    args: Vec<String>,
}

impl EngineUpdater {
    pub fn new() -> Self {
        Self::with_command(
            python_cmd(),
            ["-m", "pip", "install", "--upgrade", "yt-dlp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn run(&self) -> Result<String, DownloadError> {
        let output = run_output(&self.program, &self.args)
            .await
            .map_err(DownloadError::UpdateFailed)?;

        let text = combined_output(&output);
        if output.status.success() {
            Ok(text)
        } else {
            Err(DownloadError::UpdateFailed(format!("{} ({})", text, output.status)))
        }
    }
}

impl Default for EngineUpdater {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineUpgrade for EngineUpdater {
    async fn update(&self) -> UpdateOutcome {
        match self.run().await {
            Ok(output) => UpdateOutcome::Updated(output),
            Err(e) => UpdateOutcome::Failed(e.to_string()),
        }
    }
}

/// Kick off an update in the background and acknowledge straight away.
///
/// The outcome only ever reaches the log. A successful update refreshes the
/// cached engine version.
pub fn spawn_update(updater: Arc<dyn EngineUpgrade>, version: Arc<EngineVersion>) -> UpdateAck {
    tokio::spawn(async move {
        match updater.update().await {
            UpdateOutcome::Updated(output) => {
                tracing::info!(%output, "Engine update finished");
                let current = version.refresh().await;
                tracing::info!(version = ?current, "Engine version refreshed");
            }
            UpdateOutcome::Failed(output) => {
                tracing::warn!(%output, "Engine update failed");
            }
        }
    });

    UpdateAck::initiated()
}

/// Asks the active engine for its version
#[derive(Debug, Clone)]
pub struct VersionProbe {
    program: String,
    args: Vec<String>,
}

impl VersionProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Version string, if the engine answers within 10s
    pub async fn probe(&self) -> Option<String> {
        match run_output_with_timeout(&self.program, self.args.clone(), 10).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!version.is_empty()).then_some(version)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(program = %self.program, error = %e, "Version probe failed");
                None
            }
        }
    }
}

/// Last known engine version; the engine is only asked again on `refresh`
#[derive(Debug)]
pub struct EngineVersion {
    probe: VersionProbe,
    cached: RwLock<Option<String>>,
}

impl EngineVersion {
    /// Starts empty; call `refresh` to fill it
    pub fn new(probe: VersionProbe) -> Self {
        Self {
            probe,
            cached: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> Option<String> {
        self.cached.read().await.clone()
    }

    pub async fn refresh(&self) -> Option<String> {
        let version = self.probe.probe().await;
        *self.cached.write().await = version.clone();
        version
    }
}
