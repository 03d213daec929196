// Python engine - uses `python3 -m yt_dlp`
//
// This is the copy of yt-dlp that `pip install --upgrade yt-dlp` refreshes,
// so it is the preferred engine whenever the module is importable.

use async_trait::async_trait;
use std::process::Command as StdCommand;

use super::profile_args;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{ExtractionOutput, ExtractionProfile};
use crate::downloader::traits::ExtractionEngine;
use crate::downloader::utils::{combined_output, parse_engine_output, python_cmd, run_output};

/// Python-based engine using the yt_dlp module
pub struct PythonEngine {
    python_cmd: String,
}

impl PythonEngine {
    pub fn new() -> Self {
        Self::with_interpreter(python_cmd())
    }

    pub fn with_interpreter(python_cmd: impl Into<String>) -> Self {
        Self {
            python_cmd: python_cmd.into(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.python_cmd
    }

    /// Check if yt_dlp module is installed
    fn has_ytdlp_module(&self) -> bool {
        match StdCommand::new(&self.python_cmd)
            .args(["-c", "import yt_dlp"])
            .output()
        {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(&self, url: &str, profile: &ExtractionProfile) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "yt_dlp".to_string()];
        args.extend(profile_args(url, profile));
        args
    }
}

impl Default for PythonEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionEngine for PythonEngine {
    fn name(&self) -> &'static str {
        "python-yt-dlp"
    }

    fn is_available(&self) -> bool {
        self.has_ytdlp_module()
    }

    async fn extract(
        &self,
        url: &str,
        profile: &ExtractionProfile,
    ) -> Result<ExtractionOutput, DownloadError> {
        let args = self.build_args(url, profile);
        tracing::debug!(engine = self.name(), "Running: {} {}", self.python_cmd, args.join(" "));

        let output = run_output(&self.python_cmd, &args)
            .await
            .map_err(DownloadError::extraction)?;

        if !output.status.success() {
            return Err(DownloadError::from(combined_output(&output)));
        }

        Ok(parse_engine_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::FailureReason;

    #[test]
    fn test_build_args_runs_module() {
        let engine = PythonEngine::with_interpreter("python3");
        let args = engine.build_args("https://example.com/v1", &ExtractionProfile {
            format: "best".to_string(),
            postprocessors: Vec::new(),
            output_template: "%(id)s.%(ext)s".to_string(),
            archive_file: None,
            update_time: true,
        });

        assert_eq!(&args[..2], ["-m", "yt_dlp"]);
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v1"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_tool_not_found() {
        let engine = PythonEngine::with_interpreter("/nonexistent/python3");
        assert!(!engine.is_available());

        let profile = ExtractionProfile {
            format: "best".to_string(),
            postprocessors: Vec::new(),
            output_template: "%(id)s.%(ext)s".to_string(),
            archive_file: None,
            update_time: true,
        };
        match engine.extract("https://example.com/v1", &profile).await {
            Err(DownloadError::ExtractionFailure { reason, .. }) => {
                assert_eq!(reason, FailureReason::ToolNotFound)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
