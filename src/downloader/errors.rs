// Error types for the dispatcher, locator and updater

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of an extraction engine failure, derived from its stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Network timeout while talking to the media host
    NetworkTimeout,
    /// Host throttled or blocked the request (429, bot detection, etc.)
    Blocked,
    /// yt-dlp or python not found in system
    ToolNotFound,
    /// URL is not handled by any extractor
    UnsupportedUrl,
    /// Requested format or media is not available
    Unavailable,
    /// Anything else
    Other,
}

impl FailureReason {
    /// Smart detection of the failure kind from engine output
    pub fn classify(output: &str) -> Self {
        let lower = output.to_lowercase();

        // First: these messages echo the URL, which may contain any of the words below
        if lower.contains("unsupported url") || lower.contains("invalid url") || lower.contains("is not a valid url") {
            return Self::UnsupportedUrl;
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("confirm you're not a bot")
            || lower.contains("confirm you\u{2019}re not a bot")
            || lower.contains("blocked")
        {
            return Self::Blocked;
        }

        if lower.contains("requested format is not available")
            || lower.contains("video unavailable")
            || lower.contains("private video")
            || lower.contains("http error 404")
        {
            return Self::Unavailable;
        }

        if lower.contains("not found") || lower.contains("no such file") || lower.contains("no module named") {
            return Self::ToolNotFound;
        }

        Self::Other
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkTimeout => write!(f, "network timeout"),
            Self::Blocked => write!(f, "blocked by host"),
            Self::ToolNotFound => write!(f, "extraction engine not found"),
            Self::UnsupportedUrl => write!(f, "unsupported URL"),
            Self::Unavailable => write!(f, "media unavailable"),
            Self::Other => write!(f, "engine error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// A required field (URL or identifier) is missing, blank or unusable
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No artifact exists at the computed path
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The extraction engine ran and failed, or could not be started
    #[error("extraction failed ({reason}): {message}")]
    ExtractionFailure {
        reason: FailureReason,
        message: String,
    },

    /// Best-effort engine upgrade failed; only ever logged
    #[error("engine update failed: {0}")]
    UpdateFailed(String),

    /// Filesystem error while opening an artifact
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Build an extraction failure, classifying the engine output
    pub fn extraction(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::ExtractionFailure {
            reason: FailureReason::classify(&message),
            message,
        }
    }
}

// Engine stderr arrives as a plain string
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        Self::extraction(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_engine_output() {
        assert_eq!(
            FailureReason::classify("ERROR: Read timed out."),
            FailureReason::NetworkTimeout
        );
        assert_eq!(
            FailureReason::classify("HTTP Error 429: Too Many Requests"),
            FailureReason::Blocked
        );
        assert_eq!(
            FailureReason::classify("/usr/bin/python3: No module named yt_dlp"),
            FailureReason::ToolNotFound
        );
        assert_eq!(
            FailureReason::classify("ERROR: Unsupported URL: https://example.com/v1"),
            FailureReason::UnsupportedUrl
        );
        assert_eq!(
            FailureReason::classify("ERROR: Requested format is not available"),
            FailureReason::Unavailable
        );
        assert_eq!(
            FailureReason::classify("ERROR: unable to download video data: HTTP Error 404: Not Found"),
            FailureReason::Unavailable
        );
        assert_eq!(FailureReason::classify("segfault"), FailureReason::Other);
    }

    #[test]
    fn test_url_words_do_not_change_the_reason() {
        assert_eq!(
            FailureReason::classify("ERROR: Unsupported URL: https://example.com/robotics"),
            FailureReason::UnsupportedUrl
        );
        assert_eq!(
            FailureReason::classify("ERROR: Unsupported URL: https://example.com/timeout-429"),
            FailureReason::UnsupportedUrl
        );
        assert_eq!(
            FailureReason::classify("ERROR: [youtube] abc: Sign in to confirm you're not a bot"),
            FailureReason::Blocked
        );
        assert_eq!(
            FailureReason::classify("ERROR: [youtube] abc: Sign in to confirm you\u{2019}re not a bot"),
            FailureReason::Blocked
        );
    }

    #[test]
    fn test_from_string_is_extraction_failure() {
        let err = DownloadError::from("ERROR: Video unavailable".to_string());
        match err {
            DownloadError::ExtractionFailure { reason, message } => {
                assert_eq!(reason, FailureReason::Unavailable);
                assert_eq!(message, "ERROR: Video unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
