// Common data models for the dispatcher

use serde::{Deserialize, Serialize};

/// Default yt-dlp format selector
pub const DEFAULT_FORMAT: &str = "bestvideo+bestaudio/best";

/// Default audio quality handed to the audio extractor (kbps or VBR level)
pub const DEFAULT_AUDIO_QUALITY: &str = "192";

/// Default output naming template
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "/youtube-dl/static/%(id)s.%(ext)s";

/// Process-wide extraction defaults.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionDefaults {
    /// yt-dlp format selector (e.g. "bestvideo+bestaudio/best")
    pub format: String,
    /// Audio codec to extract into, if audio extraction is on by default
    pub extract_audio_format: Option<String>,
    /// Audio quality passed along with any audio extraction
    pub extract_audio_quality: String,
    /// Container to recode video into, if recoding is on by default
    pub recode_video_format: Option<String>,
    /// Output naming template with `%(id)s` / `%(ext)s` style placeholders
    pub output_template: String,
    /// Download archive ledger path
    pub archive_file: Option<String>,
    /// Preserve the source's Last-modified time on the written file
    pub update_time: bool,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            extract_audio_format: None,
            extract_audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
            recode_video_format: None,
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            archive_file: None,
            update_time: true,
        }
    }
}

/// A single postprocessing step applied after download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key")]
pub enum Postprocessor {
    /// Extract the audio track into `codec` ("best" keeps the source codec)
    ExtractAudio { codec: String, quality: String },
    /// Recode the video into another container
    RecodeVideo { container: String },
}

impl Postprocessor {
    pub fn is_audio(&self) -> bool {
        matches!(self, Self::ExtractAudio { .. })
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::RecodeVideo { .. })
    }
}

/// Fully resolved parameters for one extraction job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionProfile {
    pub format: String,
    /// Ordered; audio extraction always precedes video recoding
    pub postprocessors: Vec<Postprocessor>,
    pub output_template: String,
    pub archive_file: Option<String>,
    pub update_time: bool,
}

impl ExtractionProfile {
    /// Same profile without postprocessing, for engines that should not apply it
    pub fn without_postprocessors(&self) -> Self {
        Self {
            postprocessors: Vec::new(),
            ..self.clone()
        }
    }

    pub fn audio_step(&self) -> Option<&Postprocessor> {
        self.postprocessors.iter().find(|p| p.is_audio())
    }

    pub fn video_step(&self) -> Option<&Postprocessor> {
        self.postprocessors.iter().find(|p| p.is_video())
    }
}

/// What the engine reported after a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Final file path as printed by yt-dlp, when it printed one
    pub destination: Option<String>,
    /// The archive ledger already listed this URL
    pub already_archived: bool,
}

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// The URL as handed to the engine (trimmed)
    pub url: String,
    /// Artifact file name relative to the output root, when known
    pub artifact: Option<String>,
    pub already_archived: bool,
}

/// Outcome of one engine update run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "output", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated(String),
    Failed(String),
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Immediate acknowledgment returned when an update is triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    pub output: String,
}

impl UpdateAck {
    pub fn initiated() -> Self {
        Self {
            output: "Initiated package update".to_string(),
        }
    }
}
