// FormatSelector - maps a caller's format token onto an extraction profile
//
// Token classes (closed, case-sensitive):
// - Audio codecs: extract audio into that codec
// - "bestaudio": extract audio keeping the best source codec
// - Video containers: recode video into that container
// Anything else falls through to the process defaults.

use super::models::{ExtractionDefaults, ExtractionProfile, Postprocessor};

/// Audio codecs accepted as format tokens
pub const AUDIO_CODECS: [&str; 7] = ["aac", "flac", "mp3", "m4a", "opus", "vorbis", "wav"];

/// Video containers accepted as format tokens
pub const VIDEO_CONTAINERS: [&str; 6] = ["mp4", "flv", "webm", "ogg", "mkv", "avi"];

/// Token asking for the best available audio
pub const BEST_AUDIO_TOKEN: &str = "bestaudio";

/// Codec sentinel yt-dlp understands as "keep the best source audio"
pub const BEST_AUDIO_CODEC: &str = "best";

/// Classified format token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatToken<'a> {
    AudioCodec(&'a str),
    BestAudio,
    VideoContainer(&'a str),
    /// Absent, empty or unrecognized
    Unspecified,
}

impl<'a> FormatToken<'a> {
    pub fn parse(token: Option<&'a str>) -> Self {
        match token {
            Some(t) if AUDIO_CODECS.contains(&t) => Self::AudioCodec(t),
            Some(BEST_AUDIO_TOKEN) => Self::BestAudio,
            Some(t) if VIDEO_CONTAINERS.contains(&t) => Self::VideoContainer(t),
            _ => Self::Unspecified,
        }
    }
}

/// Format resolver
pub struct FormatSelector;

impl FormatSelector {
    /// Resolve a request's format token against the process defaults.
    ///
    /// Never fails: an unknown token simply leaves the defaults in charge. A
    /// recognized token overrides both the audio and the video slot, so an
    /// audio token never carries a default recode step along (and vice versa).
    pub fn resolve(token: Option<&str>, defaults: &ExtractionDefaults) -> ExtractionProfile {
        let (audio_format, video_format) = match FormatToken::parse(token) {
            FormatToken::AudioCodec(codec) => (Some(codec.to_string()), None),
            FormatToken::BestAudio => (Some(BEST_AUDIO_CODEC.to_string()), None),
            FormatToken::VideoContainer(container) => (None, Some(container.to_string())),
            FormatToken::Unspecified => (
                defaults.extract_audio_format.clone(),
                defaults.recode_video_format.clone(),
            ),
        };

        let mut postprocessors = Vec::new();

        if let Some(codec) = audio_format {
            postprocessors.push(Postprocessor::ExtractAudio {
                codec,
                quality: defaults.extract_audio_quality.clone(),
            });
        }

        if let Some(container) = video_format {
            postprocessors.push(Postprocessor::RecodeVideo { container });
        }

        ExtractionProfile {
            format: defaults.format.clone(),
            postprocessors,
            output_template: defaults.output_template.clone(),
            archive_file: defaults.archive_file.clone(),
            update_time: defaults.update_time,
        }
    }
}
