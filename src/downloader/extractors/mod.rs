// Extraction engine adapters
//
// Provides two ways of running yt-dlp:
// - Python mode: `python3 -m yt_dlp` (same interpreter the updater upgrades)
// - CLI mode: native `yt-dlp` binary
//
// EngineSelector picks one of them once, at startup, from ExtractorMode.

mod cli;
mod mode;
mod python;
mod selector;

pub use cli::CliEngine;
pub use mode::ExtractorMode;
pub use python::PythonEngine;
pub use selector::EngineSelector;

use super::models::{ExtractionProfile, Postprocessor};

/// yt-dlp arguments for a profile, URL last
pub fn profile_args(url: &str, profile: &ExtractionProfile) -> Vec<String> {
    let mut args = vec![
        "--format".to_string(),
        profile.format.clone(),
        "--output".to_string(),
        profile.output_template.clone(),
        // One video per job, even for a `watch?v=..&list=..` URL
        "--no-playlist".to_string(),
        "--newline".to_string(),
    ];

    if let Some(archive) = &profile.archive_file {
        args.push("--download-archive".to_string());
        args.push(archive.clone());
    }

    args.push(if profile.update_time { "--mtime" } else { "--no-mtime" }.to_string());

    for step in &profile.postprocessors {
        match step {
            Postprocessor::ExtractAudio { codec, quality } => {
                args.push("--extract-audio".to_string());
                args.push("--audio-format".to_string());
                args.push(codec.clone());
                args.push("--audio-quality".to_string());
                args.push(quality.clone());
            }
            Postprocessor::RecodeVideo { container } => {
                args.push("--recode-video".to_string());
                args.push(container.clone());
            }
        }
    }

    // Keep a URL starting with '-' from being read as an option
    args.push("--".to_string());
    args.push(url.to_string());
    args
}
