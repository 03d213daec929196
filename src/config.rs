use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use regex::Regex;
use std::env;
use std::path::PathBuf;

use crate::downloader::models::{
    ExtractionDefaults, DEFAULT_AUDIO_QUALITY, DEFAULT_FORMAT, DEFAULT_OUTPUT_TEMPLATE,
};
use crate::downloader::ExtractorMode;

pub const DEFAULT_STATIC_ROOT: &str = "/youtube-dl/static";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://codeit.codes";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: ExtractionDefaults,
    /// Send profile postprocessing to the engine
    pub forward_postprocessors: bool,
    pub engine_mode: ExtractorMode,
    /// Directory artifacts are served from
    pub static_root: PathBuf,
    pub allowed_origin: String,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: ExtractionDefaults::default(),
            forward_postprocessors: false,
            engine_mode: ExtractorMode::Auto,
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset and empty values take the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_bool = |key: &str, default: bool| -> Result<bool> {
            match get(key) {
                Some(v) => parse_bool(&v).with_context(|| format!("{} must be a boolean", key)),
                None => Ok(default),
            }
        };

        let defaults = ExtractionDefaults {
            format: get("YDL_FORMAT").unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            extract_audio_format: get("YDL_EXTRACT_AUDIO_FORMAT"),
            extract_audio_quality: get("YDL_EXTRACT_AUDIO_QUALITY")
                .unwrap_or_else(|| DEFAULT_AUDIO_QUALITY.to_string()),
            recode_video_format: get("YDL_RECODE_VIDEO_FORMAT"),
            output_template: get("YDL_OUTPUT_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_OUTPUT_TEMPLATE.to_string()),
            archive_file: get("YDL_ARCHIVE_FILE"),
            update_time: get_bool("YDL_UPDATE_TIME", true)?,
        };

        let missing = missing_placeholders(&defaults.output_template);
        if !missing.is_empty() {
            tracing::warn!(
                template = %defaults.output_template,
                missing = ?missing,
                "Output template lacks placeholders; artifacts may not be addressable by id"
            );
        }

        let engine_mode = match get("YDL_ENGINE_MODE") {
            Some(v) => v
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("YDL_ENGINE_MODE is invalid")?,
            None => ExtractorMode::Auto,
        };

        Ok(Self {
            defaults,
            forward_postprocessors: get_bool("YDL_FORWARD_POSTPROCESSORS", false)?,
            engine_mode,
            static_root: get("YDL_STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_ROOT)),
            allowed_origin: get("ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(anyhow!("'{}' is not a boolean", other)),
    }
}

/// Required placeholders (`id`, `ext`) absent from an output template
pub fn missing_placeholders(template: &str) -> Vec<&'static str> {
    lazy_static::lazy_static! {
        // %(name)s, %(name)d, %(name.field)s, %(name|default)s ...
        static ref FIELD_RE: Regex = Regex::new(r"%\(([A-Za-z_][A-Za-z0-9_]*)[^)]*\)[-#0 +]*\d*[a-zA-Z]").unwrap();
    }

    let present: Vec<&str> = FIELD_RE
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    ["id", "ext"]
        .into_iter()
        .filter(|required| !present.contains(required))
        .collect()
}
