// Engine selection mode

use std::fmt;
use std::str::FromStr;

/// How yt-dlp is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorMode {
    /// Python module yt_dlp (kept current by the updater)
    Python,
    /// CLI binary yt-dlp
    Cli,
    /// Python when the module imports, CLI otherwise
    #[default]
    Auto,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for ExtractorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "cli" => Ok(Self::Cli),
            "auto" | "" => Ok(Self::Auto),
            other => Err(format!("unknown engine mode '{}' (expected python, cli or auto)", other)),
        }
    }
}
