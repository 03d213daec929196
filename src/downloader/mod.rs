// Downloader module - format resolution, job dispatch, artifacts, engine upkeep

pub mod artifacts;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod tools;
pub mod traits;
pub mod utils;

pub use artifacts::ArtifactLocator;
pub use errors::{DownloadError, FailureReason};
pub use extractors::{CliEngine, EngineSelector, ExtractorMode, PythonEngine};
pub use format_selector::{FormatSelector, FormatToken};
pub use models::{
    DispatchReport, ExtractionDefaults, ExtractionOutput, ExtractionProfile, Postprocessor,
    UpdateAck, UpdateOutcome,
};
pub use orchestrator::Dispatcher;
pub use tools::{spawn_update, EngineUpdater, EngineVersion, VersionProbe};
pub use traits::{EngineUpgrade, ExtractionEngine};
