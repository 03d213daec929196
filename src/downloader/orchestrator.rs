// Dispatcher - validates a job and hands it to the extraction engine

use std::path::Path;
use std::sync::Arc;

use super::errors::DownloadError;
use super::models::{DispatchReport, ExtractionProfile};
use super::traits::ExtractionEngine;

pub struct Dispatcher {
    engine: Arc<dyn ExtractionEngine>,
    forward_postprocessors: bool,
}

impl Dispatcher {
    /// `forward_postprocessors` decides whether profile postprocessing reaches the engine
    pub fn new(engine: Arc<dyn ExtractionEngine>, forward_postprocessors: bool) -> Self {
        Self {
            engine,
            forward_postprocessors,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn forwards_postprocessors(&self) -> bool {
        self.forward_postprocessors
    }

    /// Run one job to completion.
    ///
    /// A blank URL is rejected before the engine is touched. Otherwise the
    /// engine runs exactly once and its failure is returned as is. The
    /// engine call lives on its own task, so dropping this future (a client
    /// hanging up) leaves the download running.
    pub async fn dispatch(
        &self,
        url: &str,
        profile: &ExtractionProfile,
    ) -> Result<DispatchReport, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidRequest(
                "called without a 'url'".to_string(),
            ));
        }

        let effective = if self.forward_postprocessors {
            profile.clone()
        } else {
            profile.without_postprocessors()
        };

        tracing::info!(url, engine = self.engine.name(), "Dispatching download");

        let engine = self.engine.clone();
        let job_url = url.to_string();
        let job = tokio::spawn(async move { engine.extract(&job_url, &effective).await });

        let result = match job.await {
            Ok(result) => result,
            Err(e) => Err(DownloadError::extraction(format!("extraction task failed: {}", e))),
        };

        match result {
            Ok(output) => {
                let artifact = output
                    .destination
                    .as_deref()
                    .and_then(|d| Path::new(d).file_name())
                    .map(|name| name.to_string_lossy().to_string());

                tracing::info!(url, artifact = ?artifact, "Download finished");

                Ok(DispatchReport {
                    url: url.to_string(),
                    artifact,
                    already_archived: output.already_archived,
                })
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Download failed");
                Err(e)
            }
        }
    }
}
