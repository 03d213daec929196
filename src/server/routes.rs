use axum::{
    body::Body,
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::io::ReaderStream;

use super::AppState;
use crate::downloader::{spawn_update, DownloadError, ExtractionProfile, FormatSelector, UpdateAck};

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ExtractionFailure { .. } => StatusCode::BAD_GATEWAY,
            Self::UpdateFailed(_) | Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({ "success": false, "error": self.to_string() });
        if let Self::ExtractionFailure { reason, .. } = &self {
            body["reason"] = json!(reason);
        }

        (status, Json(body)).into_response()
    }
}

pub async fn redirect_root() -> Redirect {
    Redirect::temporary("/youtube-dl")
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    added: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    service: &'static str,
    engine: &'static str,
    ytdlp_version: Option<String>,
    forward_postprocessors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    added: Option<String>,
}

/// Landing endpoint: engine identity and last known version
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "ytdl-server",
        engine: state.dispatcher.engine_name(),
        ytdlp_version: state.version.current().await,
        forward_postprocessors: state.dispatcher.forwards_postprocessors(),
        added: query.added,
    })
}

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    url: Option<String>,
    format: Option<String>,
    ui: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOptions {
    format: Option<String>,
    profile: ExtractionProfile,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    success: bool,
    url: String,
    options: SubmitOptions,
    artifact: Option<String>,
    already_archived: bool,
}

/// Queue a URL: resolve its profile and run the engine
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> Result<Response, DownloadError> {
    let url = form.url.unwrap_or_default();
    let profile = FormatSelector::resolve(form.format.as_deref(), &state.defaults);

    let report = state.dispatcher.dispatch(&url, &profile).await?;

    tracing::info!(url = %report.url, "Added url to the download queue");

    if form.ui.as_deref().is_some_and(|ui| !ui.is_empty()) {
        let target = format!("/youtube-dl?added={}", urlencoding::encode(&report.url));
        return Ok(Redirect::to(&target).into_response());
    }

    Ok(Json(SubmitResponse {
        success: true,
        url: report.url,
        options: SubmitOptions {
            format: form.format,
            profile,
        },
        artifact: report.artifact,
        already_archived: report.already_archived,
    })
    .into_response())
}

/// Start an engine upgrade without waiting for it
pub async fn trigger_update(State(state): State<AppState>) -> Json<UpdateAck> {
    Json(spawn_update(state.updater.clone(), state.version.clone()))
}

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    url: Option<String>,
}

/// Stream a finished artifact by file name
pub async fn fetch_artifact(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Response, DownloadError> {
    let identifier = query.url.unwrap_or_default();
    let (path, file) = state.locator.open(&identifier).await?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let length = file
        .metadata()
        .await
        .map_err(|source| DownloadError::Io {
            path: path.clone(),
            source,
        })?
        .len();

    tracing::debug!(identifier = %identifier, bytes = length, "Serving artifact");

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::{
        ArtifactLocator, Dispatcher, EngineUpgrade, ExtractionDefaults, ExtractionEngine,
        EngineVersion, ExtractionOutput, UpdateOutcome, VersionProbe,
    };
    use crate::server::build_app;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    struct FakeEngine {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ExtractionEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn extract(
            &self,
            _url: &str,
            _profile: &ExtractionProfile,
        ) -> Result<ExtractionOutput, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DownloadError::from("ERROR: Unsupported URL: x".to_string()));
            }
            Ok(ExtractionOutput {
                destination: Some("/static/v1.mp4".to_string()),
                already_archived: false,
            })
        }
    }

    struct SlowUpgrade;

    #[async_trait]
    impl EngineUpgrade for SlowUpgrade {
        async fn update(&self) -> UpdateOutcome {
            tokio::time::sleep(Duration::from_secs(5)).await;
            UpdateOutcome::Updated("done".to_string())
        }
    }

    fn test_state(root: &std::path::Path, fail: bool) -> (AppState, Arc<FakeEngine>) {
        let engine = Arc::new(FakeEngine {
            calls: AtomicUsize::new(0),
            fail,
        });
        let state = AppState {
            defaults: Arc::new(ExtractionDefaults::default()),
            dispatcher: Arc::new(Dispatcher::new(engine.clone(), false)),
            locator: Arc::new(ArtifactLocator::new(root)),
            updater: Arc::new(SlowUpgrade),
            version: Arc::new(EngineVersion::new(VersionProbe::new(
                "/nonexistent/yt-dlp",
                vec!["--version".to_string()],
            ))),
        };
        (state, engine)
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::post("/youtube-dl/q")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_mp3_returns_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (state, engine) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app
            .oneshot(form_request("url=https%3A%2F%2Fexample.com%2Fv1&format=mp3"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["url"], "https://example.com/v1");
        assert_eq!(body["options"]["format"], "mp3");
        assert_eq!(body["options"]["profile"]["postprocessors"][0]["key"], "ExtractAudio");
        assert_eq!(body["options"]["profile"]["postprocessors"][0]["codec"], "mp3");
        assert_eq!(body["artifact"], "v1.mp4");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_without_url_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (state, engine) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app.oneshot(form_request("url=%20%20&format=mkv")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_engine_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(dir.path(), true);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app
            .oneshot(form_request("url=https%3A%2F%2Fexample.com%2Fv1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["reason"], "unsupported_url");
    }

    #[tokio::test]
    async fn test_submit_from_ui_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app
            .oneshot(form_request("url=https%3A%2F%2Fexample.com%2Fv1&ui=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/youtube-dl?added=https%3A%2F%2Fexample.com%2Fv1"
        );
    }

    #[tokio::test]
    async fn test_update_acknowledges_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let started = Instant::now();
        let response = app
            .oneshot(
                Request::put("/youtube-dl/update")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["output"], "Initiated package update");
    }

    #[tokio::test]
    async fn test_fetch_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("v1.mp4"), b"fake video bytes").unwrap();
        let (state, _) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/youtube-dl/get?url=v1.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"fake video bytes");

        let response = app
            .clone()
            .oneshot(Request::get("/youtube-dl/get?url=missing.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::get("/youtube-dl/get?url=").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_root_redirects_and_status_reports_engine() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let response = app
            .oneshot(Request::get("/youtube-dl?added=x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["engine"], "fake");
        assert_eq!(body["added"], "x");
        assert!(body["ytdlp_version"].is_null());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_status_serves_cached_version() {
        let dir = tempfile::tempdir().unwrap();
        let calls_file = dir.path().join("calls");
        let (mut state, _) = test_state(dir.path(), false);
        let version = Arc::new(EngineVersion::new(VersionProbe::new(
            "sh",
            vec![
                "-c".to_string(),
                format!("echo run >> {}; echo 2024.08.06", calls_file.display()),
            ],
        )));
        version.refresh().await;
        state.version = version;
        let app = build_app(state, "https://codeit.codes").unwrap();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::get("/youtube-dl").body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body = json_body(response).await;
            assert_eq!(body["ytdlp_version"], "2024.08.06");
        }
        assert_eq!(std::fs::read_to_string(&calls_file).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn test_cors_answers_only_the_allowed_origin() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(dir.path(), false);
        let app = build_app(state, "https://codeit.codes").unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::get("/youtube-dl")
                    .header(header::ORIGIN, "https://codeit.codes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://codeit.codes"
        );

        let response = app
            .oneshot(
                Request::get("/youtube-dl")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(dir.path(), false);
        assert!(build_app(state, "bad\norigin").is_err());
    }
}
