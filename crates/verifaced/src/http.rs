//! HTTP surface: multipart verification endpoint and SSE progress stream.

use crate::engine::{session_upload_paths, Engine, VerifyError};
use crate::progress::ProgressStore;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Poll interval for the progress stream.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long a progress stream waits for the first record. A client that
/// opens the stream while its upload is still in flight subscribes before
/// the engine writes the 0% milestone; the record appearing within this
/// window is the normal case, not a dead session.
const STARTUP_GRACE: Duration = Duration::from_secs(2);

/// A verification has no cancellation path, so a stuck one leaves its
/// record below 100 forever. Close the stream once the record has not
/// moved for this long.
const STALE_SESSION_SECS: i64 = 600;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub progress: ProgressStore,
    pub upload_dir: PathBuf,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/verify", post(verify))
        .route("/progress/:session_id", get(progress_stream))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "result": "Error", "message": message })),
    )
        .into_response()
}

/// Collected `POST /verify` form fields.
#[derive(Default)]
struct VerifyForm {
    name: Option<String>,
    whatsapp: Option<String>,
    session_id: Option<String>,
    reference: Option<Vec<u8>>,
    selfie: Option<Vec<u8>>,
    selfie_base64: Option<String>,
}

async fn verify(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut form = VerifyForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "malformed multipart body");
                return error_json(StatusCode::BAD_REQUEST, "Malformed upload.");
            }
        };

        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        let read = |err: axum::extract::multipart::MultipartError| {
            tracing::warn!(field = %field_name, error = %err, "failed to read multipart field");
        };

        match field_name.as_str() {
            "name" => form.name = field.text().await.map_err(read).ok(),
            "whatsapp" => form.whatsapp = field.text().await.map_err(read).ok(),
            "session_id" => form.session_id = field.text().await.map_err(read).ok(),
            "selfie_base64" => form.selfie_base64 = field.text().await.map_err(read).ok(),
            "reference" => {
                if let Ok(bytes) = field.bytes().await.map_err(read) {
                    if !bytes.is_empty() {
                        form.reference = Some(bytes.to_vec());
                    }
                }
            }
            "selfie" => {
                if let Ok(bytes) = field.bytes().await.map_err(read) {
                    if !bytes.is_empty() {
                        form.selfie = Some(bytes.to_vec());
                    }
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    let session_id = form
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let Some(reference_bytes) = form.reference else {
        return error_json(StatusCode::BAD_REQUEST, "Reference image required.");
    };

    let selfie_bytes = match (form.selfie, form.selfie_base64.filter(|s| !s.is_empty())) {
        (Some(bytes), _) => bytes,
        (None, Some(data_url)) => match decode_data_url(&data_url) {
            Some(bytes) => bytes,
            None => return error_json(StatusCode::BAD_REQUEST, "Selfie required."),
        },
        (None, None) => return error_json(StatusCode::BAD_REQUEST, "Selfie required."),
    };

    // Uploads are isolated per session so concurrent verifications cannot
    // overwrite each other's images.
    let (reference_path, selfie_path) = session_upload_paths(&state.upload_dir, &session_id);
    if let Err(err) = store_uploads(&reference_path, &reference_bytes, &selfie_path, &selfie_bytes).await
    {
        tracing::error!(%session_id, error = %err, "failed to store uploads");
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload.");
    }

    let name = form.name.as_deref().filter(|n| !n.is_empty());
    let result = state
        .engine
        .verify(
            &session_id,
            &reference_path,
            &selfie_path,
            name,
            form.whatsapp.as_deref(),
        )
        .await;

    match result {
        Ok(report) => Json(report).into_response(),
        // Missing faces are a normal verification outcome: HTTP success
        // with an error-shaped JSON body.
        Err(err) if err.is_no_face() => error_json(StatusCode::OK, &err.to_string()),
        Err(VerifyError::PipelineTask(err)) => {
            tracing::error!(%session_id, error = %err, "verification pipeline task failed");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed.")
        }
        Err(err) => {
            tracing::error!(%session_id, error = %err, "unexpected verification error");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed.")
        }
    }
}

async fn store_uploads(
    reference_path: &std::path::Path,
    reference: &[u8],
    selfie_path: &std::path::Path,
    selfie: &[u8],
) -> std::io::Result<()> {
    if let Some(dir) = reference_path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(reference_path, reference).await?;
    tokio::fs::write(selfie_path, selfie).await?;
    Ok(())
}

/// Decode a data-URL-encoded payload of the form `"<header>,<base64>"`.
fn decode_data_url(data: &str) -> Option<Vec<u8>> {
    use base64::Engine as _;
    let (_header, encoded) = data.split_once(',')?;
    base64::engine::general_purpose::STANDARD.decode(encoded).ok()
}

/// SSE stream of progress events for one session.
///
/// Polls the progress store every 500ms and emits
/// `{"percent", "message", "remaining"}`. After delivering the terminal
/// 100% event the record is deleted and the stream closes. A record that
/// never appears within the startup grace window, or that disappears after
/// having been seen, means "finished or unknown": the stream simply closes,
/// it is not an error.
async fn progress_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = progress_events(state.progress.clone(), session_id)
        .map(|payload| Ok(Event::default().data(payload.to_string())));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Spawn the polling task behind a progress stream, yielding one JSON
/// payload per observed milestone.
fn progress_events(store: ProgressStore, session_id: String) -> ReceiverStream<serde_json::Value> {
    let (tx, rx) = mpsc::channel::<serde_json::Value>(16);

    tokio::spawn(async move {
        let started = Instant::now();
        let mut seen_any = false;

        loop {
            let Some(record) = store.get(&session_id).await else {
                // Keep waiting for the engine's first write; close once a
                // previously seen record is gone or the grace window runs out.
                if seen_any || started.elapsed() >= STARTUP_GRACE {
                    break;
                }
                tokio::time::sleep(PROGRESS_POLL_INTERVAL).await;
                continue;
            };
            seen_any = true;

            let idle = chrono::Utc::now().signed_duration_since(record.updated_at);
            if idle.num_seconds() > STALE_SESSION_SECS {
                tracing::warn!(%session_id, percent = record.percent, "closing stale progress stream");
                break;
            }

            let remaining = estimate_remaining_secs(started.elapsed(), record.percent);
            let payload = serde_json::json!({
                "percent": record.percent,
                "message": record.message,
                "remaining": remaining,
            });
            if tx.send(payload).await.is_err() {
                break; // client went away
            }

            if record.percent >= 100 {
                store.remove(&session_id).await;
                break;
            }

            tokio::time::sleep(PROGRESS_POLL_INTERVAL).await;
        }
    });

    ReceiverStream::new(rx)
}

/// Naive linear estimate of remaining time in whole seconds.
fn estimate_remaining_secs(elapsed: Duration, percent: u8) -> u64 {
    if percent == 0 || percent >= 100 {
        return 0;
    }
    let elapsed_secs = elapsed.as_secs_f64();
    let total_estimated = elapsed_secs / percent as f64 * 100.0;
    (total_estimated - elapsed_secs).max(0.0) as u64
}
