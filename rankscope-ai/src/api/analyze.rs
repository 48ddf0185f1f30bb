//! Analysis endpoints
//!
//! `POST /analyze` validates the body before any pipeline work, then runs the
//! pipeline on a spawned task that outlives the request. The response is
//! either one JSON document or, when the client asks for
//! `text/event-stream` (or passes `?stream=true`), an SSE stream of
//! `progress` events followed by exactly one `complete` or `error` event.
//! A client that disconnects only drops its stream.

use crate::error::{ApiError, PipelineError};
use crate::models::{AnalysisReport, AnalysisRequest, ValidationError};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::ACCEPT, HeaderMap},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use rankscope_common::events::AnalysisEvent;
use rankscope_common::sse::{create_event_sse_stream, keep_alive};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

type AnalysisOutcome = Result<AnalysisReport, PipelineError>;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    #[serde(default)]
    pub stream: Option<String>,
}

fn wants_stream(headers: &HeaderMap, query: &AnalyzeQuery) -> bool {
    let accepts_sse = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    accepts_sse || query.stream.as_deref() == Some("true")
}

fn parse_request(body: &Bytes) -> Result<AnalysisRequest, ValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidBody)?;
    AnalysisRequest::from_json(&value)
}

/// Run the pipeline on its own task, delivering the outcome on a oneshot
fn spawn_analysis(
    state: &AppState,
    analysis_id: Uuid,
    request: AnalysisRequest,
) -> oneshot::Receiver<AnalysisOutcome> {
    let (tx, rx) = oneshot::channel();
    let orchestrator = state.orchestrator.clone();
    let last_error = state.last_error.clone();

    tokio::spawn(async move {
        let outcome = orchestrator.run(analysis_id, &request).await;
        if let Err(e) = &outcome {
            *last_error.write().await = Some(e.to_string());
        }
        if tx.send(outcome).is_err() {
            debug!(analysis_id = %analysis_id, "Client gone before analysis finished");
        }
    });

    rx
}

fn success_body(report: &AnalysisReport) -> Value {
    json!({ "success": true, "report": report })
}

fn task_lost() -> ApiError {
    ApiError::Internal("Analysis task ended unexpectedly".to_string())
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(e) => {
            info!(error = %e, "Rejected analysis request");
            return ApiError::from(e).into_response();
        }
    };

    let analysis_id = Uuid::new_v4();
    if wants_stream(&headers, &query) {
        return analysis_sse(state, analysis_id, request).into_response();
    }

    match spawn_analysis(&state, analysis_id, request).await {
        Ok(Ok(report)) => Json(success_body(&report)).into_response(),
        Ok(Err(e)) => ApiError::from(e).into_response(),
        Err(_) => task_lost().into_response(),
    }
}

/// SSE response for one analysis
///
/// Subscribes before spawning so no progress event can be missed.
fn analysis_sse(
    state: AppState,
    analysis_id: Uuid,
    request: AnalysisRequest,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_bus.subscribe();
    let mut done = spawn_analysis(&state, analysis_id, request);

    info!(analysis_id = %analysis_id, "Streaming analysis");

    let stream = async_stream::stream! {
        let mut progress_open = true;
        loop {
            tokio::select! {
                biased;

                received = rx.recv(), if progress_open => {
                    match received {
                        Ok(AnalysisEvent::AnalysisProgress { analysis_id: id, stage, progress, .. })
                            if id == analysis_id =>
                        {
                            let data = json!({ "stage": stage, "progress": progress });
                            yield Ok(Event::default().event("progress").data(data.to_string()));
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(analysis_id = %analysis_id, skipped, "SSE: progress subscriber lagged");
                        }
                        Err(RecvError::Closed) => progress_open = false,
                    }
                }

                outcome = &mut done => {
                    let (name, data) = match outcome {
                        Ok(Ok(report)) => ("complete", success_body(&report)),
                        Ok(Err(e)) => ("error", ApiError::from(e).body()),
                        Err(_) => ("error", task_lost().body()),
                    };
                    yield Ok(Event::default().event(name).data(data.to_string()));
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(keep_alive())
}

/// GET /analyze/events
pub async fn analysis_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    create_event_sse_stream("rankscope-ai", &state.event_bus)
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/analyze/events", get(analysis_event_stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_stream_selection() {
        let mut headers = HeaderMap::new();
        assert!(!wants_stream(&headers, &AnalyzeQuery::default()));

        let query = AnalyzeQuery {
            stream: Some("true".to_string()),
        };
        assert!(wants_stream(&headers, &query));

        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        assert!(wants_stream(&headers, &AnalyzeQuery::default()));
    }

    #[test]
    fn test_unparsable_body_is_invalid() {
        assert_eq!(
            parse_request(&Bytes::from_static(b"{not json")),
            Err(ValidationError::InvalidBody)
        );
        assert_eq!(
            parse_request(&Bytes::from_static(b"{}")),
            Err(ValidationError::KeywordRequired)
        );
    }
}
