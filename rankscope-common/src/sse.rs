//! Server-Sent Events (SSE) utilities

use crate::events::{AnalysisEvent, EventBus};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Heartbeat interval shared by every SSE endpoint
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Encode an analysis event as an SSE frame named after its type
pub fn analysis_event_frame(event: &AnalysisEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Keep-alive settings used by RankScope SSE responses
pub fn keep_alive() -> KeepAlive {
    KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat")
}

/// Create an SSE stream forwarding every event on the bus
///
/// Used by the lifecycle feed that monitoring clients attach to. Lagged
/// receivers skip ahead rather than disconnecting.
///
/// # Arguments
/// * `service_name` - Name of the service for logging (e.g., "rankscope-ai")
/// * `event_bus` - Bus to subscribe to
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} analysis events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            if let Some(frame) = analysis_event_frame(&event) {
                                yield Ok(frame);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "SSE: {} subscriber lagged", service_name);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(keep_alive())
}
