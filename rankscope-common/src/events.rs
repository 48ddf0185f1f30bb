//! Analysis lifecycle events and the broadcast bus that carries them
//!
//! The orchestrator publishes progress through [`EventBus::emit_lossy`]; a
//! slow or absent subscriber never blocks or fails the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Analysis lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AnalysisEvent {
    /// A validated request entered the pipeline
    AnalysisStarted {
        analysis_id: Uuid,
        keyword: String,
        target_url: String,
        model: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline stage began
    ///
    /// `progress` is a percentage and never decreases within one analysis.
    AnalysisProgress {
        analysis_id: Uuid,
        stage: String,
        progress: u8,
        timestamp: DateTime<Utc>,
    },

    /// The pipeline produced a report
    AnalysisCompleted {
        analysis_id: Uuid,
        keyword: String,
        competitor_count: usize,
        degraded_stages: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The pipeline stopped on a fatal condition
    AnalysisFailed {
        analysis_id: Uuid,
        error: String,
        error_type: String,
        timestamp: DateTime<Utc>,
    },
}

impl AnalysisEvent {
    /// Get the event type as a string (SSE event name)
    pub fn event_type(&self) -> &'static str {
        match self {
            AnalysisEvent::AnalysisStarted { .. } => "AnalysisStarted",
            AnalysisEvent::AnalysisProgress { .. } => "AnalysisProgress",
            AnalysisEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            AnalysisEvent::AnalysisFailed { .. } => "AnalysisFailed",
        }
    }

    /// Analysis this event belongs to
    pub fn analysis_id(&self) -> Uuid {
        match self {
            AnalysisEvent::AnalysisStarted { analysis_id, .. }
            | AnalysisEvent::AnalysisProgress { analysis_id, .. }
            | AnalysisEvent::AnalysisCompleted { analysis_id, .. }
            | AnalysisEvent::AnalysisFailed { analysis_id, .. } => *analysis_id,
        }
    }
}

/// Event bus for broadcasting analysis events to subscribers
///
/// Backed by a `tokio::sync::broadcast` channel. Receivers that fall behind
/// by more than `capacity` events observe `RecvError::Lagged` and skip ahead.
///
/// # Examples
///
/// ```
/// use rankscope_common::events::{AnalysisEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(AnalysisEvent::AnalysisProgress {
///     analysis_id: uuid::Uuid::new_v4(),
///     stage: "Analyzing search intent".to_string(),
///     progress: 30,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AnalysisEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: AnalysisEvent,
    ) -> Result<usize, broadcast::error::SendError<AnalysisEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AnalysisEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(id: Uuid, progress: u8) -> AnalysisEvent {
        AnalysisEvent::AnalysisProgress {
            analysis_id: id,
            stage: "stage".to_string(),
            progress,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_err_but_lossy_is_silent() {
        let bus = EventBus::new(8);
        assert!(bus.emit(progress(Uuid::new_v4(), 10)).is_err());
        bus.emit_lossy(progress(Uuid::new_v4(), 10));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        bus.emit_lossy(progress(id, 10));
        bus.emit_lossy(progress(id, 30));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first, progress_with_ts(&first, id, 10));
        assert_eq!(second.analysis_id(), id);
        assert_eq!(second.event_type(), "AnalysisProgress");
    }

    fn progress_with_ts(original: &AnalysisEvent, id: Uuid, pct: u8) -> AnalysisEvent {
        match original {
            AnalysisEvent::AnalysisProgress { timestamp, stage, .. } => {
                AnalysisEvent::AnalysisProgress {
                    analysis_id: id,
                    stage: stage.clone(),
                    progress: pct,
                    timestamp: *timestamp,
                }
            }
            other => other.clone(),
        }
    }

    #[test]
    fn test_serialized_event_carries_type_tag() {
        let event = AnalysisEvent::AnalysisFailed {
            analysis_id: Uuid::nil(),
            error: "boom".to_string(),
            error_type: "analysis".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AnalysisFailed");
        assert_eq!(json["error_type"], "analysis");
    }
}
