//! Audit event hand-off.
//!
//! Each request produces one [`AuditEvent`]. Events are pushed onto a bounded
//! channel with `try_send` and drained by a background task, so the request
//! path never waits on audit delivery and never sees its failures.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::AppError;

/// Summary of one query request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub http_method: String,
    pub request_params: serde_json::Value,
    pub execution_time_ms: u64,
    pub result_count: usize,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AuditEvent {
    /// Builds the event for a finished request.
    ///
    /// A `NotFound` outcome is a successful query that matched nothing; any
    /// other error marks the event as failed and carries its message.
    pub fn from_outcome(
        endpoint: &str,
        http_method: &str,
        request_params: serde_json::Value,
        elapsed: Duration,
        outcome: Result<usize, &AppError>,
    ) -> Self {
        let (result_count, success, error_message) = match outcome {
            Ok(count) => (count, true, None),
            Err(e) if e.is_not_found() => (0, true, None),
            Err(e) => (0, false, Some(e.to_string())),
        };

        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            http_method: http_method.to_string(),
            request_params,
            execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            result_count,
            success,
            error_message,
        }
    }
}

/// Sending half of the audit channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditPublisher {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditPublisher {
    /// Creates a publisher and the receiver that must be drained.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Hands the event off without waiting. Drops it (with a warning) when the
    /// channel is full or the consumer is gone.
    pub fn publish(&self, event: AuditEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    "Audit channel full, dropping event {} for {}",
                    event.event_id,
                    event.endpoint
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    "Audit consumer stopped, dropping event {} for {}",
                    event.event_id,
                    event.endpoint
                );
            }
        }
    }
}

/// Spawns the consumer that writes each event as a structured log record
/// under the `audit` target.
pub fn spawn_audit_logger(mut rx: mpsc::Receiver<AuditEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(payload) => tracing::info!(
                    target: "audit",
                    endpoint = %event.endpoint,
                    success = event.success,
                    result_count = event.result_count,
                    execution_time_ms = event.execution_time_ms,
                    "{}",
                    payload
                ),
                Err(e) => tracing::error!("Failed to serialize audit event {}: {}", event.event_id, e),
            }
        }
        tracing::info!("Audit channel closed, audit logger stopping");
    })
}
