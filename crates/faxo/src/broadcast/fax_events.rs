//! Fax event broadcaster for real-time lifecycle streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::analyzer::DocumentInsights;
use crate::lifecycle::status::FaxStatus;

/// What happened to a fax.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FaxEventKind {
    Submitted,
    StatusChanged,
    Received,
    Deleted,
    AnalysisReady,
}

/// Lifecycle event for a fax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaxEvent {
    /// Fax this event belongs to.
    pub fax_id: String,
    /// Owner of the fax.
    pub owner_id: String,
    pub kind: FaxEventKind,
    /// Status after the event, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FaxStatus>,
    /// Status before the event, set on status changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<FaxStatus>,
    /// Error message, set when the new status carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Timestamp of this event.
    pub timestamp: DateTime<Utc>,
    /// Document insights, set on analysis completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<DocumentInsights>,
}

impl FaxEvent {
    fn base(fax_id: &str, owner_id: &str, kind: FaxEventKind) -> Self {
        Self {
            fax_id: fax_id.to_string(),
            owner_id: owner_id.to_string(),
            kind,
            status: None,
            previous_status: None,
            error: None,
            timestamp: Utc::now(),
            insights: None,
        }
    }

    /// Creates an event for a freshly submitted outbound fax.
    pub fn submitted(fax_id: &str, owner_id: &str, status: FaxStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::base(fax_id, owner_id, FaxEventKind::Submitted)
        }
    }

    /// Creates a status change event.
    pub fn status_changed(
        fax_id: &str,
        owner_id: &str,
        previous: FaxStatus,
        current: FaxStatus,
        error: Option<&str>,
    ) -> Self {
        Self {
            status: Some(current),
            previous_status: Some(previous),
            error: error.map(|e| e.to_string()),
            ..Self::base(fax_id, owner_id, FaxEventKind::StatusChanged)
        }
    }

    /// Creates an event for a received inbound fax.
    pub fn received(fax_id: &str, owner_id: &str) -> Self {
        Self {
            status: Some(FaxStatus::Delivered),
            ..Self::base(fax_id, owner_id, FaxEventKind::Received)
        }
    }

    /// Creates a deletion event.
    pub fn deleted(fax_id: &str, owner_id: &str) -> Self {
        Self::base(fax_id, owner_id, FaxEventKind::Deleted)
    }

    /// Creates an event carrying finished document insights.
    pub fn analysis_ready(fax_id: &str, owner_id: &str, insights: DocumentInsights) -> Self {
        Self {
            insights: Some(insights),
            ..Self::base(fax_id, owner_id, FaxEventKind::AnalysisReady)
        }
    }
}

/// Broadcasts fax lifecycle events for streaming.
#[derive(Clone)]
pub struct FaxEventBroadcaster {
    sender: Arc<broadcast::Sender<FaxEvent>>,
}

impl FaxEventBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: FaxEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber for fax events.
    pub fn subscribe(&self) -> broadcast::Receiver<FaxEvent> {
        self.sender.subscribe()
    }
}

impl Default for FaxEventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
