//! Fax transmission statuses and the legal moves between them.

use serde::{Deserialize, Serialize};

/// Status of a fax transmission.
///
/// Outbound faxes walk `Pending -> Queued -> Processing -> Sending` and
/// then settle on an outcome. `Delivered`, `Failed` and `Error` are
/// terminal; everything else counts as in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FaxStatus {
    Pending,
    Queued,
    Processing,
    Sending,
    Sent,
    Delivered,
    Failed,
    Error,
}

impl FaxStatus {
    /// Storage representation, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaxStatus::Pending => "pending",
            FaxStatus::Queued => "queued",
            FaxStatus::Processing => "processing",
            FaxStatus::Sending => "sending",
            FaxStatus::Sent => "sent",
            FaxStatus::Delivered => "delivered",
            FaxStatus::Failed => "failed",
            FaxStatus::Error => "error",
        }
    }

    /// Terminal statuses never change again (except through a retry,
    /// which is a separate operation, not a transition).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FaxStatus::Delivered | FaxStatus::Failed | FaxStatus::Error
        )
    }

    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }

    /// Only failed and errored faxes can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FaxStatus::Failed | FaxStatus::Error)
    }

    /// Whether a single transition from `self` to `target` is legal.
    pub fn can_advance_to(self, target: FaxStatus) -> bool {
        use FaxStatus::*;
        match (self, target) {
            (Pending, Queued) => true,
            (Queued, Processing) => true,
            (Processing, Sending) => true,
            (Sending, Sent) => true,
            (Sending, Delivered) => true,
            (Sending, Error) => true,
            (Sent, Delivered) => true,
            // Any in-flight fax may fail.
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Next step on the dispatch path, if `self` is still before the
    /// outcome fork.
    pub fn next_dispatch_step(self) -> Option<FaxStatus> {
        match self {
            FaxStatus::Pending => Some(FaxStatus::Queued),
            FaxStatus::Queued => Some(FaxStatus::Processing),
            FaxStatus::Processing => Some(FaxStatus::Sending),
            _ => None,
        }
    }
}

impl std::fmt::Display for FaxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaxStatus::Pending => write!(f, "Pending"),
            FaxStatus::Queued => write!(f, "Queued"),
            FaxStatus::Processing => write!(f, "Processing"),
            FaxStatus::Sending => write!(f, "Sending"),
            FaxStatus::Sent => write!(f, "Sent"),
            FaxStatus::Delivered => write!(f, "Delivered"),
            FaxStatus::Failed => write!(f, "Failed"),
            FaxStatus::Error => write!(f, "Error"),
        }
    }
}

/// Parses a stored status string, defaulting to `Pending` with a warning
/// on unknown values.
pub fn parse_status(s: &str, fax_id: &str) -> FaxStatus {
    match s {
        "pending" => FaxStatus::Pending,
        "queued" => FaxStatus::Queued,
        "processing" => FaxStatus::Processing,
        "sending" => FaxStatus::Sending,
        "sent" => FaxStatus::Sent,
        "delivered" => FaxStatus::Delivered,
        "failed" => FaxStatus::Failed,
        "error" => FaxStatus::Error,
        other => {
            log::warn!(
                "Unknown fax status '{}' for fax {}, defaulting to Pending",
                other,
                fax_id
            );
            FaxStatus::Pending
        }
    }
}
