//! Tracking Error Types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackingError {
    /// A backend failed while handling an event. The remaining trackers of
    /// that fan-out pass are not invoked.
    #[error("Tracker '{tracker}' failed: {source}")]
    Tracker {
        tracker: String,
        #[source]
        source: anyhow::Error,
    },

    /// The order could not be persisted before checkout-complete dispatch.
    #[error("Order persistence failed: {0}")]
    OrderPersistence(#[source] anyhow::Error),

    /// Neither a request-bound session nor a held fallback session exists.
    #[error("No session available to receive tracked codes")]
    NoSession,
}

impl TrackingError {
    pub fn tracker(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Tracker {
            tracker: name.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;
