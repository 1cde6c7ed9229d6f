//! Events emitted by the fallback dispatcher.

use crate::response::FallbackPath;
use callguard_core::{FailureKind, ResilienceEvent};
use std::time::Instant;

/// Events emitted by the fallback dispatcher.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// A degraded response was produced.
    Applied {
        /// Dependency key the call targeted.
        key: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Failure kind that triggered the fallback.
        kind: FailureKind,
        /// Which handler produced the response.
        path: FallbackPath,
    },

    /// A registered handler returned an error or panicked; dispatch moved on
    /// to the process-wide default.
    HandlerFailed {
        key: String,
        timestamp: Instant,
        kind: FailureKind,
        /// The path whose handler failed.
        path: FallbackPath,
        reason: String,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::HandlerFailed { .. } => "handler_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Applied { timestamp, .. } | Self::HandlerFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            Self::Applied { key, .. } | Self::HandlerFailed { key, .. } => key,
        }
    }
}
