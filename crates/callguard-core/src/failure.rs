use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy for a call to a remote dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum FailureKind {
    /// 4xx-class response: the caller's fault, not the dependency's.
    ClientError,
    /// 5xx-class response or transport failure.
    ServerError,
    /// The call exceeded its deadline.
    Timeout,
    /// The caller aborted the call.
    Cancelled,
    /// The circuit breaker denied the call; the dependency was never reached.
    CircuitOpen,
}

impl FailureKind {
    /// All kinds, in declaration order.
    pub const ALL: [FailureKind; 5] = [
        FailureKind::ClientError,
        FailureKind::ServerError,
        FailureKind::Timeout,
        FailureKind::Cancelled,
        FailureKind::CircuitOpen,
    ];

    /// Stable lowercase tag, used for metric labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ClientError => "client_error",
            FailureKind::ServerError => "server_error",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::CircuitOpen => "circuit_open",
        }
    }

    /// Whether this kind says something about the health of the dependency
    /// itself, as opposed to the caller or the breaker.
    pub fn is_dependency_fault(&self) -> bool {
        matches!(self, FailureKind::ServerError | FailureKind::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed call failure: the kind, an optional HTTP status and a detail message.
///
/// Classification, retry predicates and fallback selection all operate on
/// this value instead of on panics or language-level exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct CallFailure {
    kind: FailureKind,
    status: Option<u16>,
    detail: String,
}

impl CallFailure {
    /// Creates a failure of the given kind.
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            detail: detail.into(),
        }
    }

    /// Maps an HTTP status code to a failure.
    ///
    /// 4xx maps to [`FailureKind::ClientError`]; everything else (5xx and
    /// anything unexpected) maps to [`FailureKind::ServerError`].
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let kind = if (400..500).contains(&status) {
            FailureKind::ClientError
        } else {
            FailureKind::ServerError
        };
        Self {
            kind,
            status: Some(status),
            detail: detail.into(),
        }
    }

    /// A 5xx-class failure without a status code (e.g. connection refused).
    pub fn server_error(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ServerError, detail)
    }

    /// A 4xx-class failure without a status code.
    pub fn client_error(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ClientError, detail)
    }

    /// The call exceeded `deadline`.
    pub fn timeout(deadline: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("call exceeded deadline of {:?}", deadline),
        )
    }

    /// The caller aborted the call.
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "call cancelled by caller")
    }

    /// The breaker for `key` denied the call.
    pub fn circuit_open(key: impl fmt::Display) -> Self {
        Self::new(
            FailureKind::CircuitOpen,
            format!("circuit for {} is open; call not permitted", key),
        )
    }

    /// Returns the failure kind.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the HTTP status, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the detail message.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

/// Classified result of one logical call, as seen by a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallOutcome {
    Success,
    Failure,
}

impl CallOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failure)
    }
}
