use callguard_core::{CallFailure, DependencyKey, FailureKind};
use std::fmt;

/// Message carried by responses from the process-wide default.
pub const SERVICE_UNAVAILABLE: &str = "Fallback: Service unavailable";

/// Which lookup step produced a degraded response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackPath {
    /// A handler registered for the exact failure kind.
    Kind,
    /// The key's default handler.
    KeyDefault,
    /// The process-wide default.
    Global,
}

impl FallbackPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackPath::Kind => "kind",
            FallbackPath::KeyDefault => "key_default",
            FallbackPath::Global => "global",
        }
    }
}

impl fmt::Display for FallbackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A substitute response, tagged with the failure that caused it.
///
/// Never indistinguishable from a genuine success: the originating kind,
/// failure and fallback path always travel with the value.
#[derive(Debug, Clone)]
pub struct DegradedResponse<T> {
    key: DependencyKey,
    failure: CallFailure,
    path: FallbackPath,
    value: Option<T>,
}

impl<T> DegradedResponse<T> {
    pub(crate) fn new(
        key: DependencyKey,
        failure: CallFailure,
        path: FallbackPath,
        value: Option<T>,
    ) -> Self {
        Self {
            key,
            failure,
            path,
            value,
        }
    }

    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// The failure kind that triggered the fallback.
    pub fn kind(&self) -> FailureKind {
        self.failure.kind()
    }

    /// The failure that triggered the fallback.
    pub fn failure(&self) -> &CallFailure {
        &self.failure
    }

    pub fn path(&self) -> FallbackPath {
        self.path
    }

    /// The substitute value. `None` when the process-wide default had no
    /// value producer, in which case [`message`](Self::message) describes it.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// A human-readable summary of the degradation.
    pub fn message(&self) -> &str {
        match self.path {
            FallbackPath::Global => SERVICE_UNAVAILABLE,
            FallbackPath::Kind | FallbackPath::KeyDefault => self.failure.detail(),
        }
    }

    pub fn map<U, F>(self, f: F) -> DegradedResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        DegradedResponse {
            key: self.key,
            failure: self.failure,
            path: self.path,
            value: self.value.map(f),
        }
    }
}

impl<T> fmt::Display for DegradedResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "degraded response for {} ({}, via {}): {}",
            self.key,
            self.kind(),
            self.path,
            self.message()
        )
    }
}
