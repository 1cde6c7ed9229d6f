use callguard_core::FailureKind;
use callguard_fallback::DegradedResponse;

/// What the caller gets back from a protected call.
///
/// Never an error: a failure or denial is always turned into a tagged
/// [`DegradedResponse`].
#[derive(Debug, Clone)]
pub enum Response<T> {
    /// The dependency answered successfully.
    Success(T),
    /// The call was denied or failed; a fallback produced this instead.
    Degraded(DegradedResponse<T>),
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Response::Degraded(_))
    }

    /// The failure kind behind a degraded response.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Response::Success(_) => None,
            Response::Degraded(degraded) => Some(degraded.kind()),
        }
    }

    /// The real value, or the fallback's value if it produced one.
    pub fn value(&self) -> Option<&T> {
        match self {
            Response::Success(value) => Some(value),
            Response::Degraded(degraded) => degraded.value(),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Response::Success(value) => Some(value),
            Response::Degraded(degraded) => degraded.into_value(),
        }
    }

    pub fn degraded(&self) -> Option<&DegradedResponse<T>> {
        match self {
            Response::Success(_) => None,
            Response::Degraded(degraded) => Some(degraded),
        }
    }

    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Response::Success(value) => Response::Success(f(value)),
            Response::Degraded(degraded) => Response::Degraded(degraded.map(f)),
        }
    }
}
