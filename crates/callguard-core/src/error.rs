use thiserror::Error;

/// Invalid configuration detected while building a component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The failure-rate threshold is a percentage and must be at most 100.
    #[error("failure rate threshold must be within 0..=100, got {0}")]
    ThresholdOutOfRange(u8),

    /// A size, count or attempt limit that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    /// A required piece of configuration was not provided.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A settings value could not be interpreted.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
