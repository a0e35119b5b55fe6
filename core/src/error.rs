//! Error kinds surfaced by the harness.
//!
//! None of these are retried by the harness itself. Every failure of a load
//! or a probe run is wrapped in [`Failed`] together with whatever was
//! completed before it, so the caller decides whether partial state is
//! acceptable.

use std::fmt;

/// Terminal errors for a load or benchmark run.
#[derive(Debug)]
pub enum HarnessError {
    /// The load parameters or table description were rejected locally.
    /// Never reaches the database.
    InvalidSpec { reason: String },
    /// A batch round trip failed. `start_index` is the first row index of
    /// the failing batch.
    BatchLoadFailed {
        start_index: u64,
        cause: anyhow::Error,
    },
    /// A probe's statement failed.
    ProbeFailed { name: String, cause: anyhow::Error },
}

impl HarnessError {
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        HarnessError::InvalidSpec {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidSpec { reason } => write!(f, "invalid load spec: {reason}"),
            HarnessError::BatchLoadFailed { start_index, cause } => {
                write!(f, "batch starting at row {start_index} failed: {cause}")
            }
            HarnessError::ProbeFailed { name, cause } => {
                write!(f, "probe '{name}' failed: {cause}")
            }
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::InvalidSpec { .. } => None,
            HarnessError::BatchLoadFailed { cause, .. } => Some(&**cause),
            HarnessError::ProbeFailed { cause, .. } => Some(&**cause),
        }
    }
}

/// A failed run together with the results recorded before the failure.
#[derive(Debug)]
pub struct Failed<T> {
    pub partial: T,
    pub error: HarnessError,
}

impl<T> Failed<T> {
    pub fn new(partial: T, error: HarnessError) -> Self {
        Self { partial, error }
    }

    /// Replace the partial payload, keeping the error.
    pub fn map_partial<U>(self, f: impl FnOnce(T) -> U) -> Failed<U> {
        Failed {
            partial: f(self.partial),
            error: self.error,
        }
    }
}

impl<T> fmt::Display for Failed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<T: fmt::Debug> std::error::Error for Failed<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn batch_failure_message_names_start_index() {
        let err = HarnessError::BatchLoadFailed {
            start_index: 80_000,
            cause: anyhow::anyhow!("disk full"),
        };
        assert_eq!(
            err.to_string(),
            "batch starting at row 80000 failed: disk full"
        );
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
    }

    #[test]
    fn invalid_spec_has_no_source() {
        let err = HarnessError::invalid_spec("batch size must be positive");
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "invalid load spec: batch size must be positive");
    }

    #[test]
    fn failed_keeps_partial_when_mapped() {
        let failed = Failed::new(
            3u64,
            HarnessError::ProbeFailed {
                name: "lookup".into(),
                cause: anyhow::anyhow!("syntax error"),
            },
        );
        let mapped = failed.map_partial(|n| vec![0u8; n as usize]);
        assert_eq!(mapped.partial.len(), 3);
        assert_eq!(mapped.to_string(), "probe 'lookup' failed: syntax error");
    }
}
