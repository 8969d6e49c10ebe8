use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Lineage service unreachable: {0}")]
    Transport(String),

    #[error("Lineage service request timed out")]
    Timeout,

    #[error("Lineage service returned unexpected status {status}")]
    Status { status: u16 },

    #[error("Enrichment cancelled")]
    Cancelled,

    #[error("Transformer {0} already flushed, no further input accepted")]
    Exhausted(&'static str),

    #[error("Extractor error: {0}")]
    Extract(anyhow::Error),

    #[error("Loader error: {0}")]
    Load(anyhow::Error),

    #[error("Transformer error: {0}")]
    Transform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// One record an extractor could not decode. The extractor stays usable and
/// the next `extract` call moves on to the following record.
#[derive(Debug, Error)]
#[error("Invalid record at {location}: {reason}")]
pub struct InvalidRecord {
    pub location: String,
    pub reason: String,
}

impl Error {
    /// Whether an extractor failure concerns a single record rather than the
    /// extractor itself.
    #[must_use]
    pub fn is_invalid_record(&self) -> bool {
        matches!(self, Self::Extract(e) if e.is::<InvalidRecord>())
    }

    /// Whether the failure happened on the way to the lineage service and is
    /// worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure belongs to the transport class, as opposed to an
    /// answer from the service.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout | Self::Status { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(Error::Status { status: 503 }.is_retryable());
        assert!(Error::Status { status: 429 }.is_retryable());
        assert!(!Error::Status { status: 401 }.is_retryable());
        assert!(Error::Timeout.is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn cancellation_is_not_a_transport_failure() {
        assert!(Error::Transport("refused".to_string()).is_transport());
        assert!(!Error::Cancelled.is_transport());
    }

    #[test]
    fn only_undecodable_records_are_per_record_extract_failures() {
        let bad = Error::Extract(anyhow::Error::new(InvalidRecord {
            location: "in.jsonl:2".to_string(),
            reason: "unknown kind".to_string(),
        }));
        assert!(bad.is_invalid_record());
        assert!(bad.to_string().contains("in.jsonl:2"));
        assert!(!Error::Extract(anyhow::anyhow!("catalog gone")).is_invalid_record());
    }
}
