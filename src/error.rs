//! Error types for the `adama-rag` crate.

use thiserror::Error;

/// Errors surfaced to callers of the assistant pipeline.
///
/// Provider failures (embedding or generation) are deliberately absent:
/// they are recovered at the point of call and converted into fallback
/// values, never propagated. See [`ProviderError`] for the soft-failure
/// type used inside the pipeline.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The caller supplied invalid input (empty question, oversized
    /// question, missing title or content).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A document with the given ID does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The document store failed to execute an operation.
    #[error("Document store error ({backend}): {message}")]
    Store {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;

/// A failure from an external AI provider (embedding or generation).
///
/// This type never crosses the retriever or answer-generator boundary.
/// The only distinction that matters downstream is quota exhaustion
/// versus everything else, because the user-facing fallback message
/// differs — control flow does not.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider signalled quota exhaustion or rate limiting
    /// (HTTP 429 or a quota-style message).
    #[error("Provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other provider failure: network error, timeout, malformed
    /// or empty response.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Returns `true` if this failure is a quota / rate-limit condition.
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded(_))
    }

    /// Classify a provider failure from an HTTP status code and message.
    ///
    /// Status 429 or a message containing "quota", "429", or
    /// "too many requests" (case-insensitive) is treated as quota
    /// exhaustion; everything else as a generic unavailability.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        let quota = status == Some(429)
            || lowered.contains("quota")
            || lowered.contains("429")
            || lowered.contains("too many requests");
        if quota {
            ProviderError::QuotaExceeded(message)
        } else {
            ProviderError::Unavailable(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_detects_status_429() {
        assert!(ProviderError::classify(Some(429), "rate limited").is_quota());
    }

    #[test]
    fn classify_detects_quota_message_substrings() {
        assert!(ProviderError::classify(None, "Quota exceeded for model").is_quota());
        assert!(ProviderError::classify(None, "got 429 from upstream").is_quota());
        assert!(ProviderError::classify(Some(503), "Too Many Requests").is_quota());
    }

    #[test]
    fn classify_defaults_to_unavailable() {
        let err = ProviderError::classify(Some(500), "connection reset");
        assert!(!err.is_quota());
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
