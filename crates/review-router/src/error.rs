//! Error types for language-model calls.
//!
//! Everything else in the crate reports failures through `anyhow`, but LLM
//! calls need a typed error so the retry policy can tell an overloaded
//! upstream apart from a request that will never succeed.

/// Failure of a single language-model completion call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("model overloaded (HTTP {status}): {body}")]
    Overloaded { status: u16, body: String },

    #[error("rate limited: {body}")]
    RateLimited { body: String },

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("connection failed: {reason}")]
    Connection { reason: String },

    #[error("API rejected request (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("language model not configured: {reason}")]
    NotConfigured { reason: String },
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Overloaded { .. }
                | LlmError::RateLimited { .. }
                | LlmError::Timeout { .. }
                | LlmError::Connection { .. }
        )
    }

    /// Map an HTTP status and body to the matching variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => LlmError::RateLimited { body },
            500..=599 => LlmError::Overloaded { status, body },
            _ => LlmError::Api { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            LlmError::from_status(503, String::new()),
            LlmError::Overloaded { status: 503, .. }
        ));
        assert!(matches!(
            LlmError::from_status(429, String::new()),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            LlmError::from_status(400, String::new()),
            LlmError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::from_status(500, "boom".into()).is_transient());
        assert!(LlmError::Timeout { secs: 30 }.is_transient());
        assert!(!LlmError::from_status(401, "bad key".into()).is_transient());
        assert!(!LlmError::MalformedResponse { reason: "x".into() }.is_transient());
    }
}
