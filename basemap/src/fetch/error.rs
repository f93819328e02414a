//! Fetch error taxonomy.

use std::time::Duration;

/// Failure of a single tile fetch attempt.
///
/// Everything except [`FetchError::Cancelled`] is retryable: network
/// conditions, server hiccups and truncated payloads are all transient from
/// the coordinator's point of view. Validation failures (bad magic, wrong
/// dimensions) share the retry budget with network failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Non-2xx response status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The per-attempt timeout elapsed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// 2xx response with an empty body.
    #[error("empty response body")]
    EmptyBody,

    /// Payload does not start with a recognised raster magic header.
    #[error("payload is not a recognisable raster image")]
    BadMagic,

    /// Payload header could not be decoded for its dimensions.
    #[error("undecodable payload: {0}")]
    Decode(String),

    /// Decoded dimensions differ from the scheme's tile size.
    #[error("tile is {width}x{height}, expected {expected}x{expected}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: u32,
    },

    /// The operation was cancelled by the caller. Never retried.
    #[error("download cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether the coordinator may spend another attempt on this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_not_retryable() {
        assert!(!FetchError::Cancelled.is_retryable());
    }

    #[test]
    fn test_transient_failures_are_retryable() {
        let errors = [
            FetchError::Http {
                status: 503,
                url: "http://example.com/1/2/3".to_string(),
            },
            FetchError::Network("connection reset".to_string()),
            FetchError::Timeout(Duration::from_secs(30)),
            FetchError::EmptyBody,
            FetchError::BadMagic,
            FetchError::Decode("truncated".to_string()),
            FetchError::DimensionMismatch {
                width: 128,
                height: 128,
                expected: 256,
            },
        ];
        for error in errors {
            assert!(error.is_retryable(), "{} should be retryable", error);
        }
    }

    #[test]
    fn test_display_includes_context() {
        let error = FetchError::Http {
            status: 404,
            url: "http://tiles.example.com/9/1/2.png".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("tiles.example.com"));
    }
}
