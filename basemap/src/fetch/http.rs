//! HTTP client abstraction for testability

use std::time::Duration;

use super::FetchError;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for HTTP GET operations.
///
/// This seam allows the download pipeline to run against a mock client in
/// tests without touching the network.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request, returning the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Real HTTP client implementation using reqwest's blocking API.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a client with the default 30 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("basemap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// The configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Network(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Network(format!("failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock HTTP client for tests.
    ///
    /// Replays a scripted sequence of responses; once the script is
    /// exhausted the final entry repeats. A single-entry script behaves
    /// like a constant responder.
    pub struct MockHttpClient {
        script: Mutex<Vec<Result<Vec<u8>, FetchError>>>,
        calls: AtomicUsize,
    }

    impl MockHttpClient {
        /// Responds identically to every request.
        pub fn always(response: Result<Vec<u8>, FetchError>) -> Self {
            Self::scripted(vec![response])
        }

        /// Replays `script` in order, repeating the last entry forever.
        pub fn scripted(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
            assert!(!script.is_empty(), "mock script must not be empty");
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of GET calls made so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let script = self.script.lock().unwrap();
            script[index.min(script.len() - 1)].clone()
        }
    }

    #[test]
    fn test_mock_client_constant_response() {
        let mock = MockHttpClient::always(Ok(vec![1, 2, 3, 4]));
        assert_eq!(mock.get("http://example.com").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.get("http://example.com").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_mock_client_scripted_sequence() {
        let mock = MockHttpClient::scripted(vec![
            Err(FetchError::EmptyBody),
            Err(FetchError::BadMagic),
            Ok(vec![9]),
        ]);

        assert!(mock.get("u").is_err());
        assert!(mock.get("u").is_err());
        assert_eq!(mock.get("u").unwrap(), vec![9]);
        // Script exhausted: last entry repeats
        assert_eq!(mock.get("u").unwrap(), vec![9]);
    }

    #[test]
    fn test_reqwest_client_constructs() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}
