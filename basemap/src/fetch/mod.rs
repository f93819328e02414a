//! Tile fetching.
//!
//! A single-attempt, validating tile download. Retry policy lives in the
//! download coordinator; the fetcher only distinguishes retryable failures
//! from cancellation.

mod error;
mod http;
mod tile;

pub use error::FetchError;
pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT};
pub use tile::TileFetcher;

#[cfg(test)]
pub use http::tests::MockHttpClient;
