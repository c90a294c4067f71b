//! Fetch abstraction layer for mapwatch.
//!
//! Provides the [`Fetch`] trait that the client polls through, keeping
//! the library core independent of any concrete HTTP stack. Tests plug
//! in scripted in-memory implementations; production code uses the
//! `reqwest`-backed [`HttpFetch`].
//!
//! # Feature flags
//!
//! - `http` (default) — HTTP implementation via `reqwest`

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpFetch;

use std::future::Future;

/// A request/response fetch capability: one URL in, one body out.
///
/// There is deliberately no retry or backoff here — the polling layer's
/// policy is to skip a failed cycle and rely on the next timer tick.
///
/// The futures are `Send` because implementations are driven from
/// spawned per-world poll tasks.
pub trait Fetch: Send + Sync + 'static {
    /// Fetches the raw response body as text.
    fn fetch_text(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Fetches the response body parsed as JSON.
    fn fetch_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<serde_json::Value, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A canned fetcher that serves fixed bodies regardless of URL.
    struct Canned {
        text: String,
        json: serde_json::Value,
    }

    impl Fetch for Canned {
        async fn fetch_text(&self, _url: &str) -> Result<String, TransportError> {
            Ok(self.text.clone())
        }

        async fn fetch_json(
            &self,
            _url: &str,
        ) -> Result<serde_json::Value, TransportError> {
            Ok(self.json.clone())
        }
    }

    #[tokio::test]
    async fn test_fetch_trait_usable_with_in_memory_impl() {
        let f = Canned {
            text: "hello".into(),
            json: serde_json::json!({ "ok": true }),
        };
        assert_eq!(f.fetch_text("http://x/").await.unwrap(), "hello");
        assert_eq!(
            f.fetch_json("http://x/").await.unwrap()["ok"],
            serde_json::Value::Bool(true)
        );
    }

    #[test]
    fn test_error_display_status() {
        let err = TransportError::Status {
            code: 503,
            url: "http://map/up/world/world1/0".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("/up/world/world1/0"));
    }

    #[test]
    fn test_error_display_invalid_body() {
        let err = TransportError::InvalidBody {
            url: "http://map/up/configuration".into(),
            message: "expected value at line 1".into(),
        };
        assert!(err.to_string().contains("invalid body"));
    }
}
