//! HTTP transport implementation.
//!
//! This module provides an HTTP-based transport for the score queue.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, ureq, etc.).

use crate::error::TransportError;
use crate::transport::ScoreTransport;
use fairway_score_protocol::{PostScoreArgs, PostScoreResult};

/// Header carrying the client request id; the score service uses it to
/// correlate retries in its own logs.
pub const CLIENT_REQ_ID_HEADER: &str = "X-Client-Req-Id";

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. `Err` is
/// reserved for calls that never produced a response; any response,
/// whatever its status, comes back as `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response.
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response from a status and body.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }
}

/// HTTP-based score transport.
///
/// Posts JSON mutations to `{base_url}/events/{event_id}/score` and maps
/// the response onto the result protocol: a 2xx body decodes as the
/// server's verdict, 409 and 422 are mined for an authoritative revision,
/// and every other status is a plain failure verdict left to the queue's
/// backoff handling.
pub struct HttpScoreTransport<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpScoreTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn score_url(&self, event_id: &str) -> String {
        format!("{}/events/{}/score", self.base_url, event_id)
    }
}

impl<C: HttpClient> ScoreTransport for HttpScoreTransport<C> {
    fn post_score(&self, args: &PostScoreArgs) -> Result<PostScoreResult, TransportError> {
        if !self.client.is_healthy() {
            return Err(TransportError::network("http client is not healthy"));
        }

        let body = serde_json::to_vec(args)
            .map_err(|e| TransportError::codec(format!("failed to encode score mutation: {e}")))?;

        let url = self.score_url(&args.event_id);
        let headers = [
            ("Content-Type", "application/json"),
            (CLIENT_REQ_ID_HEADER, args.event_id.as_str()),
        ];
        let response = self
            .client
            .post(&url, &headers, body)
            .map_err(TransportError::Network)?;

        match response.status {
            status if (200..300).contains(&status) => serde_json::from_slice(&response.body)
                .map_err(|e| {
                    TransportError::codec(format!("failed to decode score response: {e}"))
                }),
            status @ (409 | 422) => Ok(conflict_from_body(status, &response.body)),
            status => Ok(PostScoreResult::failure(Some(status))),
        }
    }
}

/// Interprets a conflict-status body.
///
/// The service reports its authoritative revision either as a top-level
/// `currentRevision` or nested under `current.revision`. Without a
/// numeric revision there is nothing to bump to, so the conflict
/// degrades to a plain failure verdict.
fn conflict_from_body(status: u16, body: &[u8]) -> PostScoreResult {
    let Ok(detail) = serde_json::from_slice::<serde_json::Value>(body) else {
        return PostScoreResult::failure(Some(status));
    };

    let current_revision = detail
        .get("currentRevision")
        .and_then(serde_json::Value::as_u64)
        .or_else(|| {
            detail
                .get("current")
                .and_then(|current| current.get("revision"))
                .and_then(serde_json::Value::as_u64)
        });

    match current_revision {
        Some(current_revision) => PostScoreResult::ConflictRetryable {
            current_revision,
            reason: detail
                .get("reason")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("STALE_OR_DUPLICATE")
                .to_string(),
            status: Some(status),
        },
        None => PostScoreResult::failure(Some(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairway_score_protocol::{Fingerprint, FingerprintSalt};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct SeenRequest {
        url: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    struct TestClient {
        reply: Mutex<Option<Result<HttpResponse, String>>>,
        healthy: AtomicBool,
        seen: Mutex<Vec<SeenRequest>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                reply: Mutex::new(None),
                healthy: AtomicBool::new(true),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn replying(status: u16, body: serde_json::Value) -> Self {
            let client = Self::new();
            client.set_reply(Ok(HttpResponse::new(status, body.to_string().into_bytes())));
            client
        }

        fn set_reply(&self, reply: Result<HttpResponse, String>) {
            *self.reply.lock() = Some(reply);
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }
    }

    impl HttpClient for TestClient {
        fn post(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: Vec<u8>,
        ) -> Result<HttpResponse, String> {
            self.seen.lock().push(SeenRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                body,
            });
            self.reply
                .lock()
                .clone()
                .unwrap_or_else(|| Err("no reply set".into()))
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn args() -> PostScoreArgs {
        PostScoreArgs {
            event_id: "evt-42".into(),
            scorecard_id: "card-1".into(),
            hole: 7,
            strokes: 4,
            putts: Some(2),
            revision: 3,
            fingerprint: Fingerprint::derive(
                FingerprintSalt::from_bits(1),
                "card-1",
                7,
                4,
                Some(2),
                3,
            ),
        }
    }

    #[test]
    fn posts_json_to_the_event_score_url() {
        let transport = HttpScoreTransport::new(
            "https://api.example.com",
            TestClient::replying(200, json!({"ok": true, "revision": 3})),
        );
        assert_eq!(transport.base_url(), "https://api.example.com");

        let result = transport.post_score(&args()).unwrap();
        assert_eq!(result, PostScoreResult::success(3));

        let seen = transport.client.seen.lock();
        assert_eq!(seen[0].url, "https://api.example.com/events/evt-42/score");
        assert!(seen[0]
            .headers
            .contains(&("Content-Type".into(), "application/json".into())));
        assert!(seen[0]
            .headers
            .contains(&(CLIENT_REQ_ID_HEADER.into(), "evt-42".into())));

        let sent: PostScoreArgs = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(sent, args());
    }

    #[test]
    fn malformed_success_body_is_a_codec_error() {
        let client = TestClient::new();
        client.set_reply(Ok(HttpResponse::new(200, b"not json".to_vec())));
        let transport = HttpScoreTransport::new("https://api.example.com", client);

        assert!(matches!(
            transport.post_score(&args()),
            Err(TransportError::Codec(_))
        ));
    }

    #[test]
    fn conflict_with_top_level_revision() {
        let transport = HttpScoreTransport::new(
            "https://api.example.com",
            TestClient::replying(409, json!({"currentRevision": 2, "reason": "stale write"})),
        );

        let result = transport.post_score(&args()).unwrap();
        assert_eq!(
            result,
            PostScoreResult::ConflictRetryable {
                current_revision: 2,
                reason: "stale write".into(),
                status: Some(409),
            }
        );
    }

    #[test]
    fn conflict_with_nested_revision() {
        let transport = HttpScoreTransport::new(
            "https://api.example.com",
            TestClient::replying(422, json!({"current": {"revision": 7}})),
        );

        let result = transport.post_score(&args()).unwrap();
        assert_eq!(
            result,
            PostScoreResult::ConflictRetryable {
                current_revision: 7,
                reason: "STALE_OR_DUPLICATE".into(),
                status: Some(422),
            }
        );
    }

    #[test]
    fn conflict_without_revision_degrades_to_failure() {
        let transport = HttpScoreTransport::new(
            "https://api.example.com",
            TestClient::replying(409, json!({"error": "conflict"})),
        );

        let result = transport.post_score(&args()).unwrap();
        assert_eq!(result, PostScoreResult::failure(Some(409)));
    }

    #[test]
    fn other_statuses_are_failure_verdicts() {
        for status in [400, 429, 500, 503] {
            let transport = HttpScoreTransport::new(
                "https://api.example.com",
                TestClient::replying(status, json!({})),
            );
            assert_eq!(
                transport.post_score(&args()).unwrap(),
                PostScoreResult::failure(Some(status)),
            );
        }
    }

    #[test]
    fn client_failure_is_a_network_error() {
        let client = TestClient::new();
        client.set_reply(Err("connection refused".into()));
        let transport = HttpScoreTransport::new("https://api.example.com", client);

        assert_eq!(
            transport.post_score(&args()),
            Err(TransportError::network("connection refused"))
        );
    }

    #[test]
    fn unhealthy_client_short_circuits() {
        let client = TestClient::new();
        client.set_healthy(false);
        let transport = HttpScoreTransport::new("https://api.example.com", client);

        assert!(matches!(
            transport.post_score(&args()),
            Err(TransportError::Network(_))
        ));
        assert!(transport.client.seen.lock().is_empty());
    }
}
