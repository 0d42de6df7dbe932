//! Two-stage mirror list relay.
//!
//! ## Flow
//!
//! ```text
//! GET mirrors_url → {"targets": <json>} → POST relay_url → raw response body
//! ```
//!
//! The forward stage depends on the fetched document, so the two calls always
//! run in order. Neither stage is retried.

pub mod error;

use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use reqwest::Client;
use serde::Serialize;
use serde_json::value::RawValue;
use tracing::{info, warn};
use url::Url;

use crate::config::{AccessToken, Config};

pub use error::{RelayCause, RelayError, RelayStage};

/// Header carrying the relay target's access token.
pub const HEADER_ACCESS_TOKEN: &str = "Access-Token";

/// Body posted in the forward stage.
///
/// `targets` is the fetched document, kept as the exact JSON text received
/// so key order and number precision survive the relay.
#[derive(Debug, Serialize)]
pub struct RelayEnvelope {
    pub targets: Box<RawValue>,
}

/// Response from the relay target, passed back to the webhook caller.
#[derive(Debug)]
pub struct Relayed {
    /// Downstream status. Informational only; the body is relayed regardless.
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Outbound half of the service: fetch the mirror list, then forward it.
#[derive(Clone)]
pub struct RelayPipeline {
    client: Client,
    mirrors_url: Url,
    relay_url: Url,
    access_token: AccessToken,
}

impl RelayPipeline {
    /// Create a pipeline around an existing HTTP client.
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            mirrors_url: config.mirrors_url.clone(),
            relay_url: config.relay_url.clone(),
            access_token: config.access_token.clone(),
        }
    }

    /// Create a pipeline with its own pooled client, honouring the configured
    /// request timeout if any.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?, config))
    }

    /// Run both stages and return the relay target's response.
    pub async fn relay(&self) -> Result<Relayed, RelayError> {
        let targets = self.fetch_targets().await?;
        self.forward(&RelayEnvelope { targets }).await
    }

    async fn fetch_targets(&self) -> Result<Box<RawValue>, RelayError> {
        info!(url = %self.mirrors_url, "mirrors_fetch_starting");

        let response = self
            .client
            .get(self.mirrors_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(RelayError::FetchTransport)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(RelayError::FetchTransport)?;
        let targets: Box<RawValue> =
            serde_json::from_slice(&body).map_err(RelayError::FetchDecode)?;

        info!(
            status_code = status,
            body_length = body.len(),
            "mirrors_fetch_complete"
        );

        Ok(targets)
    }

    async fn forward(&self, envelope: &RelayEnvelope) -> Result<Relayed, RelayError> {
        info!(url = %self.relay_url, "mirrors_forward_starting");

        let response = self
            .client
            .post(self.relay_url.clone())
            .header(HEADER_ACCESS_TOKEN, self.access_token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .json(envelope)
            .send()
            .await
            .map_err(RelayError::ForwardTransport)?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(RelayError::ForwardTransport)?;

        if status.is_success() {
            info!(
                status_code = status.as_u16(),
                body_length = body.len(),
                "mirrors_forward_complete"
            );
        } else {
            // Relayed as-is; callers see the target's error body with a 200.
            warn!(
                status_code = status.as_u16(),
                body_length = body.len(),
                "mirrors_forward_non_success"
            );
        }

        Ok(Relayed {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::Secret;

    fn test_config(mirrors_url: &str, relay_url: &str) -> Config {
        Config {
            secret: Secret::new("abc"),
            access_token: AccessToken::new("token-123"),
            debug: false,
            host: "127.0.0.1".to_string(),
            port: 0,
            mirrors_url: Url::parse(mirrors_url).unwrap(),
            relay_url: Url::parse(relay_url).unwrap(),
            request_timeout: None,
        }
    }

    fn pipeline_for(server: &MockServer) -> RelayPipeline {
        let config = test_config(
            &format!("{}/mirrors.json", server.uri()),
            &format!("{}/api/mirrors", server.uri()),
        );
        RelayPipeline::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_relay_fetches_then_forwards() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["mirrorA","mirrorB"]"#))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/mirrors"))
            .and(header("Access-Token", "token-123"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"targets": ["mirrorA", "mirrorB"]})))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let relayed = pipeline_for(&server).relay().await.unwrap();

        assert_eq!(relayed.status, StatusCode::OK);
        assert_eq!(&relayed.body[..], b"OK");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method.as_str(), "GET");
        assert_eq!(requests[0].url.path(), "/mirrors.json");
        assert_eq!(requests[1].method.as_str(), "POST");
        assert_eq!(requests[1].url.path(), "/api/mirrors");
    }

    #[tokio::test]
    async fn test_relay_passes_targets_through_unchanged() {
        let server = MockServer::start().await;
        let document = json!([
            {"name": "ubuntu", "url": "http://mirrors.example.org/ubuntu", "tags": null},
            {"name": "arch", "extra": {"weight": 3, "enabled": false}},
            42,
            "plain"
        ]);

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document.clone()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/mirrors"))
            .and(body_json(json!({ "targets": document })))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .expect(1)
            .mount(&server)
            .await;

        let relayed = pipeline_for(&server).relay().await.unwrap();
        assert_eq!(relayed.status, StatusCode::CREATED);
        assert_eq!(&relayed.body[..], b"created");
    }

    #[tokio::test]
    async fn test_relay_forwards_fetched_text_byte_for_byte() {
        let server = MockServer::start().await;
        // Unsorted keys and an integer wider than 64 bits
        let document = r#"[{"name":"tuna","alpha":1,"id":123456789012345678901234567890},{"z":1.10,"a":[]}]"#;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(document, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/mirrors"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        pipeline_for(&server).relay().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let posted = String::from_utf8(requests[1].body.clone()).unwrap();
        assert_eq!(posted, format!(r#"{{"targets":{}}}"#, document));
    }

    #[tokio::test]
    async fn test_fetch_http_error_skips_forward() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = pipeline_for(&server).relay().await.unwrap_err();

        assert!(matches!(err, RelayError::FetchTransport(_)));
        assert_eq!(err.stage(), RelayStage::Fetch);
        assert_eq!(err.cause(), RelayCause::Transport);
    }

    #[tokio::test]
    async fn test_fetch_invalid_json_skips_forward() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = pipeline_for(&server).relay().await.unwrap_err();

        assert!(matches!(err, RelayError::FetchDecode(_)));
        assert_eq!(err.cause(), RelayCause::Decode);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 1
        let config = test_config("http://127.0.0.1:1/mirrors.json", "http://127.0.0.1:1/api");
        let err = RelayPipeline::from_config(&config)
            .unwrap()
            .relay()
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::FetchTransport(_)));
    }

    #[tokio::test]
    async fn test_forward_connection_refused() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(
            &format!("{}/mirrors.json", server.uri()),
            "http://127.0.0.1:1/api/mirrors",
        );
        let err = RelayPipeline::from_config(&config)
            .unwrap()
            .relay()
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::ForwardTransport(_)));
        assert_eq!(err.stage(), RelayStage::Forward);
        assert_eq!(err.cause(), RelayCause::Transport);
    }

    #[tokio::test]
    async fn test_forward_error_status_is_relayed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/mirrors"))
            .respond_with(
                ResponseTemplate::new(401).set_body_raw(r#"{"error":"bad token"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let relayed = pipeline_for(&server).relay().await.unwrap();

        assert_eq!(relayed.status, StatusCode::UNAUTHORIZED);
        assert_eq!(&relayed.body[..], br#"{"error":"bad token"}"#);
        assert_eq!(
            relayed.content_type,
            Some(HeaderValue::from_static("application/json"))
        );
    }

    #[tokio::test]
    async fn test_request_timeout_applies_to_fetch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/mirrors.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(
            &format!("{}/mirrors.json", server.uri()),
            &format!("{}/api/mirrors", server.uri()),
        );
        config.request_timeout = Some(Duration::from_millis(100));

        let err = RelayPipeline::from_config(&config)
            .unwrap()
            .relay()
            .await
            .unwrap_err();

        match err {
            RelayError::FetchTransport(e) => assert!(e.is_timeout()),
            other => panic!("expected fetch timeout, got {other:?}"),
        }
    }
}
