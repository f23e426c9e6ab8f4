//! A [`Facilitator`] implementation that talks to a remote facilitator
//! over HTTP.
//!
//! [`FacilitatorClient`] drives the `POST /verify` and `POST /settle`
//! endpoints with JSON bodies. It supports optional custom headers, an
//! optional per-call deadline, and an opt-in single retry for calls
//! that never reached the facilitator at all.
//!
//! ## Error Handling
//!
//! Transport failures map onto [`FacilitatorError`]:
//!
//! - connection failures become [`FacilitatorError::Unreachable`]
//! - an elapsed deadline becomes [`FacilitatorError::Timeout`]
//! - non-200 answers become [`FacilitatorError::ErrorResponse`]
//! - undecodable bodies become [`FacilitatorError::Decode`]
//!
//! A well-formed `valid: false` answer is not an error; it flows back as
//! a regular outcome.

use std::time::Duration;

use http::{HeaderMap, StatusCode};
use reqwest::Client;
use tollgate::facilitator::{BoxFuture, Facilitator, FacilitatorError};
use tollgate::proto::{FacilitatorRequest, SettleOutcome, VerifyOutcome};
use url::Url;

/// A client for a remote facilitator's verify and settle endpoints.
#[derive(Clone, Debug)]
pub struct FacilitatorClient {
    /// Base URL of the facilitator (e.g. `https://facilitator.example/`)
    base_url: Url,
    /// Full URL for `POST /verify` requests
    verify_url: Url,
    /// Full URL for `POST /settle` requests
    settle_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional custom headers sent with each request
    headers: HeaderMap,
    /// Optional per-call deadline
    timeout: Option<Duration>,
    /// Whether to retry once when the facilitator was never reached
    retry_transport: bool,
}

/// Errors constructing a [`FacilitatorClient`] from a URL.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorUrlError {
    /// The base URL itself did not parse.
    #[error("invalid facilitator base URL: {source}")]
    Base {
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// Joining an endpoint path onto the base URL failed.
    #[error("failed to construct {endpoint} URL: {source}")]
    Endpoint {
        /// The endpoint being joined (`./verify` or `./settle`).
        endpoint: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

impl FacilitatorClient {
    /// Constructs a client from a base URL.
    ///
    /// The `./verify` and `./settle` endpoint URLs are resolved relative
    /// to the base once, at construction.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorUrlError`] if endpoint URL construction
    /// fails.
    pub fn try_new(base_url: Url) -> Result<Self, FacilitatorUrlError> {
        let verify_url = base_url
            .join("./verify")
            .map_err(|e| FacilitatorUrlError::Endpoint {
                endpoint: "./verify",
                source: e,
            })?;
        let settle_url = base_url
            .join("./settle")
            .map_err(|e| FacilitatorUrlError::Endpoint {
                endpoint: "./settle",
                source: e,
            })?;
        Ok(Self {
            base_url,
            verify_url,
            settle_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
            retry_transport: false,
        })
    }

    /// Returns the base URL used by this client.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed `./verify` URL.
    #[must_use]
    pub const fn verify_url(&self) -> &Url {
        &self.verify_url
    }

    /// Returns the computed `./settle` URL.
    #[must_use]
    pub const fn settle_url(&self) -> &Url {
        &self.settle_url
    }

    /// Returns the configured per-call deadline, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Bounds every verify and settle call with a deadline.
    ///
    /// An elapsed deadline surfaces as [`FacilitatorError::Timeout`].
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retries a call once when the facilitator was never reached.
    ///
    /// Only connection-level failures are retried. Timeouts are not (the
    /// deadline already elapsed once) and neither are error responses
    /// (the facilitator answered).
    #[must_use]
    pub const fn with_transport_retry(mut self) -> Self {
        self.retry_transport = true;
        self
    }

    /// Sends a `POST /verify` request to the facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError`] if the conversation itself fails.
    pub async fn verify(
        &self,
        request: &FacilitatorRequest,
    ) -> Result<VerifyOutcome, FacilitatorError> {
        self.post_json(&self.verify_url, "verify", request).await
    }

    /// Sends a `POST /settle` request to the facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError`] if the conversation itself fails.
    pub async fn settle(
        &self,
        request: &FacilitatorRequest,
    ) -> Result<SettleOutcome, FacilitatorError> {
        self.post_json(&self.settle_url, "settle", request).await
    }

    /// Generic POST helper handling JSON serialization, error mapping,
    /// deadline application, and the optional transport retry.
    ///
    /// `context` names the call in error messages (`verify` or `settle`).
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, FacilitatorError>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let first = self.post_json_once(url, context, payload).await;
        match first {
            Err(ref error) if self.retry_transport && error.is_retryable() => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(context, error = %error, "retrying facilitator call");
                self.post_json_once(url, context, payload).await
            }
            other => other,
        }
    }

    async fn post_json_once<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, FacilitatorError>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.post(url.clone()).json(payload);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let response = match req.send().await {
            Ok(response) => response,
            Err(error) => return Err(self.transport_error(context, error)),
        };

        let status = response.status();
        let result = if status == StatusCode::OK {
            response
                .json::<R>()
                .await
                .map_err(|e| FacilitatorError::Decode {
                    context,
                    source: Box::new(e),
                })
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(FacilitatorError::ErrorResponse {
                context,
                status: status.as_u16(),
                detail,
            })
        };

        #[cfg(feature = "telemetry")]
        if let Err(ref error) = result {
            tracing::warn!(context, error = %error, "facilitator call failed");
        }

        result
    }

    fn transport_error(&self, context: &'static str, error: reqwest::Error) -> FacilitatorError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => FacilitatorError::Timeout { timeout },
            _ => FacilitatorError::Unreachable {
                context,
                source: Box::new(error),
            },
        }
    }
}

impl Facilitator for FacilitatorClient {
    fn verify<'a>(
        &'a self,
        request: &'a FacilitatorRequest,
    ) -> BoxFuture<'a, Result<VerifyOutcome, FacilitatorError>> {
        Box::pin(Self::verify(self, request))
    }

    fn settle<'a>(
        &'a self,
        request: &'a FacilitatorRequest,
    ) -> BoxFuture<'a, Result<SettleOutcome, FacilitatorError>> {
        Box::pin(Self::settle(self, request))
    }
}

/// Converts a string URL into a [`FacilitatorClient`], normalizing the
/// trailing slash so endpoint joins resolve under the base path.
impl TryFrom<&str> for FacilitatorClient {
    type Error = FacilitatorUrlError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_owned();
        normalized.push('/');
        let url =
            Url::parse(&normalized).map_err(|e| FacilitatorUrlError::Base { source: e })?;
        Self::try_new(url)
    }
}

impl TryFrom<String> for FacilitatorClient {
    type Error = FacilitatorUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use tollgate::{ChainId, MoneyAmount, PaymentOption};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> FacilitatorRequest {
        let network = ChainId::new("eip155", "84532");
        let price: MoneyAmount = "$0.001".parse().unwrap();
        FacilitatorRequest {
            scheme: "exact".into(),
            network: network.clone(),
            payload: serde_json::json!({ "signature": "0xdeadbeef" }),
            requirement: PaymentOption::new("exact", network, price, "0xpayee"),
        }
    }

    #[test]
    fn endpoint_urls_resolve_under_the_base_path() {
        let client = FacilitatorClient::try_from("http://localhost:8402/facilitator").unwrap();
        assert_eq!(
            client.verify_url().as_str(),
            "http://localhost:8402/facilitator/verify"
        );
        assert_eq!(
            client.settle_url().as_str(),
            "http://localhost:8402/facilitator/settle"
        );
    }

    #[tokio::test]
    async fn verify_posts_the_request_and_decodes_the_outcome() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_partial_json(serde_json::json!({
                "scheme": "exact",
                "network": "eip155:84532",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "valid": true })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FacilitatorClient::try_from(mock_server.uri().as_str()).unwrap();
        let outcome = client.verify(&sample_request()).await.unwrap();
        assert!(outcome.valid);
        assert!(outcome.reason.is_none());
    }

    #[tokio::test]
    async fn custom_headers_are_forwarded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settle"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "valid": true, "settlementId": "0xabc" }),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        let client = FacilitatorClient::try_from(mock_server.uri().as_str())
            .unwrap()
            .with_headers(headers);

        let outcome = client.settle(&sample_request()).await.unwrap();
        assert_eq!(outcome.settlement_id.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn non_ok_status_surfaces_as_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let client = FacilitatorClient::try_from(mock_server.uri().as_str()).unwrap();
        let err = client.verify(&sample_request()).await.unwrap_err();
        match err {
            FacilitatorError::ErrorResponse { status, detail, .. } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "boom");
            }
            other => panic!("expected ErrorResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_surfaces_as_decode_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = FacilitatorClient::try_from(mock_server.uri().as_str()).unwrap();
        let err = client.verify(&sample_request()).await.unwrap_err();
        assert!(matches!(err, FacilitatorError::Decode { .. }));
    }

    #[tokio::test]
    async fn slow_facilitator_hits_the_deadline() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "valid": true }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = FacilitatorClient::try_from(mock_server.uri().as_str())
            .unwrap()
            .with_timeout(Duration::from_millis(50));

        let err = client.verify(&sample_request()).await.unwrap_err();
        assert!(matches!(err, FacilitatorError::Timeout { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn connection_failure_maps_to_unreachable() {
        // Port 9 (discard) is closed on test hosts.
        let client = FacilitatorClient::try_from("http://127.0.0.1:9").unwrap();
        let err = client.verify(&sample_request()).await.unwrap_err();
        assert!(matches!(err, FacilitatorError::Unreachable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn error_responses_are_never_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FacilitatorClient::try_from(mock_server.uri().as_str())
            .unwrap()
            .with_transport_retry();

        let err = client.verify(&sample_request()).await.unwrap_err();
        assert!(matches!(err, FacilitatorError::ErrorResponse { .. }));
    }
}
