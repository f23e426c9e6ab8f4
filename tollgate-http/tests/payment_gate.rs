//! Full gate flow against an axum router and a mocked facilitator.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::routing::get;
use http::{Request, StatusCode};
use serde_json::Value;
use tollgate::scheme::MalformedPayload;
use tollgate::{
    ChainId, EXACT_SCHEME, PaymentOption, PaymentPayload, ResourceServer, RouteSpec, SchemeAdapter,
};
use tollgate_http::constants::{
    ACCESS_CONTROL_EXPOSE_HEADERS, X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER,
};
use tollgate_http::facilitator::FacilitatorClient;
use tollgate_http::headers::{decode_settlement, encode_payment};
use tollgate_http::server::PaymentGate;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestAdapter {
    namespace: &'static str,
}

impl SchemeAdapter for TestAdapter {
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }

    fn namespace(&self) -> &str {
        self.namespace
    }

    fn parse_payload(&self, raw: &Value) -> Result<Value, MalformedPayload> {
        if raw.get("proof").and_then(Value::as_str).is_some() {
            Ok(raw.clone())
        } else {
            Err(MalformedPayload::new("missing proof"))
        }
    }
}

fn chain_a() -> ChainId {
    ChainId::new("eip155", "84532")
}

fn chain_b() -> ChainId {
    ChainId::new("solana", "devnet")
}

fn gate_for(facilitator_url: &str) -> PaymentGate<FacilitatorClient> {
    let facilitator = FacilitatorClient::try_from(facilitator_url)
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    let server = ResourceServer::builder(facilitator)
        .register(chain_a(), Box::new(TestAdapter { namespace: "eip155" }))
        .unwrap()
        .register(chain_b(), Box::new(TestAdapter { namespace: "solana" }))
        .unwrap()
        .route(
            "GET",
            "/weather",
            RouteSpec::new(vec![
                PaymentOption::new(EXACT_SCHEME, chain_a(), "$0.001".parse().unwrap(), "addrA"),
                PaymentOption::new(EXACT_SCHEME, chain_b(), "$0.001".parse().unwrap(), "addrB"),
            ])
            .with_description("Weather data")
            .with_mime_type("application/json"),
        )
        .unwrap()
        .build();
    PaymentGate::new(Arc::new(server))
}

fn router_with(gate: PaymentGate<FacilitatorClient>) -> Router {
    Router::new()
        .route(
            "/weather",
            get(|| async { axum::Json(serde_json::json!({ "temperature": 21 })) }),
        )
        .route("/health", get(|| async { "ok" }))
        .layer(gate)
}

fn paid_request(network: ChainId) -> Request<Body> {
    let payload = PaymentPayload {
        scheme: EXACT_SCHEME.into(),
        network,
        payload: serde_json::json!({ "proof": "signed" }),
    };
    Request::builder()
        .uri("/weather")
        .header(X_PAYMENT_HEADER, encode_payment(&payload).unwrap())
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unpaid_request_receives_challenge_listing_both_options() {
    let mock_server = MockServer::start().await;
    let app = router_with(gate_for(mock_server.uri().as_str()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/weather")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    assert!(body.get("error").is_none());
    let accepts = body["accepts"].as_array().unwrap();
    assert_eq!(accepts.len(), 2);
    assert_eq!(accepts[0]["network"], "eip155:84532");
    assert_eq!(accepts[0]["payTo"], "addrA");
    assert_eq!(accepts[0]["price"], "$0.001");
    assert_eq!(accepts[0]["description"], "Weather data");
    assert_eq!(accepts[0]["mimeType"], "application/json");
    assert_eq!(accepts[1]["network"], "solana:devnet");
}

#[tokio::test]
async fn paid_request_passes_through_with_receipt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .and(body_partial_json(serde_json::json!({
            "scheme": "exact",
            "network": "eip155:84532",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "valid": true,
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/settle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "valid": true,
            "settlementId": "0xabc",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = router_with(gate_for(mock_server.uri().as_str()));
    let response = app.oneshot(paid_request(chain_a())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let receipt_header = response
        .headers()
        .get(X_PAYMENT_RESPONSE_HEADER)
        .expect("receipt header missing")
        .to_str()
        .unwrap()
        .to_owned();
    let receipt = decode_settlement(&receipt_header).unwrap();
    assert_eq!(receipt.settlement_id.as_deref(), Some("0xabc"));
    assert_eq!(receipt.network, chain_a());
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_EXPOSE_HEADERS)
            .unwrap(),
        X_PAYMENT_RESPONSE_HEADER
    );

    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!({ "temperature": 21 }));
}

#[tokio::test]
async fn unadvertised_chain_never_reaches_the_facilitator() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/settle"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = router_with(gate_for(mock_server.uri().as_str()));
    let response = app
        .oneshot(paid_request(ChainId::new("eip155", "1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("no_matching_requirement"), "got {error}");
    assert_eq!(body["accepts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn facilitator_rejection_surfaces_the_reason_verbatim() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "valid": false,
            "reason": "insufficient_funds",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/settle"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = router_with(gate_for(mock_server.uri().as_str()));
    let response = app.oneshot(paid_request(chain_a())).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "insufficient_funds");
}

#[tokio::test]
async fn settlement_failure_withholds_the_resource() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "valid": true })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/settle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "valid": false,
            "reason": "nonce_already_used",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = router_with(gate_for(mock_server.uri().as_str()));
    let response = app.oneshot(paid_request(chain_a())).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("settlement_failed"), "got {error}");
    assert!(error.contains("nonce_already_used"), "got {error}");
}

#[tokio::test]
async fn unreachable_facilitator_answers_service_unavailable() {
    // Port 9 (discard) is closed on test hosts.
    let app = router_with(gate_for("http://127.0.0.1:9"));
    let response = app.oneshot(paid_request(chain_a())).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("facilitator_unreachable"), "got {error}");
}

#[tokio::test]
async fn unreachable_facilitator_can_answer_payment_required_instead() {
    let gate = gate_for("http://127.0.0.1:9").payment_required_on_transient();
    let app = router_with(gate);
    let response = app.oneshot(paid_request(chain_a())).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    assert_eq!(body["accepts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn undecodable_header_is_rejected_without_facilitator_contact() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = router_with(gate_for(mock_server.uri().as_str()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/weather")
                .header(X_PAYMENT_HEADER, "not base64!!!")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("malformed_payload"), "got {error}");
}

#[tokio::test]
async fn ungated_route_ignores_payment_headers_entirely() {
    let mock_server = MockServer::start().await;
    let app = router_with(gate_for(mock_server.uri().as_str()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(X_PAYMENT_HEADER, "not base64!!!")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
