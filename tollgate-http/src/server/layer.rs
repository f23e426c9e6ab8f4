//! Tower layer and service wiring for the payment gate.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::Response;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use tollgate::scheme::MalformedPayload;
use tollgate::{
    Challenge, Decision, Facilitator, PaymentOption, PaymentPayload, RejectReason, ResourceServer,
    Settlement,
};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use crate::constants::{
    ACCESS_CONTROL_EXPOSE_HEADERS, X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER,
};
use crate::headers;

/// Tower layer gating requests behind payment.
///
/// One instance wraps one [`ResourceServer`]. Apply it to a router with
/// `Router::layer`; the route table inside the server decides which
/// requests are gated.
pub struct PaymentGate<F> {
    server: Arc<ResourceServer<F>>,
    payment_required_on_transient: bool,
}

impl<F> Clone for PaymentGate<F> {
    fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
            payment_required_on_transient: self.payment_required_on_transient,
        }
    }
}

impl<F> fmt::Debug for PaymentGate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentGate")
            .field(
                "payment_required_on_transient",
                &self.payment_required_on_transient,
            )
            .finish_non_exhaustive()
    }
}

impl<F: Facilitator> PaymentGate<F> {
    /// Wraps a resource server.
    pub fn new(server: Arc<ResourceServer<F>>) -> Self {
        Self {
            server,
            payment_required_on_transient: false,
        }
    }

    /// Answers `402` instead of `503` when the facilitator cannot be
    /// reached, inviting the client to retry with the same payment.
    #[must_use]
    pub const fn payment_required_on_transient(mut self) -> Self {
        self.payment_required_on_transient = true;
        self
    }
}

impl<S, F> Layer<S> for PaymentGate<F>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    F: Facilitator + 'static,
{
    type Service = PaymentGateService<F>;

    fn layer(&self, inner: S) -> Self::Service {
        PaymentGateService {
            server: Arc::clone(&self.server),
            payment_required_on_transient: self.payment_required_on_transient,
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Service produced by [`PaymentGate`].
pub struct PaymentGateService<F> {
    server: Arc<ResourceServer<F>>,
    payment_required_on_transient: bool,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<F> Clone for PaymentGateService<F> {
    fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
            payment_required_on_transient: self.payment_required_on_transient,
            inner: self.inner.clone(),
        }
    }
}

impl<F> fmt::Debug for PaymentGateService<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentGateService")
            .field(
                "payment_required_on_transient",
                &self.payment_required_on_transient,
            )
            .finish_non_exhaustive()
    }
}

impl<F> Service<Request> for PaymentGateService<F>
where
    F: Facilitator + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let server = Arc::clone(&self.server);
        let payment_required_on_transient = self.payment_required_on_transient;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let method = req.method().as_str().to_owned();
            let path = req.uri().path().to_owned();

            let payment = match extract_payment(req.headers()) {
                Ok(payment) => payment,
                Err(detail) => {
                    // A present-but-undecodable header only matters on a
                    // gated route; everywhere else it is ignored.
                    let Some(requirement) = server.routes().lookup(&method, &path) else {
                        return inner.call(req).await;
                    };
                    let reason = RejectReason::Malformed(MalformedPayload::new(detail));
                    return Ok(rejection_response(
                        &reason,
                        requirement.options(),
                        payment_required_on_transient,
                    ));
                }
            };

            match server.handle(&method, &path, payment.as_ref()).await {
                Decision::NoRequirement => inner.call(req).await,
                Decision::ChallengeRequired(options) => {
                    Ok(challenge_response(&Challenge::new(options)))
                }
                Decision::Verified(settlement) => {
                    let response = inner.call(req).await?;
                    Ok(attach_receipt(response, &settlement))
                }
                Decision::Rejected(reason) => {
                    let accepts = server
                        .routes()
                        .lookup(&method, &path)
                        .map(|requirement| requirement.options().to_vec())
                        .unwrap_or_default();
                    Ok(rejection_response(
                        &reason,
                        &accepts,
                        payment_required_on_transient,
                    ))
                }
            }
        })
    }
}

/// Pulls the payment payload out of the `X-PAYMENT` header, if present.
fn extract_payment(header_map: &HeaderMap) -> Result<Option<PaymentPayload>, String> {
    let Some(value) = header_map.get(X_PAYMENT_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| "header value is not visible ASCII".to_owned())?;
    headers::decode_payment(text)
        .map(Some)
        .map_err(|e| e.to_string())
}

fn challenge_response(challenge: &Challenge) -> Response {
    json_response(StatusCode::PAYMENT_REQUIRED, challenge)
}

fn rejection_response(
    reason: &RejectReason,
    accepts: &[PaymentOption],
    payment_required_on_transient: bool,
) -> Response {
    let status = if reason.is_transient() && !payment_required_on_transient {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::PAYMENT_REQUIRED
    };
    let challenge = Challenge::new(accepts.to_vec()).with_error(reason.to_string());
    json_response(status, &challenge)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    let bytes = serde_json::to_vec(body).expect("serialization failed");
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("failed to construct response")
}

/// Attaches the settlement receipt to a pass-through response.
///
/// The resource is already granted at this point, so the receipt header
/// is best effort.
fn attach_receipt(mut response: Response, settlement: &Settlement) -> Response {
    let Ok(encoded) = headers::encode_settlement(settlement) else {
        return response;
    };
    let Ok(value) = HeaderValue::from_str(&encoded) else {
        return response;
    };
    response.headers_mut().insert(X_PAYMENT_RESPONSE_HEADER, value);
    response.headers_mut().append(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(X_PAYMENT_RESPONSE_HEADER),
    );
    response
}
