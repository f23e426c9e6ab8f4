//! HTTP header names used by the payment gate.

/// Header carrying the Base64 payment payload (client to server).
pub const X_PAYMENT_HEADER: &str = "X-PAYMENT";

/// Header carrying the Base64 settlement receipt (server to client).
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// CORS header name for exposing custom headers to browser clients.
pub const ACCESS_CONTROL_EXPOSE_HEADERS: &str = "Access-Control-Expose-Headers";
