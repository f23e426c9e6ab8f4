//! Payment-gated demo resource server.
//!
//! Serves a weather report and Allora price predictions behind an HTTP 402
//! payment gate. Each gated route accepts payment on Base Sepolia or Solana
//! devnet with the "exact" scheme; verification and settlement are delegated
//! to a remote facilitator.
//!
//! # Usage
//!
//! ```bash
//! FACILITATOR_URL=https://facilitator.example \
//! EVM_WALLET=0x... SVM_ADDRESS=... ALLORA_API_KEY=... \
//! cargo run -p weather-server
//! ```
//!
//! # Environment Variables
//!
//! - `FACILITATOR_URL` — Base URL of the facilitator (required)
//! - `EVM_WALLET` — Payee address for `eip155` payments (required)
//! - `SVM_ADDRESS` — Payee address for `solana` payments (required)
//! - `ALLORA_API_KEY` — Upstream API key for `GET /allora`
//! - `HOST` — Override bind address (default: `0.0.0.0`)
//! - `PORT` — Override port (default: `4022`)
//! - `RUST_LOG` — Log level filter (default: `info`)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tollgate::proto::PaymentOption;
use tollgate::routes::RouteSpec;
use tollgate::scheme::EXACT_SCHEME;
use tollgate::server::ResourceServer;
use tollgate::{ChainId, MoneyAmount};
use tollgate_evm::ExactEvmAdapter;
use tollgate_http::FacilitatorClient;
use tollgate_http::server::PaymentGate;
use tollgate_svm::{ExactSvmAdapter, SolanaAddress};
use tower_http::cors;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 4022;

const ALLORA_API_BASE: &str =
    "https://api.allora.network/v2/allora/consumer/price/ethereum-111551111";

#[derive(Clone)]
struct AppState {
    http: reqwest::Client,
}

#[tokio::main]
async fn main() {
    // Initialize tracing with RUST_LOG env filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Weather server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let facilitator_url = std::env::var("FACILITATOR_URL")
        .map_err(|_| "FACILITATOR_URL environment variable is required")?;
    let evm_wallet: Address = std::env::var("EVM_WALLET")
        .map_err(|_| "EVM_WALLET environment variable is required")?
        .parse()
        .map_err(|e| format!("EVM_WALLET is not a valid eip155 address: {e}"))?;
    let svm_address: SolanaAddress = std::env::var("SVM_ADDRESS")
        .map_err(|_| "SVM_ADDRESS environment variable is required")?
        .parse()
        .map_err(|e| format!("SVM_ADDRESS is not a valid solana address: {e}"))?;

    let facilitator = FacilitatorClient::try_from(facilitator_url.as_str())?
        .with_timeout(Duration::from_secs(10));
    tracing::info!(facilitator = %facilitator.base_url(), "Facilitator client initialized");

    let base_sepolia = ChainId::new("eip155", "84532");
    let solana_devnet = ChainId::new("solana", "EtWTRABZaYq6iMfeYKouRu166VU2xqa1");
    let weather_price: MoneyAmount = "$0.001".parse()?;
    let allora_price: MoneyAmount = "$0.01".parse()?;

    let server = ResourceServer::builder(facilitator)
        .register(base_sepolia.clone(), Box::new(ExactEvmAdapter::new()))?
        .register(solana_devnet.clone(), Box::new(ExactSvmAdapter::new()))?
        .route(
            "GET",
            "/weather",
            RouteSpec::new(vec![
                PaymentOption::new(
                    EXACT_SCHEME,
                    base_sepolia.clone(),
                    weather_price.clone(),
                    evm_wallet.to_string(),
                ),
                PaymentOption::new(
                    EXACT_SCHEME,
                    solana_devnet.clone(),
                    weather_price,
                    svm_address.to_string(),
                ),
            ])
            .with_description("Weather data")
            .with_mime_type("application/json"),
        )?
        .route(
            "GET",
            "/allora",
            RouteSpec::new(vec![
                PaymentOption::new(
                    EXACT_SCHEME,
                    base_sepolia,
                    allora_price.clone(),
                    evm_wallet.to_string(),
                ),
                PaymentOption::new(
                    EXACT_SCHEME,
                    solana_devnet,
                    allora_price,
                    svm_address.to_string(),
                ),
            ])
            .with_description("Allora price predictions")
            .with_mime_type("application/json"),
        )?
        .build();

    tracing::info!(
        evm_wallet = %evm_wallet,
        svm_address = %svm_address,
        routes = server.routes().len(),
        "Payment gate configured"
    );

    let state = AppState {
        http: reqwest::Client::new(),
    };

    let app = Router::new()
        .route("/weather", get(weather))
        .route("/allora", get(allora))
        .layer(PaymentGate::new(Arc::new(server)))
        .route("/health", get(health))
        .with_state(state)
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let host: IpAddr = std::env::var("HOST")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::new(host, port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Weather server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Weather server shut down gracefully");
    Ok(())
}

/// The resource `GET /weather` sells.
async fn weather() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "report": {
            "weather": "sunny",
            "temperature": 70,
        }
    }))
}

#[derive(Debug, Deserialize)]
struct AlloraParams {
    asset: Option<String>,
    timeframe: Option<String>,
}

/// Proxies the upstream Allora consumer price API.
///
/// Upstream failures surface as 502 so callers can tell a broken
/// upstream from a broken proxy.
async fn allora(State(state): State<AppState>, Query(params): Query<AlloraParams>) -> Response {
    let Ok(api_key) = std::env::var("ALLORA_API_KEY") else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "ALLORA_API_KEY not configured",
        );
    };
    let (Some(asset), Some(timeframe)) = (params.asset, params.timeframe) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "asset and timeframe query params required",
        );
    };

    let url = format!("{ALLORA_API_BASE}/{asset}/{timeframe}");
    let response = match state.http.get(&url).header("x-api-key", api_key).send().await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!("Allora upstream unreachable: {error}");
            return error_response(StatusCode::BAD_GATEWAY, "Failed to fetch Allora data");
        }
    };
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "Allora upstream returned an error");
        return error_response(StatusCode::BAD_GATEWAY, "Allora API request failed");
    }
    match response.json::<serde_json::Value>().await {
        Ok(data) => Json(data).into_response(),
        Err(error) => {
            tracing::warn!("Allora upstream returned malformed JSON: {error}");
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch Allora data")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Health check endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
