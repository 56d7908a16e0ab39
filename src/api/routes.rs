//! Batch API route handlers
//!
//! - POST /utxos    - UTXO lists per address
//! - POST /data     - transactions with confirmation counts per address
//! - POST /baltxs   - net balance plus per-address transactions
//! - POST /balances - net balance
//! - POST /txs      - raw transaction lists per address
//! - GET|POST /fees - indexer fee estimates
//! - POST /tx       - broadcast a raw transaction
//! - GET /health    - health check

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::middleware::CorrelationId;
use super::server::SharedAppState;
use crate::aggregator::{Aggregated, RequestContext};
use crate::common::{AggregatorError, Result};

/// Number of addresses whose lookup failed, set only when non-zero
pub const PARTIAL_FAILURES_HEADER: &str = "x-partial-failures";

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub addresses: Vec<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_request(state: &SharedAppState, id: &CorrelationId, body: &Bytes) -> Result<RequestContext> {
    let request: AddressRequest = serde_json::from_slice(body)
        .map_err(|e| AggregatorError::malformed(e.to_string()))?;
    state.service.context(id.as_str(), request.addresses)
}

fn batch_response<B: Serialize>(result: Aggregated<B>) -> Response {
    let failed = result.failures.len();
    let mut response = Json(result.body).into_response();
    if failed > 0 {
        response
            .headers_mut()
            .insert(PARTIAL_FAILURES_HEADER, HeaderValue::from(failed));
    }
    response
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /utxos
async fn handle_utxos(
    State(state): State<SharedAppState>,
    Extension(id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<Response> {
    let ctx = parse_request(&state, &id, &body)?;
    Ok(batch_response(state.service.utxos(&ctx).await))
}

/// POST /data
///
/// Confirmation counts are computed against one tip height captured before
/// the fan-out. If that height cannot be fetched the request fails with 502.
async fn handle_data(
    State(state): State<SharedAppState>,
    Extension(id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<Response> {
    let ctx = parse_request(&state, &id, &body)?;
    Ok(batch_response(state.service.data(&ctx).await?))
}

/// POST /baltxs
async fn handle_balance_transactions(
    State(state): State<SharedAppState>,
    Extension(id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<Response> {
    let ctx = parse_request(&state, &id, &body)?;
    Ok(batch_response(state.service.balance_transactions(&ctx).await?))
}

/// POST /balances
async fn handle_balances(
    State(state): State<SharedAppState>,
    Extension(id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<Response> {
    let ctx = parse_request(&state, &id, &body)?;
    Ok(batch_response(state.service.balances(&ctx).await))
}

/// POST /txs
async fn handle_transactions(
    State(state): State<SharedAppState>,
    Extension(id): Extension<CorrelationId>,
    body: Bytes,
) -> Result<Response> {
    let ctx = parse_request(&state, &id, &body)?;
    Ok(batch_response(state.service.transactions(&ctx).await))
}

/// GET|POST /fees
async fn handle_fees(State(state): State<SharedAppState>) -> Result<Json<serde_json::Value>> {
    Ok(Json(state.service.fee_estimates().await?))
}

/// POST /tx
///
/// The body is the raw transaction hex, forwarded as-is.
async fn handle_broadcast(
    State(state): State<SharedAppState>,
    body: String,
) -> Result<Json<serde_json::Value>> {
    Ok(Json(state.service.broadcast(&body).await?))
}

/// GET /health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "addrbatch-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// All batch routes, before state and layers are attached
pub fn routes() -> Router<SharedAppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route("/utxos", post(handle_utxos))
        .route("/data", post(handle_data))
        .route("/baltxs", post(handle_balance_transactions))
        .route("/balances", post(handle_balances))
        .route("/txs", post(handle_transactions))
        .route("/fees", get(handle_fees).post(handle_fees))
        .route("/tx", post(handle_broadcast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{BatchService, FanOutExecutor};
    use crate::api::server::create_router;
    use crate::indexer::stub::{StubAddress, StubIndexer};
    use crate::indexer::{Indexer, Transaction, TxStatus, Utxo};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(indexer: Arc<dyn Indexer>) -> Router {
        let service = BatchService::new(
            indexer,
            FanOutExecutor::new(Duration::from_secs(3)),
            Duration::from_secs(1),
            50,
        );
        create_router(service)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn utxo(txid: &str, value: u64) -> Utxo {
        Utxo {
            txid: txid.to_string(),
            vout: 0,
            value,
            status: TxStatus::confirmed_at(100),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(StubIndexer::new(1)))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-correlation-id"));
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_bodies_rejected() {
        let indexer = Arc::new(StubIndexer::new(1));
        for body in ["not json", "{}", "{\"addresses\": \"A\"}"] {
            let response = app(indexer.clone())
                .oneshot(post_json("/balances", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
            assert_eq!(json_body(response).await["code"], "MALFORMED_REQUEST");
        }
        assert_eq!(indexer.calls(), 0);
    }

    #[tokio::test]
    async fn test_too_many_addresses_rejected() {
        let addresses: Vec<String> = (0..51).map(|i| format!("addr{}", i)).collect();
        let body = serde_json::json!({ "addresses": addresses }).to_string();

        let response = app(Arc::new(StubIndexer::new(1)))
            .oneshot(post_json("/utxos", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_address_list() {
        let indexer = Arc::new(StubIndexer::new(1));

        let response = app(indexer.clone())
            .oneshot(post_json("/baltxs", r#"{"addresses": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({
                "balance": {"balance": 0, "unconfirmedBalance": 0},
                "transactions": []
            })
        );
        assert_eq!(indexer.calls(), 0);
        assert_eq!(indexer.height_calls(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_bad_gateway() {
        let indexer = Arc::new(StubIndexer::without_height());

        let response = app(indexer.clone())
            .oneshot(post_json("/data", r#"{"addresses": ["A"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["code"], "UPSTREAM_UNAVAILABLE");
        assert_eq!(indexer.calls(), 0);
    }

    #[tokio::test]
    async fn test_utxos_deduplicated_and_grouped() {
        let indexer = StubIndexer::new(1)
            .with_address(
                "A",
                StubAddress {
                    utxos: vec![utxo("a1", 10), utxo("a2", 20)],
                    ..Default::default()
                },
            )
            .with_address(
                "B",
                StubAddress {
                    utxos: vec![utxo("b1", 30)],
                    delay: Duration::from_millis(20),
                    ..Default::default()
                },
            );
        let indexer = Arc::new(indexer);

        let response = app(indexer.clone())
            .oneshot(post_json("/utxos", r#"{"addresses": ["B", "A", "B"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(PARTIAL_FAILURES_HEADER));

        let body = json_body(response).await;
        assert_eq!(body[0][0]["txid"], "b1");
        assert_eq!(body[1].as_array().unwrap().len(), 2);
        assert_eq!(indexer.calls(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_header() {
        let indexer = StubIndexer::new(1)
            .with_balance("X", 700, Duration::ZERO)
            .with_failing("Y");

        let response = app(Arc::new(indexer))
            .oneshot(post_json("/balances", r#"{"addresses": ["X", "Y"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[PARTIAL_FAILURES_HEADER], "1");
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"balance": 700, "unconfirmedBalance": 0})
        );
    }

    #[tokio::test]
    async fn test_data_confirmations() {
        let indexer = StubIndexer::new(700_000).with_address(
            "A",
            StubAddress {
                txs: vec![
                    Transaction::new("c", TxStatus::confirmed_at(699_995)),
                    Transaction::new("m", TxStatus::unconfirmed()),
                ],
                ..Default::default()
            },
        );

        let response = app(Arc::new(indexer))
            .oneshot(post_json("/data", r#"{"addresses": ["A"]}"#))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body[0]["address"], "A");
        assert_eq!(body[0]["totalTransactions"], 2);
        assert_eq!(body[0]["transactions"][0]["confirmations"], 5);
        assert_eq!(body[0]["transactions"][1]["confirmations"], 0);
    }

    #[tokio::test]
    async fn test_stats_failure_sets_partial_header() {
        let indexer = StubIndexer::new(700_000).with_address(
            "C",
            StubAddress {
                txs: vec![Transaction::new("c1", TxStatus::confirmed_at(600_000))],
                fail_stats: true,
                ..Default::default()
            },
        );

        let response = app(Arc::new(indexer))
            .oneshot(post_json("/data", r#"{"addresses": ["C"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[PARTIAL_FAILURES_HEADER], "1");
        let body = json_body(response).await;
        assert_eq!(body[0]["totalTransactions"], 1);
        assert_eq!(body[0]["confirmedCount"], 0);
    }

    #[tokio::test]
    async fn test_txs_lists() {
        let indexer = StubIndexer::new(1).with_address(
            "A",
            StubAddress {
                txs: vec![Transaction::new("t1", TxStatus::unconfirmed())],
                ..Default::default()
            },
        );

        let response = app(Arc::new(indexer))
            .oneshot(post_json("/txs", r#"{"addresses": ["A", "Z"]}"#))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["txs"][0][0]["txid"], "t1");
        assert_eq!(body["txs"][1], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_fees_get_and_post() {
        let indexer: Arc<dyn Indexer> = Arc::new(StubIndexer::new(1));

        let response = app(indexer.clone())
            .oneshot(Request::get("/fees").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["3"], 12.0);

        let response = app(indexer)
            .oneshot(post_json("/fees", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_broadcast() {
        let indexer: Arc<dyn Indexer> = Arc::new(StubIndexer::new(1));

        let response = app(indexer.clone())
            .oneshot(post_json("/tx", "0200000001"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!("4e5f"));

        let response = app(indexer.clone())
            .oneshot(post_json("/tx", "ff"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BROADCAST_REJECTED");

        let response = app(indexer).oneshot(post_json("/tx", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_correlation_id_echoed() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/balances")
            .header("x-correlation-id", "wallet-7")
            .body(Body::from(r#"{"addresses": []}"#))
            .unwrap();

        let response = app(Arc::new(StubIndexer::new(1)))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.headers()["x-correlation-id"], "wallet-7");
    }
}
