//! HTTP surface of the channel.
//!
//! | Method | Path      | Auth                     |
//! |--------|-----------|--------------------------|
//! | GET    | `/health` | only with `all-routes`   |
//! | GET    | `/`       | only with `all-routes`   |
//! | POST   | `/`       | always                   |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method};
use axum::routing::get;
use axum::{Json, Router};
use calcwizard_common::Message;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ChannelError;
use crate::service::{now_secs, ChannelService, HealthResponse};

pub fn router(service: Arc<ChannelService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(history_handler).post(submit_handler))
        .layer(cors)
        .with_state(service)
}

fn credential(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

async fn health_handler(
    State(service): State<Arc<ChannelService>>,
    headers: HeaderMap,
) -> Result<Json<HealthResponse>, ChannelError> {
    service.health(credential(&headers)).map(Json)
}

async fn history_handler(
    State(service): State<Arc<ChannelService>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>, ChannelError> {
    service
        .history(credential(&headers), now_secs())
        .await
        .map(Json)
}

async fn submit_handler(
    State(service): State<Arc<ChannelService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ChannelError> {
    service
        .submit(credential(&headers), &body, now_secs())
        .await?;
    Ok("OK")
}
