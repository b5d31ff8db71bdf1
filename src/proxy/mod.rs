//! HTTP front end: the Translate v2 passthrough on `/` and the v1.5
//! `tr.json` emulation.

pub mod handler;
pub mod legacy;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

const V1_5_TRANSLATE: &str = "/api/v1.5/tr.json/translate";

/// Build the router. `accesslog` adds a per-request trace span and log line.
pub fn router(state: Arc<AppState>, accesslog: bool) -> Router {
    let v1_5 = get(handler::v1_5_translate_handler).options(handler::v1_5_options_handler);

    let app = Router::new()
        .route(
            "/",
            post(handler::translate_handler).fallback(handler::default_handler),
        )
        .route(V1_5_TRANSLATE, v1_5.clone())
        .route(&format!("{}/", V1_5_TRANSLATE), v1_5)
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware));

    if accesslog {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

/// Injects a unique `x-request-id` into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
