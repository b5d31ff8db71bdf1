use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW};
use axum::http::{HeaderName, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

use crate::errors::AppError;
use crate::models::translate::{TranslateRequest, TranslateResponse};
use crate::AppState;

use super::legacy::{extract_language, split_src_dest_languages, V15Query, V15TranslateResponse};

type CorsHeaders = [(HeaderName, &'static str); 2];

fn cors() -> CorsHeaders {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

/// Any method on `/` other than POST: liveness answer.
pub async fn default_handler() -> impl IntoResponse {
    (StatusCode::OK, cors(), "ok")
}

/// `POST /`: Translate v2 request body in, Translate v2 response out.
pub async fn translate_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(CorsHeaders, Json<TranslateResponse>), AppError> {
    let mut request: TranslateRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("request unmarshal: {}", e)))?;

    request.source_language_code = request
        .source_language_code
        .as_deref()
        .map(extract_language)
        .filter(|code| !code.is_empty())
        .map(str::to_string);
    request.target_language_code = extract_language(&request.target_language_code).to_string();

    let response = state.translator.translate(request).await?;
    debug!("<- {} translations", response.translations.len());
    Ok((cors(), Json(response)))
}

/// `GET /api/v1.5/tr.json/translate?text=..&lang=SRC-DST`
pub async fn v1_5_translate_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<V15Query>,
) -> Result<(CorsHeaders, Json<V15TranslateResponse>), AppError> {
    let (src, dst) = split_src_dest_languages(&query.lang).map_err(AppError::BadRequest)?;

    let request = TranslateRequest {
        folder_id: None,
        texts: vec![query.text],
        source_language_code: Some(src.to_string()),
        target_language_code: dst.to_string(),
    };
    let response = state.translator.translate(request).await?;
    Ok((cors(), Json(response.into())))
}

/// `OPTIONS /api/v1.5/tr.json/translate`
pub async fn v1_5_options_handler() -> impl IntoResponse {
    (StatusCode::OK, [(ALLOW, "GET,OPTIONS")])
}
