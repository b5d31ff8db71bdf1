//! Authenticated request/response cycle shared by every upstream call.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::TokenManager;
use crate::errors::{ClientError, RequestError};

/// Send a prepared request, read the whole body, and classify the outcome.
///
/// 200 decodes into `T`; any other status becomes [`RequestError::Status`];
/// everything that fails before a status is known, or while reading/decoding
/// the body, becomes [`RequestError::Transport`]. An empty 200 body yields
/// `T::default()` unless `expect_response` is set.
pub(crate) async fn dispatch<T>(
    call: &str,
    request: RequestBuilder,
    expect_response: bool,
) -> Result<T, RequestError>
where
    T: DeserializeOwned + Default,
{
    let response = request
        .send()
        .await
        .map_err(|e| RequestError::transport(call, format!("response: {}", e)))?;

    let status = response.status();
    // The body is drained here on every path so the connection goes back to the pool.
    let payload = response.bytes().await;

    if status != StatusCode::OK {
        let body = payload
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        return Err(RequestError::Status {
            call: call.to_string(),
            code: status.as_u16(),
            status: status.to_string(),
            body,
        });
    }

    let payload = payload
        .map_err(|e| RequestError::transport(call, format!("response payload read: {}", e)))?;

    if payload.is_empty() {
        if expect_response {
            return Err(RequestError::transport(call, "empty response payload"));
        }
        return Ok(T::default());
    }

    serde_json::from_slice(&payload).map_err(|e| {
        RequestError::transport(
            call,
            format!(
                "response payload unmarshal {}: {}",
                String::from_utf8_lossy(&payload),
                e
            ),
        )
    })
}

/// Executes bearer-authenticated calls with a token from the [`TokenManager`].
pub struct RequestExecutor {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    persist_on_refresh: bool,
}

impl RequestExecutor {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenManager>, persist_on_refresh: bool) -> Self {
        Self {
            http,
            tokens,
            persist_on_refresh,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Run one authenticated call. No retry.
    pub async fn execute<B, T>(
        &self,
        call: &str,
        method: Method,
        url: Url,
        body: Option<&B>,
        expect_response: bool,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let payload = encode_body(call, body)?;
        let token = self.tokens.access_token(self.persist_on_refresh).await?;
        Ok(self
            .send(call, method, &url, payload.as_deref(), expect_response, &token)
            .await?)
    }

    /// Like [`execute`](Self::execute), but a 401 forces one token refresh and
    /// one retry. Any other failure, and a failure of the retry, is returned
    /// unchanged.
    pub async fn execute_with_reauth<B, T>(
        &self,
        call: &str,
        method: Method,
        url: Url,
        body: Option<&B>,
        expect_response: bool,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let payload = encode_body(call, body)?;
        let token = self.tokens.access_token(self.persist_on_refresh).await?;

        match self
            .send(call, method.clone(), &url, payload.as_deref(), expect_response, &token)
            .await
        {
            Err(e) if e.status_code() == Some(401) => {
                debug!(call, "unauthorized request, trying to refresh token, message: {}", e);
                let fresh = self
                    .tokens
                    .force_refresh(&token, self.persist_on_refresh)
                    .await?;
                Ok(self
                    .send(call, method, &url, payload.as_deref(), expect_response, &fresh)
                    .await?)
            }
            other => Ok(other?),
        }
    }

    async fn send<T>(
        &self,
        call: &str,
        method: Method,
        url: &Url,
        payload: Option<&[u8]>,
        expect_response: bool,
        token: &str,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Default,
    {
        let mut request = self
            .http
            .request(method, url.clone())
            .bearer_auth(token);
        if let Some(payload) = payload {
            debug!(call, "-> {}", String::from_utf8_lossy(payload));
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload.to_vec());
        }
        dispatch(call, request, expect_response).await
    }
}

fn encode_body<B>(call: &str, body: Option<&B>) -> Result<Option<Vec<u8>>, RequestError>
where
    B: Serialize + ?Sized,
{
    body.map(|b| {
        serde_json::to_vec(b)
            .map_err(|e| RequestError::transport(call, format!("request marshal: {}", e)))
    })
    .transpose()
}
