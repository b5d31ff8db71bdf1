//! Access-token lifecycle manager.
//!
//! Holds the in-memory [`Credentials`], decides when the IAM token must be
//! exchanged again, and performs the exchange. The whole check-refresh-write
//! sequence runs under one async mutex, so concurrent callers never issue
//! duplicate exchanges or overwrite a fresh expiry with a stale one.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::client::executor::dispatch;
use crate::errors::{ClientError, RequestError};
use crate::models::cloud::{IamTokenRequest, IamTokenResponse};
use crate::store::CredentialStore;

use super::Credentials;

pub struct TokenManager {
    state: Mutex<Credentials>,
    http: reqwest::Client,
    token_url: Url,
    store: Option<Arc<dyn CredentialStore>>,
}

impl TokenManager {
    pub fn new(credentials: Credentials, http: reqwest::Client, token_url: Url) -> Self {
        Self {
            state: Mutex::new(credentials),
            http,
            token_url,
            store: None,
        }
    }

    /// Store that refreshed tokens are written back to when persistence is requested.
    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Snapshot of the current credentials.
    pub async fn credentials(&self) -> Credentials {
        self.state.lock().await.clone()
    }

    pub async fn oauth_token(&self) -> String {
        self.state.lock().await.oauth_token.clone()
    }

    /// Replace the OAuth token. The cached access token belonged to the old
    /// one, so it is dropped.
    pub async fn set_oauth_token(&self, oauth_token: impl Into<String>) {
        let mut creds = self.state.lock().await;
        creds.oauth_token = oauth_token.into();
        creds.access_token.clear();
        creds.access_token_expiry = None;
    }

    /// Current access token, exchanging the OAuth token first if the cached
    /// one is empty or expired.
    pub async fn access_token(&self, persist_on_refresh: bool) -> Result<String, ClientError> {
        let mut creds = self.state.lock().await;
        if !creds.is_expired() {
            return Ok(creds.access_token.clone());
        }
        self.refresh_locked(&mut creds, persist_on_refresh).await
    }

    /// Exchange a new access token regardless of the cached expiry.
    ///
    /// `rejected` is the token the remote refused. If another caller already
    /// replaced it with a valid token, that one is returned without a second
    /// exchange.
    pub async fn force_refresh(
        &self,
        rejected: &str,
        persist_on_refresh: bool,
    ) -> Result<String, ClientError> {
        let mut creds = self.state.lock().await;
        if creds.access_token != rejected && !creds.is_expired() {
            debug!("access token already refreshed by a concurrent request");
            return Ok(creds.access_token.clone());
        }
        self.refresh_locked(&mut creds, persist_on_refresh).await
    }

    async fn refresh_locked(
        &self,
        creds: &mut Credentials,
        persist_on_refresh: bool,
    ) -> Result<String, ClientError> {
        let response = self
            .request_access_token(&creds.oauth_token)
            .await
            .map_err(ClientError::TokenRefresh)?;

        if response.expires_at.is_none() {
            warn!("IAM token response carries no expiry; it will be exchanged again on next use");
        }
        info!(
            token = %mask_token(&response.iam_token),
            expires_at = ?response.expires_at,
            "requested IAM token"
        );

        creds.access_token = response.iam_token;
        creds.access_token_expiry = response.expires_at;

        if persist_on_refresh {
            self.persist(creds).await;
        }
        Ok(creds.access_token.clone())
    }

    async fn request_access_token(&self, oauth_token: &str) -> Result<IamTokenResponse, RequestError> {
        const CALL: &str = "requestIamToken";
        let body = IamTokenRequest {
            yandex_passport_oauth_token: oauth_token.to_string(),
        };
        let request = self.http.post(self.token_url.clone()).json(&body);
        let response: IamTokenResponse = dispatch(CALL, request, true).await?;
        if response.iam_token.is_empty() {
            return Err(RequestError::transport(CALL, "response carries an empty IAM token"));
        }
        Ok(response)
    }

    /// Read-merge-write so the folder stored alongside the tokens survives.
    /// Failure is reported and swallowed: the fresh token is still usable.
    async fn persist(&self, creds: &Credentials) {
        let Some(store) = &self.store else {
            return;
        };
        let result = async {
            let mut doc = store.load().await?;
            creds.write_into(&mut doc);
            store.save(&doc).await
        }
        .await;
        if let Err(e) = result {
            error!(backend = store.name(), "failed to persist refreshed IAM token: {}", e);
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url.as_str())
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

/// First and last four characters only.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    } else {
        "****".to_string()
    }
}
