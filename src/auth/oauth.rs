//! Startup OAuth check: make sure the OAuth token we hold is accepted by the
//! IAM exchange, asking the operator for a new one when it is missing or
//! rejected.

use thiserror::Error;
use tracing::{info, warn};

use crate::errors::ClientError;
use crate::prompt::{Prompt, PromptError};

use super::TokenManager;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("OAuth token input: {0}")]
    Prompt(#[from] PromptError),
}

/// Loop until the OAuth token yields an access token.
///
/// The exchange is done without persisting; the caller writes the store once
/// startup has finished. A 401 from the exchange discards the OAuth token and
/// asks again; any other failure ends startup.
pub async fn ensure_oauth_token(
    tokens: &TokenManager,
    prompt: &mut dyn Prompt,
    oauth_token_url: &str,
) -> Result<(), OAuthError> {
    loop {
        if tokens.oauth_token().await.is_empty() {
            prompt.say(&format!("Please go to {}", oauth_token_url)).await?;
            prompt.say("in order to obtain OAuth token.").await?;
            let token = prompt.ask("Please enter OAuth token: ").await?;
            tokens.set_oauth_token(token).await;
        }

        match tokens.access_token(false).await {
            Ok(_) => {
                info!("OAuth token accepted");
                return Ok(());
            }
            Err(e) if e.is_status(401) => {
                warn!("OAuth token rejected: {}", e);
                tokens.set_oauth_token(String::new()).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
