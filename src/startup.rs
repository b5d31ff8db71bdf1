//! Boot sequence run once before the listener starts.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use crate::auth::oauth::ensure_oauth_token;
use crate::auth::{Credentials, TokenManager};
use crate::client::{CloudClient, RequestExecutor};
use crate::config::Config;
use crate::prompt::Prompt;
use crate::resolver::{Resolver, ResolverOptions};
use crate::store::{CredentialStore, FileCredentialStore};
use crate::translator::Translator;
use crate::AppState;

/// Startup against the file store at `config.config_file`.
pub async fn bootstrap(config: &Config, prompt: &mut dyn Prompt) -> anyhow::Result<AppState> {
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(config.config_file.clone()));
    bootstrap_with_store(config, store, prompt).await
}

/// Load credentials, make sure the OAuth token works, resolve the folder,
/// write back what changed and hand over the state the router serves.
///
/// The store is only written when `config.persist_on_refresh` is set.
pub async fn bootstrap_with_store(
    config: &Config,
    store: Arc<dyn CredentialStore>,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<AppState> {
    let loaded = store.load().await.context("read config file")?;
    info!(backend = store.name(), folder_id = %loaded.folder_id, "loaded stored credentials");

    let http = config.http_client()?;
    let mut tokens = TokenManager::new(
        Credentials::from_stored(&loaded),
        http.clone(),
        config.endpoints.iam_token.clone(),
    );
    if config.persist_on_refresh {
        tokens = tokens.with_store(store.clone());
    }
    let tokens = Arc::new(tokens);

    ensure_oauth_token(&tokens, prompt, &config.oauth_token_url)
        .await
        .context("verify OAuth token")?;

    let client = CloudClient::new(
        RequestExecutor::new(http, tokens.clone(), config.persist_on_refresh),
        config.endpoints.clone(),
    );

    let options = ResolverOptions {
        new_folder_name: config.new_folder_name.clone(),
        all_folders: config.all_folders,
    };
    let configured = Some(loaded.folder_id.as_str()).filter(|id| !id.is_empty());
    let scope = Resolver::new(&client, prompt, &options)
        .resolve(configured)
        .await
        .context("select cloud folder")?;

    if config.persist_on_refresh {
        let mut current = loaded.clone();
        tokens.credentials().await.write_into(&mut current);
        current.folder_id = scope.folder_id.clone();
        if current != loaded {
            match store.save(&current).await {
                Ok(()) => info!(backend = store.name(), "stored credentials updated"),
                Err(e) => error!("write config file: {}", e),
            }
        }
    }

    Ok(AppState {
        translator: Translator::new(client, scope),
    })
}
