use tracing::debug;

use crate::client::CloudClient;
use crate::errors::ClientError;
use crate::models::translate::{TranslateRequest, TranslateResponse};
use crate::resolver::ResolvedScope;

/// Translate calls bound to the folder chosen at startup.
pub struct Translator {
    client: CloudClient,
    scope: ResolvedScope,
}

impl Translator {
    pub fn new(client: CloudClient, scope: ResolvedScope) -> Self {
        Self { client, scope }
    }

    pub fn scope(&self) -> &ResolvedScope {
        &self.scope
    }

    /// Requests without a folder are billed to the resolved one.
    pub async fn translate(&self, mut request: TranslateRequest) -> Result<TranslateResponse, ClientError> {
        if request.folder_id.as_deref().map_or(true, str::is_empty) {
            request.folder_id = Some(self.scope.folder_id.clone());
        }
        debug!(
            folder_id = request.folder_id.as_deref().unwrap_or_default(),
            texts = request.texts.len(),
            target = %request.target_language_code,
            "translate"
        );
        self.client.translate(&request).await
    }
}
