//! Yandex Cloud API client: resource-manager listing/creation and Translate.
//!
//! Every call goes through the [`RequestExecutor`]; only `translate` uses the
//! refresh-and-retry-on-401 policy.

pub mod executor;

use std::collections::HashSet;

use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::config::Endpoints;
use crate::errors::{ClientError, RequestError};
use crate::models::cloud::{
    Cloud, CloudsResponse, CreateFolderRequest, Folder, FoldersResponse, Operation,
};
use crate::models::translate::{TranslateRequest, TranslateResponse};

pub use executor::RequestExecutor;

pub struct CloudClient {
    executor: RequestExecutor,
    endpoints: Endpoints,
}

impl CloudClient {
    pub fn new(executor: RequestExecutor, endpoints: Endpoints) -> Self {
        Self { executor, endpoints }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// All clouds visible to the account, across pages.
    pub async fn list_clouds(&self) -> Result<Vec<Cloud>, ClientError> {
        let mut clouds = Vec::new();
        let mut page_token = String::new();
        let mut seen = HashSet::new();
        loop {
            let mut url = self.endpoints.clouds.clone();
            if !page_token.is_empty() {
                url.query_pairs_mut().append_pair("pageToken", &page_token);
            }
            let page: CloudsResponse = self
                .executor
                .execute::<(), _>("clouds", Method::GET, url, None, false)
                .await?;
            clouds.extend(page.clouds);
            if page.next_page_token.is_empty() {
                break;
            }
            page_token = next_page("clouds", &mut seen, page.next_page_token)?;
        }
        debug!(count = clouds.len(), "listed clouds");
        Ok(clouds)
    }

    /// All folders of `cloud_id`, across pages.
    pub async fn list_folders(&self, cloud_id: &str) -> Result<Vec<Folder>, ClientError> {
        let mut folders = Vec::new();
        let mut page_token = String::new();
        let mut seen = HashSet::new();
        loop {
            let mut url = self.endpoints.folders.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("cloudId", cloud_id);
                if !page_token.is_empty() {
                    query.append_pair("pageToken", &page_token);
                }
            }
            let page: FoldersResponse = self
                .executor
                .execute::<(), _>("cloud folders", Method::GET, url, None, false)
                .await?;
            folders.extend(page.folders);
            if page.next_page_token.is_empty() {
                break;
            }
            page_token = next_page("cloud folders", &mut seen, page.next_page_token)?;
        }
        debug!(cloud_id, count = folders.len(), "listed folders");
        Ok(folders)
    }

    pub async fn get_folder(&self, folder_id: &str) -> Result<Folder, ClientError> {
        let url = self.folder_url(folder_id);
        self.executor
            .execute::<(), _>("get folder", Method::GET, url, None, true)
            .await
    }

    pub async fn create_folder(&self, cloud_id: &str, name: &str) -> Result<Operation, ClientError> {
        let request = CreateFolderRequest {
            cloud_id: cloud_id.to_string(),
            name: name.to_string(),
            description: None,
        };
        self.executor
            .execute(
                "create folder",
                Method::POST,
                self.endpoints.folders.clone(),
                Some(&request),
                true,
            )
            .await
    }

    /// Translate `request` under `request.folder_id`, which the caller has
    /// already filled in.
    pub async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse, ClientError> {
        let response: TranslateResponse = self
            .executor
            .execute_with_reauth(
                "translate",
                Method::POST,
                self.endpoints.translate.clone(),
                Some(request),
                true,
            )
            .await?;
        debug!(call = "translate", "<- {} translations", response.translations.len());
        Ok(response)
    }

    fn folder_url(&self, folder_id: &str) -> Url {
        let mut url = self.endpoints.folders.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(folder_id);
        }
        url
    }
}

/// A listing that hands back a token it already gave would never end.
fn next_page(call: &str, seen: &mut HashSet<String>, token: String) -> Result<String, ClientError> {
    if !seen.insert(token.clone()) {
        return Err(RequestError::transport(call, format!("repeated page token {}", token)).into());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, TokenManager};
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CloudClient {
        let endpoints = Endpoints::under(&server.uri()).unwrap();
        let creds = Credentials {
            oauth_token: "y0_oauth".into(),
            access_token: "t1.cached".into(),
            access_token_expiry: Some(Utc::now() + Duration::hours(1)),
        };
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(creds, http.clone(), endpoints.iam_token.clone()));
        CloudClient::new(RequestExecutor::new(http, tokens, false), endpoints)
    }

    #[tokio::test]
    async fn test_list_clouds_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/clouds"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clouds": [{"id": "c1", "name": "first"}],
                "nextPageToken": "p2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/clouds"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clouds": [{"id": "c2", "name": "second"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids: Vec<_> = client(&server)
            .list_clouds()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, ["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_list_folders_passes_cloud_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/folders"))
            .and(query_param("cloudId", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folders": [{"id": "f1", "cloudId": "c1", "name": "default", "status": "ACTIVE"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let folders = client(&server).list_folders("c1").await.unwrap();
        assert_eq!(folders.len(), 1);
        assert!(folders[0].is_active());
    }

    #[tokio::test]
    async fn test_empty_listing_body_is_no_folders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/folders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        assert!(client(&server).list_folders("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_folder_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/folders/b1gfolder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "b1gfolder", "cloudId": "c9", "status": "ACTIVE"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let folder = client(&server).get_folder("b1gfolder").await.unwrap();
        assert_eq!(folder.cloud_id, "c9");
    }

    #[tokio::test]
    async fn test_create_folder_posts_cloud_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource-manager/v1/folders"))
            .and(body_json(serde_json::json!({"cloudId": "c1", "name": "translate-proxy"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "op1", "done": true, "response": {"id": "f-new"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let op = client(&server).create_folder("c1", "translate-proxy").await.unwrap();
        assert!(op.done);
        assert_eq!(op.folder_id(), "f-new");
    }

    #[tokio::test]
    async fn test_repeated_page_token_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/clouds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clouds": [{"id": "c1"}],
                "nextPageToken": "same"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client(&server).list_clouds(),
        )
        .await
        .expect("listing must terminate");
        let err = result.unwrap_err();
        assert!(matches!(err, ClientError::Request(RequestError::Transport { .. })));
        assert!(err.to_string().contains("repeated page token"));
    }

    #[tokio::test]
    async fn test_folder_page_cycle_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/folders"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folders": [{"id": "f1"}], "nextPageToken": "a"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/folders"))
            .and(query_param("pageToken", "a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folders": [{"id": "f2"}], "nextPageToken": "b"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resource-manager/v1/folders"))
            .and(query_param("pageToken", "b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folders": [{"id": "f3"}], "nextPageToken": "a"
            })))
            .mount(&server)
            .await;

        let err = client(&server).list_folders("c1").await.unwrap_err();
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("repeated page token a"));
    }
}
