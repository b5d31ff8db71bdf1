#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use translate_proxy::config::{Config, Endpoints};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const IAM: &str = "/iam/v1/tokens";
pub const CLOUDS: &str = "/resource-manager/v1/clouds";
pub const FOLDERS: &str = "/resource-manager/v1/folders";
pub const TRANSLATE: &str = "/translate/v2/translate";

/// Config pointing every endpoint at `server`.
pub fn config(server: &MockServer, config_file: PathBuf, persist_on_refresh: bool) -> Config {
    Config {
        config_file,
        persist_on_refresh,
        new_folder_name: "translate-proxy".into(),
        all_folders: false,
        oauth_token_url: "https://oauth.example/authorize".into(),
        endpoints: Endpoints::under(&server.uri()).unwrap(),
        address: "127.0.0.1:0".into(),
        insecure: false,
        accesslog: false,
        tls: None,
        request_timeout: Duration::from_secs(5),
        log_json: false,
    }
}

pub async fn mount_iam(server: &MockServer, oauth: &str, iam: &str, expect: u64) {
    let expires_at = (Utc::now() + chrono::Duration::hours(12)).to_rfc3339();
    Mock::given(method("POST"))
        .and(path(IAM))
        .and(body_json(json!({ "yandexPassportOauthToken": oauth })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "iamToken": iam,
            "expiresAt": expires_at
        })))
        .expect(expect)
        .mount(server)
        .await;
}

pub async fn mount_folder(server: &MockServer, folder_id: &str, cloud_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", FOLDERS, folder_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": folder_id,
            "cloudId": cloud_id,
            "name": "default",
            "status": "ACTIVE"
        })))
        .mount(server)
        .await;
}
