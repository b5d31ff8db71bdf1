//! Resource-manager and IAM wire records.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IamTokenRequest {
    pub yandex_passport_oauth_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamTokenResponse {
    pub iam_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cloud {
    pub id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub description: String,
    pub organization_id: String,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudsResponse {
    pub clouds: Vec<Cloud>,
    pub next_page_token: String,
}

/// Folder lifecycle state. Only `ACTIVE` folders are offered by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FolderStatus {
    Active,
    #[default]
    Unspecified,
    Other(String),
}

impl From<String> for FolderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ACTIVE" => FolderStatus::Active,
            "" | "STATUS_UNSPECIFIED" => FolderStatus::Unspecified,
            _ => FolderStatus::Other(value),
        }
    }
}

impl From<FolderStatus> for String {
    fn from(value: FolderStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FolderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderStatus::Active => f.write_str("ACTIVE"),
            FolderStatus::Unspecified => f.write_str("STATUS_UNSPECIFIED"),
            FolderStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Folder {
    pub id: String,
    pub cloud_id: String,
    pub created_at: Option<String>,
    pub name: String,
    pub description: String,
    pub labels: HashMap<String, String>,
    pub status: FolderStatus,
}

impl Folder {
    pub fn is_active(&self) -> bool {
        self.status == FolderStatus::Active
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoldersResponse {
    pub folders: Vec<Folder>,
    pub next_page_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub cloud_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `google.rpc.Status` carried by a failed operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OperationError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateFolderMetadata {
    pub folder_id: String,
}

/// Long-running operation returned by folder creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub id: String,
    pub description: String,
    pub created_at: Option<String>,
    pub created_by: String,
    pub modified_at: Option<String>,
    pub done: bool,
    pub metadata: Option<CreateFolderMetadata>,
    pub error: Option<OperationError>,
    pub response: Option<Folder>,
}

impl Operation {
    /// ID of the folder this operation created: the embedded folder, then the
    /// metadata, then the operation's own id.
    pub fn folder_id(&self) -> &str {
        if let Some(folder) = self.response.as_ref().filter(|f| !f.id.is_empty()) {
            return &folder.id;
        }
        if let Some(meta) = self.metadata.as_ref().filter(|m| !m.folder_id.is_empty()) {
            return &meta.folder_id;
        }
        &self.id
    }
}
