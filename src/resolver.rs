//! Folder resolution.
//!
//! Turns "maybe a folder ID from the config file" into a concrete folder the
//! proxy will bill translations to:
//!
//! ```text
//! ConfiguredFolder ──ok──────────────────────────────────────────► Resolved
//!        │ 404
//!        ▼
//!    NoFolder ──list clouds──► CloudChosen ──list folders──► Resolved
//!                  │ 0 ⇒ fatal     │ 0 usable ⇒ create
//!                  │ 1 ⇒ auto      │ 1 ⇒ auto
//!                  │ n ⇒ ask       │ n ⇒ ask
//! ```
//!
//! Every branch ends in a folder ID or an error.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::CloudClient;
use crate::errors::ClientError;
use crate::models::cloud::Folder;
use crate::prompt::{Prompt, PromptError};

/// Invalid answers tolerated per question before giving up.
pub const MAX_CHOICE_ATTEMPTS: usize = 5;

const CHOICE_QUESTION: &str = "Please enter your numeric choice: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    pub cloud_id: String,
    pub folder_id: String,
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Name used when the cloud has no usable folder and one is created.
    pub new_folder_name: String,
    /// Offer folders in every status, not only `ACTIVE`.
    pub all_folders: bool,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("there is no cloud for your account. Please create it")]
    NoCloud,

    #[error("{context}: {source}")]
    Client {
        context: &'static str,
        source: ClientError,
    },

    #[error("create cloud folder {name}: {source}")]
    CreateFolder { name: String, source: ClientError },

    #[error("create cloud folder {name} error code {code}, {message}")]
    FolderOperation {
        name: String,
        code: i32,
        message: String,
    },

    #[error("no valid {what} entered after {attempts} attempts")]
    TooManyInvalidAnswers { what: &'static str, attempts: usize },

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

#[derive(Debug)]
enum State {
    ConfiguredFolder(String),
    NoFolder,
    CloudChosen(String),
    Resolved(ResolvedScope),
}

pub struct Resolver<'a> {
    client: &'a CloudClient,
    prompt: &'a mut dyn Prompt,
    options: &'a ResolverOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(client: &'a CloudClient, prompt: &'a mut dyn Prompt, options: &'a ResolverOptions) -> Self {
        Self {
            client,
            prompt,
            options,
        }
    }

    /// Run the state machine to completion.
    pub async fn resolve(&mut self, configured_folder: Option<&str>) -> Result<ResolvedScope, ResolveError> {
        let mut state = match configured_folder.filter(|id| !id.is_empty()) {
            Some(id) => State::ConfiguredFolder(id.to_string()),
            None => State::NoFolder,
        };

        loop {
            debug!(?state, "resolver step");
            state = match state {
                State::ConfiguredFolder(folder_id) => self.validate_configured(folder_id).await?,
                State::NoFolder => State::CloudChosen(self.choose_cloud().await?),
                State::CloudChosen(cloud_id) => {
                    let folder_id = self.choose_folder(&cloud_id).await?;
                    State::Resolved(ResolvedScope { cloud_id, folder_id })
                }
                State::Resolved(scope) => {
                    info!(cloud_id = %scope.cloud_id, folder_id = %scope.folder_id, "folder resolved");
                    return Ok(scope);
                }
            };
        }
    }

    async fn validate_configured(&mut self, folder_id: String) -> Result<State, ResolveError> {
        match self.client.get_folder(&folder_id).await {
            Ok(folder) => Ok(State::Resolved(ResolvedScope {
                cloud_id: folder.cloud_id,
                folder_id,
            })),
            Err(e) if e.is_status(404) => {
                warn!(folder_id = %folder_id, "configured folder not found");
                Ok(State::NoFolder)
            }
            Err(source) => Err(ResolveError::Client {
                context: "get configured folder",
                source,
            }),
        }
    }

    async fn choose_cloud(&mut self) -> Result<String, ResolveError> {
        let clouds = self
            .client
            .list_clouds()
            .await
            .map_err(|source| ResolveError::Client {
                context: "list clouds",
                source,
            })?;

        match clouds.as_slice() {
            [] => Err(ResolveError::NoCloud),
            [cloud] => {
                self.prompt
                    .say(&format!("cloud {} (id = {}) automatically selected", cloud.name, cloud.id))
                    .await?;
                Ok(cloud.id.clone())
            }
            _ => {
                self.prompt.say("Please select cloud to use:").await?;
                for (i, cloud) in clouds.iter().enumerate() {
                    let n = i + 1;
                    self.prompt
                        .say(&format!("[{}] cloud{} (id = {}, name = {})", n, n, cloud.id, cloud.name))
                        .await?;
                }
                let index = self.read_choice("cloud", clouds.len()).await?;
                Ok(clouds[index].id.clone())
            }
        }
    }

    async fn choose_folder(&mut self, cloud_id: &str) -> Result<String, ResolveError> {
        let folders = self
            .client
            .list_folders(cloud_id)
            .await
            .map_err(|source| ResolveError::Client {
                context: "list cloud folders",
                source,
            })?;

        let candidates: Vec<Folder> = if self.options.all_folders {
            folders
        } else {
            folders.into_iter().filter(Folder::is_active).collect()
        };

        match candidates.as_slice() {
            [] => self.create_folder(cloud_id).await,
            [folder] => {
                self.prompt
                    .say(&format!(
                        "folder {} (id = {}, status = {}) automatically selected",
                        folder.name, folder.id, folder.status
                    ))
                    .await?;
                Ok(folder.id.clone())
            }
            _ => {
                self.prompt.say("Please choose a folder to use:").await?;
                for (i, folder) in candidates.iter().enumerate() {
                    let n = i + 1;
                    self.prompt
                        .say(&format!(
                            "[{}] folder{} (id = {}, name = {}, status = {})",
                            n, n, folder.id, folder.name, folder.status
                        ))
                        .await?;
                }
                let index = self.read_choice("folder", candidates.len()).await?;
                Ok(candidates[index].id.clone())
            }
        }
    }

    /// Create the default folder. A 409 (name held by a folder pending
    /// deletion) asks for another name and retries exactly once.
    async fn create_folder(&mut self, cloud_id: &str) -> Result<String, ResolveError> {
        let mut name = self.options.new_folder_name.clone();
        info!(cloud_id, name = %name, "trying to create folder");

        let operation = match self.client.create_folder(cloud_id, &name).await {
            Ok(operation) => operation,
            Err(e) if e.is_status(409) => {
                warn!(name = %name, "folder name conflicts with an existing, possibly deleted, folder");
                self.prompt
                    .say(&format!("Folder name {} is already taken.", name))
                    .await?;
                name = self.read_name().await?;
                self.client
                    .create_folder(cloud_id, &name)
                    .await
                    .map_err(|source| ResolveError::CreateFolder {
                        name: name.clone(),
                        source,
                    })?
            }
            Err(source) => return Err(ResolveError::CreateFolder { name, source }),
        };

        if !operation.done {
            let (code, message) = operation
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or_else(|| (0, "operation did not complete".to_string()));
            return Err(ResolveError::FolderOperation { name, code, message });
        }

        let folder_id = operation.folder_id().to_string();
        self.prompt
            .say(&format!("folder {} (id = {}) automatically created", name, folder_id))
            .await?;
        Ok(folder_id)
    }

    /// 1-based choice among `count` items, returned 0-based.
    async fn read_choice(&mut self, what: &'static str, count: usize) -> Result<usize, ResolveError> {
        for _ in 0..MAX_CHOICE_ATTEMPTS {
            let answer = self.prompt.ask(CHOICE_QUESTION).await?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
                _ => {
                    self.prompt
                        .say(&format!(
                            "Entered invalid {} number, must be in the range {} to {}",
                            what, 1, count
                        ))
                        .await?
                }
            }
        }
        Err(ResolveError::TooManyInvalidAnswers {
            what,
            attempts: MAX_CHOICE_ATTEMPTS,
        })
    }

    async fn read_name(&mut self) -> Result<String, ResolveError> {
        for _ in 0..MAX_CHOICE_ATTEMPTS {
            let name = self.prompt.ask("Please enter your new folder name: ").await?;
            if !name.is_empty() {
                return Ok(name);
            }
        }
        Err(ResolveError::TooManyInvalidAnswers {
            what: "folder name",
            attempts: MAX_CHOICE_ATTEMPTS,
        })
    }
}
