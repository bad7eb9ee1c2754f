//! Folder upload flow: login, ensure the repository, commit the folder.

use modelpush_core::{PushError, RepoId, Result, SecretString, UploadConfig};

use crate::client::{CreateRepoRequest, HubApi, UploadFolderRequest, User};
use crate::commit::CommitInfo;

/// Console sink for user-facing progress lines.
pub trait Reporter: Send + Sync {
    /// A step is starting.
    fn progress(&self, message: &str);
    /// The upload finished.
    fn success(&self, message: &str);
    /// Something is off but nothing was attempted.
    fn warning(&self, message: &str);
    /// The upload failed.
    fn failure(&self, message: &str);
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Files were committed.
    Uploaded {
        /// Web URL of the repository.
        url: String,
        /// The new commit.
        commit: CommitInfo,
    },
    /// A remote call failed; the error was reported, not propagated.
    Failed {
        /// Reported error text.
        message: String,
    },
    /// Nothing was attempted.
    Skipped {
        /// Why.
        reason: String,
    },
}

impl UploadOutcome {
    /// Whether the files made it to the Hub.
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Check the local folder, then upload it.
///
/// A missing folder only produces a warning and no remote call is made.
pub async fn run<A: HubApi + ?Sized>(
    api: &A,
    config: &UploadConfig,
    login_token: Option<&SecretString>,
    reporter: &dyn Reporter,
) -> UploadOutcome {
    if !config.model_path.exists() {
        let reason = format!(
            "folder '{}' not found. Make sure the path is correct before running.",
            config.model_path.display()
        );
        tracing::warn!(path = %config.model_path.display(), "Model folder not found");
        reporter.warning(&reason);
        return UploadOutcome::Skipped { reason };
    }

    upload_model(api, config, login_token, reporter).await
}

/// Upload `config.model_path` to `config.repo_id`.
///
/// When `login_token` is set it is checked with the Hub before anything else.
/// A bare repository name is placed under the token owner's namespace.
/// Every error is caught here and reported; the caller only sees the outcome.
pub async fn upload_model<A: HubApi + ?Sized>(
    api: &A,
    config: &UploadConfig,
    login_token: Option<&SecretString>,
    reporter: &dyn Reporter,
) -> UploadOutcome {
    match try_upload(api, config, login_token, reporter).await {
        Ok((url, commit)) => {
            reporter.success(&format!("Successfully uploaded model to {url}"));
            UploadOutcome::Uploaded { url, commit }
        }
        Err(e) => {
            tracing::error!(error = %e, "Upload failed");
            let message = format!("Error uploading model: {e}");
            reporter.failure(&message);
            UploadOutcome::Failed { message }
        }
    }
}

async fn try_upload<A: HubApi + ?Sized>(
    api: &A,
    config: &UploadConfig,
    login_token: Option<&SecretString>,
    reporter: &dyn Reporter,
) -> Result<(String, CommitInfo)> {
    let configured: &RepoId = config.require_repo_id()?;

    let mut account: Option<User> = None;
    if let Some(token) = login_token {
        let user = api.login(token).await?;
        tracing::info!(user = %user.name, "Logged in");
        if user.token_role() == Some("read") {
            return Err(PushError::Unauthorized(format!(
                "token for '{}' is read-only, a write token is required",
                user.name
            )));
        }
        account = Some(user);
    }

    let repo_id = if configured.is_qualified() {
        configured.clone()
    } else {
        let user = match account {
            Some(user) => user,
            None => api.whoami().await?,
        };
        let qualified = configured.qualify(&user.name)?;
        tracing::info!(repo = %qualified, "Using the token owner's namespace");
        qualified
    };

    reporter.progress(&format!(
        "Starting upload from '{}' to '{}'...",
        config.model_path.display(),
        repo_id
    ));

    let url = api
        .create_repo(&CreateRepoRequest {
            repo_id: repo_id.clone(),
            repo_type: config.repo_type,
            private: config.private,
            exist_ok: true,
        })
        .await?;

    let commit = api
        .upload_folder(&UploadFolderRequest {
            folder_path: config.model_path.clone(),
            repo_id,
            repo_type: config.repo_type,
            revision: config.revision.clone(),
            commit_message: config.commit_message.clone(),
            commit_description: config.commit_description.clone(),
            ignore_patterns: config.ignore_patterns.clone(),
        })
        .await?;

    Ok((url, commit))
}
