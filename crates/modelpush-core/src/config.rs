//! Upload configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{PushError, RepoId, RepoKind, SecretString};

/// Default Hub endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// Environment variable overriding the Hub endpoint.
pub const ENDPOINT_ENV: &str = "HF_ENDPOINT";

/// Default hosted inference endpoint.
pub const DEFAULT_INFERENCE_ENDPOINT: &str = "https://api-inference.huggingface.co";

/// Everything needed to push one folder to one repository.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Local directory containing the model files.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Target repository (`namespace/name`).
    #[serde(default)]
    pub repo_id: Option<RepoId>,

    /// Repository kind.
    #[serde(default)]
    pub repo_type: RepoKind,

    /// Access token with write permission.
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Commit summary line.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Optional commit description body.
    #[serde(default)]
    pub commit_description: Option<String>,

    /// Branch to commit to.
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Create the repository as private if it does not exist yet.
    #[serde(default)]
    pub private: bool,

    /// Hub base URL, `None` until set by a flag, the file or `HF_ENDPOINT`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Gitignore-style patterns for files that are never uploaded.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            repo_id: None,
            repo_type: RepoKind::default(),
            token: None,
            commit_message: default_commit_message(),
            commit_description: None,
            revision: default_revision(),
            private: false,
            endpoint: None,
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl UploadConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        // An empty document is valid and means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `HF_ENDPOINT` from the process environment.
    pub fn merge_env(self) -> Self {
        self.merge_env_from(|var| std::env::var(var).ok())
    }

    /// Apply environment overrides using a custom lookup.
    ///
    /// The endpoint variable is only consulted when no endpoint was set in the
    /// file or on the command line, whatever value that explicit endpoint has.
    pub fn merge_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.endpoint.is_none() {
            if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|e| !e.trim().is_empty()) {
                tracing::debug!(endpoint = %endpoint, "Using endpoint from {}", ENDPOINT_ENV);
                self.endpoint = Some(endpoint);
            }
        }
        self.endpoint = self
            .endpoint
            .map(|e| e.trim().trim_end_matches('/').to_string());
        self
    }

    /// Hub base URL in effect, the public Hub when none was set.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// The configured repository, or an error if none was given.
    pub fn require_repo_id(&self) -> crate::Result<&RepoId> {
        self.repo_id.as_ref().ok_or_else(|| {
            PushError::Config(
                "repository id is required, pass --repo-id or set repo_id in the config file"
                    .into(),
            )
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        self.require_repo_id()?;

        if self.commit_message.trim().is_empty() {
            return Err(PushError::Config("commit message must not be empty".into()));
        }

        if self.revision.trim().is_empty() {
            return Err(PushError::Config("revision must not be empty".into()));
        }

        let endpoint = self.endpoint();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(PushError::Config(format!(
                "endpoint '{endpoint}' must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// Web URL of the target repository.
    pub fn repo_url(&self) -> crate::Result<String> {
        let repo_id = self.require_repo_id()?;
        Ok(format!(
            "{}/{}{}",
            self.endpoint().trim_end_matches('/'),
            self.repo_type.url_prefix(),
            repo_id
        ))
    }

    /// Sample configuration written by `modelpush init`.
    pub fn sample_yaml() -> &'static str {
        SAMPLE_YAML
    }
}

const SAMPLE_YAML: &str = r#"# modelpush upload configuration

# Local folder with the model files (weights, config.json, tokenizer, ...)
model_path: ./my_model_directory

# Target repository on the Hub
repo_id: your-username/your-model

# model or dataset
repo_type: model

# Write token. Prefer the HF_TOKEN environment variable or `modelpush login`.
# token: hf_xxx

commit_message: Upload model via script
# commit_description: Trained with ...

revision: main
private: false

# Defaults to HF_ENDPOINT, then to the public Hub
# endpoint: https://huggingface.co

ignore_patterns:
  - .git
  - .DS_Store
  - __pycache__
"#;

// Default value functions
fn default_model_path() -> PathBuf {
    PathBuf::from("./my_model_directory")
}
fn default_commit_message() -> String {
    "Upload model via script".into()
}
fn default_revision() -> String {
    "main".into()
}
fn default_ignore_patterns() -> Vec<String> {
    vec![".git".into(), ".DS_Store".into(), "__pycache__".into()]
}
