//! Repository identifiers and kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PushError;

const MAX_NAME_LEN: usize = 96;

/// Kind of Hub repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Model repository.
    #[default]
    Model,
    /// Dataset repository.
    Dataset,
}

impl RepoKind {
    /// Prefix used in web and git URLs (`""` for models).
    #[must_use]
    pub const fn url_prefix(&self) -> &'static str {
        match self {
            Self::Model => "",
            Self::Dataset => "datasets/",
        }
    }

    /// Plural path segment used by the REST API (`/api/models/...`).
    #[must_use]
    pub const fn api_segment(&self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
        }
    }

    /// Value of the `type` field when creating a repository.
    ///
    /// Models are the server default and are sent without a type.
    #[must_use]
    pub const fn create_type(&self) -> Option<&'static str> {
        match self {
            Self::Model => None,
            Self::Dataset => Some("dataset"),
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model"),
            Self::Dataset => f.write_str("dataset"),
        }
    }
}

impl FromStr for RepoKind {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "model" | "models" => Ok(Self::Model),
            "dataset" | "datasets" => Ok(Self::Dataset),
            other => Err(PushError::Config(format!(
                "unknown repo type '{other}', expected 'model' or 'dataset'"
            ))),
        }
    }
}

/// A Hub repository identifier, `namespace/name` or a bare `name`.
///
/// A bare name must be [qualified](RepoId::qualify) with the account
/// namespace before it is used in repository URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    namespace: Option<String>,
    name: String,
}

impl RepoId {
    /// Parse and validate an identifier.
    pub fn parse(repo_id: &str) -> crate::Result<Self> {
        let repo_id = repo_id.trim();
        if repo_id.is_empty() {
            return Err(PushError::invalid_repo_id(repo_id, "must not be empty"));
        }

        let mut parts = repo_id.split('/');
        let (namespace, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => (None, name),
            (Some(namespace), Some(name), None) => (Some(namespace), name),
            _ => {
                return Err(PushError::invalid_repo_id(
                    repo_id,
                    "expected 'namespace/name' with a single '/'",
                ))
            }
        };

        if let Some(namespace) = namespace {
            validate_part(repo_id, "namespace", namespace)?;
        }
        validate_part(repo_id, "name", name)?;

        Ok(Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        })
    }

    /// Owning user or organization, if given.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Repository name without namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the owner is part of the identifier.
    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }

    /// Place a bare name under `namespace`.
    ///
    /// Identifiers that already carry a namespace are returned unchanged.
    pub fn qualify(&self, namespace: &str) -> crate::Result<Self> {
        if self.is_qualified() {
            return Ok(self.clone());
        }
        Self::parse(&format!("{namespace}/{}", self.name))
    }
}

fn validate_part(repo_id: &str, what: &str, part: &str) -> crate::Result<()> {
    if part.is_empty() {
        return Err(PushError::invalid_repo_id(
            repo_id,
            format!("{what} must not be empty"),
        ));
    }
    if part.len() > MAX_NAME_LEN {
        return Err(PushError::invalid_repo_id(
            repo_id,
            format!("{what} is longer than {MAX_NAME_LEN} characters"),
        ));
    }
    if let Some(c) = part
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(PushError::invalid_repo_id(
            repo_id,
            format!("{what} contains invalid character '{c}'"),
        ));
    }
    if part.contains("--") || part.contains("..") {
        return Err(PushError::invalid_repo_id(
            repo_id,
            format!("'--' and '..' are forbidden in the {what}"),
        ));
    }
    if part.starts_with(['-', '.']) || part.ends_with(['-', '.']) {
        return Err(PushError::invalid_repo_id(
            repo_id,
            format!("{what} cannot start or end with '-' or '.'"),
        ));
    }
    Ok(())
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for RepoId {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoId {
    type Error = PushError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
    }
}
