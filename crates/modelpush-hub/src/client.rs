//! Hub REST client.
//!
//! [`HubApi`] is the seam between the upload flow and the network. The
//! [`HttpHub`] implementation speaks the Hub's HTTP API through `reqwest`.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use modelpush_core::{PushError, RepoId, RepoKind, Result, SecretString};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use crate::commit::{
    commit_payload, preupload_request, CommitInfo, CommitOperation, PreuploadResponse,
    UploadMode, PREUPLOAD_BATCH,
};
use crate::folder::{scan_folder, LocalFile};
use crate::lfs::{request_batch, sha256_file, transfer_object, LfsObject, LfsTarget};

pub(crate) const USER_AGENT: &str = concat!("modelpush/", env!("CARGO_PKG_VERSION"));

/// Account behind a token, as reported by `whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// User or organization name.
    pub name: String,
    /// `user` or `org`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Organizations the user belongs to.
    #[serde(default)]
    pub orgs: Vec<Organization>,
    /// Token details.
    #[serde(default)]
    pub auth: Option<AuthInfo>,
}

impl User {
    /// Role of the access token (`read`, `write`, `fineGrained`), if reported.
    pub fn token_role(&self) -> Option<&str> {
        self.auth
            .as_ref()
            .and_then(|a| a.access_token.as_ref())
            .and_then(|t| t.role.as_deref())
    }
}

/// Organization membership.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organization {
    /// Organization name.
    pub name: String,
}

/// `auth` block of a `whoami` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthInfo {
    /// Token description.
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<AccessTokenInfo>,
}

/// Access token description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessTokenInfo {
    /// Token role.
    #[serde(default)]
    pub role: Option<String>,
}

/// Parameters for creating a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRepoRequest {
    /// Repository to create.
    pub repo_id: RepoId,
    /// Repository kind.
    pub repo_type: RepoKind,
    /// Create as private.
    pub private: bool,
    /// Treat "already exists" as success.
    pub exist_ok: bool,
}

/// Parameters for uploading a folder in one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFolderRequest {
    /// Local folder.
    pub folder_path: PathBuf,
    /// Target repository.
    pub repo_id: RepoId,
    /// Repository kind.
    pub repo_type: RepoKind,
    /// Branch to commit to.
    pub revision: String,
    /// Commit summary.
    pub commit_message: String,
    /// Commit description.
    pub commit_description: Option<String>,
    /// Gitignore-style patterns excluded from the upload.
    pub ignore_patterns: Vec<String>,
}

/// Remote operations needed to publish a folder.
#[async_trait]
pub trait HubApi: Send + Sync {
    /// Check a token and return the account it belongs to.
    async fn login(&self, token: &SecretString) -> Result<User>;

    /// Account behind the client's own token.
    async fn whoami(&self) -> Result<User>;

    /// Create a repository, returning its web URL.
    async fn create_repo(&self, request: &CreateRepoRequest) -> Result<String>;

    /// Upload every non-ignored file of a folder in a single commit.
    async fn upload_folder(&self, request: &UploadFolderRequest) -> Result<CommitInfo>;
}

/// `reqwest`-backed [`HubApi`].
#[derive(Debug, Clone)]
pub struct HttpHub {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<SecretString>,
}

impl HttpHub {
    /// Build a client for `endpoint`, authenticating with `token` when given.
    pub fn new(endpoint: &str, token: Option<SecretString>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| PushError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(PushError::Config(format!(
                "endpoint '{endpoint}' cannot be used as a base URL"
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PushError::Hub(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    /// Client for a loopback test server, bypassing any proxy settings.
    #[cfg(test)]
    pub(crate) fn local(endpoint: &str, token: Option<SecretString>) -> Self {
        let mut hub = Self::new(endpoint, token).unwrap();
        hub.client = reqwest::Client::builder().no_proxy().build().unwrap();
        hub
    }

    /// Endpoint URL with extra path segments, each percent-encoded.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| PushError::Config(format!("invalid endpoint '{}'", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_segments<'a>(repo_id: &'a RepoId) -> Vec<&'a str> {
        repo_id.namespace().into_iter().chain([repo_id.name()]).collect()
    }

    /// `/api/{models|datasets}/{repo}/{action}/{revision}`
    fn repo_api_url(
        &self,
        repo_id: &RepoId,
        repo_type: RepoKind,
        action: &str,
        revision: &str,
    ) -> Result<Url> {
        let mut segments = vec!["api", repo_type.api_segment()];
        segments.extend(Self::repo_segments(repo_id));
        segments.extend([action, revision]);
        self.url(&segments)
    }

    /// Web URL of a repository.
    pub fn repo_web_url(&self, repo_id: &RepoId, repo_type: RepoKind) -> String {
        format!(
            "{}/{}{}",
            self.endpoint.as_str().trim_end_matches('/'),
            repo_type.url_prefix(),
            repo_id
        )
    }

    fn lfs_batch_url(&self, repo_id: &RepoId, repo_type: RepoKind) -> String {
        format!(
            "{}.git/info/lfs/objects/batch",
            self.repo_web_url(repo_id, repo_type)
        )
    }

    fn require_token(&self) -> Result<&SecretString> {
        self.token.as_ref().ok_or_else(|| {
            PushError::Unauthorized(
                "no token found, pass --token, set HF_TOKEN or run `modelpush login`".into(),
            )
        })
    }

    async fn preupload(
        &self,
        request: &UploadFolderRequest,
        files: &[LocalFile],
    ) -> Result<HashMap<String, (UploadMode, bool)>> {
        let token = self.require_token()?;
        let url = self.repo_api_url(
            &request.repo_id,
            request.repo_type,
            "preupload",
            &request.revision,
        )?;

        let mut modes = HashMap::with_capacity(files.len());
        for chunk in files.chunks(PREUPLOAD_BATCH) {
            let response = self
                .client
                .post(url.clone())
                .header(AUTHORIZATION, token.bearer())
                .json(&preupload_request(chunk)?)
                .send()
                .await
                .map_err(|e| PushError::Hub(e.to_string()))?;
            let response = check_status(response).await?;
            let parsed: PreuploadResponse = response
                .json()
                .await
                .map_err(|e| PushError::Hub(format!("invalid preupload response: {e}")))?;
            for file in parsed.files {
                modes.insert(file.path, (file.upload_mode, file.should_ignore));
            }
        }
        Ok(modes)
    }

    async fn upload_lfs_files(
        &self,
        request: &UploadFolderRequest,
        files: &[(&LocalFile, String)],
    ) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let token = self.require_token()?;
        let target = LfsTarget {
            batch_url: self.lfs_batch_url(&request.repo_id, request.repo_type),
            revision: &request.revision,
            token,
        };

        let by_oid: HashMap<&str, &LocalFile> = files
            .iter()
            .map(|(file, oid)| (oid.as_str(), *file))
            .collect();

        for chunk in files.chunks(PREUPLOAD_BATCH) {
            let objects: Vec<LfsObject> = chunk
                .iter()
                .map(|(file, oid)| LfsObject {
                    oid: oid.clone(),
                    size: file.size,
                })
                .collect();

            for object in request_batch(&self.client, &target, &objects).await? {
                let file = by_oid.get(object.oid.as_str()).ok_or_else(|| {
                    PushError::Hub(format!("LFS batch returned unknown object {}", object.oid))
                })?;
                tracing::info!(path = %file.path_in_repo, size = file.size, "Uploading LFS file");
                transfer_object(&self.client, token, &object, &file.local_path).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl HubApi for HttpHub {
    async fn login(&self, token: &SecretString) -> Result<User> {
        let response = self
            .client
            .get(self.url(&["api", "whoami-v2"])?)
            .header(AUTHORIZATION, token.bearer())
            .send()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| PushError::Hub(format!("invalid whoami response: {e}")))
    }

    async fn whoami(&self) -> Result<User> {
        let token = self.require_token()?;
        self.login(token).await
    }

    async fn create_repo(&self, request: &CreateRepoRequest) -> Result<String> {
        let token = self.require_token()?;

        let mut body = json!({
            "name": request.repo_id.name(),
            "private": request.private,
        });
        if let Some(namespace) = request.repo_id.namespace() {
            body["organization"] = json!(namespace);
        }
        if let Some(kind) = request.repo_type.create_type() {
            body["type"] = json!(kind);
        }

        let response = self
            .client
            .post(self.url(&["api", "repos", "create"])?)
            .header(AUTHORIZATION, token.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;

        if response.status() == StatusCode::CONFLICT && request.exist_ok {
            tracing::debug!(repo = %request.repo_id, "Repository already exists");
            return Ok(self.repo_web_url(&request.repo_id, request.repo_type));
        }

        let response = check_status(response).await?;
        let created: CreateRepoResponse = response
            .json()
            .await
            .map_err(|e| PushError::Hub(format!("invalid create response: {e}")))?;
        tracing::info!(url = %created.url, "Created repository");
        Ok(created.url)
    }

    async fn upload_folder(&self, request: &UploadFolderRequest) -> Result<CommitInfo> {
        let token = self.require_token()?;
        let files = scan_folder(&request.folder_path, &request.ignore_patterns)?;
        let modes = self.preupload(request, &files).await?;

        let mut regular = Vec::new();
        let mut lfs = Vec::new();
        for file in &files {
            match modes.get(&file.path_in_repo) {
                Some((_, true)) => {
                    tracing::debug!(path = %file.path_in_repo, "Skipped by repository .gitignore");
                }
                Some((UploadMode::Lfs, false)) => {
                    lfs.push((file, sha256_file(&file.local_path)?));
                }
                _ => regular.push(file),
            }
        }

        if regular.is_empty() && lfs.is_empty() {
            return Err(PushError::EmptyFolder(
                request.folder_path.display().to_string(),
            ));
        }

        self.upload_lfs_files(request, &lfs).await?;

        let mut operations = Vec::with_capacity(regular.len() + lfs.len());
        for file in regular {
            operations.push(CommitOperation::Add {
                path_in_repo: file.path_in_repo.clone(),
                content: std::fs::read(&file.local_path)?,
            });
        }
        for (file, oid) in &lfs {
            operations.push(CommitOperation::AddLfs {
                path_in_repo: file.path_in_repo.clone(),
                oid: oid.clone(),
                size: file.size,
            });
        }

        let payload = commit_payload(
            &request.commit_message,
            request.commit_description.as_deref().unwrap_or_default(),
            &operations,
        );

        let response = self
            .client
            .post(self.repo_api_url(
                &request.repo_id,
                request.repo_type,
                "commit",
                &request.revision,
            )?)
            .header(AUTHORIZATION, token.bearer())
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(payload)
            .send()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;
        let response = check_status(response).await?;

        let commit: CommitInfo = response
            .json()
            .await
            .map_err(|e| PushError::Hub(format!("invalid commit response: {e}")))?;
        tracing::info!(
            commit = %commit.commit_oid,
            files = operations.len(),
            "Committed folder"
        );
        Ok(commit)
    }
}

#[derive(Debug, Deserialize)]
struct CreateRepoResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Extract the Hub's error message from a response body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Turn a non-success response into a [`PushError`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_message = response
        .headers()
        .get("x-error-message")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = header_message.unwrap_or_else(|| error_message(&body));

    if status == StatusCode::UNAUTHORIZED {
        return Err(PushError::Unauthorized(if message.is_empty() {
            "invalid or missing token".to_string()
        } else {
            message
        }));
    }

    Err(PushError::Http {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub(endpoint: &str) -> HttpHub {
        HttpHub::new(endpoint, Some(SecretString::new("hf_test"))).unwrap()
    }

    #[test]
    fn test_api_urls() {
        let hub = hub("https://huggingface.co");
        let repo = RepoId::parse("acme/bone-fracture").unwrap();

        assert_eq!(
            hub.url(&["api", "whoami-v2"]).unwrap().as_str(),
            "https://huggingface.co/api/whoami-v2"
        );
        assert_eq!(
            hub.repo_api_url(&repo, RepoKind::Model, "commit", "main")
                .unwrap()
                .as_str(),
            "https://huggingface.co/api/models/acme/bone-fracture/commit/main"
        );
        assert_eq!(
            hub.repo_api_url(&repo, RepoKind::Dataset, "preupload", "refs/pr/1")
                .unwrap()
                .as_str(),
            "https://huggingface.co/api/datasets/acme/bone-fracture/preupload/refs%2Fpr%2F1"
        );
    }

    #[test]
    fn test_lfs_batch_url() {
        let hub = hub("https://huggingface.co/");
        let repo = RepoId::parse("acme/data").unwrap();
        assert_eq!(
            hub.lfs_batch_url(&repo, RepoKind::Dataset),
            "https://huggingface.co/datasets/acme/data.git/info/lfs/objects/batch"
        );
        assert_eq!(
            hub.repo_web_url(&repo, RepoKind::Model),
            "https://huggingface.co/acme/data"
        );
    }

    #[test]
    fn test_endpoint_with_path_prefix() {
        let hub = hub("https://proxy.internal/hf/");
        assert_eq!(
            hub.url(&["api", "repos", "create"]).unwrap().as_str(),
            "https://proxy.internal/hf/api/repos/create"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            HttpHub::new("not a url", None),
            Err(PushError::Config(_))
        ));
    }

    #[test]
    fn test_error_message_parsing() {
        assert_eq!(
            error_message(r#"{"error":"You already created this model repo"}"#),
            "You already created this model repo"
        );
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_whoami_parsing() {
        let body = r#"{
            "type": "user",
            "name": "Dawgggggg",
            "orgs": [{"name": "acme"}],
            "auth": {"type": "access_token", "accessToken": {"displayName": "ci", "role": "write"}}
        }"#;
        let user: User = serde_json::from_str(body).unwrap();
        assert_eq!(user.name, "Dawgggggg");
        assert_eq!(user.orgs[0].name, "acme");
        assert_eq!(user.token_role(), Some("write"));
    }

    #[tokio::test]
    async fn test_create_repo_without_token_fails_locally() {
        let hub = HttpHub::new("https://huggingface.co", None).unwrap();
        let request = CreateRepoRequest {
            repo_id: RepoId::parse("acme/model").unwrap(),
            repo_type: RepoKind::Model,
            private: false,
            exist_ok: true,
        };
        let err = hub.create_repo(&request).await.unwrap_err();
        assert!(matches!(err, PushError::Unauthorized(_)));
    }

    use crate::test_server::{Recorded, Reply, TestServer};
    use base64::Engine as _;
    use serde_json::json;

    fn create_request(repo: &str, repo_type: RepoKind, exist_ok: bool) -> CreateRepoRequest {
        CreateRepoRequest {
            repo_id: RepoId::parse(repo).unwrap(),
            repo_type,
            private: false,
            exist_ok,
        }
    }

    #[tokio::test]
    async fn test_create_repo_conflict_with_exist_ok() {
        let server = TestServer::start(|_| {
            |_: &Recorded| Reply::json(409, json!({"error": "You already created this model repo"}))
        })
        .await;
        let hub = HttpHub::local(server.url(), Some(SecretString::new("hf_test")));

        let url = hub
            .create_repo(&create_request("acme/model", RepoKind::Model, true))
            .await
            .unwrap();

        assert_eq!(url, format!("{}/acme/model", server.url()));
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].line(), "POST /api/repos/create");
        assert_eq!(requests[0].header("authorization"), Some("Bearer hf_test"));
        let body = requests[0].json();
        assert_eq!(body["name"], "model");
        assert_eq!(body["organization"], "acme");
        assert_eq!(body["private"], false);
        assert!(body.get("type").is_none());
    }

    #[tokio::test]
    async fn test_create_repo_conflict_without_exist_ok() {
        let server = TestServer::start(|_| {
            |_: &Recorded| Reply::json(409, json!({"error": "You already created this model repo"}))
        })
        .await;
        let hub = HttpHub::local(server.url(), Some(SecretString::new("hf_test")));

        let err = hub
            .create_repo(&create_request("acme/model", RepoKind::Model, false))
            .await
            .unwrap_err();

        match err {
            PushError::Http { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "You already created this model repo");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_dataset_returns_server_url() {
        let server = TestServer::start(|_| {
            |_: &Recorded| Reply::json(200, json!({"url": "https://hub.example/datasets/acme/data"}))
        })
        .await;
        let hub = HttpHub::local(server.url(), Some(SecretString::new("hf_test")));

        let url = hub
            .create_repo(&create_request("acme/data", RepoKind::Dataset, true))
            .await
            .unwrap();

        assert_eq!(url, "https://hub.example/datasets/acme/data");
        assert_eq!(server.requests()[0].json()["type"], "dataset");
    }

    #[tokio::test]
    async fn test_login_maps_unauthorized() {
        let server = TestServer::start(|_| {
            |_: &Recorded| {
                Reply::json(401, json!({"error": "ignored"}))
                    .with_header("x-error-message", "Invalid credentials in Authorization header")
            }
        })
        .await;
        let hub = HttpHub::local(server.url(), None);

        let err = hub.login(&SecretString::new("hf_bad")).await.unwrap_err();

        match err {
            PushError::Unauthorized(message) => {
                assert_eq!(message, "Invalid credentials in Authorization header");
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        let requests = server.requests();
        assert_eq!(requests[0].line(), "GET /api/whoami-v2");
        assert_eq!(requests[0].header("authorization"), Some("Bearer hf_bad"));
    }

    #[tokio::test]
    async fn test_login_plain_text_error() {
        let server = TestServer::start(|_| |_: &Recorded| Reply::text(500, "boom\n")).await;
        let hub = HttpHub::local(server.url(), None);

        let err = hub.login(&SecretString::new("hf_test")).await.unwrap_err();

        assert!(matches!(
            err,
            PushError::Http { status: 500, ref message } if message == "boom"
        ));
    }

    #[tokio::test]
    async fn test_whoami_uses_client_token() {
        let server = TestServer::start(|_| {
            |_: &Recorded| Reply::json(200, json!({"name": "alice", "type": "user"}))
        })
        .await;
        let hub = HttpHub::local(server.url(), Some(SecretString::new("hf_alice")));

        let user = hub.whoami().await.unwrap();

        assert_eq!(user.name, "alice");
        assert_eq!(
            server.requests()[0].header("authorization"),
            Some("Bearer hf_alice")
        );
    }

    fn hub_replies(base: &str, request: &Recorded) -> Reply {
        match (request.method.as_str(), request.path.as_str()) {
            ("POST", "/api/models/acme/model/preupload/main") => Reply::json(
                200,
                json!({"files": [
                    {"path": "config.json", "uploadMode": "regular", "shouldIgnore": false},
                    {"path": "model.bin", "uploadMode": "lfs", "shouldIgnore": false},
                    {"path": "notes.txt", "uploadMode": "regular", "shouldIgnore": true},
                ]}),
            ),
            ("POST", "/acme/model.git/info/lfs/objects/batch") => {
                let batch = request.json();
                let object = &batch["objects"][0];
                let oid = object["oid"].as_str().unwrap();
                Reply::json(
                    200,
                    json!({"transfer": "basic", "objects": [{
                        "oid": oid,
                        "size": object["size"],
                        "actions": {
                            "upload": {
                                "href": format!("{base}/upload/{oid}"),
                                "header": {"x-amz-acl": "private"},
                            },
                            "verify": {"href": format!("{base}/verify")},
                        },
                    }]}),
                )
            }
            ("PUT", path) if path.starts_with("/upload/") => Reply::text(200, ""),
            ("POST", "/verify") => Reply::json(200, json!({})),
            ("POST", "/api/models/acme/model/commit/main") => Reply::json(
                200,
                json!({
                    "commitOid": "deadbeef",
                    "commitUrl": format!("{base}/acme/model/commit/deadbeef"),
                }),
            ),
            _ => Reply::text(404, "not found"),
        }
    }

    #[tokio::test]
    async fn test_upload_folder_over_http() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), br#"{"hidden_size": 8}"#).unwrap();
        let weights: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("model.bin"), &weights).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"scratch").unwrap();
        let oid = sha256_file(&dir.path().join("model.bin")).unwrap();

        let server = TestServer::start(|base| {
            let base = base.to_string();
            move |request: &Recorded| hub_replies(&base, request)
        })
        .await;
        let hub = HttpHub::local(server.url(), Some(SecretString::new("hf_test")));

        let commit = hub
            .upload_folder(&UploadFolderRequest {
                folder_path: dir.path().to_path_buf(),
                repo_id: RepoId::parse("acme/model").unwrap(),
                repo_type: RepoKind::Model,
                revision: "main".into(),
                commit_message: "Upload model via script".into(),
                commit_description: None,
                ignore_patterns: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(commit.commit_oid, "deadbeef");

        let requests = server.requests();
        let lines: Vec<String> = requests.iter().map(Recorded::line).collect();
        assert_eq!(
            lines,
            vec![
                "POST /api/models/acme/model/preupload/main".to_string(),
                "POST /acme/model.git/info/lfs/objects/batch".to_string(),
                format!("PUT /upload/{oid}"),
                "POST /verify".to_string(),
                "POST /api/models/acme/model/commit/main".to_string(),
            ]
        );

        let preupload = requests[0].json();
        let paths: Vec<&str> = preupload["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["config.json", "model.bin", "notes.txt"]);

        let batch = &requests[1];
        assert_eq!(
            batch.header("content-type"),
            Some("application/vnd.git-lfs+json")
        );
        assert_eq!(batch.json()["objects"][0]["oid"], oid.as_str());

        let put = &requests[2];
        assert_eq!(put.body, weights);
        assert_eq!(put.header("x-amz-acl"), Some("private"));
        assert_eq!(put.header("authorization"), None);

        let verify = &requests[3];
        assert_eq!(verify.header("authorization"), Some("Bearer hf_test"));
        assert_eq!(verify.json(), json!({"oid": oid, "size": 2048}));

        let commit_request = &requests[4];
        assert_eq!(
            commit_request.header("content-type"),
            Some("application/x-ndjson")
        );
        let lines: Vec<serde_json::Value> = commit_request
            .text()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["key"], "header");
        assert_eq!(lines[0]["value"]["summary"], "Upload model via script");
        assert_eq!(lines[1]["key"], "file");
        assert_eq!(lines[1]["value"]["path"], "config.json");
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(lines[1]["value"]["content"].as_str().unwrap())
                .unwrap(),
            br#"{"hidden_size": 8}"#
        );
        assert_eq!(lines[2]["key"], "lfsFile");
        assert_eq!(lines[2]["value"]["path"], "model.bin");
        assert_eq!(lines[2]["value"]["oid"], oid.as_str());
        assert!(!commit_request.text().contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_upload_folder_all_ignored_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"scratch").unwrap();

        let server = TestServer::start(|_| {
            |_: &Recorded| {
                Reply::json(
                    200,
                    json!({"files": [
                        {"path": "notes.txt", "uploadMode": "regular", "shouldIgnore": true},
                    ]}),
                )
            }
        })
        .await;
        let hub = HttpHub::local(server.url(), Some(SecretString::new("hf_test")));

        let err = hub
            .upload_folder(&UploadFolderRequest {
                folder_path: dir.path().to_path_buf(),
                repo_id: RepoId::parse("acme/model").unwrap(),
                repo_type: RepoKind::Model,
                revision: "main".into(),
                commit_message: "Upload".into(),
                commit_description: None,
                ignore_patterns: Vec::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PushError::EmptyFolder(_)));
        assert_eq!(server.requests().len(), 1);
    }
}
