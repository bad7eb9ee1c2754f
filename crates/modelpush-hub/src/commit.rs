//! Preupload classification and NDJSON commit payloads.

use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use modelpush_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::folder::LocalFile;

/// Bytes of each file sent to the server for classification.
pub const SAMPLE_SIZE: usize = 512;

/// Maximum number of files per preupload request.
pub const PREUPLOAD_BATCH: usize = 256;

/// How the server wants a file transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Inline, base64 inside the commit payload.
    Regular,
    /// Through git-lfs object storage.
    Lfs,
}

#[derive(Debug, Serialize)]
pub(crate) struct PreuploadFile {
    pub path: String,
    pub sample: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PreuploadRequest {
    pub files: Vec<PreuploadFile>,
}

/// Server classification for a single path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreuploadResult {
    /// Path inside the repository.
    pub path: String,
    /// Transfer mode.
    pub upload_mode: UploadMode,
    /// The repository's `.gitignore` excludes this path.
    #[serde(default)]
    pub should_ignore: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreuploadResponse {
    pub files: Vec<PreuploadResult>,
}

/// Base64 of the first [`SAMPLE_SIZE`] bytes of a file.
pub(crate) fn read_sample(path: &Path) -> Result<String> {
    let mut buf = Vec::with_capacity(SAMPLE_SIZE);
    std::fs::File::open(path)?
        .take(SAMPLE_SIZE as u64)
        .read_to_end(&mut buf)?;
    Ok(STANDARD.encode(&buf))
}

pub(crate) fn preupload_request(files: &[LocalFile]) -> Result<PreuploadRequest> {
    let files = files
        .iter()
        .map(|file| {
            Ok(PreuploadFile {
                path: file.path_in_repo.clone(),
                sample: read_sample(&file.local_path)?,
                size: file.size,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PreuploadRequest { files })
}

/// One file operation in a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOperation {
    /// Regular file, content inlined.
    Add {
        /// Path inside the repository.
        path_in_repo: String,
        /// Raw file content.
        content: Vec<u8>,
    },
    /// File already uploaded to LFS storage, referenced by hash.
    AddLfs {
        /// Path inside the repository.
        path_in_repo: String,
        /// Hex SHA-256 of the content.
        oid: String,
        /// Size in bytes.
        size: u64,
    },
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Commit hash.
    pub commit_oid: String,
    /// Web URL of the commit.
    #[serde(default)]
    pub commit_url: String,
}

/// Serialize a commit as newline-delimited JSON.
///
/// The header line comes first, followed by one line per operation.
pub fn commit_payload(summary: &str, description: &str, operations: &[CommitOperation]) -> String {
    let mut lines = Vec::with_capacity(operations.len() + 1);
    lines.push(json!({
        "key": "header",
        "value": { "summary": summary, "description": description },
    }));

    for op in operations {
        lines.push(match op {
            CommitOperation::Add {
                path_in_repo,
                content,
            } => json!({
                "key": "file",
                "value": {
                    "content": STANDARD.encode(content),
                    "path": path_in_repo,
                    "encoding": "base64",
                },
            }),
            CommitOperation::AddLfs {
                path_in_repo, oid, ..
            } => json!({
                "key": "lfsFile",
                "value": {
                    "path": path_in_repo,
                    "algo": "sha256",
                    "oid": oid,
                },
            }),
        });
    }

    let mut body = lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    body.push('\n');
    body
}
