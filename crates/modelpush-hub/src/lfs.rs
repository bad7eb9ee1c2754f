//! Git LFS batch transfer for large files.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use modelpush_core::{PushError, Result, SecretString};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::client::check_status;

const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";
const HASH_CHUNK: usize = 64 * 1024;

/// Hex SHA-256 of a file, read in fixed-size chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// A content-addressed object to push to LFS storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LfsObject {
    /// Hex SHA-256.
    pub oid: String,
    /// Size in bytes.
    pub size: u64,
}

#[derive(Debug, Serialize)]
struct BatchRef<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    operation: &'static str,
    transfers: [&'static str; 1],
    objects: &'a [LfsObject],
    hash_algo: &'static str,
    #[serde(rename = "ref")]
    git_ref: BatchRef<'a>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LfsAction {
    pub href: String,
    #[serde(default)]
    pub header: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LfsActions {
    pub upload: Option<LfsAction>,
    pub verify: Option<LfsAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LfsObjectError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchObject {
    pub oid: String,
    pub size: u64,
    #[serde(default)]
    pub actions: Option<LfsActions>,
    #[serde(default)]
    pub error: Option<LfsObjectError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponse {
    pub objects: Vec<BatchObject>,
}

/// Where a batch of LFS objects goes.
pub(crate) struct LfsTarget<'a> {
    /// `{endpoint}/{prefix}{repo_id}.git/info/lfs/objects/batch`
    pub batch_url: String,
    pub revision: &'a str,
    pub token: &'a SecretString,
}

pub(crate) fn batch_body(objects: &[LfsObject], revision: &str) -> Result<String> {
    Ok(serde_json::to_string(&BatchRequest {
        operation: "upload",
        transfers: ["basic"],
        objects,
        hash_algo: "sha256",
        git_ref: BatchRef { name: revision },
    })?)
}

/// Ask the server which objects it still needs and where to put them.
pub(crate) async fn request_batch(
    client: &reqwest::Client,
    target: &LfsTarget<'_>,
    objects: &[LfsObject],
) -> Result<Vec<BatchObject>> {
    let response = client
        .post(&target.batch_url)
        .header(AUTHORIZATION, target.token.bearer())
        .header(ACCEPT, LFS_MEDIA_TYPE)
        .header(CONTENT_TYPE, LFS_MEDIA_TYPE)
        .body(batch_body(objects, target.revision)?)
        .send()
        .await
        .map_err(|e| PushError::Hub(e.to_string()))?;
    let response = check_status(response).await?;

    let batch: BatchResponse = response
        .json()
        .await
        .map_err(|e| PushError::Hub(format!("invalid LFS batch response: {e}")))?;
    Ok(batch.objects)
}

/// Transfer one object according to the server's batch answer.
///
/// Returns `false` when the server already had the object.
pub(crate) async fn transfer_object(
    client: &reqwest::Client,
    token: &SecretString,
    object: &BatchObject,
    local_path: &Path,
) -> Result<bool> {
    if let Some(err) = &object.error {
        return Err(PushError::Hub(format!(
            "LFS object {} rejected ({}): {}",
            object.oid, err.code, err.message
        )));
    }

    let Some(actions) = &object.actions else {
        tracing::debug!(oid = %object.oid, "LFS object already present");
        return Ok(false);
    };

    if let Some(upload) = &actions.upload {
        if upload.header.contains_key("chunk_size") {
            return Err(PushError::Hub(format!(
                "server requested a multipart transfer for {}, which is not supported",
                local_path.display()
            )));
        }

        let file = tokio::fs::File::open(local_path).await?;
        let mut request = client
            .put(&upload.href)
            .header(CONTENT_LENGTH, object.size)
            .body(reqwest::Body::from(file));
        for (name, value) in &upload.header {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;
        check_status(response).await?;
        tracing::info!(oid = %object.oid, size = object.size, "Uploaded LFS object");
    }

    if let Some(verify) = &actions.verify {
        let mut request = client
            .post(&verify.href)
            .header(AUTHORIZATION, token.bearer())
            .json(&LfsObject {
                oid: object.oid.clone(),
                size: object.size,
            });
        for (name, value) in &verify.header {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;
        check_status(response).await?;
    }

    Ok(true)
}
