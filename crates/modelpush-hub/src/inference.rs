//! Image classification through the hosted inference API.

use std::path::Path;

use modelpush_core::{PushError, RepoId, Result, SecretString};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::client::USER_AGENT;

/// One label predicted for an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Class label.
    pub label: String,
    /// Probability in `0.0..=1.0`.
    pub score: f64,
}

impl Classification {
    /// Score as a percentage with one decimal, e.g. `97.3%`.
    pub fn confidence(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Predictions {
    Many(Vec<Classification>),
    One(Classification),
}

/// Parse an inference response, best score first.
///
/// Some models answer with a single object instead of a list.
pub fn parse_predictions(body: &str) -> Result<Vec<Classification>> {
    let mut predictions = match serde_json::from_str(body)? {
        Predictions::Many(list) => list,
        Predictions::One(single) => vec![single],
    };
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(predictions)
}

/// MIME type sent with an image, from its extension.
pub fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Client for one model's inference URL.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    url: Url,
    token: Option<SecretString>,
}

impl InferenceClient {
    /// Target `{endpoint}/models/{repo_id}`.
    pub fn for_model(endpoint: &str, repo_id: &RepoId, token: Option<SecretString>) -> Result<Self> {
        let mut url = Url::parse(endpoint).map_err(|e| {
            PushError::Config(format!("invalid inference endpoint '{endpoint}': {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| PushError::Config(format!("invalid inference endpoint '{endpoint}'")))?
            .pop_if_empty()
            .push("models")
            .extend(repo_id.namespace())
            .push(repo_id.name());
        Self::build(url, token)
    }

    /// Target a full model URL as given.
    pub fn with_url(url: &str, token: Option<SecretString>) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| PushError::Config(format!("invalid inference URL '{url}': {e}")))?;
        Self::build(url, token)
    }

    fn build(url: Url, token: Option<SecretString>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PushError::Hub(e.to_string()))?;
        Ok(Self { client, url, token })
    }

    #[cfg(test)]
    fn without_proxy(mut self) -> Self {
        self.client = reqwest::Client::builder().no_proxy().build().unwrap();
        self
    }

    /// URL requests are sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send the raw image bytes and return the predicted labels, best first.
    pub async fn classify_image(&self, image: &Path) -> Result<Vec<Classification>> {
        let bytes = tokio::fs::read(image).await.map_err(|e| {
            PushError::Config(format!("cannot read image '{}': {e}", image.display()))
        })?;

        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, image_content_type(image))
            .body(bytes);
        match &self.token {
            Some(token) => request = request.header(AUTHORIZATION, token.bearer()),
            None => tracing::warn!("No token found, the inference request is anonymous"),
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PushError::Hub(e.to_string()))?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Error classifying image");
            return Err(PushError::Inference {
                status: status.as_u16(),
                body,
            });
        }

        let predictions = parse_predictions(&body)?;
        tracing::debug!(count = predictions.len(), "Received predictions");
        Ok(predictions)
    }
}
