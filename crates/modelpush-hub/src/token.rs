//! Access token resolution and the saved-login token file.

use hf_hub::Cache;
use modelpush_core::{Result, SecretString, TOKEN_ENV};
use std::path::PathBuf;

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Passed on the command line or in the config file.
    Explicit,
    /// Read from `HF_TOKEN`.
    Environment,
    /// Saved by a previous `login`.
    SavedLogin,
}

/// Resolve the token to use for this run.
///
/// Order: explicit value, then `HF_TOKEN`, then the token file saved by a
/// previous login in the Hugging Face cache directory.
pub fn resolve_token(explicit: Option<SecretString>) -> Option<(SecretString, TokenSource)> {
    resolve_token_with(explicit, SecretString::from_env(TOKEN_ENV), &Cache::default())
}

/// [`resolve_token`] with the environment value and cache passed in.
pub fn resolve_token_with(
    explicit: Option<SecretString>,
    env_token: Option<SecretString>,
    cache: &Cache,
) -> Option<(SecretString, TokenSource)> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Some((token, TokenSource::Explicit));
    }
    if let Some(token) = env_token.filter(|t| !t.is_empty()) {
        return Some((token, TokenSource::Environment));
    }
    SecretString::non_empty(cache.token()).map(|token| (token, TokenSource::SavedLogin))
}

/// Path of the saved token file.
pub fn token_path() -> PathBuf {
    Cache::default().token_path()
}

/// Persist a token so later runs can omit it.
pub fn save_token(token: &SecretString) -> Result<PathBuf> {
    save_token_in(&Cache::default(), token)
}

/// [`save_token`] against a specific cache.
pub fn save_token_in(cache: &Cache, token: &SecretString) -> Result<PathBuf> {
    let path = cache.token_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, token.expose_secret())?;
    tracing::debug!(path = %path.display(), "Saved access token");
    Ok(path)
}
