//! Core types, configuration and error handling for modelpush.
//!
//! This crate provides the foundational pieces shared by the Hub client and
//! the command-line front end:
//!
//! - Repository identifiers and repository kinds
//! - Upload configuration (YAML files, environment overrides, validation)
//! - Error handling infrastructure
//! - Secure handling of secrets (access tokens)

#![warn(missing_docs)]

mod config;
mod error;
mod secrets;
mod types;

pub use config::*;
pub use error::*;
pub use secrets::SecretString;
pub use types::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{PushError, Result};
    pub use crate::secrets::SecretString;
    pub use crate::types::*;
}
