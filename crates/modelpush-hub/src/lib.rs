//! HuggingFace Hub upload support for modelpush.
//!
//! This crate provides:
//! - The [`HubApi`] seam and its HTTP implementation
//! - Folder scanning with gitignore-style exclusions
//! - Regular and LFS file transfer in a single commit
//! - Token resolution and the saved-login token file
//! - Image classification through the hosted inference API
//! - The upload flow used by the command-line tool

#![warn(missing_docs)]

mod client;
mod commit;
mod folder;
mod inference;
mod lfs;
mod token;
mod upload;

#[cfg(test)]
mod test_server;

pub use client::*;
pub use commit::{commit_payload, CommitInfo, CommitOperation, PreuploadResult, UploadMode};
pub use folder::*;
pub use inference::*;
pub use lfs::{sha256_file, LfsObject};
pub use token::*;
pub use upload::*;
