//! # contract: collaborator interfaces of the publishing pipeline
//!
//! The pipeline never talks to a network service or a file format directly.
//! It calls the four traits below, which are implemented by real clients
//! (the CSV store and HTTP publisher in this crate, the OpenAI client in the
//! `pressroom` binary crate) and by `mockall` mocks in tests.
//!
//! ## Result shapes
//! - Generators return `Result` with a per-item error; the pipeline records it
//!   and moves to the next item.
//! - [`Publisher::publish`] is infallible in its signature: every transport
//!   or protocol problem is folded into a [`PublishOutcome`] variant.
//! - [`RecordStore`] errors are the only ones that abort a run.
//!
//! ## Mocking
//! The traits are annotated for `mockall`; the mocks are exported when the
//! `test-export-mocks` feature is enabled (default) so integration tests and
//! downstream crates can use them.

use async_trait::async_trait;
use mockall::automock;
use std::fmt;
use std::path::PathBuf;

use crate::error::{AssetError, GenerationError, StoreError};
use crate::ledger::Ledger;

/// Produces long-form text for a topic.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Raw generated text for `topic`. Title extraction happens in the formatter.
    async fn generate(&self, topic: &str) -> Result<String, GenerationError>;
}

/// Produces image bytes for a prompt.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetGenerator: Send + Sync {
    /// `target_name` is the file name the bytes will be stored under.
    async fn generate(&self, prompt: &str, target_name: &str) -> Result<Vec<u8>, AssetError>;
}

/// Sends one item to the destination platform.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> PublishOutcome;
}

/// Loads and writes back the ledger.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RecordStore: Send + Sync {
    fn load(&self) -> Result<Ledger, StoreError>;

    /// Full overwrite of the backing source.
    fn persist(&self, ledger: &Ledger) -> Result<(), StoreError>;
}

/// Role an image plays on the published item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    Cover,
    Thumbnail,
}

impl AssetRole {
    pub const ALL: [AssetRole; 2] = [AssetRole::Cover, AssetRole::Thumbnail];

    /// File name suffix for the stored image.
    pub fn suffix(self) -> &'static str {
        match self {
            AssetRole::Cover => "cover",
            AssetRole::Thumbnail => "thumb",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRole::Cover => f.write_str("cover"),
            AssetRole::Thumbnail => f.write_str("thumbnail"),
        }
    }
}

/// An image written to local disk for an item.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredAsset {
    pub role: AssetRole,
    pub path: PathBuf,
}

/// Everything the publisher needs for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub keyword: String,
    pub title: String,
    pub body: String,
    pub classification_id: Option<u32>,
    pub assets: Vec<StoredAsset>,
}

/// Result of one publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// 2xx with a JSON acknowledgement carrying an identifier.
    Published { remote_id: String },
    /// The endpoint answered, but not with a usable acknowledgement.
    Rejected { status: u16, reason: String },
    /// The request never completed (connect, timeout, I/O).
    TransportFailure { reason: String },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            PublishOutcome::Published { remote_id } => Some(remote_id),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        match self {
            PublishOutcome::Published { .. } => None,
            PublishOutcome::Rejected { status, reason } => {
                Some(format!("rejected with status {status}: {reason}"))
            }
            PublishOutcome::TransportFailure { reason } => {
                Some(format!("transport failure: {reason}"))
            }
        }
    }
}
