//! Local backup of content that failed to publish.
//!
//! One pretty-printed JSON file per keyword under the backup directory, named
//! by [`file_stem`] so distinct keywords never share a file. A later failure
//! for the same keyword overwrites the earlier file.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::assets::file_stem;
use crate::contract::{PublishRequest, StoredAsset};

#[derive(Debug, Serialize)]
struct BackupRecord<'a> {
    keyword: &'a str,
    title: &'a str,
    body: &'a str,
    classification_id: Option<u32>,
    assets: &'a [StoredAsset],
    failure: &'a str,
    content_hash: String,
}

pub fn backup_path(dir: &Path, keyword: &str) -> PathBuf {
    dir.join(format!("{}.json", file_stem(keyword)))
}

/// Writes the request's content to `<dir>/<stem>.json`.
pub async fn write_backup(
    dir: &Path,
    request: &PublishRequest,
    failure: &str,
) -> io::Result<PathBuf> {
    let record = BackupRecord {
        keyword: &request.keyword,
        title: &request.title,
        body: &request.body,
        classification_id: request.classification_id,
        assets: &request.assets,
        failure,
        content_hash: format!("{:x}", Sha256::digest(request.body.as_bytes())),
    };

    let path = backup_path(dir, &request.keyword);
    match store(dir, &path, &record).await {
        Ok(()) => {
            info!(keyword = %request.keyword, path = %path.display(), "[BACKUP] Stored unpublished content");
            Ok(path)
        }
        Err(e) => {
            error!(keyword = %request.keyword, path = %path.display(), error = ?e, "[BACKUP] Failed to store unpublished content");
            Err(e)
        }
    }
}

async fn store(dir: &Path, path: &Path, record: &BackupRecord<'_>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, json).await
}
