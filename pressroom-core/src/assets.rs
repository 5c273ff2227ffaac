//! Naming and storing generated images.
//!
//! The core only decides where bytes land: `<dir>/<stem>_<suffix>.<ext>`,
//! derived from the keyword and the asset role, so a rerun for the same
//! keyword overwrites the previous attempt. The stem pairs a readable slug
//! with a short hash of the exact keyword, so keywords that slug alike
//! (`C++` and `C#`) never share a file.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::config::AssetsConfig;
use crate::contract::{AssetGenerator, AssetRole, StoredAsset};
use crate::error::AssetError;

/// Filesystem-safe form of a keyword, shared by assets and backups.
pub fn slug(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        "item".to_string()
    } else {
        out.to_string()
    }
}

/// Hex characters of the keyword hash kept in a file stem.
const STEM_HASH_CHARS: usize = 8;

/// Collision-free file stem for a keyword: `<slug>-<hash8>`.
pub fn file_stem(keyword: &str) -> String {
    let keyword = keyword.trim();
    let digest = format!("{:x}", Sha256::digest(keyword.as_bytes()));
    format!("{}-{}", slug(keyword), &digest[..STEM_HASH_CHARS])
}

pub struct AssetStore {
    dir: PathBuf,
    extension: String,
    cover_prompt: String,
    thumbnail_prompt: String,
}

impl AssetStore {
    pub fn from_config(config: &AssetsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
            cover_prompt: config.cover_prompt.clone(),
            thumbnail_prompt: config.thumbnail_prompt.clone(),
        }
    }

    pub fn file_name(&self, keyword: &str, role: AssetRole) -> String {
        format!("{}_{}.{}", file_stem(keyword), role.suffix(), self.extension)
    }

    pub fn path_for(&self, keyword: &str, role: AssetRole) -> PathBuf {
        self.dir.join(self.file_name(keyword, role))
    }

    pub fn prompt_for(&self, keyword: &str, role: AssetRole) -> String {
        let template = match role {
            AssetRole::Cover => &self.cover_prompt,
            AssetRole::Thumbnail => &self.thumbnail_prompt,
        };
        template.replace("{keyword}", keyword)
    }

    /// Generates one asset and writes it to its deterministic path.
    pub async fn produce(
        &self,
        generator: &dyn AssetGenerator,
        keyword: &str,
        role: AssetRole,
    ) -> Result<StoredAsset, AssetError> {
        let prompt = self.prompt_for(keyword, role);
        let target_name = self.file_name(keyword, role);
        info!(keyword, %role, target = %target_name, "[ASSET] Generating image");

        let bytes = generator.generate(&prompt, &target_name).await?;
        if bytes.is_empty() {
            error!(keyword, %role, "[ASSET] Generator returned no bytes");
            return Err(AssetError::Empty);
        }

        let path = self.path_for(keyword, role);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| AssetError::Io {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), size = bytes.len(), "[ASSET] Stored image");

        Ok(StoredAsset { role, path })
    }
}
