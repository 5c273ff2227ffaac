//! Deployment configuration for a pipeline run.
//!
//! Every struct deserialises from the YAML config file with defaults for any
//! omitted key; secrets are injected by the CLI after parsing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub records: RecordsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub pass: PassConfig,
    #[serde(default)]
    pub categories: CategoriesConfig,
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            records = %self.records.path.display(),
            assets = ?self.assets.mode,
            encoding = ?self.publish.encoding,
            persist = ?self.pass.persist,
            max_items = ?self.pass.max_items,
            backup = self.backup.dir.is_some(),
            "Loaded PipelineConfig"
        );
        debug!(
            generation = ?self.generation,
            format = ?self.format,
            fields = ?self.publish.fields,
            "PipelineConfig loaded (debug)"
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    pub path: PathBuf,
    #[serde(default = "default_keyword_column")]
    pub keyword_column: String,
    #[serde(default = "default_category_column")]
    pub category_column: String,
}

fn default_keyword_column() -> String {
    "keyword".to_string()
}

fn default_category_column() -> String {
    "category".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub system_prompt: String,
    /// User prompt; `{keyword}` is replaced with the item's keyword.
    pub prompt_template: String,
    pub temperature: f32,
    /// The generated body must be longer than this many characters.
    pub min_body_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            system_prompt: "You are an expert SEO copywriter.".to_string(),
            prompt_template: "Write a 300-word SEO-optimised article about: {keyword}".to_string(),
            temperature: 0.7,
            min_body_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetMode {
    /// No image calls are made.
    #[default]
    Disabled,
    /// An asset failure fails the item.
    Required,
    /// An asset failure is logged and the item is published without it.
    BestEffort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub mode: AssetMode,
    pub dir: PathBuf,
    pub extension: String,
    pub model: String,
    pub size: String,
    /// `{keyword}` is replaced with the item's keyword.
    pub cover_prompt: String,
    pub thumbnail_prompt: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            mode: AssetMode::Disabled,
            dir: PathBuf::from("images"),
            extension: "jpg".to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            cover_prompt: "Realistic illustration for: {keyword}".to_string(),
            thumbnail_prompt: "Realistic thumbnail for: {keyword}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Class attribute applied to every heading element.
    pub heading_class: Option<String>,
    /// Wrap heading text in `<strong>`.
    pub emphasize_headings: bool,
    pub paragraph_class: Option<String>,
    pub title_placeholder: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            heading_class: None,
            emphasize_headings: true,
            paragraph_class: None,
            title_placeholder: "Untitled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishEncoding {
    /// multipart/form-data with binary cover and thumbnail parts.
    #[default]
    Multipart,
    /// application/x-www-form-urlencoded with static asset path placeholders.
    Form,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub endpoint: String,
    pub encoding: PublishEncoding,
    pub timeout_secs: u64,
    /// Dotted path of the identifier in the JSON acknowledgement.
    pub id_field: String,
    pub fields: PayloadFields,
    pub cover_placeholder: String,
    pub thumbnail_placeholder: String,
    /// Bearer token, injected from the environment.
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            encoding: PublishEncoding::Multipart,
            timeout_secs: 30,
            id_field: "id".to_string(),
            fields: PayloadFields::default(),
            cover_placeholder: "images/default_cover.jpg".to_string(),
            thumbnail_placeholder: "images/default_thumb.jpg".to_string(),
            api_token: None,
        }
    }
}

/// Field names of the publish payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadFields {
    pub title: String,
    pub content: String,
    pub keywords: String,
    pub category_id: String,
    pub cover_image: String,
    pub thumbnail_image: String,
}

impl Default for PayloadFields {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            content: "content".to_string(),
            keywords: "keywords".to_string(),
            category_id: "category_id".to_string(),
            cover_image: "cover_image".to_string(),
            thumbnail_image: "thumbnail_image".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Where unpublished content is kept. Disabled when absent.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// Persist after every successful publish and once more at the end.
    #[default]
    AfterEachPublish,
    EndOfPass,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// Upper bound on pending items attempted in one pass.
    pub max_items: Option<usize>,
    pub persist: PersistMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    /// Replaces the built-in label table when present.
    pub table: Option<BTreeMap<String, u32>>,
    pub default_id: Option<u32>,
}
