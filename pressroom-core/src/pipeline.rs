//! One pass over the record store: generate → format → assets → publish.
//!
//! This module drives the per-item state machine and owns every mutation of
//! the ledger:
//!   - Items already marked `sent` are left untouched and cost no calls
//!   - Items with an empty keyword are skipped
//!   - Generation, asset and publish failures are recorded per item and the
//!     pass moves on; the item stays `sent = false` and is retried next pass
//!   - A confirmed publish sets `sent` and `remote_id` together
//!   - Unpublished content is written to the backup directory when enabled
//!
//! # Persistence
//! The ledger is persisted after each successful publish (unless configured
//! for end-of-pass only) and always once at the end of the pass, even when
//! items failed. Only record store errors make [`run_pass`] return `Err`.
//!
//! # Ordering
//! Items are processed sequentially in store order; one item is fully
//! resolved before the next starts.

use std::path::PathBuf;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::assets::AssetStore;
use crate::backup::write_backup;
use crate::categories::CategoryTable;
use crate::config::{AssetMode, FormatConfig, PersistMode, PipelineConfig};
use crate::contract::{
    AssetGenerator, AssetRole, ContentGenerator, PublishOutcome, PublishRequest, Publisher,
    RecordStore, StoredAsset,
};
use crate::error::{GenerationError, PipelineError};
use crate::formatter::{self, FormattedContent};
use crate::ledger::WorkItem;

/// Everything a pass needs besides its collaborators. Built once per process.
pub struct PassSettings {
    pub format: FormatConfig,
    pub min_body_chars: usize,
    pub asset_mode: AssetMode,
    pub asset_store: AssetStore,
    pub backup_dir: Option<PathBuf>,
    pub max_items: Option<usize>,
    pub persist: PersistMode,
    pub categories: CategoryTable,
}

impl PassSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            format: config.format.clone(),
            min_body_chars: config.generation.min_body_chars,
            asset_mode: config.assets.mode,
            asset_store: AssetStore::from_config(&config.assets),
            backup_dir: config.backup.dir.clone(),
            max_items: config.pass.max_items,
            persist: config.pass.persist,
            categories: CategoryTable::from_config(&config.categories),
        }
    }
}

/// How one item ended in a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already published in an earlier pass.
    AlreadySent,
    /// No keyword.
    Skipped,
    /// Pending, but the pass budget was spent.
    Deferred,
    GenerationFailed { reason: String },
    AssetFailed { role: AssetRole, reason: String },
    PublishFailed { reason: String, backup: Option<PathBuf> },
    Published { remote_id: String },
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ItemOutcome::GenerationFailed { .. }
                | ItemOutcome::AssetFailed { .. }
                | ItemOutcome::PublishFailed { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub index: usize,
    pub keyword: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone)]
pub struct PassReport {
    pub run_id: Uuid,
    pub items: Vec<ItemReport>,
}

impl PassReport {
    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Published { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(ItemOutcome::is_failure)
    }

    pub fn already_sent(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::AlreadySent))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    pub fn deferred(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Deferred))
    }

    pub fn outcome_for(&self, keyword: &str) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|r| r.keyword == keyword)
            .map(|r| &r.outcome)
    }
}

/// Runs one pass over the store and persists the resulting ledger.
pub async fn run_pass<S, G, P>(
    settings: &PassSettings,
    store: &S,
    generator: &G,
    assets: Option<&dyn AssetGenerator>,
    publisher: &P,
) -> Result<PassReport, PipelineError>
where
    S: RecordStore + ?Sized,
    G: ContentGenerator + ?Sized,
    P: Publisher + ?Sized,
{
    let run_id = Uuid::new_v4();
    execute_pass(run_id, settings, store, generator, assets, publisher)
        .instrument(info_span!("pass", %run_id))
        .await
}

async fn execute_pass<S, G, P>(
    run_id: Uuid,
    settings: &PassSettings,
    store: &S,
    generator: &G,
    assets: Option<&dyn AssetGenerator>,
    publisher: &P,
) -> Result<PassReport, PipelineError>
where
    S: RecordStore + ?Sized,
    G: ContentGenerator + ?Sized,
    P: Publisher + ?Sized,
{
    let mut ledger = store.load()?;
    info!(
        items = ledger.items.len(),
        pending = ledger.pending().count(),
        "[PASS] Starting pass"
    );

    let assets = match (settings.asset_mode, assets) {
        (AssetMode::Disabled, _) => None,
        (AssetMode::Required, None) => {
            error!("[PASS][ERROR] Assets are required but no asset generator was supplied; pending items will not be attempted");
            None
        }
        (AssetMode::BestEffort, None) => {
            warn!("[PASS] Best-effort assets without an asset generator; publishing without assets");
            None
        }
        (_, Some(generator)) => Some(generator),
    };
    let assets_unavailable = settings.asset_mode == AssetMode::Required && assets.is_none();

    let mut report = PassReport {
        run_id,
        items: Vec::with_capacity(ledger.items.len()),
    };
    let mut attempted = 0usize;

    for index in 0..ledger.items.len() {
        let item = &ledger.items[index];
        let outcome = if item.sent {
            debug!(keyword = %item.keyword, "[PASS] Already sent, excluded from pass");
            ItemOutcome::AlreadySent
        } else if item.keyword.is_empty() {
            info!(row = index + 1, "[PASS] Empty keyword, skipping row");
            ItemOutcome::Skipped
        } else if settings.max_items.is_some_and(|max| attempted >= max) {
            debug!(keyword = %item.keyword, "[PASS] Pass budget spent, deferring item");
            ItemOutcome::Deferred
        } else if assets_unavailable {
            attempted += 1;
            warn!(keyword = %item.keyword, "[PASS] Required assets cannot be produced, item left pending");
            ItemOutcome::AssetFailed {
                role: AssetRole::Cover,
                reason: "no asset generator available".to_string(),
            }
        } else {
            attempted += 1;
            process_item(settings, item, generator, assets, publisher).await
        };

        if let ItemOutcome::Published { remote_id } = &outcome {
            ledger.items[index].mark_published(remote_id.clone());
            if settings.persist == PersistMode::AfterEachPublish {
                if let Err(e) = store.persist(&ledger) {
                    warn!(error = %e, "[PASS] Incremental persist failed; continuing");
                }
            }
        }

        report.items.push(ItemReport {
            index,
            keyword: ledger.items[index].keyword.clone(),
            outcome,
        });
    }

    info!(
        published = report.published(),
        failed = report.failed(),
        already_sent = report.already_sent(),
        skipped = report.skipped(),
        deferred = report.deferred(),
        "[PASS] Pass finished, persisting ledger"
    );

    if let Err(e) = store.persist(&ledger) {
        error!(error = %e, "[PASS][ERROR] Final persist failed");
        return Err(e.into());
    }
    Ok(report)
}

/// Resolves a single pending item. Never fails the pass.
async fn process_item<G, P>(
    settings: &PassSettings,
    item: &WorkItem,
    generator: &G,
    assets: Option<&dyn AssetGenerator>,
    publisher: &P,
) -> ItemOutcome
where
    G: ContentGenerator + ?Sized,
    P: Publisher + ?Sized,
{
    let keyword = item.keyword.as_str();

    // Generating
    let content = match generate(settings, generator, keyword).await {
        Ok(content) => content,
        Err(e) => {
            warn!(keyword, error = %e, "[PASS] Generation failed, item left pending");
            return ItemOutcome::GenerationFailed {
                reason: e.to_string(),
            };
        }
    };
    info!(keyword, title = %content.title, chars = content.body_chars, "[PASS] Content generated");

    // Asset generating
    let mut stored: Vec<StoredAsset> = Vec::new();
    if let Some(asset_generator) = assets {
        for role in AssetRole::ALL {
            match settings
                .asset_store
                .produce(asset_generator, keyword, role)
                .await
            {
                Ok(asset) => stored.push(asset),
                Err(e) if settings.asset_mode == AssetMode::Required => {
                    warn!(keyword, %role, error = %e, "[PASS] Asset failed, discarding generated content");
                    return ItemOutcome::AssetFailed {
                        role,
                        reason: e.to_string(),
                    };
                }
                Err(e) => {
                    warn!(keyword, %role, error = %e, "[PASS] Asset failed, publishing without it");
                }
            }
        }
    }

    // Publishing
    let request = PublishRequest {
        keyword: keyword.to_string(),
        title: content.title,
        body: content.body_markup,
        classification_id: Some(settings.categories.classify(item.category.as_deref())),
        assets: stored,
    };
    let outcome = publisher.publish(&request).await;
    match outcome {
        PublishOutcome::Published { remote_id } => {
            info!(keyword, remote_id = %remote_id, "[PASS] Published");
            ItemOutcome::Published { remote_id }
        }
        failed => {
            let reason = failed
                .failure_reason()
                .unwrap_or_else(|| "unknown publish failure".to_string());
            warn!(keyword, %reason, "[PASS] Publish failed, item left pending");
            let backup = match settings.backup_dir.as_deref() {
                Some(dir) => write_backup(dir, &request, &reason).await.ok(),
                None => None,
            };
            ItemOutcome::PublishFailed { reason, backup }
        }
    }
}

async fn generate<G>(
    settings: &PassSettings,
    generator: &G,
    keyword: &str,
) -> Result<FormattedContent, GenerationError>
where
    G: ContentGenerator + ?Sized,
{
    info!(keyword, "[PASS] Generating content");
    let raw = generator.generate(keyword).await?;
    if raw.trim().is_empty() {
        return Err(GenerationError::Empty);
    }
    let content = formatter::format(&raw, &settings.format);
    if content.body_chars <= settings.min_body_chars {
        return Err(GenerationError::TooShort {
            actual: content.body_chars,
            floor: settings.min_body_chars,
        });
    }
    Ok(content)
}
