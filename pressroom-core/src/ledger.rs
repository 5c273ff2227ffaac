//! Work items and the completion ledger that travels with them.

use tracing::warn;

/// Column owned by the pipeline: completion flag.
pub const SENT_COLUMN: &str = "sent";
/// Column owned by the pipeline: identifier acknowledged by the remote platform.
pub const REMOTE_ID_COLUMN: &str = "remote_id";

/// One keyword-driven unit of publishing work and its ledger state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Trimmed keyword. Empty means the row is skipped.
    pub keyword: String,
    pub category: Option<String>,
    pub sent: bool,
    pub remote_id: Option<String>,
    /// Raw input cells by column name, in header order, excluding the ledger columns.
    pub cells: Vec<(String, String)>,
}

impl WorkItem {
    /// A fresh, unsent item with no extra columns.
    pub fn new(keyword: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            keyword: keyword.into().trim().to_string(),
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            sent: false,
            remote_id: None,
            cells: Vec::new(),
        }
    }

    /// Raw value of an input column, if the row carried one.
    pub fn cell(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Record a confirmed publish. Sets `sent` together with the identifier.
    pub fn mark_published(&mut self, remote_id: impl Into<String>) {
        self.sent = true;
        self.remote_id = Some(remote_id.into());
    }

    /// Drops a remote id that is not backed by `sent == true`.
    pub(crate) fn enforce_invariant(&mut self) {
        if !self.sent && self.remote_id.is_some() {
            warn!(
                keyword = %self.keyword,
                remote_id = ?self.remote_id,
                "Dropping remote_id on an item that is not marked sent"
            );
            self.remote_id = None;
        }
    }
}

/// The loaded table: column order plus the items in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    /// Input headers, with the ledger columns appended when they were absent.
    pub columns: Vec<String>,
    pub items: Vec<WorkItem>,
}

impl Ledger {
    /// Builds a ledger with the default `keyword, category, sent, remote_id` layout.
    pub fn from_items(items: Vec<WorkItem>) -> Self {
        Self {
            columns: vec![
                "keyword".to_string(),
                "category".to_string(),
                SENT_COLUMN.to_string(),
                REMOTE_ID_COLUMN.to_string(),
            ],
            items,
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().filter(|item| !item.sent)
    }

    /// True when every item with a remote id is also marked sent.
    pub fn is_consistent(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.remote_id.is_none() || item.sent)
    }
}

/// Interprets a boolean-like cell. Anything unrecognised is `false`.
pub fn parse_sent(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "x" | "sent"
    )
}

pub fn format_sent(sent: bool) -> &'static str {
    if sent {
        "true"
    } else {
        "false"
    }
}
