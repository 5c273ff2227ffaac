//! CSV-backed record store.
//!
//! The file needs a header row with at least the keyword column. The ledger
//! columns (`sent`, `remote_id`) are created on first load if missing, and
//! every other column is written back exactly as it was read. Short rows are
//! padded; a row with non-empty cells beyond the header is unreadable, since
//! those cells could not be written back.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::config::RecordsConfig;
use crate::contract::RecordStore;
use crate::error::StoreError;
use crate::ledger::{format_sent, parse_sent, Ledger, WorkItem, REMOTE_ID_COLUMN, SENT_COLUMN};

pub struct CsvRecordStore {
    path: PathBuf,
    keyword_column: String,
    category_column: String,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keyword_column: "keyword".to_string(),
            category_column: "category".to_string(),
        }
    }

    pub fn from_config(config: &RecordsConfig) -> Self {
        Self::new(&config.path).with_columns(&config.keyword_column, &config.category_column)
    }

    pub fn with_columns(mut self, keyword_column: &str, category_column: &str) -> Self {
        self.keyword_column = keyword_column.to_string();
        self.category_column = category_column.to_string();
        self
    }

    fn unreadable(&self, reason: impl ToString) -> StoreError {
        let e = StoreError::unreadable(&self.path, reason);
        error!(error = %e, "Record store unreadable");
        e
    }

    fn persist_failure(&self, reason: impl ToString) -> StoreError {
        let e = StoreError::persist(&self.path, reason);
        error!(error = %e, "Record store persist failed");
        e
    }

    fn row_for(&self, columns: &[String], item: &WorkItem) -> Vec<String> {
        columns
            .iter()
            .map(|column| {
                let name = header_name(column);
                if name == SENT_COLUMN {
                    return format_sent(item.sent).to_string();
                }
                if name == REMOTE_ID_COLUMN {
                    return item.remote_id.clone().unwrap_or_default();
                }
                if let Some(raw) = item.cell(column) {
                    return raw.to_string();
                }
                // Items built in code carry no raw cells.
                if name == self.keyword_column {
                    item.keyword.clone()
                } else if name == self.category_column {
                    item.category.clone().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .collect()
    }
}

/// Header text without a UTF-8 BOM or surrounding whitespace.
fn header_name(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim()
}

impl RecordStore for CsvRecordStore {
    fn load(&self) -> Result<Ledger, StoreError> {
        info!(path = %self.path.display(), "Loading record store");
        let file = File::open(&self.path).map_err(|e| self.unreadable(e))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.unreadable(e))?
            .iter()
            .map(str::to_string)
            .collect();

        let keyword_idx = headers
            .iter()
            .position(|h| header_name(h) == self.keyword_column)
            .ok_or_else(|| self.unreadable(format!("missing column {:?}", self.keyword_column)))?;
        let category_idx = headers
            .iter()
            .position(|h| header_name(h) == self.category_column);
        let sent_idx = headers.iter().position(|h| header_name(h) == SENT_COLUMN);
        let remote_idx = headers
            .iter()
            .position(|h| header_name(h) == REMOTE_ID_COLUMN);

        let mut items = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| self.unreadable(format!("row {}: {e}", row + 1)))?;
            if record.iter().skip(headers.len()).any(|cell| !cell.trim().is_empty()) {
                return Err(self.unreadable(format!(
                    "row {} has {} cells but the header has {}",
                    row + 1,
                    record.len(),
                    headers.len()
                )));
            }
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let cells = headers
                .iter()
                .enumerate()
                .filter(|(idx, _)| Some(*idx) != sent_idx && Some(*idx) != remote_idx)
                .map(|(idx, name)| (name.clone(), field(idx).to_string()))
                .collect();

            let mut item = WorkItem {
                keyword: field(keyword_idx).trim().to_string(),
                category: category_idx
                    .map(field)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
                sent: sent_idx.map(field).map(parse_sent).unwrap_or(false),
                remote_id: remote_idx
                    .map(field)
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
                cells,
            };
            item.enforce_invariant();
            items.push(item);
        }

        let mut columns = headers;
        for ledger_column in [SENT_COLUMN, REMOTE_ID_COLUMN] {
            if !columns.iter().any(|h| header_name(h) == ledger_column) {
                debug!(column = ledger_column, "Initialising missing ledger column");
                columns.push(ledger_column.to_string());
            }
        }

        info!(
            path = %self.path.display(),
            items = items.len(),
            sent = items.iter().filter(|i| i.sent).count(),
            "Record store loaded"
        );
        Ok(Ledger { columns, items })
    }

    fn persist(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.persist_failure(e))?;
        // The temp file is created 0600; the rewritten sheet keeps the source's mode.
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| self.persist_failure(e))?;
        }

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer
                .write_record(&ledger.columns)
                .map_err(|e| self.persist_failure(e))?;
            for item in &ledger.items {
                writer
                    .write_record(self.row_for(&ledger.columns, item))
                    .map_err(|e| self.persist_failure(e))?;
            }
            writer.flush().map_err(|e| self.persist_failure(e))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| self.persist_failure(e.error))?;
        debug!(
            path = %self.path.display(),
            items = ledger.items.len(),
            "Record store persisted"
        );
        Ok(())
    }
}
