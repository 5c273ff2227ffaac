//! Category label to classification id mapping.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::CategoriesConfig;

/// Id used when a label is absent or not in the table.
pub const DEFAULT_CLASSIFICATION_ID: u32 = 2;

const BUILTIN: &[(&str, u32)] = &[
    ("Communication", 1),
    ("Rédacteur", 2),
    ("Politique", 3),
    ("Immobilier", 4),
    ("Rédacteur Santé", 5),
    ("Cinema", 6),
    ("Sport", 7),
    ("Traduire", 9),
];

/// Immutable label table, built once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    ids: BTreeMap<String, u32>,
    default_id: u32,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            ids: BUILTIN
                .iter()
                .map(|(label, id)| (label.to_string(), *id))
                .collect(),
            default_id: DEFAULT_CLASSIFICATION_ID,
        }
    }
}

impl CategoryTable {
    pub fn new(ids: BTreeMap<String, u32>, default_id: u32) -> Self {
        let ids = ids
            .into_iter()
            .map(|(label, id)| (label.trim().to_string(), id))
            .collect();
        Self { ids, default_id }
    }

    pub fn from_config(config: &CategoriesConfig) -> Self {
        let builtin = Self::default();
        let ids = config.table.clone().unwrap_or(builtin.ids);
        Self::new(ids, config.default_id.unwrap_or(builtin.default_id))
    }

    /// Resolves a label; unknown or missing labels fall back to the default id.
    pub fn classify(&self, label: Option<&str>) -> u32 {
        let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
            return self.default_id;
        };
        match self.ids.get(label) {
            Some(id) => *id,
            None => {
                debug!(label, default_id = self.default_id, "Unknown category, using default id");
                self.default_id
            }
        }
    }

    pub fn default_id(&self) -> u32 {
        self.default_id
    }
}
