// src/collect/mod.rs
//
// Label collection: one strategy per explorer family, selected by the
// chain configuration. Both strategies produce the same finalized result
// shape and share the table heuristics in `crate::table`.

pub mod paged;
pub mod subcategory;

use std::time::Duration;

use crate::browser::Session;
use crate::config::{ChainConfig, Strategy};
use crate::error::HarvestError;
use crate::table::{RawTable, ADDRESS_COLUMN};

/// Render budget for complex sites, which return the full label in one
/// oversized response.
pub const COMPLEX_WAIT: Duration = Duration::from_secs(10);

/// Render budget for simple paged sites.
pub const SIMPLE_WAIT: Duration = Duration::from_secs(5);

/// Finalized address set for one (chain, label) pair: built incrementally
/// across pages or subcategories, sum rows already stripped, never mutated
/// after collection completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelResult {
    pub label: String,
    pub table: RawTable,
}

impl LabelResult {
    pub fn row_count(&self) -> usize {
        self.table.rows.len()
    }

    pub fn addresses(&self) -> Vec<&str> {
        self.table.column_values(ADDRESS_COLUMN).unwrap_or_default()
    }

}

/// Collect one label with the chain's strategy. `Ok(None)` is the explicit
/// zero-addresses outcome, not an error.
pub fn collect_label<S: Session>(
    session: &mut S,
    cfg: &ChainConfig,
    label: &str,
) -> Result<Option<LabelResult>, HarvestError> {
    match cfg.strategy {
        Strategy::Complex => subcategory::collect(session, cfg, label),
        Strategy::Simple => paged::collect(session, cfg, label),
    }
}
