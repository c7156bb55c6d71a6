// src/collect/paged.rs
//
// Collector for explorers with plain 1-based page indexing. Pages are
// fetched until the explorer serves its "no matching entries" placeholder
// one index past the end. Rows are concatenated in fetch order; the source
// ordering is trusted for cross-page uniqueness.

use tracing::{debug, info};

use super::{LabelResult, SIMPLE_WAIT};
use crate::browser::Session;
use crate::config::ChainConfig;
use crate::error::HarvestError;
use crate::table::{self, RawTable};

/// Rows a well-formed sentinel table carries: message, blank, sum.
const SENTINEL_ROWS: usize = 3;

pub fn collect<S: Session>(
    session: &mut S,
    cfg: &ChainConfig,
    label: &str,
) -> Result<Option<LabelResult>, HarvestError> {
    let mut merged: Option<RawTable> = None;
    let mut page: u32 = 1;

    loop {
        let url = cfg.label_page_url(label, page);
        session.navigate(url.as_str(), SIMPLE_WAIT)?;
        let html = session.page_source()?;
        let Some(first) = table::extract_tables(&html).into_iter().next() else {
            // The page did not parse into a table at all. Recoverable at
            // label granularity; the batch driver skips and continues.
            return Err(HarvestError::PageParse {
                url: url.to_string(),
            });
        };

        if table::is_placeholder(&first) {
            // First index beyond the end. The sentinel table carries zero
            // useful information and has a fixed shape; anything else means
            // the empty-state heuristic no longer matches the site.
            if first.rows.len() != SENTINEL_ROWS {
                return Err(HarvestError::integrity(
                    label,
                    format!(
                        "sentinel table on page {page} has {} rows, expected {SENTINEL_ROWS}",
                        first.rows.len()
                    ),
                ));
            }
            break;
        }

        let trimmed = table::strip_sum_row(first, label)?;
        debug!(label, page, rows = trimmed.rows.len(), "page fetched");
        match merged {
            Some(ref mut out) => {
                if out.headers != trimmed.headers {
                    return Err(HarvestError::integrity(
                        label,
                        format!("page {page} columns differ from earlier pages"),
                    ));
                }
                out.rows.extend(trimmed.rows);
            }
            None => merged = Some(trimmed),
        }
        page += 1;
    }

    match merged {
        Some(table) if !table.rows.is_empty() => {
            info!(label, rows = table.rows.len(), pages = page - 1, "collected");
            Ok(Some(LabelResult {
                label: label.to_string(),
                table,
            }))
        }
        _ => Ok(None),
    }
}
