// src/collect/subcategory.rs
//
// Collector for explorers that split a label across internal sub-category
// tabs (Main/Others). Tab existence is not discoverable up front: probing a
// missing or invalid subcatid just returns the default tab again, so the
// per-ID result sets have to be reconciled after the fact.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{LabelResult, COMPLEX_WAIT};
use crate::browser::Session;
use crate::config::ChainConfig;
use crate::error::HarvestError;
use crate::table::{self, RawTable};

/// Fetch every candidate subcategory for `label` and reconcile the results
/// into one deduplicated table. Main-only labels probe only the first
/// candidate. `Ok(None)` when every candidate comes back empty.
pub fn collect<S: Session>(
    session: &mut S,
    cfg: &ChainConfig,
    label: &str,
) -> Result<Option<LabelResult>, HarvestError> {
    let candidates: &[String] = if cfg.is_main_only(label) {
        &cfg.subcategories[..1]
    } else {
        &cfg.subcategories
    };

    let mut tables: Vec<(String, RawTable)> = Vec::new();
    for subcat in candidates {
        let url = cfg.subcategory_url(label, subcat);
        session.navigate(url.as_str(), COMPLEX_WAIT)?;
        let html = session.page_source()?;
        let Some(best) = table::select_largest(&table::extract_tables(&html)).cloned() else {
            debug!(label, %subcat, "no result table for subcategory");
            continue;
        };
        let trimmed = table::strip_sum_row(best, label)?;
        info!(label, %subcat, rows = trimmed.rows.len(), "subcategory fetched");
        tables.push((subcat.clone(), trimmed));
    }

    match reconcile(label, tables)? {
        Some(table) if !table.rows.is_empty() => Ok(Some(LabelResult {
            label: label.to_string(),
            table,
        })),
        _ => Ok(None),
    }
}

/// Fold per-subcategory tables into one, enforcing the invariant that each
/// new address set is either disjoint from the union so far (a real extra
/// tab) or a subset of it (the default tab served again, discarded as
/// redundant). A partial overlap means the tab semantics changed under us;
/// the label aborts with the conflicting IDs named.
pub(crate) fn reconcile(
    label: &str,
    tables: Vec<(String, RawTable)>,
) -> Result<Option<RawTable>, HarvestError> {
    let mut union: HashSet<String> = HashSet::new();
    let mut kept_ids: Vec<String> = Vec::new();
    let mut merged: Option<RawTable> = None;

    for (subcat, table) in tables {
        let addresses = table::unique_addresses(&table, label, &format!("subcategory {subcat}"))?;
        if union.is_disjoint(&addresses) {
            match merged {
                Some(ref mut out) => {
                    if out.headers != table.headers {
                        return Err(HarvestError::integrity(
                            label,
                            format!(
                                "subcategory {subcat} columns differ from subcategories {}",
                                kept_ids.join(", ")
                            ),
                        ));
                    }
                    out.rows.extend(table.rows);
                }
                None => merged = Some(table),
            }
            union.extend(addresses);
            kept_ids.push(subcat);
        } else if addresses.is_subset(&union) {
            debug!(label, %subcat, "subcategory repeats already-seen addresses; discarded");
        } else {
            return Err(HarvestError::integrity(
                label,
                format!(
                    "subcategory {subcat} partially overlaps subcategories {}",
                    kept_ids.join(", ")
                ),
            ));
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::ScriptedSession;
    use crate::config::{ChainConfig, ChainSettings, Settings};
    use crate::table::fixtures;

    fn ethereum_config() -> ChainConfig {
        let settings: Settings = [(
            "ethereum".to_string(),
            ChainSettings {
                user: "u".into(),
                pass: "p".into(),
                baseurl: None,
            },
        )]
        .into_iter()
        .collect();
        ChainConfig::resolve("ethereum", &settings).unwrap()
    }

    fn addr_table(rows: &[(&str, &str)]) -> RawTable {
        RawTable {
            headers: vec!["Address".into(), "Name Tag".into()],
            rows: rows
                .iter()
                .map(|(a, t)| vec![a.to_string(), t.to_string()])
                .collect(),
        }
    }

    #[test]
    fn disjoint_sets_are_unioned() {
        let merged = reconcile(
            "foo",
            vec![
                ("1".into(), addr_table(&[("0x1", "A"), ("0x2", "B")])),
                ("0".into(), addr_table(&[("0x3", "C")])),
            ],
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.rows.len(), 3);
    }

    #[test]
    fn subset_sets_are_discarded() {
        // The default tab served twice: identical address sets.
        let merged = reconcile(
            "foo",
            vec![
                ("1".into(), addr_table(&[("0x1", "A"), ("0x2", "B")])),
                ("0".into(), addr_table(&[("0x2", "B"), ("0x1", "A")])),
            ],
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.rows.len(), 2);
    }

    #[test]
    fn partial_overlap_aborts_with_the_offending_id() {
        let err = reconcile(
            "foo",
            vec![
                ("1".into(), addr_table(&[("0x1", "A"), ("0x2", "B")])),
                ("0".into(), addr_table(&[("0x2", "B"), ("0x3", "C")])),
            ],
        )
        .unwrap_err();
        match err {
            HarvestError::Integrity { detail, .. } => {
                assert!(detail.contains("subcategory 0"), "detail: {detail}");
            }
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn intra_table_duplicates_abort() {
        let err = reconcile(
            "foo",
            vec![("1".into(), addr_table(&[("0x1", "A"), ("0x1", "A")]))],
        )
        .unwrap_err();
        assert!(matches!(err, HarvestError::Integrity { .. }));
    }

    #[test]
    fn empty_candidate_list_is_a_zero_outcome() {
        assert!(reconcile("foo", Vec::new()).unwrap().is_none());
    }

    #[test]
    fn main_only_label_probes_only_the_first_candidate() {
        let cfg = ethereum_config();
        // uniswap is in ethereum's main-only list.
        let url = cfg.subcategory_url("uniswap", "1").to_string();
        let mut session =
            ScriptedSession::new([(url.clone(), fixtures::label_page(&[("0x1", "Uniswap V3")]))]);
        let result = collect(&mut session, &cfg, "uniswap").unwrap().unwrap();
        assert_eq!(session.visited, vec![url]);
        assert_eq!(result.row_count(), 1);
    }

    #[test]
    fn regular_label_probes_every_candidate() {
        let cfg = ethereum_config();
        let main_url = cfg.subcategory_url("aave", "1").to_string();
        let others_url = cfg.subcategory_url("aave", "0").to_string();
        let mut session = ScriptedSession::new([
            (main_url.clone(), fixtures::label_page(&[("0x1", "Aave")])),
            (others_url.clone(), fixtures::label_page(&[("0x2", "")])),
        ]);
        let result = collect(&mut session, &cfg, "aave").unwrap().unwrap();
        assert_eq!(session.visited, vec![main_url, others_url]);
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn all_candidates_empty_is_a_zero_outcome() {
        let cfg = ethereum_config();
        // No canned pages: both candidates render as empty documents.
        let mut session = ScriptedSession::empty();
        assert!(collect(&mut session, &cfg, "ghost").unwrap().is_none());
        assert_eq!(session.visited.len(), 2);
    }
}
