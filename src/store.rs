// src/store.rs
//
// Durable, idempotent persistence of one label's result set: a CSV with
// every surviving column, and a JSON address→name-tag map. The JSON file
// doubles as the completion marker, so it is written last.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::collect::LabelResult;
use crate::config::Chain;
use crate::error::HarvestError;
use crate::table::{ADDRESS_COLUMN, NAME_TAG_COLUMN};

pub fn csv_path(data_dir: &Path, chain: Chain, label: &str) -> PathBuf {
    data_dir.join(chain.name()).join(format!("{label}.csv"))
}

pub fn json_path(data_dir: &Path, chain: Chain, label: &str) -> PathBuf {
    data_dir.join(chain.name()).join(format!("{label}.json"))
}

/// Whether a completed output already exists for this (chain, label) pair.
/// Probed before any fetch, which is what makes batch runs resumable.
pub fn already_harvested(data_dir: &Path, chain: Chain, label: &str) -> bool {
    json_path(data_dir, chain, label).exists()
}

/// Row count, address list length and address-set cardinality must agree;
/// any silent duplication upstream fails here, before a byte is written.
fn validate(result: &LabelResult) -> Result<Vec<(String, String)>, HarvestError> {
    let addresses = result.table.column_values(ADDRESS_COLUMN).ok_or_else(|| {
        HarvestError::integrity(
            &result.label,
            format!("result table has no `{ADDRESS_COLUMN}` column"),
        )
    })?;
    let tags = result.table.column_values(NAME_TAG_COLUMN).ok_or_else(|| {
        HarvestError::integrity(
            &result.label,
            format!("result table has no `{NAME_TAG_COLUMN}` column"),
        )
    })?;
    let unique: HashSet<&str> = addresses.iter().copied().collect();
    if result.table.rows.len() != addresses.len() || addresses.len() != unique.len() {
        return Err(HarvestError::integrity(
            &result.label,
            format!(
                "cardinality mismatch: {} rows, {} addresses, {} unique",
                result.table.rows.len(),
                addresses.len(),
                unique.len()
            ),
        ));
    }
    Ok(addresses
        .into_iter()
        .zip(tags)
        .map(|(a, t)| (a.to_string(), t.to_string()))
        .collect())
}

pub fn persist(data_dir: &Path, chain: Chain, result: &LabelResult) -> Result<(), HarvestError> {
    let pairs = validate(result)?;

    let dir = data_dir.join(chain.name());
    fs::create_dir_all(&dir)?;

    let csv_file = csv_path(data_dir, chain, &result.label);
    let mut writer = csv::Writer::from_path(&csv_file)?;
    writer.write_record(&result.table.headers)?;
    for row in &result.table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let mapping: BTreeMap<String, String> = pairs.into_iter().collect();
    let json_file = json_path(data_dir, chain, &result.label);
    fs::write(&json_file, serde_json::to_string(&mapping)?)?;

    info!(
        label = %result.label,
        chain = chain.name(),
        rows = result.row_count(),
        "persisted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{self, fixtures, RawTable};
    use tempfile::TempDir;

    fn result(rows: &[(&str, &str)]) -> LabelResult {
        LabelResult {
            label: "foo".into(),
            table: RawTable {
                headers: vec!["Address".into(), "Name Tag".into()],
                rows: rows
                    .iter()
                    .map(|(a, t)| vec![a.to_string(), t.to_string()])
                    .collect(),
            },
        }
    }

    #[test]
    fn writes_csv_and_json() {
        let tmp = TempDir::new().unwrap();
        let res = result(&[("0x1", "Foo"), ("0x2", "")]);
        persist(tmp.path(), Chain::Gnosis, &res).unwrap();

        let csv = fs::read_to_string(csv_path(tmp.path(), Chain::Gnosis, "foo")).unwrap();
        assert_eq!(csv.lines().count(), 3); // header + 2 rows

        let json = fs::read_to_string(json_path(tmp.path(), Chain::Gnosis, "foo")).unwrap();
        let mapping: BTreeMap<String, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["0x1"], "Foo");
        assert_eq!(mapping["0x2"], "");
        assert!(already_harvested(tmp.path(), Chain::Gnosis, "foo"));
    }

    #[test]
    fn duplicate_addresses_abort_with_no_partial_write() {
        let tmp = TempDir::new().unwrap();
        let res = result(&[("0x1", "Foo"), ("0x1", "Bar")]);
        let err = persist(tmp.path(), Chain::Gnosis, &res).unwrap_err();
        assert!(matches!(err, HarvestError::Integrity { .. }));
        assert!(!csv_path(tmp.path(), Chain::Gnosis, "foo").exists());
        assert!(!json_path(tmp.path(), Chain::Gnosis, "foo").exists());
    }

    #[test]
    fn sum_row_never_reaches_storage() {
        // End to end over the extraction path: a page table whose last row
        // is "Sum of 3 entries" persists with exactly original - 1 rows.
        let tmp = TempDir::new().unwrap();
        let page = fixtures::label_page(&[("0x1", "A"), ("0x2", "B"), ("0x3", "C")]);
        let raw = table::extract_tables(&page).into_iter().next().unwrap();
        assert_eq!(raw.rows.len(), 4);
        let trimmed = table::strip_sum_row(raw, "foo").unwrap();
        let res = LabelResult {
            label: "foo".into(),
            table: trimmed,
        };
        persist(tmp.path(), Chain::Gnosis, &res).unwrap();

        let json = fs::read_to_string(json_path(tmp.path(), Chain::Gnosis, "foo")).unwrap();
        let mapping: BTreeMap<String, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(mapping.len(), 3);
        assert!(mapping.values().all(|v| !v.starts_with("Sum of")));
    }

    #[test]
    fn already_harvested_is_false_before_any_write() {
        let tmp = TempDir::new().unwrap();
        assert!(!already_harvested(tmp.path(), Chain::Gnosis, "foo"));
    }
}
