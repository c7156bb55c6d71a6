// src/combine.rs
//
// Merge per-label JSON mappings into one combined mapping per chain, then
// one cross-chain mapping keyed by chain name. First-seen name wins for an
// address that appears under several labels; no conflict detection across
// differing name tags is attempted.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use glob::glob;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HarvestError;

/// File name of the cross-chain mapping.
pub const COMBINED_ALL_FILE: &str = "combinedLabels.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedEntry {
    pub name: String,
    pub labels: Vec<String>,
}

pub type CombinedMapping = BTreeMap<String, CombinedEntry>;

/// Fold every `<chain_dir>/*.json` label file into one address→entry map.
/// The label identifier is the file stem. glob yields paths in sorted
/// order, but label-list ordering is not a promised property.
pub fn fold_chain(chain_dir: &Path) -> Result<CombinedMapping, HarvestError> {
    let mut combined = CombinedMapping::new();
    let pattern = format!("{}/*.json", chain_dir.display());
    let paths =
        glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    for entry in paths {
        let path = entry.map_err(|e| e.into_error())?;
        let Some(label) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        debug!(%label, "folding label file");
        let raw = fs::read_to_string(&path)?;
        let mapping: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        for (address, tag) in mapping {
            combined
                .entry(address)
                .or_insert_with(|| CombinedEntry {
                    name: tag,
                    labels: Vec::new(),
                })
                .labels
                .push(label.clone());
        }
    }
    Ok(combined)
}

/// Fold one chain's label files and write `<combined_dir>/<chain>.json`.
pub fn combine_chain(
    data_dir: &Path,
    combined_dir: &Path,
    chain_name: &str,
) -> Result<CombinedMapping, HarvestError> {
    let mapping = fold_chain(&data_dir.join(chain_name))?;
    fs::create_dir_all(combined_dir)?;
    let out = combined_dir.join(format!("{chain_name}.json"));
    fs::write(&out, serde_json::to_string(&mapping)?)?;
    info!(chain = chain_name, addresses = mapping.len(), "combined chain mapping written");
    Ok(mapping)
}

/// Fold every chain directory under `data_dir`, writing the per-chain files
/// and the top-level cross-chain mapping keyed by chain name.
pub fn combine_all(
    data_dir: &Path,
    combined_dir: &Path,
) -> Result<BTreeMap<String, CombinedMapping>, HarvestError> {
    let mut all: BTreeMap<String, CombinedMapping> = BTreeMap::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Ok(chain_name) = entry.file_name().into_string() else {
            continue;
        };
        let mapping = combine_chain(data_dir, combined_dir, &chain_name)?;
        all.insert(chain_name, mapping);
    }
    fs::write(
        combined_dir.join(COMBINED_ALL_FILE),
        serde_json::to_string(&all)?,
    )?;
    info!(chains = all.len(), "cross-chain mapping written");
    Ok(all)
}
