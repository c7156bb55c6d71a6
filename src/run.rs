// src/run.rs
//
// Per-label orchestration and the batch loop. The interactive prompts live
// in the binary; everything here takes an explicit session, configuration
// and data directory so it can run against a scripted session in tests.

use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::browser::Session;
use crate::collect;
use crate::config::ChainConfig;
use crate::discover;
use crate::error::HarvestError;
use crate::store;

/// Default delay between labels in a batch run; the only rate-limit
/// mitigation. `harvest_all` takes the delay as an argument so tests can
/// run with zero.
pub const INTER_LABEL_DELAY: Duration = Duration::from_secs(5);

/// Run mode, resolved from the operator's prompts before any collection
/// begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One label at a time, with a continue-or-exit prompt in between.
    Single,
    /// Everything the label cloud advertises.
    All,
}

/// How a single label's harvest concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Result set written to durable storage.
    Persisted { rows: usize },
    /// Label exists but yielded no addresses; nothing written.
    Zero,
    /// Output already present from an earlier run; no fetch performed.
    AlreadyDone,
}

/// Collect and persist one label. The idempotence probe runs before any
/// fetch, so interrupted batch runs resume without re-scraping.
pub fn harvest_label<S: Session>(
    session: &mut S,
    cfg: &ChainConfig,
    data_dir: &Path,
    label: &str,
) -> Result<Outcome, HarvestError> {
    if store::already_harvested(data_dir, cfg.chain, label) {
        info!(label, "already exists; skipping");
        return Ok(Outcome::AlreadyDone);
    }
    info!(label, chain = cfg.chain.name(), "getting addresses");
    match collect::collect_label(session, cfg, label)? {
        Some(result) => {
            let rows = result.row_count();
            store::persist(data_dir, cfg.chain, &result)?;
            Ok(Outcome::Persisted { rows })
        }
        None => {
            info!(label, "has 0 addresses; skipping");
            Ok(Outcome::Zero)
        }
    }
}

/// Discover every advertised label and harvest them sequentially.
/// Page-parse faults skip the label and the batch continues; integrity
/// violations abort the run.
pub fn harvest_all<S: Session>(
    session: &mut S,
    cfg: &ChainConfig,
    data_dir: &Path,
    delay: Duration,
) -> Result<(), HarvestError> {
    let labels = discover::discover_labels(session, cfg)?;
    for label in labels {
        if cfg.is_ignored(&label) {
            info!(%label, "ignored due to size or irrelevance");
            continue;
        }
        if store::already_harvested(data_dir, cfg.chain, &label) {
            info!(%label, "already exists; skipping");
            continue;
        }
        match harvest_label(session, cfg, data_dir, &label) {
            Ok(_) => {}
            Err(err) if err.is_label_skip() => {
                warn!(%label, error = %err, "skipping label due to error");
            }
            Err(err) => return Err(err),
        }
        thread::sleep(delay);
    }
    Ok(())
}
