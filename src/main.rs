use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use labelgrab::{
    browser::{self, ChromeSession},
    combine,
    config::{self, ChainConfig},
    run::{self, Mode},
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const SETTINGS_PATH: &str = "config.json";
const DATA_DIR: &str = "data";
const COMBINED_DIR: &str = "combined";

/// Chain answer that skips scraping and only merges existing files.
const COMBINE_SENTINEL: &str = "combine";

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    let data_dir = PathBuf::from(DATA_DIR);
    let combined_dir = PathBuf::from(COMBINED_DIR);

    // ─── 2) resolve the command before any side effect ───────────────
    let settings = config::load_settings(SETTINGS_PATH)?;
    let answer = prompt(
        "Enter chain (ethereum/optimism/arbitrum/polygon/gnosis), \
         or `combine` to only merge existing files: ",
    )?;
    if answer == COMBINE_SENTINEL {
        let all = combine::combine_all(&data_dir, &combined_dir)?;
        info!(chains = all.len(), "combined mappings written; exiting");
        return Ok(());
    }
    let cfg = ChainConfig::resolve(&answer, &settings)?;

    let mode = loop {
        match prompt("Enter retrieval type (single/all): ")?.as_str() {
            "single" => break Mode::Single,
            "all" => break Mode::All,
            other => eprintln!("unrecognized retrieval type `{other}`"),
        }
    };

    // ─── 3) browser session + operator-assisted login ────────────────
    let mut session = ChromeSession::launch()?;
    browser::login(&mut session, &cfg)?;
    prompt("Press enter once logged in")?;

    // ─── 4) harvest ──────────────────────────────────────────────────
    match mode {
        Mode::All => run::harvest_all(&mut session, &cfg, &data_dir, run::INTER_LABEL_DELAY)?,
        Mode::Single => {
            let mut label = prompt("Enter label of interest: ")?;
            loop {
                match run::harvest_label(&mut session, &cfg, &data_dir, &label) {
                    Ok(outcome) => info!(label = %label, ?outcome, "label finished"),
                    Err(err) if err.is_label_skip() => {
                        warn!(label = %label, error = %err, "skipping label due to error")
                    }
                    Err(err) => return Err(err.into()),
                }
                let next = prompt("Type `exit` to end, or the next label of interest: ")?;
                if next == "exit" {
                    break;
                }
                label = next;
            }
        }
    }

    info!("all done");
    Ok(())
}
