// src/discover.rs
//
// Label discovery from the explorer's label-cloud index page: every anchor
// whose target starts with the chain's label-URL prefix, stripped down to
// the bare identifier.

use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::info;

use crate::browser::Session;
use crate::config::ChainConfig;
use crate::error::HarvestError;

pub const LABELCLOUD_WAIT: Duration = Duration::from_secs(5);

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Every label advertised on `<base>/labelcloud`, in page order. Duplicates
/// are possible and harmless: collection is keyed by identifier and
/// idempotent.
pub fn discover_labels<S: Session>(
    session: &mut S,
    cfg: &ChainConfig,
) -> Result<Vec<String>, HarvestError> {
    session.navigate(cfg.labelcloud_url().as_str(), LABELCLOUD_WAIT)?;
    let html = session.page_source()?;

    let prefix = cfg.label_prefix();
    let doc = Html::parse_document(&html);
    let labels: Vec<String> = doc
        .select(&ANCHOR)
        .filter_map(|el| el.value().attr("href"))
        // Relative hrefs resolve against the chain's base URL, the same way
        // the browser would.
        .filter_map(|href| cfg.base_url.join(href).ok())
        .filter_map(|url| {
            url.as_str()
                .strip_prefix(prefix.as_str())
                .map(|rest| rest.trim_start_matches('/').to_string())
        })
        .filter(|label| !label.is_empty())
        .collect();

    info!(chain = cfg.chain.name(), count = labels.len(), "discovered labels");
    Ok(labels)
}
