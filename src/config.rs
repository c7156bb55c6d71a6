// src/config.rs
//
// Per-chain configuration: the static explorer tables plus the operator's
// credentials file. Everything a run needs is resolved once, up front, into
// an immutable `ChainConfig` that the collectors take by reference.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::error::HarvestError;

/// Subcategory IDs probed on complex sites, in candidate order.
/// 1 is Main, 0 is Others; these are the common pair, but tab semantics are
/// undocumented, so the collector reconciles whatever comes back.
pub const SUBCATEGORY_IDS: &[&str] = &["1", "0"];

/// `size=` parameter for complex sites: large enough to return every address
/// for a label in a single query. Oversizing is harmless; the page does not
/// take longer to load.
pub const COMPLEX_PAGE_SIZE: u32 = 7000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Ethereum,
    Optimism,
    Arbitrum,
    Polygon,
    Gnosis,
}

/// How a chain's explorer serves label pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Plain 1-based page indexing, empty-state sentinel past the end.
    Simple,
    /// One oversized query per subcategory tab, reconciled afterwards.
    Complex,
}

impl Chain {
    pub fn name(self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Optimism => "optimism",
            Chain::Arbitrum => "arbitrum",
            Chain::Polygon => "polygon",
            Chain::Gnosis => "gnosis",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Chain::Ethereum => "https://etherscan.io/",
            Chain::Optimism => "https://optimistic.etherscan.io/",
            Chain::Arbitrum => "https://arbiscan.io/",
            Chain::Polygon => "https://polygonscan.com/",
            Chain::Gnosis => "https://gnosisscan.io/",
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            Chain::Ethereum | Chain::Optimism => Strategy::Complex,
            Chain::Arbitrum | Chain::Polygon | Chain::Gnosis => Strategy::Simple,
        }
    }

    /// Labels never harvested for this chain: oversized, bugged, or known
    /// to carry no data.
    pub fn ignore_list(self) -> &'static [&'static str] {
        match self {
            Chain::Ethereum => &[
                "eth2-depositor",
                "gnosis-safe-multisig",
                "safe-multisig",
                "beacon-depositor",
                "contract-deployer",
                "liqui.io",
                "education",
                "electronics",
                "flashbots",
                "media",
                "music",
                "network",
                "prediction-market",
                "real-estate",
                "vpn",
            ],
            Chain::Polygon => &["contract-deployer"],
            _ => &[],
        }
    }

    /// Labels too big for the Others tab; restricted to the first
    /// subcategory candidate only.
    pub fn main_only(self) -> &'static [&'static str] {
        match self {
            Chain::Ethereum => &["token-contract", "uniswap"],
            _ => &[],
        }
    }
}

impl FromStr for Chain {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Chain::Ethereum),
            "optimism" => Ok(Chain::Optimism),
            "arbitrum" => Ok(Chain::Arbitrum),
            "polygon" => Ok(Chain::Polygon),
            "gnosis" => Ok(Chain::Gnosis),
            other => Err(HarvestError::UnknownChain(other.to_string())),
        }
    }
}

/// One chain's entry in `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    pub user: String,
    pub pass: String,
    /// Optional override for the built-in explorer base URL.
    #[serde(default)]
    pub baseurl: Option<String>,
}

/// The operator's settings file, keyed by chain name.
pub type Settings = HashMap<String, ChainSettings>;

pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, HarvestError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Resolved, immutable configuration for one run against one chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain: Chain,
    pub base_url: Url,
    pub strategy: Strategy,
    pub subcategories: Vec<String>,
    pub main_only: HashSet<String>,
    pub ignore: HashSet<String>,
    pub user: String,
    pub pass: String,
}

impl ChainConfig {
    /// Validate the operator's chain selection against the settings file.
    /// Runs before any side effect (no browser, no files).
    pub fn resolve(chain_name: &str, settings: &Settings) -> Result<Self, HarvestError> {
        let chain: Chain = chain_name.parse()?;
        let creds = settings
            .get(chain.name())
            .ok_or_else(|| HarvestError::MissingCredentials(chain.name().to_string()))?;
        let base = creds.baseurl.as_deref().unwrap_or_else(|| chain.base_url());
        let base_url =
            Url::parse(base).map_err(|_| HarvestError::InvalidBaseUrl(base.to_string()))?;
        Ok(ChainConfig {
            chain,
            base_url,
            strategy: chain.strategy(),
            subcategories: SUBCATEGORY_IDS.iter().map(|s| s.to_string()).collect(),
            main_only: chain.main_only().iter().map(|s| s.to_string()).collect(),
            ignore: chain.ignore_list().iter().map(|s| s.to_string()).collect(),
            user: creds.user.clone(),
            pass: creds.pass.clone(),
        })
    }

    pub fn is_main_only(&self, label: &str) -> bool {
        self.main_only.contains(label)
    }

    pub fn is_ignored(&self, label: &str) -> bool {
        self.ignore.contains(label)
    }

    pub fn login_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("login");
        url
    }

    pub fn labelcloud_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("labelcloud");
        url
    }

    /// Complex-site query for one subcategory tab, oversized so the whole
    /// label comes back in a single response. `col=1` is always present in
    /// the explorers' own URLs; its effect is unknown.
    pub fn subcategory_url(&self, label: &str, subcat: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("accounts/label/{label}"));
        url.set_query(Some(&format!(
            "subcatid={subcat}&size={COMPLEX_PAGE_SIZE}&start=0&col=1&order=asc"
        )));
        url
    }

    /// Simple-site page fetch, 1-based index.
    pub fn label_page_url(&self, label: &str, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("accounts/label/{label}/{page}"));
        url
    }

    /// Href prefix that identifies label links on the label-cloud page.
    pub fn label_prefix(&self) -> String {
        let mut url = self.base_url.clone();
        url.set_path("accounts/label/");
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(chains: &[&str]) -> Settings {
        chains
            .iter()
            .map(|c| {
                (
                    c.to_string(),
                    ChainSettings {
                        user: "u".into(),
                        pass: "p".into(),
                        baseurl: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn unknown_chain_is_a_config_fault() {
        let err = ChainConfig::resolve("solana", &settings_for(&["ethereum"])).unwrap_err();
        assert!(matches!(err, HarvestError::UnknownChain(ref c) if c == "solana"));
    }

    #[test]
    fn missing_credentials_is_a_config_fault() {
        let err = ChainConfig::resolve("gnosis", &settings_for(&["ethereum"])).unwrap_err();
        assert!(matches!(err, HarvestError::MissingCredentials(ref c) if c == "gnosis"));
    }

    #[test]
    fn strategy_split_matches_explorer_families() {
        assert_eq!(Chain::Ethereum.strategy(), Strategy::Complex);
        assert_eq!(Chain::Optimism.strategy(), Strategy::Complex);
        assert_eq!(Chain::Arbitrum.strategy(), Strategy::Simple);
        assert_eq!(Chain::Polygon.strategy(), Strategy::Simple);
        assert_eq!(Chain::Gnosis.strategy(), Strategy::Simple);
    }

    #[test]
    fn settings_file_parses() {
        let raw = r#"{
            "ethereum": { "user": "alice", "pass": "hunter2" },
            "gnosis": { "user": "bob", "pass": "s3cret", "baseurl": "https://example.org/" }
        }"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        let cfg = ChainConfig::resolve("gnosis", &settings).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://example.org/");
        assert_eq!(cfg.user, "bob");
    }

    #[test]
    fn url_construction() {
        let cfg = ChainConfig::resolve("ethereum", &settings_for(&["ethereum"])).unwrap();
        assert_eq!(
            cfg.subcategory_url("uniswap", "1").as_str(),
            "https://etherscan.io/accounts/label/uniswap?subcatid=1&size=7000&start=0&col=1&order=asc"
        );
        assert_eq!(
            cfg.label_page_url("aave", 3).as_str(),
            "https://etherscan.io/accounts/label/aave/3"
        );
        assert_eq!(cfg.label_prefix(), "https://etherscan.io/accounts/label/");
    }

    #[test]
    fn main_only_and_ignore_sets() {
        let cfg = ChainConfig::resolve("ethereum", &settings_for(&["ethereum"])).unwrap();
        assert!(cfg.is_main_only("uniswap"));
        assert!(!cfg.is_main_only("aave"));
        assert!(cfg.is_ignored("eth2-depositor"));
        assert!(!cfg.is_ignored("aave"));
    }
}
