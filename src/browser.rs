// src/browser.rs
//
// Browser session collaborator. The collectors only need navigation, a
// fixed post-navigation wait, the rendered page markup, and text entry into
// named login fields; everything else (table extraction, link discovery)
// happens on the markup via `scraper`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::debug;

use crate::config::ChainConfig;
use crate::error::HarvestError;

/// ASP.NET form field IDs on the Etherscan-family login page.
pub const USERNAME_FIELD_ID: &str = "ContentPlaceHolder1_txtUserName";
pub const PASSWORD_FIELD_ID: &str = "ContentPlaceHolder1_txtPassword";

/// Render budget for the login page.
pub const LOGIN_WAIT: Duration = Duration::from_secs(5);

pub trait Session {
    /// Navigate to `url`, then block for `wait` while the page renders.
    fn navigate(&mut self, url: &str, wait: Duration) -> Result<(), HarvestError>;

    /// Markup of the currently rendered page.
    fn page_source(&mut self) -> Result<String, HarvestError>;

    /// Type `value` into the element with DOM id `element_id`.
    fn fill_field(&mut self, element_id: &str, value: &str) -> Result<(), HarvestError>;
}

/// Live session backed by one headless Chrome process. The process is torn
/// down when the session is dropped, so `main` owning the value is the
/// cleanup guarantee.
pub struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch() -> Result<Self, HarvestError> {
        // The window must stay visible: the operator submits the login form
        // and solves the captcha by hand before collection starts.
        let options = LaunchOptions::default_builder()
            .headless(false)
            .build()
            .map_err(|e| anyhow!("failed to build browser launch options: {e}"))?;
        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl Session for ChromeSession {
    fn navigate(&mut self, url: &str, wait: Duration) -> Result<(), HarvestError> {
        debug!(%url, "navigating");
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        // The explorers render their result tables client-side; a fixed wait
        // budget stands in for load detection.
        thread::sleep(wait);
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, HarvestError> {
        Ok(self.tab.get_content()?)
    }

    fn fill_field(&mut self, element_id: &str, value: &str) -> Result<(), HarvestError> {
        let selector = format!("#{element_id}");
        self.tab.find_element(&selector)?.type_into(value)?;
        Ok(())
    }
}

/// Navigate to the explorer's login form and prefill the credential fields.
/// Submitting (and any captcha) is left to the operator; the caller prompts
/// before continuing.
pub fn login<S: Session>(session: &mut S, cfg: &ChainConfig) -> Result<(), HarvestError> {
    session.navigate(cfg.login_url().as_str(), LOGIN_WAIT)?;
    session.fill_field(USERNAME_FIELD_ID, &cfg.user)?;
    session.fill_field(PASSWORD_FIELD_ID, &cfg.pass)?;
    Ok(())
}
