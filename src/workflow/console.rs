//! Admin console steps shared by the restore and publish workflows

use tracing::info;

use crate::browser::{BrowserSession, KeyEntry, Page};
use crate::core::{Config, Result};

/// Open an admin console URL and sign in
pub async fn login<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
    url: &str,
) -> Result<()> {
    let selectors = &config.selectors;
    info!(url, username = %config.credentials.username, "Login");

    page.goto(url).await?;
    page.send_keys(
        &selectors.login_username,
        config.credentials.username.as_str(),
        &KeyEntry::new(),
    )
    .await?;
    page.send_keys(
        &selectors.login_password,
        config.credentials.password.as_str(),
        &KeyEntry::new(),
    )
    .await?;
    page.click(&selectors.login_button).await
}

/// Type the console password into the focused popup and confirm
pub async fn enter_popup_password<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
) -> Result<()> {
    let selectors = &config.selectors;
    page.send_keys(
        &selectors.popup_password,
        config.credentials.password.as_str(),
        &KeyEntry::new(),
    )
    .await?;
    page.click(&selectors.popup_ok).await
}
