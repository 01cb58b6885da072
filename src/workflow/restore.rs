//! Restore workflow
//!
//! Restores one database backup through the console's Backup & Restore
//! popup. Backups are picked by their position in the list the console
//! renders (newest first), never by name.

use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser::{BrowserSession, Page, PollPolicy, MAIN_WINDOW};
use crate::core::{Config, PilotError, RestoreOutcome, Result};
use crate::workflow::console::{enter_popup_password, login};

pub const BACKUP_AND_RESTORE_WINDOW: &str = "backup_and_restore";
pub const PASSWORD_WINDOW: &str = "password";

/// Restore the backup at `index` on the admin console at `url`
///
/// An index past the end of the list is reported as
/// [`RestoreOutcome::IndexExhausted`], not as an error.
pub async fn restore_backup<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
    url: &str,
    index: usize,
) -> Result<RestoreOutcome> {
    info!(index, url, "----- RESTORE -----");
    page.activate(MAIN_WINDOW).await?;
    login(page, config, url).await?;

    // The backup file name changes every day; there is always one button.
    page.click(&config.selectors.backup_restore_button).await?;
    page.register_and_activate(BACKUP_AND_RESTORE_WINDOW).await?;

    select_restore_tab(page, config).await?;

    if let RestoreOutcome::IndexExhausted { index, available } =
        choose_backup(page, config, index).await?
    {
        info!(index, available, "Backup index not found");
        return Ok(RestoreOutcome::IndexExhausted { index, available });
    }

    page.register_and_activate(PASSWORD_WINDOW).await?;
    enter_popup_password(page, config).await?;

    page.activate(BACKUP_AND_RESTORE_WINDOW).await?;
    wait_for_restore_success(page, config).await?;

    page.close_window(PASSWORD_WINDOW, None).await?;
    page.close_window(BACKUP_AND_RESTORE_WINDOW, None).await?;
    Ok(RestoreOutcome::Restored)
}

async fn select_restore_tab<B: BrowserSession>(page: &mut Page<B>, config: &Config) -> Result<()> {
    let selectors = &config.selectors;

    page.switch_to_frame(&selectors.header_frame).await?;
    page.click(&selectors.restore_tab_link).await?;

    page.switch_to_frame(&selectors.main_frame).await?;
    page.click(&selectors.next_button).await?;

    let policy = page.settings().poll;
    if !page.page_contains_text(&selectors.restore_intro_text, policy).await? {
        warn!(text = %selectors.restore_intro_text, "Restore page text not found");
    }

    page.default_content().await
}

/// Pick the backup at `index` and start the restore
async fn choose_backup<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
    index: usize,
) -> Result<RestoreOutcome> {
    let selectors = &config.selectors;

    page.switch_to_frame(&selectors.main_frame).await?;
    let list = page.select_control(&selectors.backup_list).await?;
    let labels = page.option_labels(&list).await?;
    info!(
        selector = %selectors.backup_list,
        count = labels.len(),
        options = ?labels,
        "Backup files listed"
    );

    let Some(label) = labels.get(index) else {
        return Ok(RestoreOutcome::IndexExhausted {
            index,
            available: labels.len(),
        });
    };

    info!(index, backup = %label, "Selecting backup");
    page.select_index(&list, index).await?;
    page.sleep(page.settings().settle).await;

    page.click(&selectors.next_button).await?;
    page.click(&selectors.restore_button).await?;
    Ok(RestoreOutcome::Restored)
}

async fn wait_for_restore_success<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
) -> Result<()> {
    let selectors = &config.selectors;
    info!("Wait for restore to complete");

    let budget = Duration::from_secs(config.timing.restore_timeout_secs());
    let policy = PollPolicy::for_duration(budget, Duration::from_secs(1));

    page.switch_to_frame(&selectors.main_frame).await?;
    page.default_content_quietly().await?;

    if page.page_contains_text(&selectors.restore_success_text, policy).await? {
        info!("Restore completed successfully");
        return Ok(());
    }

    page.capture("restore-failed").await;
    let msg = format!(
        "\"{}\" not found within {} minutes",
        selectors.restore_success_text, config.timing.restore_timeout_minutes
    );
    error!(reason = %msg, "Restore failed");
    Err(PilotError::RestoreFailed(msg))
}
