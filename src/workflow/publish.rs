//! Publish workflow
//!
//! Starts a publication of the design site and then watches the status
//! label once per second until it reports a terminal state or the publish
//! timeout runs out.

use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser::{BrowserSession, Page, MAIN_WINDOW};
use crate::core::{Config, PublishState, Result};
use crate::workflow::console::{enter_popup_password, login};
use crate::workflow::restore::PASSWORD_WINDOW;
use crate::workflow::status::{classify, StatusTracker, Transition};

pub const PUBLISH_WINDOW: &str = "publish";
pub const EXPECTED_POPUP_WINDOW: &str = "expected_popup";

const TICK: Duration = Duration::from_secs(1);

/// Publish the design site and wait for the outcome
pub async fn publish<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
) -> Result<PublishState> {
    info!("----- PUBLISH -----");
    start_publication(page, config).await?;
    monitor_publication(page, config).await
}

/// Walk through the publish dialog up to the point the server takes over
pub async fn start_publication<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
) -> Result<()> {
    let selectors = &config.selectors;

    page.activate(MAIN_WINDOW).await?;
    login(page, config, &config.sites.design_admin_url).await?;

    page.click(&selectors.publish_section_button).await?;
    page.switch_to_frame(&selectors.publish_sites_frame).await?;
    page.click(&selectors.publish_site_button).await?;

    page.register_and_activate(PUBLISH_WINDOW).await?;
    page.click(&selectors.next_button).await?;
    // "Backup publish site database" comes pre-ticked
    page.click(&selectors.backup_publish_site_checkbox).await?;
    page.click(&selectors.publish_button).await?;

    page.register_and_activate(PASSWORD_WINDOW).await?;
    enter_popup_password(page, config).await?;
    page.sleep(Duration::from_millis(500)).await;
    page.close_window(PASSWORD_WINDOW, Some(PUBLISH_WINDOW)).await
}

/// One reading of the publish window
struct StatusReading {
    text: String,
    unexpected_windows: usize,
}

async fn read_status<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
) -> Result<Option<StatusReading>> {
    page.activate_quietly(PUBLISH_WINDOW).await?;
    page.default_content_quietly().await?;

    let Some(text) = page.text_of(&config.selectors.publish_status).await? else {
        return Ok(None);
    };
    let unexpected_windows = page.unexpected_window_count().await?;

    Ok(Some(StatusReading {
        text,
        unexpected_windows,
    }))
}

/// Acknowledge and close a confirmation popup the console raised by itself
async fn dismiss_popup<B: BrowserSession>(page: &mut Page<B>, config: &Config) -> Result<()> {
    info!("Dismissing unexpected popup");
    page.register_new_window(EXPECTED_POPUP_WINDOW).await?;
    let acknowledged = acknowledge_popup(page, config).await;
    // Once bound, the name is released whatever happened in the popup
    page.close_window(EXPECTED_POPUP_WINDOW, Some(PUBLISH_WINDOW)).await?;
    acknowledged?;
    page.default_content().await
}

async fn acknowledge_popup<B: BrowserSession>(page: &mut Page<B>, config: &Config) -> Result<()> {
    page.activate(EXPECTED_POPUP_WINDOW).await?;
    page.click(&config.selectors.popup_acknowledge).await
}

/// Poll the status label until a terminal state
pub async fn monitor_publication<B: BrowserSession>(
    page: &mut Page<B>,
    config: &Config,
) -> Result<PublishState> {
    info!("Wait for publication to complete");
    let mut tracker = StatusTracker::new(config.timing.publish_ticks());

    while tracker.next_tick() {
        page.sleep(TICK).await;

        let reading = match read_status(page, config).await {
            Ok(Some(reading)) => reading,
            Ok(None) => {
                page.capture("cant-find-publish-status").await;
                error!(
                    selector = %config.selectors.publish_status,
                    "Can't find publication status: ABORT"
                );
                return Ok(PublishState::UnhandledError);
            }
            Err(e) if e.is_transient() => {
                warn!(tick = tracker.tick, error = %e, "Ignoring renderer timeout");
                page.capture("renderer-timeout").await;
                tracker.interrupt();
                continue;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(tick = tracker.tick, error = %e, "Status tick failed");
                continue;
            }
        };

        if tracker.observe(&reading.text) {
            info!(status = %reading.text, "Publication status");
        }

        match classify(&reading.text, reading.unexpected_windows) {
            Transition::Stay => {}
            Transition::DismissPopup => {
                if let Err(e) = dismiss_popup(page, config).await {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!(error = %e, "Could not dismiss popup");
                }
            }
            Transition::Finish(state) => {
                finish(page, state, &reading.text).await;
                return Ok(state);
            }
        }
    }

    warn!(
        minutes = config.timing.publish_timeout_minutes,
        "Publication TIMEOUT ERROR"
    );
    Ok(PublishState::Timeout)
}

async fn finish<B: BrowserSession>(page: &mut Page<B>, state: PublishState, status: &str) {
    if let Some(tag) = state.screenshot_tag() {
        page.capture(tag).await;
    }

    match state {
        PublishState::Success => info!(status, "Publication completed"),
        PublishState::Warning => warn!(status, "Publication WARNING"),
        PublishState::DatabaseCorrupted => error!(status, "Publication ERROR"),
        PublishState::UnhandledError => error!(status, "Publication UNHANDLED ERROR"),
        PublishState::InProgress | PublishState::Timeout => {}
    }
}
