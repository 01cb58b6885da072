//! Driver loop
//!
//! One cycle per design-site backup: restore that backup on the design
//! site, restore the newest backup on the live site, publish. The run ends
//! when the design site has no backup at the next index.
//!
//! Every cycle gets a fresh browser session, torn down at the end of the
//! cycle whatever happened.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::browser::{BrowserSession, Clock, Page, PageSettings, SessionFactory};
use crate::core::{Config, CycleOutcome, PilotError, RestoreOutcome, Result, RunSummary};
use crate::workflow::publish::publish;
use crate::workflow::restore::restore_backup;

/// Live backups are taken fresh every cycle; the newest is always first.
const LIVE_BACKUP_INDEX: usize = 0;

/// Runs restore + publish cycles until the design backups run out
pub struct Driver<F: SessionFactory> {
    factory: F,
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    start_index: usize,
}

impl<F: SessionFactory> Driver<F> {
    pub fn new(factory: F, config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        Self {
            factory,
            config,
            clock,
            start_index: 0,
        }
    }

    /// Start from a design backup other than the newest
    pub fn with_start_index(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    /// Run cycles until the design site reports the index exhausted
    ///
    /// Only programming-contract violations and session start failures end
    /// the run early.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut design_index = self.start_index;

        loop {
            summary.cycles += 1;
            let outcome = self.run_session(design_index).await?;
            summary.record(design_index, &outcome);

            if let CycleOutcome::IndexExhausted = outcome {
                info!(index = design_index, "Design site backup index not found. END.");
                return Ok(summary);
            }
            design_index += 1;
        }
    }

    /// Open a session, run one cycle in it, tear it down
    async fn run_session(&self, design_index: usize) -> Result<CycleOutcome> {
        let session = self.factory.open().await?;
        let settings = PageSettings::from_config(&self.config);
        let mut page = match Page::open(session, Arc::clone(&self.clock), settings).await {
            Ok(page) => page,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!(index = design_index, error = %e, "Browser session unusable");
                return Ok(CycleOutcome::Failed(e));
            }
        };

        let outcome = match self.run_cycle(&mut page, design_index).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => {
                teardown(page).await;
                return Err(e);
            }
            Err(e) => {
                page.capture("uncaught-exception").await;
                error!(index = design_index, error = %e, "Cycle aborted");
                CycleOutcome::Failed(e)
            }
        };

        teardown(page).await;
        Ok(outcome)
    }

    async fn run_cycle<B: BrowserSession>(
        &self,
        page: &mut Page<B>,
        design_index: usize,
    ) -> Result<CycleOutcome> {
        let sites = &self.config.sites;

        match restore_backup(page, &self.config, &sites.design_admin_url, design_index).await? {
            RestoreOutcome::Restored => {}
            RestoreOutcome::IndexExhausted { .. } => return Ok(CycleOutcome::IndexExhausted),
        }

        match restore_backup(page, &self.config, &sites.live_admin_url, LIVE_BACKUP_INDEX).await? {
            RestoreOutcome::Restored => {}
            RestoreOutcome::IndexExhausted { available, .. } => {
                return Err(PilotError::RestoreFailed(format!(
                    "live site lists {} backups, newest one missing",
                    available
                )));
            }
        }

        let state = publish(page, &self.config).await?;
        Ok(CycleOutcome::Published(state))
    }
}

async fn teardown<B: BrowserSession>(page: Page<B>) {
    match page.quit().await {
        Ok(()) => info!("Browser session closed"),
        Err(e) => warn!(error = %e, "Browser session did not close cleanly"),
    }
}
