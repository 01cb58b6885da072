//! Workflow module - the operational sequences run against the console
//!
//! Restore and publish are built only from page-layer calls; the driver
//! strings them together into cycles.

pub mod console;
pub mod driver;
pub mod publish;
pub mod restore;
pub mod status;

pub use driver::Driver;
pub use publish::{monitor_publication, publish, start_publication};
pub use restore::restore_backup;
pub use status::{classify, StatusTracker, Transition};
