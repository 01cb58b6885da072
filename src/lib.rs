//! publish-pilot - drives a web admin console with no API
//!
//! Restores database backups and publishes the design site to the live
//! site by operating the console's browser UI over WebDriver.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Browser**: Session capability trait, WebDriver backend, poll
//!   primitive, window registry and page interaction layer
//! - **Workflow**: Restore, publish status machine, publish, driver loop
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use publish_pilot::browser::{TokioClock, WebDriverFactory};
//! use publish_pilot::{Config, Driver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load();
//!     config.validate().unwrap();
//!
//!     let factory = WebDriverFactory::new(config.browser.clone());
//!     let driver = Driver::new(factory, Arc::new(config), Arc::new(TokioClock));
//!     let summary = driver.run().await.unwrap();
//!     println!("{} publications", summary.publications.len());
//! }
//! ```

pub mod browser;
pub mod core;
pub mod workflow;

// Re-export commonly used items
pub use core::{Config, PilotError, Result};
pub use workflow::Driver;
