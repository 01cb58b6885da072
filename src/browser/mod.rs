//! Browser module
//!
//! Session capability trait, WebDriver backend, poll primitive, window
//! registry and the page layer built on them.

pub mod page;
pub mod poll;
pub mod session;
pub mod webdriver;
pub mod windows;

pub use page::{KeyEntry, KeyInput, Located, Page, PageSettings, SelectControl};
pub use poll::{poll_until, Clock, PollPolicy, Probe, TokioClock};
pub use session::{BrowserSession, SessionFactory, TAB};
pub use webdriver::{WebDriverFactory, WebDriverSession};
pub use windows::{WindowRegistry, MAIN_WINDOW};
