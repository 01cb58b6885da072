//! Browser capability interface
//!
//! Everything the workflows need from a browser, expressed as a trait so
//! the WebDriver backend and in-memory test doubles are interchangeable.

use async_trait::async_trait;

use crate::core::{Result, WindowHandle};

/// WebDriver key code for the Tab key
pub const TAB: &str = "\u{e004}";

/// One live browser session
///
/// Methods take `&mut self`: a session has a single focused window and a
/// single execution context, so it is only ever driven from one place.
#[async_trait]
pub trait BrowserSession: Send {
    /// Reference to an element located in the current document
    type Element: Clone + Send + Sync + std::fmt::Debug;

    /// Handles of every live window
    async fn window_handles(&mut self) -> Result<Vec<WindowHandle>>;

    /// Handle of the focused window
    async fn current_window(&mut self) -> Result<WindowHandle>;

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()>;

    /// Close the focused window
    async fn close_window(&mut self) -> Result<()>;

    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Leave any frame and target the top-level document
    async fn default_content(&mut self) -> Result<()>;

    async fn enter_frame(&mut self, frame: &Self::Element) -> Result<()>;

    /// First element matching a CSS selector; `None` when there is none
    async fn find(&mut self, selector: &str) -> Result<Option<Self::Element>>;

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Self::Element>>;

    async fn tag_name(&mut self, element: &Self::Element) -> Result<String>;

    async fn text(&mut self, element: &Self::Element) -> Result<String>;

    async fn click(&mut self, element: &Self::Element) -> Result<()>;

    async fn clear(&mut self, element: &Self::Element) -> Result<()>;

    async fn send_keys(&mut self, element: &Self::Element, keys: &str) -> Result<()>;

    /// Visible labels of a select element's options, in document order
    async fn option_labels(&mut self, select: &Self::Element) -> Result<Vec<String>>;

    async fn select_by_index(&mut self, select: &Self::Element, index: usize) -> Result<()>;

    async fn page_source(&mut self) -> Result<String>;

    /// PNG of the focused window
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    /// Close every window and end the session
    async fn quit(&mut self) -> Result<()>;
}

/// Opens fresh browser sessions, one per driver cycle
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self) -> Result<Self::Session>;
}
