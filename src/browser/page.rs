//! Page interaction layer
//!
//! Element lookup, clicking, typing and frame navigation on top of the
//! poll primitive and the window registry. Owns the browser session for
//! the lifetime of one driver cycle.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::poll::{poll_until, Clock, PollPolicy, Probe};
use crate::browser::session::{BrowserSession, TAB};
use crate::browser::windows::{WindowRegistry, MAIN_WINDOW};
use crate::core::{Config, PilotError, Result, WindowHandle};

/// Timing and output settings of a [`Page`]
#[derive(Debug, Clone)]
pub struct PageSettings {
    /// Policy for element and text lookups
    pub poll: PollPolicy,
    /// Pause around frame switches and after a new window is registered
    pub settle: Duration,
    /// Where screenshots are written
    pub screenshot_dir: PathBuf,
}

impl PageSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll: PollPolicy::new(config.timing.retries, config.timing.interval()),
            settle: config.timing.settle(),
            screenshot_dir: config.diagnostics.screenshot_dir.clone(),
        }
    }
}

/// A select element, wrapped so option handling is explicit
#[derive(Debug, Clone)]
pub struct SelectControl<E> {
    element: E,
}

impl<E> SelectControl<E> {
    pub fn element(&self) -> &E {
        &self.element
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone)]
pub enum Located<E> {
    Element(E),
    Select(SelectControl<E>),
}

impl<E> Located<E> {
    pub fn element(&self) -> &E {
        match self {
            Located::Element(element) => element,
            Located::Select(select) => select.element(),
        }
    }

    pub fn into_select(self) -> Option<SelectControl<E>> {
        match self {
            Located::Select(select) => Some(select),
            Located::Element(_) => None,
        }
    }
}

/// Keys typed into one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// A single key sequence
    Single(String),
    /// Sequences applied one after another
    Sequence(Vec<String>),
}

impl KeyInput {
    fn sequences(&self) -> &[String] {
        match self {
            KeyInput::Single(keys) => std::slice::from_ref(keys),
            KeyInput::Sequence(all) => all,
        }
    }
}

impl From<&str> for KeyInput {
    fn from(keys: &str) -> Self {
        KeyInput::Single(keys.to_string())
    }
}

impl From<String> for KeyInput {
    fn from(keys: String) -> Self {
        KeyInput::Single(keys)
    }
}

impl From<Vec<&str>> for KeyInput {
    fn from(all: Vec<&str>) -> Self {
        KeyInput::Sequence(all.into_iter().map(String::from).collect())
    }
}

/// Options for [`Page::send_keys`]
///
/// Text checks are advisory: a violation is logged, never raised.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    /// Clear the field before typing
    pub clear: bool,
    /// Press Tab after each sequence
    pub tab_out: bool,
    /// Text the page should contain afterwards
    pub expect_text: Option<String>,
    /// Texts the page should not contain afterwards
    pub forbid_text: Vec<String>,
}

impl Default for KeyEntry {
    fn default() -> Self {
        Self {
            clear: true,
            tab_out: true,
            expect_text: None,
            forbid_text: Vec::new(),
        }
    }
}

impl KeyEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn tab_out(mut self, tab_out: bool) -> Self {
        self.tab_out = tab_out;
        self
    }

    pub fn expect(mut self, text: impl Into<String>) -> Self {
        self.expect_text = Some(text.into());
        self
    }

    pub fn forbid(mut self, text: impl Into<String>) -> Self {
        self.forbid_text.push(text.into());
        self
    }
}

struct FindElement<'a> {
    selector: &'a str,
}

#[async_trait]
impl<'a, B: BrowserSession> Probe<B> for FindElement<'a> {
    type Output = B::Element;

    async fn probe(&mut self, session: &mut B) -> Result<Option<B::Element>> {
        session.find(self.selector).await
    }
}

struct FindAll<'a> {
    selector: &'a str,
}

#[async_trait]
impl<'a, B: BrowserSession> Probe<B> for FindAll<'a> {
    type Output = Vec<B::Element>;

    async fn probe(&mut self, session: &mut B) -> Result<Option<Vec<B::Element>>> {
        let elements = session.find_all(self.selector).await?;
        Ok((!elements.is_empty()).then_some(elements))
    }
}

struct ContainsText<'a> {
    text: &'a str,
}

#[async_trait]
impl<'a, B: BrowserSession> Probe<B> for ContainsText<'a> {
    type Output = ();

    async fn probe(&mut self, session: &mut B) -> Result<Option<()>> {
        let source = session.page_source().await?;
        Ok(source.contains(self.text).then_some(()))
    }
}

/// The browser session plus everything needed to drive it
pub struct Page<B: BrowserSession> {
    session: B,
    windows: WindowRegistry,
    clock: Arc<dyn Clock>,
    settings: PageSettings,
}

impl<B: BrowserSession> Page<B> {
    /// Take ownership of a fresh session and name its window "main"
    pub async fn open(
        mut session: B,
        clock: Arc<dyn Clock>,
        settings: PageSettings,
    ) -> Result<Self> {
        let mut windows = WindowRegistry::new();
        let handle = match windows.register_current(&mut session).await {
            Ok(handle) => handle,
            Err(e) => {
                if let Err(quit) = session.quit().await {
                    debug!(error = %quit, "Quit after failed start");
                }
                return Err(e);
            }
        };
        debug!(handle = %handle, "Main window registered");

        Ok(Self {
            session,
            windows,
            clock,
            settings,
        })
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn session_mut(&mut self) -> &mut B {
        &mut self.session
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub async fn sleep(&self, duration: Duration) {
        self.clock.sleep(duration).await;
    }

    async fn settle(&self) {
        if !self.settings.settle.is_zero() {
            self.clock.sleep(self.settings.settle).await;
        }
    }

    // ---- windows -------------------------------------------------------

    /// Wait for a new window and name it
    pub async fn register_new_window(&mut self, name: &str) -> Result<WindowHandle> {
        let handle = self
            .windows
            .register_new_window(&mut self.session, self.clock.as_ref(), name)
            .await?;
        self.settle().await;
        Ok(handle)
    }

    /// Wait for a new window, name it and focus it
    pub async fn register_and_activate(&mut self, name: &str) -> Result<WindowHandle> {
        let handle = self.register_new_window(name).await?;
        self.activate(name).await?;
        Ok(handle)
    }

    pub async fn activate(&mut self, name: &str) -> Result<()> {
        self.windows.activate(&mut self.session, name).await?;
        info!(window = name, "Activated window");
        Ok(())
    }

    /// Same as [`Page::activate`] without the log line, for polling loops
    pub async fn activate_quietly(&mut self, name: &str) -> Result<()> {
        self.windows.activate(&mut self.session, name).await
    }

    /// Close a named window and focus `fallback` ("main" when `None`)
    pub async fn close_window(&mut self, name: &str, fallback: Option<&str>) -> Result<()> {
        let fallback = fallback.unwrap_or(MAIN_WINDOW);
        self.windows.close(&mut self.session, name, fallback).await
    }

    pub async fn unexpected_window_count(&mut self) -> Result<usize> {
        self.windows.unexpected_window_count(&mut self.session).await
    }

    // ---- navigation ----------------------------------------------------

    pub async fn goto(&mut self, url: &str) -> Result<()> {
        self.session.goto(url).await
    }

    pub async fn default_content(&mut self) -> Result<()> {
        info!("Switch focus to the default frame");
        self.session.default_content().await
    }

    pub async fn default_content_quietly(&mut self) -> Result<()> {
        self.session.default_content().await
    }

    /// Enter the frame matching `selector`, starting from the top document
    pub async fn switch_to_frame(&mut self, selector: &str) -> Result<()> {
        self.settle().await;
        self.session.default_content().await?;
        self.settle().await;

        info!(selector, "Switching to frame");
        let frame = self.require(selector).await?;
        self.session.enter_frame(frame.element()).await?;
        self.settle().await;
        Ok(())
    }

    // ---- elements ------------------------------------------------------

    /// Look an element up with the default policy
    pub async fn find(&mut self, selector: &str) -> Result<Option<Located<B::Element>>> {
        let policy = self.settings.poll;
        self.find_with(selector, policy).await
    }

    /// Look an element up; select elements come back wrapped
    pub async fn find_with(
        &mut self,
        selector: &str,
        policy: PollPolicy,
    ) -> Result<Option<Located<B::Element>>> {
        let mut probe = FindElement { selector };
        let found = poll_until(self.clock.as_ref(), policy, &mut self.session, &mut probe).await?;

        let Some(element) = found else {
            debug!(selector, "Element not found");
            return Ok(None);
        };

        let tag = self.session.tag_name(&element).await?;
        if tag.eq_ignore_ascii_case("select") {
            Ok(Some(Located::Select(SelectControl { element })))
        } else {
            Ok(Some(Located::Element(element)))
        }
    }

    /// Like [`Page::find`], but absence is an error
    pub async fn require(&mut self, selector: &str) -> Result<Located<B::Element>> {
        self.find(selector)
            .await?
            .ok_or_else(|| PilotError::ElementNotFound(selector.to_string()))
    }

    /// Every element matching `selector`; empty when none appear in time
    pub async fn find_all(&mut self, selector: &str) -> Result<Vec<B::Element>> {
        let policy = self.settings.poll;
        let mut probe = FindAll { selector };
        let found = poll_until(self.clock.as_ref(), policy, &mut self.session, &mut probe).await?;
        Ok(found.unwrap_or_default())
    }

    pub async fn click(&mut self, selector: &str) -> Result<()> {
        info!(selector, "Clicking");
        let element = self.require(selector).await?;
        self.session.click(element.element()).await
    }

    /// Text of the element matching `selector`, `None` if it never appears
    pub async fn text_of(&mut self, selector: &str) -> Result<Option<String>> {
        match self.find(selector).await? {
            Some(element) => Ok(Some(self.session.text(element.element()).await?)),
            None => Ok(None),
        }
    }

    /// Type into the element matching `selector`
    pub async fn send_keys(
        &mut self,
        selector: &str,
        keys: impl Into<KeyInput>,
        entry: &KeyEntry,
    ) -> Result<()> {
        let keys = keys.into();
        info!(selector, "Sending keys");
        let located = self.require(selector).await?;
        let element = located.element();

        if entry.clear {
            self.session.clear(element).await?;
        }

        for sequence in keys.sequences() {
            self.session.send_keys(element, sequence).await?;
            if entry.tab_out {
                self.session.send_keys(element, TAB).await?;
            }
            self.check_entry(selector, entry).await?;
        }

        Ok(())
    }

    async fn check_entry(&mut self, selector: &str, entry: &KeyEntry) -> Result<()> {
        if let Some(ref expected) = entry.expect_text {
            let policy = self.settings.poll;
            if !self.page_contains_text(expected, policy).await? {
                warn!(selector, expected = %expected, "Expected text not found after typing");
            }
        }

        for forbidden in &entry.forbid_text {
            if self.page_contains_text(forbidden, PollPolicy::once()).await? {
                warn!(selector, forbidden = %forbidden, "Unexpected text found after typing");
            }
        }

        Ok(())
    }

    /// Whether the page source contains `text` within the policy
    pub async fn page_contains_text(&mut self, text: &str, policy: PollPolicy) -> Result<bool> {
        let mut probe = ContainsText { text };
        let found = poll_until(self.clock.as_ref(), policy, &mut self.session, &mut probe).await?;
        Ok(found.is_some())
    }

    // ---- select controls -----------------------------------------------

    /// The select element matching `selector`
    pub async fn select_control(&mut self, selector: &str) -> Result<SelectControl<B::Element>> {
        self.require(selector)
            .await?
            .into_select()
            .ok_or_else(|| PilotError::browser(format!("{} is not a select element", selector)))
    }

    pub async fn option_labels(
        &mut self,
        select: &SelectControl<B::Element>,
    ) -> Result<Vec<String>> {
        self.session.option_labels(select.element()).await
    }

    pub async fn select_index(
        &mut self,
        select: &SelectControl<B::Element>,
        index: usize,
    ) -> Result<()> {
        self.session.select_by_index(select.element(), index).await
    }

    // ---- diagnostics ---------------------------------------------------

    /// Save a screenshot as `<tag>-<timestamp>.png`
    pub async fn screenshot(&mut self, tag: &str) -> Result<PathBuf> {
        let png = self.session.screenshot().await?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let path = self.settings.screenshot_dir.join(format!("{}-{}.png", tag, stamp));

        tokio::fs::write(&path, png)
            .await
            .map_err(|e| {
                PilotError::with_context(format!("Failed to write {}", path.display()), e)
            })?;

        warn!(path = %path.display(), "Screenshot saved");
        Ok(path)
    }

    /// Screenshot for a failure that is already being reported
    pub async fn capture(&mut self, tag: &str) {
        if let Err(e) = self.screenshot(tag).await {
            warn!(tag, error = %e, "Could not capture screenshot");
        }
    }

    /// End the browser session
    pub async fn quit(mut self) -> Result<()> {
        self.session.quit().await
    }
}
