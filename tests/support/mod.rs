//! Scripted in-memory admin console for integration tests
//!
//! Elements are plain selector strings. Clicking certain selectors opens
//! popups the same way the real console does, the backup list depends on
//! the admin URL last visited, and the publish status label plays back a
//! script.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

use publish_pilot::browser::{BrowserSession, Clock, Page, PageSettings, SessionFactory};
use publish_pilot::core::{PilotError, Result, WindowHandle};
use publish_pilot::Config;

pub const DESIGN_URL: &str = "https://design.example.com/admin";
pub const LIVE_URL: &str = "https://live.example.com/admin";
pub const STATUS: &str = "span#lblPublishStatus";

/// Clock that records sleeps instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingClock {
    sleeps: AtomicUsize,
}

impl RecordingClock {
    pub fn sleeps(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything the fake console knows and everything it was asked to do
#[derive(Debug)]
pub struct ConsoleState {
    pub handles: Vec<WindowHandle>,
    pub current: Option<WindowHandle>,
    next_window: usize,
    pub url: Option<String>,
    /// Backup labels per admin URL
    pub backups: HashMap<String, Vec<String>>,
    /// Whether the restore success marker shows up in the page source
    pub restore_succeeds: bool,
    /// Extra page source text
    pub extra_source: String,
    /// Clicking these selectors opens a new window
    pub opens_window: HashSet<String>,
    /// Selectors that never resolve
    pub missing: HashSet<String>,
    /// Status texts played back one per read; the last one repeats
    pub status_script: VecDeque<String>,
    pub status_reads: usize,
    /// Open an unexpected popup on each of these status reads
    pub popup_on_reads: Vec<usize>,
    /// Upcoming window switches that fail with a transient error
    pub transient_switch_failures: usize,
    /// Upcoming window switches that fail with an ordinary browser error
    pub broken_switch_failures: usize,
    /// The next switch to each of these handles fails with a transient error
    pub transient_switch_to: HashSet<WindowHandle>,

    pub gotos: Vec<String>,
    pub clicks: Vec<String>,
    pub keys: Vec<(String, String)>,
    pub clears: usize,
    pub frames: Vec<String>,
    pub selected: Vec<usize>,
    pub closed: Vec<WindowHandle>,
    pub screenshots: usize,
    pub quits: usize,
}

impl Default for ConsoleState {
    fn default() -> Self {
        let opens_window = ["a.button", "#RestoreButton", "#PublishButton_0", "#PublishButton"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            handles: vec![WindowHandle::new("w0")],
            current: Some(WindowHandle::new("w0")),
            next_window: 1,
            url: None,
            backups: HashMap::new(),
            restore_succeeds: true,
            extra_source: String::new(),
            opens_window,
            missing: HashSet::new(),
            status_script: VecDeque::from(vec!["Completed successfully".to_string()]),
            status_reads: 0,
            popup_on_reads: Vec::new(),
            transient_switch_failures: 0,
            broken_switch_failures: 0,
            transient_switch_to: HashSet::new(),
            gotos: Vec::new(),
            clicks: Vec::new(),
            keys: Vec::new(),
            clears: 0,
            frames: Vec::new(),
            selected: Vec::new(),
            closed: Vec::new(),
            screenshots: 0,
            quits: 0,
        }
    }
}

impl ConsoleState {
    pub fn with_backups(mut self, url: &str, count: usize) -> Self {
        let labels = (0..count).rev().map(|n| format!("backup-{}.bak", n)).collect();
        self.backups.insert(url.to_string(), labels);
        self
    }

    pub fn with_status(mut self, script: &[&str]) -> Self {
        self.status_script = script.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn open_window(&mut self) -> WindowHandle {
        let handle = WindowHandle::new(format!("w{}", self.next_window));
        self.next_window += 1;
        self.handles.push(handle.clone());
        handle
    }

    pub fn clicked(&self, selector: &str) -> bool {
        self.clicks.iter().any(|c| c == selector)
    }
}

/// Browser session over a shared [`ConsoleState`]
#[derive(Debug, Clone)]
pub struct FakeBrowser {
    state: Arc<Mutex<ConsoleState>>,
}

impl FakeBrowser {
    pub fn new(state: ConsoleState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap()
    }

    pub fn shared(&self) -> Arc<Mutex<ConsoleState>> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    type Element = String;

    async fn window_handles(&mut self) -> Result<Vec<WindowHandle>> {
        Ok(self.state().handles.clone())
    }

    async fn current_window(&mut self) -> Result<WindowHandle> {
        self.state()
            .current
            .clone()
            .ok_or_else(|| PilotError::browser("no such window"))
    }

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()> {
        let mut state = self.state();
        if state.transient_switch_failures > 0 {
            state.transient_switch_failures -= 1;
            return Err(PilotError::transient("timeout: renderer busy"));
        }
        if state.transient_switch_to.remove(handle) {
            return Err(PilotError::transient("timeout: renderer busy"));
        }
        if state.broken_switch_failures > 0 {
            state.broken_switch_failures -= 1;
            return Err(PilotError::browser("unknown error: cannot determine loading status"));
        }
        if !state.handles.contains(handle) {
            return Err(PilotError::browser(format!("no such window: {}", handle)));
        }
        state.current = Some(handle.clone());
        Ok(())
    }

    async fn close_window(&mut self) -> Result<()> {
        let mut state = self.state();
        let current = state
            .current
            .take()
            .ok_or_else(|| PilotError::browser("no such window"))?;
        state.handles.retain(|h| *h != current);
        state.closed.push(current);
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        let mut state = self.state();
        state.url = Some(url.to_string());
        state.gotos.push(url.to_string());
        Ok(())
    }

    async fn default_content(&mut self) -> Result<()> {
        self.state().frames.push("<top>".to_string());
        Ok(())
    }

    async fn enter_frame(&mut self, frame: &String) -> Result<()> {
        self.state().frames.push(frame.clone());
        Ok(())
    }

    async fn find(&mut self, selector: &str) -> Result<Option<String>> {
        let state = self.state();
        if state.missing.contains(selector) {
            return Ok(None);
        }
        Ok(Some(selector.to_string()))
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<String>> {
        Ok(self.find(selector).await?.into_iter().collect())
    }

    async fn tag_name(&mut self, element: &String) -> Result<String> {
        if element.starts_with("select") {
            Ok("select".to_string())
        } else {
            Ok("div".to_string())
        }
    }

    async fn text(&mut self, element: &String) -> Result<String> {
        let mut state = self.state();
        if element != STATUS {
            return Ok(String::new());
        }

        state.status_reads += 1;
        if state.popup_on_reads.contains(&state.status_reads) {
            state.open_window();
        }

        let text = if state.status_script.len() > 1 {
            state.status_script.pop_front().unwrap_or_default()
        } else {
            state.status_script.front().cloned().unwrap_or_default()
        };
        Ok(text)
    }

    async fn click(&mut self, element: &String) -> Result<()> {
        let mut state = self.state();
        state.clicks.push(element.clone());
        if state.opens_window.contains(element) {
            state.open_window();
        }
        Ok(())
    }

    async fn clear(&mut self, _element: &String) -> Result<()> {
        self.state().clears += 1;
        Ok(())
    }

    async fn send_keys(&mut self, element: &String, keys: &str) -> Result<()> {
        self.state().keys.push((element.clone(), keys.to_string()));
        Ok(())
    }

    async fn option_labels(&mut self, _select: &String) -> Result<Vec<String>> {
        let state = self.state();
        let labels = state
            .url
            .as_ref()
            .and_then(|url| state.backups.get(url))
            .cloned()
            .unwrap_or_default();
        Ok(labels)
    }

    async fn select_by_index(&mut self, _select: &String, index: usize) -> Result<()> {
        self.state().selected.push(index);
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String> {
        let state = self.state();
        let mut source =
            String::from("<html>Please select the backup file that you want to restore");
        if state.restore_succeeds {
            source.push_str(" Completed successfully");
        }
        source.push_str(&state.extra_source);
        source.push_str("</html>");
        Ok(source)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.state().screenshots += 1;
        Ok(b"\x89PNG".to_vec())
    }

    async fn quit(&mut self) -> Result<()> {
        let mut state = self.state();
        state.quits += 1;
        state.handles.clear();
        state.current = None;
        Ok(())
    }
}

/// Opens a fresh fake console per cycle and keeps every one for inspection
pub struct FakeFactory {
    template: Box<dyn Fn() -> ConsoleState + Send + Sync>,
    sessions: Sessions,
    pub fail_open: bool,
}

/// Every console a [`FakeFactory`] opened, in order
#[derive(Clone, Default)]
pub struct Sessions(Arc<Mutex<Vec<Arc<Mutex<ConsoleState>>>>>);

impl Sessions {
    pub fn get(&self, n: usize) -> Arc<Mutex<ConsoleState>> {
        Arc::clone(&self.0.lock().unwrap()[n])
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl FakeFactory {
    pub fn new(template: impl Fn() -> ConsoleState + Send + Sync + 'static) -> Self {
        Self {
            template: Box::new(template),
            sessions: Sessions::default(),
            fail_open: false,
        }
    }

    pub fn sessions(&self) -> Sessions {
        self.sessions.clone()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeBrowser;

    async fn open(&self) -> Result<FakeBrowser> {
        if self.fail_open {
            return Err(PilotError::session("chromedriver not running"));
        }
        let browser = FakeBrowser::new((self.template)());
        self.sessions.0.lock().unwrap().push(browser.shared());
        Ok(browser)
    }
}

/// Configuration with tiny budgets and a temporary screenshot directory
pub fn test_config() -> (Config, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.credentials.username = "admin".to_string();
    config.credentials.password = "secret".to_string();
    config.sites.design_admin_url = DESIGN_URL.to_string();
    config.sites.live_admin_url = LIVE_URL.to_string();
    config.timing.publish_timeout_minutes = 1;
    config.timing.restore_timeout_minutes = 1;
    config.timing.retries = 3;
    config.timing.interval_secs = 1;
    config.timing.settle_ms = 0;
    config.diagnostics.screenshot_dir = dir.path().to_path_buf();
    (config, dir)
}

/// A page over a fake console, plus a handle on the console state
pub async fn open_page(
    state: ConsoleState,
    config: &Config,
) -> (Page<FakeBrowser>, Arc<Mutex<ConsoleState>>, Arc<RecordingClock>) {
    let browser = FakeBrowser::new(state);
    let shared = browser.shared();
    let clock = Arc::new(RecordingClock::default());
    let page = Page::open(browser, clock.clone(), PageSettings::from_config(config))
        .await
        .unwrap();
    (page, shared, clock)
}
