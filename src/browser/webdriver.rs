//! WebDriver backend - wraps a fantoccini client
//!
//! Chrome talks to chromedriver, Firefox to geckodriver. Both are driven
//! through the same W3C protocol; only the capabilities differ.

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::browser::session::{BrowserSession, SessionFactory};
use crate::core::config::{BrowserConfig, BrowserKind};
use crate::core::{PilotError, Result, WindowHandle};

/// Map a WebDriver command error onto the crate taxonomy
fn command_error(err: CmdError) -> PilotError {
    if let CmdError::Standard(ref wd) = err {
        if matches!(
            wd.error,
            ErrorStatus::Timeout | ErrorStatus::ScriptTimeout | ErrorStatus::StaleElementReference
        ) {
            return PilotError::transient(err.to_string());
        }
    }
    PilotError::browser(err.to_string())
}

/// Build the capabilities for a backend
pub fn capabilities(kind: BrowserKind, headless: bool) -> Capabilities {
    let mut caps = Capabilities::new();

    match kind {
        BrowserKind::Chrome => {
            let mut args = vec![
                "start-maximized",
                "enable-automation",
                "--no-sandbox",
                "--disable-infobars",
                "--disable-dev-shm-usage",
                "--disable-browser-side-navigation",
                "--disable-gpu",
            ];
            if headless {
                args.push("--headless");
            }
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            let args: Vec<&str> = if headless { vec!["-headless"] } else { Vec::new() };
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
    }

    caps
}

/// A browser session driven over WebDriver
pub struct WebDriverSession {
    client: Client,
    kind: BrowserKind,
}

impl WebDriverSession {
    /// Connect to the WebDriver server and create a session
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let url = config.webdriver_url();
        info!(browser = %config.kind, url, headless = config.headless, "Starting browser session");

        let client = ClientBuilder::native()
            .capabilities(capabilities(config.kind, config.headless))
            .connect(url)
            .await
            .map_err(|e| {
                PilotError::session(format!(
                    "Cannot connect to {} WebDriver at {}: {}",
                    config.kind, url, e
                ))
            })?;

        let timeouts = TimeoutConfiguration::new(
            None,
            Some(Duration::from_secs(config.page_load_timeout_secs)),
            Some(Duration::from_secs(config.implicit_wait_secs)),
        );
        client.update_timeouts(timeouts).await.map_err(command_error)?;

        Ok(Self {
            client,
            kind: config.kind,
        })
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = Element;

    async fn window_handles(&mut self) -> Result<Vec<WindowHandle>> {
        let handles = self.client.windows().await.map_err(command_error)?;
        Ok(handles
            .into_iter()
            .map(|h| WindowHandle::new(String::from(h)))
            .collect())
    }

    async fn current_window(&mut self) -> Result<WindowHandle> {
        let handle = self.client.window().await.map_err(command_error)?;
        Ok(WindowHandle::new(String::from(handle)))
    }

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()> {
        let handle = fantoccini::wd::WindowHandle::try_from(handle.as_str().to_string())
            .map_err(|e| PilotError::browser(format!("Invalid window handle {}: {}", handle, e)))?;
        self.client
            .switch_to_window(handle)
            .await
            .map_err(command_error)
    }

    async fn close_window(&mut self) -> Result<()> {
        self.client.close_window().await.map_err(command_error)
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        self.client.goto(url).await.map_err(command_error)
    }

    async fn default_content(&mut self) -> Result<()> {
        self.client.enter_frame(None).await.map_err(command_error)
    }

    async fn enter_frame(&mut self, frame: &Element) -> Result<()> {
        frame.clone().enter_frame().await.map_err(command_error)
    }

    async fn find(&mut self, selector: &str) -> Result<Option<Element>> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if e.is_no_such_element() => {
                debug!(selector, "No element yet");
                Ok(None)
            }
            Err(e) => Err(command_error(e)),
        }
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>> {
        self.client
            .find_all(Locator::Css(selector))
            .await
            .map_err(command_error)
    }

    async fn tag_name(&mut self, element: &Element) -> Result<String> {
        element.tag_name().await.map_err(command_error)
    }

    async fn text(&mut self, element: &Element) -> Result<String> {
        element.text().await.map_err(command_error)
    }

    async fn click(&mut self, element: &Element) -> Result<()> {
        element.click().await.map_err(command_error)
    }

    async fn clear(&mut self, element: &Element) -> Result<()> {
        element.clear().await.map_err(command_error)
    }

    async fn send_keys(&mut self, element: &Element, keys: &str) -> Result<()> {
        element.send_keys(keys).await.map_err(command_error)
    }

    async fn option_labels(&mut self, select: &Element) -> Result<Vec<String>> {
        let options = select
            .find_all(Locator::Css("option"))
            .await
            .map_err(command_error)?;

        let mut labels = Vec::with_capacity(options.len());
        for option in &options {
            labels.push(option.text().await.map_err(command_error)?);
        }
        Ok(labels)
    }

    async fn select_by_index(&mut self, select: &Element, index: usize) -> Result<()> {
        select
            .select_by_index(index)
            .await
            .map_err(command_error)
    }

    async fn page_source(&mut self) -> Result<String> {
        self.client.source().await.map_err(command_error)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.client.screenshot().await.map_err(command_error)
    }

    async fn quit(&mut self) -> Result<()> {
        debug!(browser = %self.kind, "Ending WebDriver session");
        self.client.clone().close().await.map_err(command_error)
    }
}

/// Opens WebDriver sessions from the browser configuration
pub struct WebDriverFactory {
    config: BrowserConfig,
}

impl WebDriverFactory {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    type Session = WebDriverSession;

    async fn open(&self) -> Result<WebDriverSession> {
        WebDriverSession::connect(&self.config).await
    }
}
