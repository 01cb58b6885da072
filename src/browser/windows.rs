//! Window registry - logical window names bound to browser handles
//!
//! The vendor console opens popups for almost every step. Each popup the
//! workflow expects gets a name when it appears; any live handle without a
//! name is an unexpected popup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::browser::poll::{poll_until, Clock, PollPolicy, Probe};
use crate::browser::session::BrowserSession;
use crate::core::{PilotError, Result, WindowHandle};

/// Name of the window the session starts with
pub const MAIN_WINDOW: &str = "main";

/// Attempts made while waiting for a new window to appear
const NEW_WINDOW_ATTEMPTS: u32 = 5;

/// Mapping from logical window name to live window handle
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<String, WindowHandle>,
    active: Option<String>,
}

/// Looks for a live handle no name is bound to
struct NewWindow<'a> {
    registry: &'a WindowRegistry,
}

#[async_trait]
impl<'a, B: BrowserSession> Probe<B> for NewWindow<'a> {
    type Output = WindowHandle;

    async fn probe(&mut self, session: &mut B) -> Result<Option<WindowHandle>> {
        let handles = session.window_handles().await?;
        Ok(handles.into_iter().find(|h| !self.registry.is_known(h)))
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `handle`
    ///
    /// Fails if the name is still bound or the handle already has a name.
    pub fn bind(&mut self, name: &str, handle: WindowHandle) -> Result<()> {
        if self.windows.contains_key(name) {
            return Err(PilotError::DuplicateWindow(name.to_string()));
        }
        if let Some(owner) = self.name_of(&handle) {
            return Err(PilotError::HandleConflict {
                handle: handle.to_string(),
                name: owner.to_string(),
            });
        }
        self.windows.insert(name.to_string(), handle);
        Ok(())
    }

    /// Drop the binding for `name`, returning its handle
    pub fn unbind(&mut self, name: &str) -> Option<WindowHandle> {
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        self.windows.remove(name)
    }

    pub fn handle(&self, name: &str) -> Option<&WindowHandle> {
        self.windows.get(name)
    }

    pub fn name_of(&self, handle: &WindowHandle) -> Option<&str> {
        self.windows
            .iter()
            .find(|(_, h)| *h == handle)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_known(&self, handle: &WindowHandle) -> bool {
        self.name_of(handle).is_some()
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Name of the window the page layer currently targets
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Bind the window the session is focused on as [`MAIN_WINDOW`]
    pub async fn register_current<B: BrowserSession>(
        &mut self,
        session: &mut B,
    ) -> Result<WindowHandle> {
        let handle = session.current_window().await?;
        self.bind(MAIN_WINDOW, handle.clone())?;
        self.active = Some(MAIN_WINDOW.to_string());
        Ok(handle)
    }

    /// Wait for a window nobody has named yet and bind it to `name`
    pub async fn register_new_window<B: BrowserSession>(
        &mut self,
        session: &mut B,
        clock: &dyn Clock,
        name: &str,
    ) -> Result<WindowHandle> {
        if self.windows.contains_key(name) {
            return Err(PilotError::DuplicateWindow(name.to_string()));
        }

        info!(window = name, "Waiting for new window");
        let policy = PollPolicy::new(NEW_WINDOW_ATTEMPTS, Duration::from_secs(1));
        let mut probe = NewWindow { registry: &*self };
        let handle = poll_until(clock, policy, session, &mut probe)
            .await?
            .ok_or_else(|| PilotError::WindowDidNotAppear(name.to_string()))?;

        self.bind(name, handle.clone())?;
        info!(window = name, handle = %handle, "Registered window");
        Ok(handle)
    }

    /// Focus the window bound to `name`
    pub async fn activate<B: BrowserSession>(&mut self, session: &mut B, name: &str) -> Result<()> {
        let handle = self
            .windows
            .get(name)
            .ok_or_else(|| PilotError::UnknownWindow(name.to_string()))?;
        session.switch_to_window(handle).await?;
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Close the window bound to `name`, then focus `fallback`
    ///
    /// The binding is removed even when the browser refuses the close or the
    /// window is already gone.
    pub async fn close<B: BrowserSession>(
        &mut self,
        session: &mut B,
        name: &str,
        fallback: &str,
    ) -> Result<()> {
        match self.unbind(name) {
            Some(handle) => {
                let closed = match session.switch_to_window(&handle).await {
                    Ok(()) => session.close_window().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = closed {
                    debug!(window = name, error = %e, "Window already gone");
                }
                info!(window = name, "Closed window");
            }
            None => debug!(window = name, "Close requested for unbound window"),
        }

        self.activate(session, fallback).await
    }

    /// Live handles minus registered names
    pub async fn unexpected_window_count<B: BrowserSession>(
        &self,
        session: &mut B,
    ) -> Result<usize> {
        let live = session.window_handles().await?;
        Ok(live.len().saturating_sub(self.windows.len()))
    }
}
