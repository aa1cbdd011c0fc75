use fieldsmith_core::{
    consts::selectors,
    traits::{RemoteDriver, RemoteSession, SessionError},
};
use std::time::Duration;

/// Driver that answers every interaction optimistically and never raises
/// the security-code challenge. The standalone binary runs with it so a
/// deployment can exercise the whole pipeline without a browser backend;
/// production embeds a real driver instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunDriver;

#[derive(Debug, Default)]
pub struct DryRunSession;

impl RemoteDriver for DryRunDriver {
    type Session = DryRunSession;

    async fn open(&self) -> Result<Self::Session, SessionError> {
        Ok(DryRunSession)
    }
}

impl RemoteSession for DryRunSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        debug!(url, "dry-run navigate");
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), SessionError> {
        debug!(selector, value.len = value.len(), "dry-run fill");
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        debug!(selector, "dry-run click");
        Ok(())
    }

    async fn press(&mut self, key: &str) -> Result<(), SessionError> {
        debug!(key, "dry-run press");
        Ok(())
    }

    async fn wait_for(&mut self, marker: &str, _timeout: Duration) -> Result<bool, SessionError> {
        Ok(marker != selectors::SEND_SECURITY_CODE_BUTTON)
    }

    async fn is_visible(&mut self, marker: &str) -> Result<bool, SessionError> {
        Ok(marker == selectors::DASHBOARD_MARKER)
    }

    async fn read_text(&mut self, _selector: &str) -> Result<String, SessionError> {
        Ok(String::new())
    }

    async fn close(&mut self) {}
}
