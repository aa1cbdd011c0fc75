use std::{future::Future, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element {selector} not found")]
    ElementNotFound { selector: String },

    #[error("timed out waiting for {marker}")]
    Timeout { marker: String },

    #[error("remote application error: {0}")]
    Remote(String),
}

/// One live browser-equivalent session against the remote application.
///
/// A session is exclusively owned by a single provisioning run and must be
/// closed before the run's tenant queue advances.
pub trait RemoteSession: Send {
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn fill(
        &mut self,
        selector: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn click(&mut self, selector: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn press(&mut self, key: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Wait until `marker` is present, up to `timeout`. `Ok(false)` means the
    /// marker did not show up in time; hard session failures are `Err`.
    fn wait_for(
        &mut self,
        marker: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<bool, SessionError>> + Send;

    fn is_visible(&mut self, marker: &str)
        -> impl Future<Output = Result<bool, SessionError>> + Send;

    fn read_text(
        &mut self,
        selector: &str,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Release the session. Infallible so the teardown path cannot fail halfway.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Factory for [`RemoteSession`]s, injected into the job runner context
pub trait RemoteDriver: Send + Sync + 'static {
    type Session: RemoteSession;

    fn open(&self) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}
