use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::BrowserTarget;

/// A live, driver-controlled browser process instance.
///
/// Exclusively owned by the (trial, benchmark, browser) triple that is
/// currently executing. The orchestration engine is written purely
/// against this interface so it can be exercised with canned sessions in
/// tests.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to a URL and wait for the page load to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression in page context and return its
    /// value.
    async fn execute_script(&self, expression: &str) -> Result<Value>;

    /// Capture the current viewport as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Move and resize the browser window.
    async fn set_window_geometry(&self, x: i32, y: i32, width: u32, height: u32) -> Result<()>;

    /// Graceful close. Called at most once; errors are the caller's to
    /// swallow.
    async fn close(&mut self) -> Result<()>;

    /// The browser version the session reported at attach time, if any.
    fn version(&self) -> Option<String>;
}

/// Launch strategy for browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Start a session for the given target. Failure here is fatal for
    /// the current (trial, benchmark, browser) triple only.
    async fn launch(&self, target: &BrowserTarget) -> Result<Box<dyn BrowserSession>>;
}
