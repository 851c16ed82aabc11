//! Browser targets and session lifecycle.

pub mod detect;
pub mod traits;
pub mod webdriver;

use std::path::PathBuf;

/// Engine family of an installed browser build. Selects the launch
/// strategy and any family-specific teardown quirk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chromium,
    Firefox,
    Safari,
}

impl BrowserFamily {
    /// Process name that must be force-killed after the driver-level
    /// quit. Safari is known not to release its processes promptly.
    pub fn post_quit_kill(self) -> Option<&'static str> {
        match self {
            BrowserFamily::Safari => Some("Safari"),
            BrowserFamily::Chromium | BrowserFamily::Firefox => None,
        }
    }
}

/// One distinct installed browser build. The configured set is fixed for
/// the duration of a run.
#[derive(Debug, Clone)]
pub struct BrowserTarget {
    pub name: String,
    pub exe: PathBuf,
    pub family: BrowserFamily,
    /// Resolved lazily: at detection time where cheap, otherwise recorded
    /// from the first live session.
    pub version: Option<String>,
}

impl BrowserTarget {
    pub fn new(name: &str, exe: PathBuf, family: BrowserFamily) -> Self {
        Self {
            name: name.to_string(),
            exe,
            family,
            version: None,
        }
    }

    /// Display label: name plus version when known. Used for result
    /// columns and artifact names.
    pub fn label(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Best-effort session teardown. A browser that resists quitting must not
/// abort the trial matrix, so every failure here is logged and swallowed.
pub async fn teardown(mut session: Box<dyn traits::BrowserSession>, family: BrowserFamily) {
    if let Err(e) = session.close().await {
        log::warn!("Browser did not close cleanly: {}", e);
    }
    if let Some(process) = family.post_quit_kill() {
        if let Err(e) = tokio::process::Command::new("killall")
            .arg(process)
            .status()
            .await
        {
            log::warn!("Forced kill of {} failed: {}", process, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;
    use serde_json::Value;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_post_quit_kill_only_for_safari() {
        assert_eq!(BrowserFamily::Safari.post_quit_kill(), Some("Safari"));
        assert_eq!(BrowserFamily::Chromium.post_quit_kill(), None);
        assert_eq!(BrowserFamily::Firefox.post_quit_kill(), None);
    }

    #[test]
    fn test_label_includes_version_when_known() {
        let mut target = BrowserTarget::new("Chrome", "/opt/chrome".into(), BrowserFamily::Chromium);
        assert_eq!(target.label(), "Chrome");
        target.version = Some("126.0.6478.55".to_string());
        assert_eq!(target.label(), "Chrome 126.0.6478.55");
    }

    #[tokio::test]
    async fn test_teardown_swallows_close_errors() {
        let mut session = MockSession::new(|_| Ok(Value::Null));
        session.fail_close = true;
        let closed = session.closed.clone();

        teardown(Box::new(session), BrowserFamily::Chromium).await;
        assert!(closed.load(Ordering::SeqCst));
    }
}
