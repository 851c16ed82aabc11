//! WebDriver-backed browser sessions.
//!
//! Talks to a locally running chromedriver / geckodriver / safaridriver
//! endpoint. Launching those daemons is outside the engine's scope; the
//! endpoint URLs come from the environment with localhost defaults.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thirtyfour::prelude::*;

use super::traits::{BrowserSession, SessionFactory};
use super::{BrowserFamily, BrowserTarget};

/// Window geometry applied to every session so viewport differences
/// don't skew scores.
const WINDOW_POS: (i32, i32) = (0, 0);
const WINDOW_SIZE: (u32, u32) = (1440, 900);

/// Benchmark pages can take a long time to load all their assets.
const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(600);
const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("session is already closed")]
    Closed,
}

fn endpoint_for(family: BrowserFamily) -> String {
    let (var, default) = match family {
        BrowserFamily::Chromium => ("BENCHMATE_CHROMEDRIVER", "http://localhost:9515"),
        BrowserFamily::Firefox => ("BENCHMATE_GECKODRIVER", "http://localhost:4444"),
        BrowserFamily::Safari => ("BENCHMATE_SAFARIDRIVER", "http://localhost:4445"),
    };
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Production session factory: one WebDriver session per launch, keyed by
/// the target's family.
pub struct WebDriverFactory;

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn launch(&self, target: &BrowserTarget) -> Result<Box<dyn BrowserSession>> {
        let endpoint = endpoint_for(target.family);
        let exe = target.exe.to_string_lossy();

        let driver = match target.family {
            BrowserFamily::Chromium => {
                let mut caps = DesiredCapabilities::chrome();
                caps.set_binary(&exe)?;
                WebDriver::new(&endpoint, caps).await
            }
            BrowserFamily::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                caps.set_firefox_binary(&exe)?;
                WebDriver::new(&endpoint, caps).await
            }
            BrowserFamily::Safari => {
                let caps = DesiredCapabilities::safari();
                WebDriver::new(&endpoint, caps).await
            }
        }
        .with_context(|| format!("Failed to launch {} via {}", target.name, endpoint))?;

        driver.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        driver.set_script_timeout(SCRIPT_TIMEOUT).await?;

        let version = query_version(&driver, target.family).await;
        let session = WebDriverSession {
            driver: Some(driver),
            version,
        };
        session
            .set_window_geometry(WINDOW_POS.0, WINDOW_POS.1, WINDOW_SIZE.0, WINDOW_SIZE.1)
            .await?;

        Ok(Box::new(session))
    }
}

async fn query_version(driver: &WebDriver, family: BrowserFamily) -> Option<String> {
    let ret = driver
        .execute("return navigator.userAgent;", Vec::new())
        .await
        .ok()?;
    let ua = ret.json().as_str()?.to_string();
    parse_user_agent_version(family, &ua)
}

/// Pull the family's own version token out of a user-agent string.
fn parse_user_agent_version(family: BrowserFamily, ua: &str) -> Option<String> {
    let marker = match family {
        BrowserFamily::Chromium => "Chrome/",
        BrowserFamily::Firefox => "Firefox/",
        BrowserFamily::Safari => "Version/",
    };
    let start = ua.find(marker)? + marker.len();
    let rest = &ua[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let token = &rest[..end];
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub struct WebDriverSession {
    /// `quit` consumes the driver, so it lives in an Option.
    driver: Option<WebDriver>,
    version: Option<String>,
}

impl WebDriverSession {
    fn handle(&self) -> Result<&WebDriver> {
        self.driver.as_ref().ok_or_else(|| DriverError::Closed.into())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.handle()?
            .goto(url)
            .await
            .with_context(|| format!("Failed to load {}", url))
    }

    async fn execute_script(&self, expression: &str) -> Result<Value> {
        let ret = self
            .handle()?
            .execute(expression, Vec::new())
            .await
            .context("Script evaluation failed")?;
        Ok(ret.json().clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.handle()?
            .screenshot_as_png()
            .await
            .context("Screenshot capture failed")
    }

    async fn set_window_geometry(&self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        self.handle()?
            .set_window_rect(x as u32, y as u32, width, height)
            .await
            .context("Failed to set window geometry")
    }

    async fn close(&mut self) -> Result<()> {
        match self.driver.take() {
            Some(driver) => driver.quit().await.context("WebDriver quit failed"),
            None => Ok(()),
        }
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }
}
