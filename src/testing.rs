//! Shared test doubles for the session and probe seams.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::driver::traits::{BrowserSession, SessionFactory};
use crate::driver::BrowserTarget;
use crate::runner::idle::CpuProbe;

type ScriptHandler = dyn Fn(&str) -> Result<Value> + Send + Sync;

/// A canned browser session scripted by a closure mapping probe
/// expressions to values.
pub struct MockSession {
    handler: Arc<ScriptHandler>,
    pub reported_version: Option<String>,
    pub fail_close: bool,
    pub navigations: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockSession {
    pub fn new(handler: impl Fn(&str) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            reported_version: None,
            fail_close: false,
            navigations: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn execute_script(&self, expression: &str) -> Result<Value> {
        (self.handler)(expression)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn set_window_geometry(&self, _x: i32, _y: i32, _w: u32, _h: u32) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            Err(anyhow!("browser refused to quit"))
        } else {
            Ok(())
        }
    }

    fn version(&self) -> Option<String> {
        self.reported_version.clone()
    }
}

/// Factory delegating to a closure, letting tests fail specific targets.
pub struct FnFactory<F>(pub F);

#[async_trait]
impl<F> SessionFactory for FnFactory<F>
where
    F: Fn(&BrowserTarget) -> Result<Box<dyn BrowserSession>> + Send + Sync,
{
    async fn launch(&self, target: &BrowserTarget) -> Result<Box<dyn BrowserSession>> {
        (self.0)(target)
    }
}

/// Probe replaying a fixed utilization sequence, holding the last value
/// once the script runs out.
pub struct ScriptedCpuProbe {
    samples: Vec<f64>,
    cursor: usize,
    cores: usize,
}

impl ScriptedCpuProbe {
    pub fn new(cores: usize, samples: Vec<f64>) -> Self {
        Self { samples, cursor: 0, cores }
    }
}

#[async_trait]
impl CpuProbe for ScriptedCpuProbe {
    async fn sample_percent(&mut self, interval: Duration) -> f64 {
        tokio::time::sleep(interval).await;
        let value = self
            .samples
            .get(self.cursor)
            .or(self.samples.last())
            .copied()
            .unwrap_or(0.0);
        self.cursor += 1;
        value
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}
