//! Benchmark orchestration: trials, ordering, gating and persistence.

pub mod collect;
pub mod execution;
pub mod idle;
pub mod plan;

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::time::Duration;

use crate::bench::BenchmarkSpec;
use crate::driver::traits::{BrowserSession, SessionFactory};
use crate::driver::{self, BrowserTarget};
use crate::store::ResultStore;
use collect::ExecutionOutcome;
use execution::{BenchmarkExecution, ExecutionState};
use idle::{CpuProbe, IdleGate};

/// Timing knobs, defaulted to the production values.
pub struct RunnerConfig {
    pub idle_timeout: Duration,
    pub execution_deadline: Duration,
    pub poll_interval: Duration,
    pub idle_gate: IdleGate,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            execution_deadline: BenchmarkExecution::DEFAULT_DEADLINE,
            poll_interval: BenchmarkExecution::DEFAULT_POLL_INTERVAL,
            idle_gate: IdleGate::default(),
        }
    }
}

/// Sequences the full trial matrix.
///
/// Exactly one (trial, benchmark, browser) triple is live at any time;
/// the session it owns is torn down before the next launch, so timed
/// runs never share the machine.
pub struct Orchestrator {
    factory: Box<dyn SessionFactory>,
    probe: Box<dyn CpuProbe>,
    store: ResultStore,
    config: RunnerConfig,
}

impl Orchestrator {
    pub fn new(
        factory: Box<dyn SessionFactory>,
        probe: Box<dyn CpuProbe>,
        store: ResultStore,
        config: RunnerConfig,
    ) -> Self {
        Self { factory, probe, store, config }
    }

    /// Run `trials` full passes over the matrix. Only store I/O errors
    /// propagate; every per-triple failure is recorded as an empty cell
    /// and the matrix keeps moving.
    pub async fn run_all(
        &mut self,
        trials: u32,
        benchmarks: &[BenchmarkSpec],
        browsers: &mut [BrowserTarget],
    ) -> Result<()> {
        let mut rng = rand::thread_rng();
        for trial in 1..=trials {
            // One timestamp per trial: the join key across every
            // benchmark's result file.
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            println!();
            println!("{}", format!("Run {}", trial).bold());

            let plan = plan::TrialPlan::shuffle(&mut rng, benchmarks.len(), browsers.len());
            for (slot, &bench_idx) in plan.benchmarks.iter().enumerate() {
                let spec = &benchmarks[bench_idx];
                println!("{}:", spec.name.cyan());

                let mut row: Vec<ExecutionOutcome> = vec![ExecutionOutcome::Failed; browsers.len()];
                for &browser_idx in &plan.browsers[slot] {
                    row[browser_idx] = self.run_triple(spec, &mut browsers[browser_idx]).await;
                }

                // Committed once per (trial, benchmark), in configuration
                // order, after every browser has been attempted.
                let fields: Vec<String> = row.iter().map(|o| o.as_field()).collect();
                self.store.append_row(spec, &timestamp, &fields)?;
            }
        }
        Ok(())
    }

    /// One (trial, benchmark, browser) execution: launch, gate, drive,
    /// collect, tear down. Never propagates; failures become `Failed`.
    async fn run_triple(
        &mut self,
        spec: &BenchmarkSpec,
        target: &mut BrowserTarget,
    ) -> ExecutionOutcome {
        log::info!("Launching {}...", target.name);
        let session = match self.factory.launch(target).await {
            Ok(session) => session,
            Err(e) => {
                log::info!("Failed to launch {}: {}", target.name, e);
                return ExecutionOutcome::Failed;
            }
        };
        if target.version.is_none() {
            target.version = session.version();
        }

        let label = target.label();
        let outcome = self.drive(session.as_ref(), spec, &label).await;
        driver::teardown(session, target.family).await;
        outcome
    }

    async fn drive(
        &mut self,
        session: &dyn BrowserSession,
        spec: &BenchmarkSpec,
        label: &str,
    ) -> ExecutionOutcome {
        if let Err(e) = session.navigate(&spec.url).await {
            log::info!("Failed to load {}: {}", spec.url, e);
            return ExecutionOutcome::Failed;
        }

        // Soft-fail: a busy host delays the run but never blocks it.
        self.config
            .idle_gate
            .wait_for_idle(self.probe.as_mut(), self.config.idle_timeout)
            .await;

        let mut execution = BenchmarkExecution::new(self.config.execution_deadline)
            .with_poll_interval(self.config.poll_interval);
        match execution.run(session, spec).await {
            ExecutionState::Completed => {
                let screenshot = self.store.artifact_path(spec, label);
                collect::collect(session, spec, label, &screenshot).await
            }
            state => {
                log::info!("Benchmark failed ({:?})", state);
                ExecutionOutcome::Failed
            }
        }
    }
}

/// CLI entry: detect browsers, assemble the production wiring and run.
pub async fn run_benchmarks(runs: u32, output: &Path, suite: Option<&Path>) -> Result<()> {
    let benchmarks = match suite {
        Some(path) => crate::bench::load_suite(path)?,
        None => crate::bench::builtin_suite(),
    };

    let mut browsers = driver::detect::detect_browsers().await;
    if browsers.is_empty() {
        anyhow::bail!("No supported browsers detected on this machine");
    }
    println!("{} Detected {} browser(s):", "▶".green().bold(), browsers.len());
    for browser in &browsers {
        println!("  {}: {}", browser.label().cyan(), browser.exe.display());
    }

    let prefix = chrono::Local::now().format("%Y%m%d-%H%M%S-").to_string();
    let store = ResultStore::initialize(output, &prefix, &benchmarks, &browsers)?;

    let mut orchestrator = Orchestrator::new(
        Box::new(driver::webdriver::WebDriverFactory),
        Box::new(idle::SystemCpuProbe::new()),
        store,
        RunnerConfig::default(),
    );
    orchestrator.run_all(runs, &benchmarks, &mut browsers).await
}
