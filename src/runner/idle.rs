//! Idle gating: hold a timed measurement until the host machine calms
//! down, so benchmark runs don't compete with background load.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// System load probe. `sample_percent` measures average utilization
/// across all cores over the given interval.
#[async_trait]
pub trait CpuProbe: Send {
    async fn sample_percent(&mut self, interval: Duration) -> f64;
    fn core_count(&self) -> usize;
}

/// sysinfo-backed probe.
pub struct SystemCpuProbe {
    system: sysinfo::System,
}

impl SystemCpuProbe {
    pub fn new() -> Self {
        let mut system = sysinfo::System::new();
        system.refresh_cpu_all();
        Self { system }
    }
}

impl Default for SystemCpuProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CpuProbe for SystemCpuProbe {
    async fn sample_percent(&mut self, interval: Duration) -> f64 {
        self.system.refresh_cpu_usage();
        tokio::time::sleep(interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
        self.system.refresh_cpu_usage();
        self.system.global_cpu_usage() as f64
    }

    fn core_count(&self) -> usize {
        self.system.cpus().len()
    }
}

/// Waits for sustained system quiescence before a timed benchmark run.
///
/// The utilization target scales per core: a single core may burn up to
/// 30% of its share, with a 10% floor so the gate still means something
/// on many-core machines. Timing out is not an error; fairness here is
/// best-effort and the trial matrix must keep moving on a busy host.
pub struct IdleGate {
    pub sample_interval: Duration,
    pub settle_window: Duration,
}

impl Default for IdleGate {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            settle_window: Duration::from_secs(2),
        }
    }
}

impl IdleGate {
    /// Target utilization percentage for a machine with `cores` logical
    /// cores.
    pub fn target_percent(cores: usize) -> f64 {
        (30.0 / cores as f64).max(10.0)
    }

    /// Returns true once utilization stayed at or below target for a full
    /// settle window, false if the timeout elapsed first.
    pub async fn wait_for_idle(&self, probe: &mut dyn CpuProbe, timeout: Duration) -> bool {
        let cores = probe.core_count();
        if cores == 0 {
            // Probe can't see the CPUs; nothing to gate on.
            return true;
        }
        let target = Self::target_percent(cores);
        log::info!("Waiting for idle...");

        let deadline = Instant::now() + timeout;
        let mut idle_since: Option<Instant> = None;
        let mut last_report = Instant::now();

        while Instant::now() < deadline {
            let check_start = Instant::now();
            let pct = probe.sample_percent(self.sample_interval).await;
            if pct <= target {
                let since = *idle_since.get_or_insert(check_start);
                if since.elapsed() >= self.settle_window {
                    return true;
                }
            } else {
                idle_since = None;
            }
            if last_report.elapsed() >= Duration::from_secs(1) {
                last_report = Instant::now();
                log::info!(
                    "CPU utilization: {:.1}% ({} cores, {:.1}% target)",
                    pct,
                    cores,
                    target
                );
            }
        }
        false
    }
}
