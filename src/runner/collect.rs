//! Result and artifact collection after a completed execution.

use std::path::Path;

use crate::bench::BenchmarkSpec;
use crate::driver::traits::BrowserSession;

/// Result of one (trial, benchmark, browser) execution. Transient:
/// consumed into the row buffer, never retained.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Score { value: f64, confidence: Option<f64> },
    Failed,
}

impl ExecutionOutcome {
    /// CSV field rendering: empty for failures, `score` or
    /// `score ± confidence` otherwise.
    pub fn as_field(&self) -> String {
        match self {
            ExecutionOutcome::Failed => String::new(),
            ExecutionOutcome::Score { value, confidence } => match confidence {
                Some(c) => format!("{} ± {}", fmt_num(*value), fmt_num(*c)),
                None => fmt_num(*value),
            },
        }
    }
}

/// Render a score the way the benchmark reported it: whole numbers
/// without a trailing fraction.
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Read the score (and confidence when declared) and capture a screenshot
/// artifact at `screenshot_path`, overwriting any previous capture with
/// the same name. A failing result probe yields `Failed` rather than an
/// error; a missing score must not take down the rest of the matrix.
pub async fn collect(
    session: &dyn BrowserSession,
    spec: &BenchmarkSpec,
    browser_label: &str,
    screenshot_path: &Path,
) -> ExecutionOutcome {
    let outcome = match spec.read_score(session).await {
        Ok(value) => {
            let confidence = match spec.read_confidence(session).await {
                Ok(c) => c,
                Err(e) => {
                    log::info!("Failed to read confidence for {}: {}", spec.name, e);
                    None
                }
            };
            ExecutionOutcome::Score { value, confidence }
        }
        Err(e) => {
            log::info!("Failed to read result for {}: {}", spec.name, e);
            ExecutionOutcome::Failed
        }
    };

    println!("    {}: {}", browser_label, outcome.as_field());

    match session.screenshot().await {
        Ok(bytes) => {
            if let Err(e) = std::fs::write(screenshot_path, bytes) {
                log::warn!("Failed to save screenshot {}: {}", screenshot_path.display(), e);
            }
        }
        Err(e) => log::warn!("Failed to capture screenshot: {}", e),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;
    use anyhow::anyhow;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn spec(confidence: Option<&str>) -> BenchmarkSpec {
        BenchmarkSpec {
            name: "Sample Bench".to_string(),
            url: "http://localhost/bench".to_string(),
            start: "start;".to_string(),
            done: "done;".to_string(),
            result: "result;".to_string(),
            confidence: confidence.map(|s| s.to_string()),
        }
    }

    fn shot_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("benchmate-shot-{}-{}.png", tag, std::process::id()))
    }

    #[test]
    fn test_field_rendering() {
        let whole = ExecutionOutcome::Score { value: 142.0, confidence: None };
        assert_eq!(whole.as_field(), "142");

        let fractional = ExecutionOutcome::Score { value: 88.4, confidence: None };
        assert_eq!(fractional.as_field(), "88.4");

        let with_confidence = ExecutionOutcome::Score { value: 142.0, confidence: Some(3.2) };
        assert_eq!(with_confidence.as_field(), "142 ± 3.2");

        assert_eq!(ExecutionOutcome::Failed.as_field(), "");
    }

    #[tokio::test]
    async fn test_collect_score_and_screenshot() {
        let session = MockSession::new(|expr| match expr {
            "result;" => Ok(json!(96)),
            "conf;" => Ok(json!(1.5)),
            _ => Ok(Value::Null),
        });
        let path = shot_path("ok");
        let outcome = collect(&session, &spec(Some("conf;")), "Chrome 126", &path).await;
        assert_eq!(outcome, ExecutionOutcome::Score { value: 96.0, confidence: Some(1.5) });
        assert!(path.is_file());
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_result_probe_failure_yields_failed_outcome() {
        let session = MockSession::new(|expr| match expr {
            "result;" => Err(anyhow!("no score element")),
            _ => Ok(Value::Null),
        });
        let path = shot_path("failed");
        let outcome = collect(&session, &spec(None), "Firefox", &path).await;
        assert_eq!(outcome, ExecutionOutcome::Failed);
        // The screenshot is still captured; it documents what the page
        // looked like when the score went missing.
        assert!(path.is_file());
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_confidence_probe_failure_keeps_score() {
        let session = MockSession::new(|expr| match expr {
            "result;" => Ok(json!(50.5)),
            "conf;" => Err(anyhow!("nope")),
            _ => Ok(Value::Null),
        });
        let path = shot_path("conf");
        let outcome = collect(&session, &spec(Some("conf;")), "Chrome", &path).await;
        assert_eq!(outcome, ExecutionOutcome::Score { value: 50.5, confidence: None });
        std::fs::remove_file(&path).ok();
    }
}
