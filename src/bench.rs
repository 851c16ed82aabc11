//! Benchmark suite definitions.
//!
//! Each benchmark is a browserbench.org page driven through opaque
//! JavaScript probes: a start trigger, a completion predicate, a score
//! extractor and an optional confidence extractor. Probes are evaluated
//! in page context through the [`BrowserSession`] seam, so the rest of
//! the engine never interprets page semantics itself.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::driver::traits::BrowserSession;

/// A single benchmark definition. Fixed at configuration time and never
/// mutated during a run.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkSpec {
    pub name: String,
    pub url: String,
    /// Expression that kicks the benchmark off.
    pub start: String,
    /// Boolean expression that is true once the run has finished.
    pub done: String,
    /// Numeric expression extracting the final score.
    pub result: String,
    /// Optional numeric expression extracting the confidence interval.
    #[serde(default)]
    pub confidence: Option<String>,
}

impl BenchmarkSpec {
    /// Benchmark name with spaces stripped, used for file naming.
    pub fn file_stem(&self) -> String {
        self.name.replace(' ', "")
    }

    /// Issue the start trigger. Called exactly once per execution.
    pub async fn trigger_start(&self, session: &dyn BrowserSession) -> Result<()> {
        session.execute_script(&self.start).await.map(|_| ())
    }

    /// Evaluate the completion predicate.
    pub async fn is_done(&self, session: &dyn BrowserSession) -> Result<bool> {
        let value = session.execute_script(&self.done).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Extract the final score.
    pub async fn read_score(&self, session: &dyn BrowserSession) -> Result<f64> {
        let value = session.execute_script(&self.result).await?;
        numeric(&value).with_context(|| {
            format!("benchmark '{}' returned a non-numeric score: {}", self.name, value)
        })
    }

    /// Extract the confidence value, if this benchmark declares a probe
    /// for it.
    pub async fn read_confidence(&self, session: &dyn BrowserSession) -> Result<Option<f64>> {
        match &self.confidence {
            Some(expr) => {
                let value = session.execute_script(expr).await?;
                Ok(numeric(&value))
            }
            None => Ok(None),
        }
    }
}

fn numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The default browserbench.org suite.
pub fn builtin_suite() -> Vec<BenchmarkSpec> {
    vec![
        BenchmarkSpec {
            name: "Speedometer 2.0".to_string(),
            url: "https://browserbench.org/Speedometer2.0/".to_string(),
            start: "startTest();".to_string(),
            done: "return (document.getElementById('results-with-statistics') && document.getElementById('results-with-statistics').innerText.length > 0);".to_string(),
            result: "return parseInt(document.getElementById('result-number').innerText);".to_string(),
            confidence: Some(
                "return parseFloat(document.getElementById('confidence-number').innerText);".to_string(),
            ),
        },
        BenchmarkSpec {
            name: "MotionMark 1.2".to_string(),
            url: "https://browserbench.org/MotionMark1.2/".to_string(),
            start: "benchmarkController.startBenchmark();".to_string(),
            done: "return (document.querySelector('#results>.body>.score-container>.score').innerText.length > 0);".to_string(),
            result: "return parseFloat(document.querySelector('#results>.body>.score-container>.score').innerText);".to_string(),
            confidence: None,
        },
        BenchmarkSpec {
            name: "JetStream 2".to_string(),
            url: "https://browserbench.org/JetStream/".to_string(),
            start: "JetStream.start();".to_string(),
            done: "return (document.querySelectorAll('#result-summary>.score').length > 0);".to_string(),
            result: "return parseFloat(document.querySelector('#result-summary>.score').innerText);".to_string(),
            confidence: None,
        },
    ]
}

/// Load a custom suite from a YAML file containing a list of benchmark
/// definitions.
pub fn load_suite(path: &Path) -> Result<Vec<BenchmarkSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suite file {}", path.display()))?;
    let specs: Vec<BenchmarkSpec> = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse suite file {}", path.display()))?;
    if specs.is_empty() {
        anyhow::bail!("Suite file {} defines no benchmarks", path.display());
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;
    use anyhow::anyhow;
    use serde_json::{json, Value};

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

    #[test]
    fn test_file_stem_strips_spaces() {
        assert_eq!(spec(None).file_stem(), "SampleBench");
        assert_eq!(builtin_suite()[0].file_stem(), "Speedometer2.0");
    }

    #[test]
    fn test_builtin_suite_shape() {
        let suite = builtin_suite();
        assert_eq!(suite.len(), 3);
        assert!(suite.iter().all(|s| s.url.starts_with("https://browserbench.org/")));
    }

    #[tokio::test]
    async fn test_read_score_accepts_number_and_numeric_string() {
        let session = MockSession::new(|_| Ok(json!(142.5)));
        assert_eq!(spec(None).read_score(&session).await.unwrap(), 142.5);

        let session = MockSession::new(|_| Ok(json!("96")));
        assert_eq!(spec(None).read_score(&session).await.unwrap(), 96.0);
    }

    #[tokio::test]
    async fn test_read_score_rejects_non_numeric() {
        let session = MockSession::new(|_| Ok(Value::Null));
        assert!(spec(None).read_score(&session).await.is_err());
    }

    #[tokio::test]
    async fn test_is_done_treats_non_bool_as_pending() {
        let session = MockSession::new(|_| Ok(Value::Null));
        assert!(!spec(None).is_done(&session).await.unwrap());

        let session = MockSession::new(|_| Ok(json!(true)));
        assert!(spec(None).is_done(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_confidence_absent_without_probe() {
        let session = MockSession::new(|_| Err(anyhow!("should not be called")));
        assert_eq!(spec(None).read_confidence(&session).await.unwrap(), None);

        let session = MockSession::new(|_| Ok(json!(3.2)));
        assert_eq!(
            spec(Some("conf;")).read_confidence(&session).await.unwrap(),
            Some(3.2)
        );
    }

    #[test]
    fn test_load_suite_from_yaml() {
        let path = std::env::temp_dir().join(format!("benchmate-suite-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            r#"
- name: Custom Bench
  url: http://localhost:8080/
  start: "go();"
  done: "return window.finished;"
  result: "return window.score;"
"#,
        )
        .unwrap();

        let suite = load_suite(&path).unwrap();
        assert_eq!(suite.len(), 1);
        assert_eq!(suite[0].name, "Custom Bench");
        assert!(suite[0].confidence.is_none());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_suite_rejects_empty() {
        let path = std::env::temp_dir().join(format!("benchmate-empty-{}.yaml", std::process::id()));
        std::fs::write(&path, "[]").unwrap();
        assert!(load_suite(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
