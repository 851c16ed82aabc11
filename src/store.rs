//! Append-only per-benchmark CSV result files.
//!
//! One file per benchmark, created with a header row at startup and only
//! ever appended to afterwards. Rows already written stay valid if the
//! process dies mid-matrix, so a partial run is still usable for
//! analysis. Errors here are the only fatal errors of the whole run:
//! without the store, result integrity is gone.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::bench::BenchmarkSpec;
use crate::driver::BrowserTarget;

pub struct ResultStore {
    root: PathBuf,
    prefix: String,
    columns: Vec<String>,
}

impl ResultStore {
    /// Create the run root and write one header row per benchmark.
    ///
    /// Column order is the browser configuration order and never changes
    /// afterwards, regardless of the randomized execution order.
    pub fn initialize(
        root: &Path,
        prefix: &str,
        benchmarks: &[BenchmarkSpec],
        browsers: &[BrowserTarget],
    ) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create run directory {}", root.display()))?;
        let store = Self {
            root: root.to_path_buf(),
            prefix: prefix.to_string(),
            columns: browsers.iter().map(|b| b.label()).collect(),
        };
        for spec in benchmarks {
            let path = store.csv_path(spec);
            let mut writer = WriterBuilder::new()
                .from_path(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut header = vec!["Run".to_string()];
            header.extend(store.columns.iter().cloned());
            writer.write_record(&header)?;
            writer.flush()?;
        }
        Ok(store)
    }

    pub fn browser_count(&self) -> usize {
        self.columns.len()
    }

    /// Path of the benchmark's result file.
    pub fn csv_path(&self, spec: &BenchmarkSpec) -> PathBuf {
        self.root.join(format!("{}{}.csv", self.prefix, spec.file_stem()))
    }

    /// Path of the screenshot artifact for one (benchmark, browser)
    /// pair. Deterministic, so each trial overwrites the last capture.
    pub fn artifact_path(&self, spec: &BenchmarkSpec, browser_label: &str) -> PathBuf {
        self.root
            .join(format!("{}{}-{}.png", self.prefix, spec.file_stem(), browser_label))
    }

    /// Append one trial row: the trial timestamp plus one field per
    /// configured browser. `fields` must already be in configuration
    /// order, empty where that browser produced no outcome.
    pub fn append_row(&self, spec: &BenchmarkSpec, timestamp: &str, fields: &[String]) -> Result<()> {
        debug_assert_eq!(fields.len(), self.columns.len());
        let path = self.csv_path(spec);
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut writer = WriterBuilder::new().from_writer(file);
        let mut record = vec![timestamp.to_string()];
        record.extend_from_slice(fields);
        writer.write_record(&record)?;
        writer.flush()?;
        Ok(())
    }
}
