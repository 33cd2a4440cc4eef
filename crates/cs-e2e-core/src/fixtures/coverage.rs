//! Front-end coverage dumps, written when `COVERAGE=true`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

pub const COVERAGE_DIR: &str = ".nyc_output";

#[derive(Debug, Clone)]
pub struct CoverageSink {
    dir: PathBuf,
    enabled: bool,
}

impl CoverageSink {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    /// `.nyc_output` under the working directory
    pub fn in_working_dir(enabled: bool) -> Self {
        Self::new(COVERAGE_DIR, enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the coverage object collected for `test_title`.
    ///
    /// Never fails: a disabled sink or a null payload writes nothing, and
    /// write errors are logged. Returns the file written, if any.
    pub fn write(&self, test_title: &str, coverage: &Value) -> Option<PathBuf> {
        if !self.enabled || coverage.is_null() {
            return None;
        }
        match self.try_write(test_title, coverage) {
            Ok(path) => {
                debug!(path = %path.display(), "Wrote coverage");
                Some(path)
            }
            Err(e) => {
                warn!(test = test_title, error = %e, "Coverage collection failed");
                None
            }
        }
    }

    fn try_write(&self, test_title: &str, coverage: &Value) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(format!(
            "coverage-{}-{}.json",
            sanitize_title(test_title),
            Utc::now().timestamp_millis()
        ));
        std::fs::write(&path, serde_json::to_string(coverage)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Replace everything outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Repos > create (snapshot)"), "Repos___create__snapshot_");
        assert_eq!(sanitize_title("plain-name_1"), "plain-name_1");
    }

    #[test]
    fn test_write_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CoverageSink::new(dir.path().join(".nyc_output"), true);

        let path = sink.write("Templates list", &json!({ "a.js": {} })).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("coverage-Templates_list-"));
        assert!(name.ends_with(".json"));
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({ "a.js": {} }));
    }

    #[test]
    fn test_disabled_or_empty_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        assert!(CoverageSink::new(&out, false).write("t", &json!({})).is_none());
        assert!(CoverageSink::new(&out, true).write("t", &Value::Null).is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let sink = CoverageSink::new(blocker.join("nested"), true);
        assert!(sink.write("t", &json!({})).is_none());
    }
}
