use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::Result;

/// Per-run log owned by the orchestrating function.
///
/// Lines are buffered and written to disk exactly once: by [`RunLog::finish`]
/// on the normal path, or by `Drop` (marked as aborted) on any early exit.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    start: DateTime<Local>,
    buffer: String,
    written: bool,
}

impl RunLog {
    pub fn new(script: &str, params: &[(&str, String)], log_dir: &Path, log_name: Option<&str>) -> Self {
        let start = Local::now();
        let file_name = match log_name {
            Some(name) => name.to_string(),
            None => format!("{}_{}.log", script, start.format("%Y%m%d_%H%M%S")),
        };

        let mut buffer = String::new();
        buffer.push_str("===== AO3 SCRAPER LOG =====\n");
        let _ = writeln!(buffer, "Script: {script}");
        let _ = writeln!(buffer, "Start: {}", start.format("%Y-%m-%dT%H:%M:%S"));
        buffer.push_str("Parameters:\n");
        for (key, value) in params {
            let _ = writeln!(buffer, "  {key}: {value}");
        }
        buffer.push_str("===========================\n\n");

        Self {
            path: log_dir.join(file_name),
            start,
            buffer,
            written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        debug!(target: "runlog", "{line}");
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    /// Appends the summary and runtime, writes the file, and returns its path.
    pub fn finish(mut self, summary: &[String]) -> Result<PathBuf> {
        self.buffer.push_str("\n=== Summary ===\n");
        for line in summary {
            self.buffer.push_str(line);
            self.buffer.push('\n');
        }
        self.write_out("END")?;
        Ok(self.path.clone())
    }

    fn write_out(&mut self, trailer: &str) -> Result<()> {
        // Set first so a failed write is not retried from `Drop`.
        self.written = true;
        let runtime = (Local::now() - self.start)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;
        let _ = writeln!(self.buffer, "Runtime: {runtime:.1} seconds");
        let _ = writeln!(self.buffer, "===== {trailer} =====");

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, &self.buffer)?;
        Ok(())
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if self.written {
            return;
        }
        if let Err(err) = self.write_out("ABORTED") {
            warn!("Couldn't write run log {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_writes_params_lines_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::new(
            "ao3_ids",
            &[("delay", "10".to_string()), ("num_to_retrieve", "5".to_string())],
            dir.path(),
            Some("run.log"),
        );
        log.line("Page 1 processed, 5 ids collected.");
        let path = log.finish(&["Ids collected: 5".to_string()]).unwrap();

        assert_eq!(path, dir.path().join("run.log"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("===== AO3 SCRAPER LOG =====\nScript: ao3_ids\n"));
        assert!(text.contains("  delay: 10\n"));
        assert!(text.contains("Page 1 processed, 5 ids collected.\n"));
        assert!(text.contains("=== Summary ===\nIds collected: 5\n"));
        assert!(text.contains("Runtime: "));
        assert!(text.trim_end().ends_with("===== END ====="));
    }

    #[test]
    fn default_name_uses_script_and_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new("ao3_works", &[], dir.path(), None);
        let name = log.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ao3_works_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "ao3_works_".len() + "YYYYmmdd_HHMMSS".len() + ".log".len());
    }

    #[test]
    fn dropped_log_is_flushed_as_aborted() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut log = RunLog::new("ao3_works", &[], &dir.path().join("nested"), Some("early.log"));
            log.line("work 1 processed");
            log.path().to_path_buf()
        };
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("work 1 processed\n"));
        assert!(text.trim_end().ends_with("===== ABORTED ====="));
    }
}
