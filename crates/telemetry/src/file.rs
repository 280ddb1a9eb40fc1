//! Daily trace file: `<logs_dir>/agent_trace_<YYYY-MM-DD>.log`.
//!
//! One line per event in the form `<timestamp> - <LEVEL> - <message>`.
//! The file is opened lazily in append mode. Every I/O failure is logged
//! through `tracing::warn!` and then dropped.

use chrono::Local;
use mediscreen_core::trace::{TraceEvent, Tracer};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::format::render_event;

pub struct FileTracer {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileTracer {
    /// Trace into today's file under `logs_dir`.
    pub fn daily(logs_dir: impl AsRef<Path>) -> Self {
        let name = format!("agent_trace_{}.log", Local::now().format("%Y-%m-%d"));
        Self::at(logs_dir.as_ref().join(name))
    }

    /// Trace into an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> std::io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn write_lines(&self, lines: &[String]) -> std::io::Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        if let Some(file) = guard.as_mut() {
            for line in lines {
                writeln!(file, "{line}")?;
            }
            file.flush()?;
        }
        Ok(())
    }
}

impl Tracer for FileTracer {
    fn record(&self, event: TraceEvent) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string();
        let lines: Vec<String> = render_event(&event)
            .into_iter()
            .map(|(level, message)| format!("{stamp} - {level} - {message}"))
            .collect();
        if let Err(e) = self.write_lines(&lines) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write trace event");
        }
    }
}
