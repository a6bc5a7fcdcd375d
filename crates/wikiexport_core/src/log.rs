use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Information,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Information => "INFO ",
            Self::Warning => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Append-only journal shared by every parser of a run.
///
/// Entries keep run order, are mirrored to `tracing` and optionally to a log file.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    warning_count: usize,
    error_count: usize,
    file: Option<LogFile>,
}

#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self {
            file: Some(LogFile {
                path: path.to_path_buf(),
                writer: BufWriter::new(file),
            }),
            entries: Vec::new(),
            warning_count: 0,
            error_count: 0,
        })
    }

    pub fn information(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(LogLevel::Information, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warning_count += 1;
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.error_count += 1;
        self.push(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|file| file.path.as_path())
    }

    /// True when any entry at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(needle))
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.writer
                .flush()
                .with_context(|| format!("failed to write {}", file.path.display()))?;
        }
        Ok(())
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if let Some(file) = self.file.as_mut() {
            let stamp = Utc::now().format("%Y-%m-%d %H:%M:%SZ");
            // The entry stays in memory when the file write fails.
            if writeln!(file.writer, "[{stamp}] {} {message}", level.as_str()).is_err() {
                tracing::warn!("failed to append to {}", file.path.display());
            }
        }
        self.entries.push(LogEntry { level, message });
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{LogLevel, RunLog};

    #[test]
    fn counts_warnings_and_errors_in_run_order() {
        let mut log = RunLog::new();
        log.information("début");
        log.warning("portée non reconnue");
        log.error("école inconnue");
        log.warning("cible introuvable");

        assert_eq!(log.warning_count(), 2);
        assert_eq!(log.error_count(), 1);
        let levels: Vec<LogLevel> = log.entries().iter().map(|entry| entry.level).collect();
        assert_eq!(
            levels,
            vec![
                LogLevel::Information,
                LogLevel::Warning,
                LogLevel::Error,
                LogLevel::Warning
            ]
        );
        assert!(log.contains(LogLevel::Error, "école"));
        assert!(!log.contains(LogLevel::Information, "école"));
    }

    #[test]
    fn mirrors_entries_to_log_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("logs").join("run.log");
        {
            let mut log = RunLog::with_file(&path).expect("log file");
            log.information("Exécution commande spells");
            log.error("Sort inconnu");
            log.flush().expect("flush");
        }

        let content = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] INFO  Exécution commande spells"));
        assert!(lines[1].ends_with("] ERROR Sort inconnu"));
    }
}
