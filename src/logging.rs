//! Logging: console output via `tracing`, unit summary collection, and a
//! persistent plain-text log file under the cache directory.
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

/// Unit execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct UnitEntry {
    /// Unit name.
    pub name: String,
    /// Final status of the unit.
    pub status: UnitStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// Unit completed successfully.
    Ok,
    /// Unit does not apply to the current platform or configuration.
    NotApplicable,
    /// Unit was explicitly skipped (e.g., no strategy, missing prerequisite).
    Skipped,
    /// Unit ran in dry-run mode; no changes were applied.
    DryRun,
    /// Unit encountered an error and could not complete.
    Failed,
}

/// Abstraction over logging backends, so units can log without knowing the
/// concrete sink (the production [`Logger`] or a test collector).
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a unit result for the summary.
    fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>);
}

/// Install the global tracing subscriber for console output.
///
/// Honors `RUST_LOG` when set; otherwise `info` (or `debug` with
/// `--verbose`). Safe to call more than once — later calls are no-ops.
pub fn init_subscriber(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are also appended to a persistent log file at
/// `$XDG_CACHE_HOME/provision/<command>.log` (default
/// `~/.cache/provision/<command>.log`), with a level tag and no ANSI codes.
pub struct Logger {
    units: Mutex<Vec<UnitEntry>>,
    file: Option<Mutex<File>>,
    file_path: Option<PathBuf>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Create a new logger writing to `<cache>/provision/<command>.log`.
    ///
    /// A missing or unwritable cache directory disables the file sink but
    /// never fails the run.
    #[must_use]
    pub fn new(command: &str) -> Self {
        let file_path = log_file_path(command);
        let file = file_path.as_ref().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
                .map(Mutex::new)
        });
        Self {
            units: Mutex::new(Vec::new()),
            file,
            file_path,
        }
    }

    fn write_file(&self, tag: &str, msg: &str) {
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{tag} {msg}");
            }
        }
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        self.write_file("==>", msg);
        tracing::info!(target: "provision::stage", "==> {msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        self.write_file("[info]", msg);
        tracing::info!("{msg}");
    }

    /// Log a debug message (always written to the log file).
    pub fn debug(&self, msg: &str) {
        self.write_file("[debug]", msg);
        tracing::debug!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        self.write_file("[warn]", msg);
        tracing::warn!("{msg}");
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        self.write_file("[error]", msg);
        tracing::error!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        self.write_file("[dry run]", msg);
        tracing::info!(target: "provision::dry_run", "{msg}");
    }

    /// Record a unit result for the summary.
    pub fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.units.lock() {
            guard.push(UnitEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the number of failed units.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.units.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|u| u.status == UnitStatus::Failed)
                .count()
        })
    }

    /// Return a clone of all recorded unit entries (test-only).
    #[cfg(test)]
    pub(crate) fn unit_entries(&self) -> Vec<UnitEntry> {
        self.units.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Return the log file path, if the file sink is active.
    #[must_use]
    pub fn log_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Print the summary of all recorded units.
    #[allow(clippy::print_stdout)]
    pub fn print_summary(&self) {
        let units = match self.units.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if units.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let mut ok = 0u32;
        let mut not_applicable = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;

        for unit in &units {
            let (icon, color) = match unit.status {
                UnitStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                UnitStatus::NotApplicable => {
                    not_applicable += 1;
                    ("·", "\x1b[2m")
                }
                UnitStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                UnitStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                UnitStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = unit
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            let line = truncate_to_width(
                &format!("{} {}{suffix}", icon, unit.name),
                terminal_columns(),
            );
            self.info(&format!("{color}{line}\x1b[0m"));
        }

        println!();
        let total = ok + not_applicable + skipped + dry_run + failed;
        self.info(&format!(
            "{total} units: \x1b[32m{ok} ok\x1b[0m, \x1b[2m{not_applicable} n/a\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.file_path {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        self.stage(msg);
    }
    fn info(&self, msg: &str) {
        self.info(msg);
    }
    fn debug(&self, msg: &str) {
        self.debug(msg);
    }
    fn warn(&self, msg: &str) {
        self.warn(msg);
    }
    fn error(&self, msg: &str) {
        self.error(msg);
    }
    fn dry_run(&self, msg: &str) {
        self.dry_run(msg);
    }
    fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>) {
        self.record_unit(name, status, message);
    }
}

/// Resolve `<cache>/provision/<command>.log`, creating the directory.
fn log_file_path(command: &str) -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let dir = cache.join("provision");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// One-row truncation so the summary never wraps.
fn terminal_columns() -> usize {
    terminal_size::terminal_size().map_or(100, |(w, _)| usize::from(w.0))
}

fn truncate_to_width(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let truncated: String = s.chars().take(width.saturating_sub(1)).collect();
    format!("{truncated}…")
}
