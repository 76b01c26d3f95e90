// Shared helpers for integration tests.
//
// Provides a scriptable executor, a collecting logger, and a context
// builder backed by a temporary home directory so each integration test can
// exercise the engine without touching the real system.
#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use provision_cli::config::{ResolvedConfig, defaults};
use provision_cli::exec::{ExecResult, Executor};
use provision_cli::logging::{Log, UnitEntry, UnitStatus};
use provision_cli::platform::{Elevation, OsFamily, PackageManager, Platform};
use provision_cli::units::Context;

/// A scriptable executor: queued `(success, stdout)` responses, a program
/// allowlist for `which()`, and a record of every call.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<(bool, String)>>,
    which_programs: Vec<String>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<(bool, String)>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.which_programs.push(program.to_string());
        self
    }

    pub fn recorded_calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn next(&self, program: &str, args: &[&str]) -> (bool, String) {
        self.calls.lock().expect("calls lock").push((
            program.to_string(),
            args.iter().map(|s| (*s).to_string()).collect(),
        ));
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or((true, String::new()))
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let (success, stdout) = self.next(program, args);
        if success {
            Ok(ExecResult {
                stdout,
                stderr: String::new(),
                success: true,
                code: Some(0),
            })
        } else {
            anyhow::bail!("scripted command failed: {program}")
        }
    }

    fn run_in(&self, _: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run(program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let (success, stdout) = self.next(program, args);
        Ok(ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        })
    }

    fn which(&self, program: &str) -> bool {
        self.which_programs.iter().any(|p| p == program)
    }
}

/// A logger that collects messages and unit entries for assertions.
#[derive(Debug, Default)]
pub struct CollectingLog {
    pub lines: Mutex<Vec<String>>,
    pub units: Mutex<Vec<UnitEntry>>,
}

impl CollectingLog {
    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .lock()
            .expect("lines lock")
            .iter()
            .filter(|l| l.starts_with("warn:"))
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<UnitEntry> {
        self.units.lock().expect("units lock").clone()
    }

    fn push(&self, tag: &str, msg: &str) {
        self.lines
            .lock()
            .expect("lines lock")
            .push(format!("{tag}: {msg}"));
    }
}

impl Log for CollectingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>) {
        self.units.lock().expect("units lock").push(UnitEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// An isolated engine context backed by a temp-dir home.
pub struct IntegrationContext {
    pub home: tempfile::TempDir,
    pub log: Arc<CollectingLog>,
    pub ctx: Context,
}

/// Build a context for the given platform, executor, and configuration.
pub fn make_context(
    config: ResolvedConfig,
    platform: Platform,
    executor: Arc<dyn Executor>,
) -> IntegrationContext {
    let home = tempfile::tempdir().expect("create temp home");
    let log = Arc::new(CollectingLog::default());
    let ctx = Context {
        config,
        platform,
        log: Arc::clone(&log) as Arc<dyn Log>,
        dry_run: false,
        home: home.path().to_path_buf(),
        user: "tester".to_string(),
        executor,
        elevation: Elevation::Sudo,
    };
    IntegrationContext { home, log, ctx }
}

/// Default config, Ubuntu/apt platform, scripted executor.
pub fn apt_context(executor: Arc<dyn Executor>) -> IntegrationContext {
    make_context(
        defaults::resolved(),
        Platform::new(OsFamily::Ubuntu, PackageManager::Apt),
        executor,
    )
}

/// Default config on a platform with no package manager at all.
pub fn bare_context(executor: Arc<dyn Executor>) -> IntegrationContext {
    make_context(
        defaults::resolved(),
        Platform::new(OsFamily::Unknown, PackageManager::None),
        executor,
    )
}

/// Home path of a context as a `PathBuf`.
pub fn home_path(ictx: &IntegrationContext) -> PathBuf {
    ictx.home.path().to_path_buf()
}
