//! Idempotent resource primitives (check + apply pattern).
pub mod fs;
pub mod git_clone;
pub mod installer;
pub mod line;
pub mod managed_file;
pub mod package;
pub mod shell;
pub mod symlink;

use anyhow::Result;

/// Minimal interface for resources that can be described and applied.
///
/// Resources whose state is determined via a single external bulk query
/// (e.g. installed-package sets) may be driven from pre-fetched state; those
/// that can determine their own state independently implement the richer
/// [`Resource`] super-trait.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Apply the resource change.
    ///
    /// Creates parent directories if needed, updates the resource to match
    /// the desired state, and returns the appropriate [`ResourceChange`].
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be applied due to I/O
    /// failures, permission issues, or command failures.
    fn apply(&self) -> Result<ResourceChange>;

    /// Remove the resource, undoing a previous `apply()`.
    ///
    /// Default implementation returns an error — override in resources that
    /// support removal.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails or is not supported.
    fn remove(&self) -> Result<ResourceChange> {
        anyhow::bail!(
            "operation 'remove' is not supported for resource '{}'",
            self.description()
        )
    }
}

/// State of a resource (file line, package, symlink, …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist or is not present.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// The current value of the resource.
        current: String,
    },
    /// Resource cannot be applied (e.g., a foreign file occupies the target).
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was skipped, with a reason.
    Skipped {
        /// Reason why the resource was skipped.
        reason: String,
    },
}

/// Unified interface for resources that can be checked and applied.
///
/// # Examples
///
/// ```ignore
/// // All resources follow the same check-then-apply pattern:
/// let state = resource.current_state()?;
/// if resource.needs_change()? {
///     resource.apply()?;
/// }
/// ```
pub trait Resource: Applicable {
    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource state cannot be determined.
    fn current_state(&self) -> Result<ResourceState>;

    /// Determine if the resource needs to be changed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Resource::current_state`].
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}

impl Applicable for Box<dyn Resource + Send> {
    fn description(&self) -> String {
        (**self).description()
    }

    fn apply(&self) -> Result<ResourceChange> {
        (**self).apply()
    }

    fn remove(&self) -> Result<ResourceChange> {
        (**self).remove()
    }
}

impl Resource for Box<dyn Resource + Send> {
    fn current_state(&self) -> Result<ResourceState> {
        (**self).current_state()
    }
}

/// Shared test helpers for resource and unit tests.
#[cfg(test)]
pub mod test_helpers {
    use crate::exec::{ExecResult, Executor};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// A configurable mock executor.
    ///
    /// Maintains a queue of `(success, stdout)` responses consumed in FIFO
    /// order by the `run*` methods. When the queue is empty any call returns
    /// a failed response. `which()` consults the configured program list
    /// (or the blanket `which_all` flag) and does not consume responses.
    #[derive(Debug, Default)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        which_all: bool,
        which_programs: Vec<String>,
        call_count: AtomicUsize,
    }

    impl MockExecutor {
        /// Create a mock with a single successful response.
        #[must_use]
        pub fn ok(stdout: &str) -> Self {
            Self::with_responses(vec![(true, stdout.to_string())])
        }

        /// Create a mock with a single failed response (empty stdout).
        #[must_use]
        pub fn fail() -> Self {
            Self::with_responses(vec![(false, String::new())])
        }

        /// Create a mock from an ordered list of `(success, stdout)` pairs.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        /// Make `which()` return `true` for every program.
        #[must_use]
        pub fn with_which(mut self, result: bool) -> Self {
            self.which_all = result;
            self
        }

        /// Make `which()` return `true` for `program`.
        #[must_use]
        pub fn with_program(mut self, program: &str) -> Self {
            self.which_programs.push(program.to_string());
            self
        }

        /// Total number of `run*` calls made so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn next(&self) -> (bool, String) {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().map_or_else(
                |_| (false, "mutex poisoned".to_string()),
                |mut guard| {
                    guard
                        .pop_front()
                        .unwrap_or_else(|| (false, "unexpected call".to_string()))
                },
            )
        }

        fn next_result(&self) -> anyhow::Result<ExecResult> {
            let (success, stdout) = self.next();
            if success {
                Ok(ExecResult {
                    stdout,
                    stderr: String::new(),
                    success: true,
                    code: Some(0),
                })
            } else {
                anyhow::bail!("mock command failed")
            }
        }
    }

    impl Executor for MockExecutor {
        fn run(&self, _: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
            self.next_result()
        }

        fn run_in(&self, _: &Path, _: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
            self.next_result()
        }

        fn run_unchecked(&self, _: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
            let (success, stdout) = self.next();
            Ok(ExecResult {
                stdout,
                stderr: String::new(),
                success,
                code: Some(i32::from(!success)),
            })
        }

        fn which(&self, program: &str) -> bool {
            self.which_all || self.which_programs.iter().any(|p| p == program)
        }
    }

    /// A test executor that records every invocation as `(program, args)`
    /// pairs so tests can assert exact command lines. All calls succeed.
    #[derive(Debug, Default)]
    pub struct RecordingExecutor {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        which_all: bool,
    }

    impl RecordingExecutor {
        /// Create a recorder whose `which()` always returns `false`.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a recorder whose `which()` always returns `true`.
        #[must_use]
        pub fn with_which(which_all: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                which_all,
            }
        }

        /// Return all recorded `(program, args)` invocations.
        #[must_use]
        #[allow(clippy::unwrap_used)]
        pub fn recorded_calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }

        #[allow(clippy::unwrap_used)]
        fn record(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.calls.lock().unwrap().push((
                program.to_string(),
                args.iter().map(|s| (*s).to_string()).collect(),
            ));
            Ok(ExecResult {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                code: Some(0),
            })
        }
    }

    impl Executor for RecordingExecutor {
        fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.record(program, args)
        }

        fn run_in(&self, _: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.record(program, args)
        }

        fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.record(program, args)
        }

        fn which(&self, _: &str) -> bool {
            self.which_all
        }
    }
}
