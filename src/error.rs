//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`], [`UnitError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Config(ConfigError)     — config file parsing and value validation
//! ├── Unit(UnitError)         — unit execution and prerequisite issues
//! ├── Resource(ResourceError) — file edits, packages, symlinks, permissions
//! └── Platform(PlatformError) — platform probing failures
//! ```

// Error variants are part of the public API; not every variant is constructed
// by the current code paths.
#![allow(dead_code)]

use thiserror::Error;

/// Top-level error type for the provisioning engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related error (parsing, validation, I/O).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unit execution error (failure, missing prerequisite, timeout).
    #[error("unit error: {0}")]
    Unit(#[from] UnitError),

    /// Resource operation error (file edit, package install, symlink).
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Platform probing error.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors that arise from configuration loading and resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but is not parseable JSON.
    #[error("invalid JSON in {path}: {message}")]
    Parse {
        /// Path of the unparseable file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A value failed validation after parsing.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue {
        /// Dotted key path of the offending setting.
        key: String,
        /// Human-readable reason.
        message: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise during unit execution.
#[derive(Error, Debug)]
pub enum UnitError {
    /// A unit failed to execute.
    #[error("unit '{unit}' failed: {reason}")]
    ExecutionFailed {
        /// Name of the unit that failed.
        unit: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A unit was skipped because a prerequisite unit failed.
    #[error("unit '{unit}' skipped: prerequisite '{prerequisite}' failed")]
    MissingPrerequisite {
        /// Name of the skipped unit.
        unit: String,
        /// Name of the failed prerequisite.
        prerequisite: String,
    },

    /// A unit's child process exceeded the per-run deadline.
    #[error("unit '{unit}' timed out after {seconds}s")]
    Timeout {
        /// Name of the unit that timed out.
        unit: String,
        /// Deadline that was exceeded.
        seconds: u64,
    },
}

/// Errors that arise from resource operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A symlink operation failed.
    #[error("symlink error: {0}")]
    Symlink(String),

    /// A package installation failed.
    #[error("package installation failed: {package}")]
    PackageInstall {
        /// Name of the package that could not be installed.
        package: String,
        /// Underlying error from the package manager.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A file permission change failed.
    #[error("file permission error: {path}")]
    Permission {
        /// Path of the file whose permissions could not be changed.
        path: String,
    },

    /// A required file was not found.
    #[error("file not found: {0}")]
    NotFound(String),
}

/// Errors that arise from platform probing.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No supported package manager was found on PATH.
    #[error("no supported package manager detected")]
    NoPackageManager,

    /// Platform detection failed (e.g., unreadable os-release).
    #[error("platform detection failed: {0}")]
    DetectionFailed(String),
}
