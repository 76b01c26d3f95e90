//! Idempotent line-level edits to text configuration files.
//!
//! Two primitives cover every rc-file mutation the engine performs:
//!
//! - [`LineInFile`] appends an exact line only when no existing line matches
//!   it byte-for-byte.
//! - [`KeyedValue`] rewrites a `key=value` line in place when the key is
//!   already present, and appends otherwise.
//!
//! Both are byte-idempotent: re-applying with identical inputs leaves the
//! file unchanged after the first application, and unrelated lines are never
//! reordered. Whole-file rewrites go through a temp-file-then-rename so a
//! partial write cannot corrupt the target.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{Applicable, Resource, ResourceChange, ResourceState, fs};

/// An exact line that must be present in a text file.
#[derive(Debug, Clone)]
pub struct LineInFile {
    /// File to edit (created if absent).
    pub path: PathBuf,
    /// The exact line (without trailing newline).
    pub line: String,
}

impl LineInFile {
    /// Create a new line resource.
    #[must_use]
    pub const fn new(path: PathBuf, line: String) -> Self {
        Self { path, line }
    }
}

impl Applicable for LineInFile {
    fn description(&self) -> String {
        format!("line '{}' in {}", self.line, self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let mut content = if self.path.exists() {
            std::fs::read_to_string(&self.path)
                .with_context(|| format!("reading {}", self.path.display()))?
        } else {
            String::new()
        };
        if content.lines().any(|l| l == self.line) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&self.line);
        content.push('\n');
        fs::write_atomic(&self.path, &content)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for LineInFile {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Missing);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        if content.lines().any(|l| l == self.line) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}

/// A `key=value` line maintained in place.
///
/// A line "matches the key" when it starts with `key=` (no leading
/// whitespace). The first matching line is rewritten; later matches are left
/// alone.
#[derive(Debug, Clone)]
pub struct KeyedValue {
    /// File to edit (created if absent).
    pub path: PathBuf,
    /// Key part (left of `=`).
    pub key: String,
    /// Value part (right of `=`), stored verbatim.
    pub value: String,
}

impl KeyedValue {
    /// Create a new keyed-value resource.
    #[must_use]
    pub const fn new(path: PathBuf, key: String, value: String) -> Self {
        Self { path, key, value }
    }

    /// Keyed value rendering a shell array, e.g. `plugins=(git docker)`.
    #[must_use]
    pub fn list(path: PathBuf, key: &str, items: &[&str]) -> Self {
        Self {
            path,
            key: key.to_string(),
            value: format!("({})", items.join(" ")),
        }
    }

    fn rendered(&self) -> String {
        format!("{}={}", self.key, self.value)
    }

    fn key_prefix(&self) -> String {
        format!("{}=", self.key)
    }
}

impl Applicable for KeyedValue {
    fn description(&self) -> String {
        format!("{} in {}", self.rendered(), self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let rendered = self.rendered();
        if !self.path.exists() {
            fs::write_atomic(&self.path, &format!("{rendered}\n"))?;
            return Ok(ResourceChange::Applied);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let prefix = self.key_prefix();

        let mut lines: Vec<&str> = content.lines().collect();
        let mut replaced = false;
        for slot in &mut lines {
            if slot.starts_with(&prefix) {
                if *slot == rendered {
                    return Ok(ResourceChange::AlreadyCorrect);
                }
                *slot = &rendered;
                replaced = true;
                break;
            }
        }
        if replaced {
            let mut new_content = lines.join("\n");
            new_content.push('\n');
            fs::write_atomic(&self.path, &new_content)?;
        } else {
            // No matching key: plain append, same as LineInFile.
            let mut new_content = content;
            if !new_content.is_empty() && !new_content.ends_with('\n') {
                new_content.push('\n');
            }
            new_content.push_str(&rendered);
            new_content.push('\n');
            fs::write_atomic(&self.path, &new_content)?;
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for KeyedValue {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Missing);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let prefix = self.key_prefix();
        let rendered = self.rendered();
        match content.lines().find(|l| l.starts_with(&prefix)) {
            Some(line) if line == rendered => Ok(ResourceState::Correct),
            Some(line) => Ok(ResourceState::Incorrect {
                current: line.to_string(),
            }),
            None => Ok(ResourceState::Missing),
        }
    }
}
