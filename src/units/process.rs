//! Generic resource processing: check state, apply as configured, count.
//!
//! Strictly sequential — one resource is fully applied before the next is
//! checked. Package managers hold global locks, so no concurrent
//! invocations are permitted anywhere in the engine.
use anyhow::Result;

use super::Context;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Result of a single unit execution.
#[derive(Debug, Clone)]
pub enum UnitResult {
    /// Unit completed successfully.
    Ok,
    /// Unit was skipped, with a reason.
    Skipped(String),
    /// Unit ran in dry-run mode.
    DryRun,
}

/// Counters for units that process many resources.
///
/// # Examples
///
/// ```
/// use provision_cli::units::UnitStats;
///
/// let stats = UnitStats { changed: 3, already_ok: 10, skipped: 0 };
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
/// ```
#[derive(Debug, Default)]
pub struct UnitStats {
    /// Resources changed or applied.
    pub changed: u32,
    /// Resources already in the correct state.
    pub already_ok: u32,
    /// Resources skipped due to errors or inapplicability.
    pub skipped: u32,
}

impl UnitStats {
    /// Create a new empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate [`UnitResult`].
    #[must_use]
    pub fn finish(self, ctx: &Context) -> UnitResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            UnitResult::DryRun
        } else {
            UnitResult::Ok
        }
    }
}

impl std::ops::AddAssign for UnitStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// Configuration for the resource processing loop.
///
/// # Examples
///
/// ```
/// use provision_cli::units::ProcessOpts;
///
/// // Fix everything, bail on errors (strict):
/// let opts = ProcessOpts::apply_all("link");
/// assert!(opts.fix_incorrect && opts.fix_missing && opts.bail_on_error);
///
/// // Install only missing resources, warn on errors (lenient):
/// let opts = ProcessOpts::install_missing("install");
/// assert!(!opts.fix_incorrect && opts.fix_missing && !opts.bail_on_error);
/// ```
#[derive(Debug)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "install", "link", "write").
    pub verb: &'a str,
    /// Treat `Incorrect` as fixable. If `false`, skip it.
    pub fix_incorrect: bool,
    /// Treat `Missing` as fixable. If `false`, skip it.
    pub fix_missing: bool,
    /// Propagate errors from `apply()`. If `false`, warn and count skipped.
    pub bail_on_error: bool,
}

impl<'a> ProcessOpts<'a> {
    /// Fix both missing and incorrect resources, bailing on errors.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: true,
            fix_missing: true,
            bail_on_error: true,
        }
    }

    /// Install only missing resources, warning on errors instead of bailing.
    ///
    /// Suitable for resources that must not be overwritten when already
    /// present (claim-once symlinks, vendor installers).
    #[must_use]
    pub const fn install_missing(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: false,
            fix_missing: true,
            bail_on_error: false,
        }
    }

    /// Warn on errors instead of bailing.
    #[must_use]
    pub const fn no_bail(mut self) -> Self {
        self.bail_on_error = false;
        self
    }
}

/// Check and apply each resource in order, returning accumulated stats.
///
/// Lower-level variant for units that process several resource groups and
/// want a single combined summary.
///
/// # Errors
///
/// Propagates state-check errors, and apply errors when `bail_on_error`.
pub fn run_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts<'_>,
) -> Result<UnitStats> {
    let mut stats = UnitStats::new();
    for resource in resources {
        let current = resource.current_state()?;
        stats += process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats)
}

/// Check and apply each resource, logging one summary line.
///
/// # Errors
///
/// Same failure modes as [`run_resources`].
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts<'_>,
) -> Result<UnitResult> {
    Ok(run_resources(ctx, resources, opts)?.finish(ctx))
}

/// Apply resources with pre-computed states (bulk-query pattern), logging
/// one summary line.
///
/// # Errors
///
/// Propagates apply errors when `bail_on_error`.
pub fn process_resource_states<R: Resource>(
    ctx: &Context,
    resource_states: impl IntoIterator<Item = (R, ResourceState)>,
    opts: &ProcessOpts<'_>,
) -> Result<UnitResult> {
    let mut stats = UnitStats::new();
    for (resource, current) in resource_states {
        stats += process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats.finish(ctx))
}

/// Process a single resource given its current state, returning a delta.
pub(crate) fn process_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    resource_state: ResourceState,
    opts: &ProcessOpts<'_>,
) -> Result<UnitStats> {
    let desc = resource.description();
    let mut delta = UnitStats::new();
    match resource_state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.debug(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        ResourceState::Missing if !opts.fix_missing => {
            delta.skipped += 1;
        }
        ResourceState::Incorrect { .. } if !opts.fix_incorrect => {
            ctx.log.debug(&format!("skipping {desc} (unexpected state)"));
            delta.skipped += 1;
        }
        resource_state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.dry_run {
                let msg = if let ResourceState::Incorrect { ref current } = resource_state {
                    format!("would {} {desc} (currently {current})", opts.verb)
                } else {
                    format!("would {}: {desc}", opts.verb)
                };
                ctx.log.dry_run(&msg);
                delta.changed += 1;
                return Ok(delta);
            }
            delta += apply_resource(ctx, resource, opts)?;
        }
    }
    Ok(delta)
}

/// Apply a single resource change, returning a delta.
fn apply_resource<R: Resource>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts<'_>,
) -> Result<UnitStats> {
    let desc = resource.description();
    let mut delta = UnitStats::new();
    let change = match resource.apply() {
        Ok(change) => change,
        Err(e) => {
            if opts.bail_on_error {
                return Err(e);
            }
            ctx.log.warn(&format!("failed to {} {desc}: {e:#}", opts.verb));
            delta.skipped += 1;
            return Ok(delta);
        }
    };

    match change {
        ResourceChange::Applied => {
            ctx.log.debug(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
        }
        ResourceChange::AlreadyCorrect => {
            delta.already_ok += 1;
        }
        ResourceChange::Skipped { reason } => {
            if opts.bail_on_error {
                anyhow::bail!("failed to {} {desc}: {reason}", opts.verb);
            }
            ctx.log.warn(&format!("failed to {} {desc}: {reason}", opts.verb));
            delta.skipped += 1;
        }
    }
    Ok(delta)
}
