//! The convergence executor: walk the catalog, tolerate per-unit failure.
use std::collections::HashSet;

use super::{Context, Gate, Unit, UnitResult};
use crate::logging::UnitStatus;

/// Outcome of a whole run, by unit name.
#[derive(Debug, Default, Clone)]
pub struct Report {
    /// Units that completed (including dry-run previews).
    pub succeeded: Vec<String>,
    /// Units skipped with a reason: no strategy, failed prerequisite, or an
    /// explicit runtime skip.
    pub warned: Vec<String>,
    /// Units that errored. Never aborts the run.
    pub failed: Vec<String>,
}

impl Report {
    /// Whether every attempted unit succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Execute units in declaration order.
///
/// Per spec of the decision table:
/// - disabled units are recorded quietly as not applicable;
/// - unsupported units are skipped with a logged reason;
/// - a failing unit is logged as a warning-level event and the run
///   continues with later independent units;
/// - units whose declared prerequisites failed (directly or transitively)
///   are hard-skipped with a clear warning instead of producing a confusing
///   downstream error.
pub fn run_units(units: &[Box<dyn Unit>], ctx: &Context) -> Report {
    let mut report = Report::default();
    let mut unavailable: HashSet<&'static str> = HashSet::new();

    for unit in units {
        let name = unit.name();

        if let Some(dep) = unit
            .dependencies()
            .iter()
            .find(|dep| unavailable.contains(**dep))
        {
            let reason = format!("prerequisite '{dep}' failed");
            ctx.log.warn(&format!("skipping {name}: {reason}"));
            ctx.log.record_unit(name, UnitStatus::Skipped, Some(&reason));
            report.warned.push(name.to_string());
            // Transitive dependents must be skipped too.
            unavailable.insert(name);
            continue;
        }

        match unit.gate(ctx) {
            Gate::Disabled(reason) => {
                ctx.log.debug(&format!("skipping {name}: {reason}"));
                ctx.log
                    .record_unit(name, UnitStatus::NotApplicable, Some(&reason));
            }
            Gate::Unsupported(reason) => {
                ctx.log.warn(&format!("skipping {name}: {reason}"));
                ctx.log.record_unit(name, UnitStatus::Skipped, Some(&reason));
                report.warned.push(name.to_string());
                unavailable.insert(name);
            }
            Gate::Run => {
                ctx.log.stage(name);
                match unit.run(ctx) {
                    Ok(UnitResult::Ok) => {
                        ctx.log.record_unit(name, UnitStatus::Ok, None);
                        report.succeeded.push(name.to_string());
                    }
                    Ok(UnitResult::DryRun) => {
                        ctx.log.record_unit(name, UnitStatus::DryRun, None);
                        report.succeeded.push(name.to_string());
                    }
                    Ok(UnitResult::Skipped(reason)) => {
                        ctx.log.info(&format!("skipped: {reason}"));
                        ctx.log.record_unit(name, UnitStatus::Skipped, Some(&reason));
                        report.warned.push(name.to_string());
                        unavailable.insert(name);
                    }
                    Err(e) => {
                        ctx.log.warn(&format!("{name} failed: {e:#}"));
                        ctx.log
                            .record_unit(name, UnitStatus::Failed, Some(&format!("{e:#}")));
                        report.failed.push(name.to_string());
                        unavailable.insert(name);
                    }
                }
            }
        }
    }

    report
}
