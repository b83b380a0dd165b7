//! Simulate command.
//!
//! Replays the edit batches stored in a session file, one batch at a time.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use gkepool_reconcile::BatchOutcome;
use serde::Serialize;
use tracing::info;

use crate::output::{print_info, print_single, print_success, print_warning, OutputFormat};
use crate::session::open_session;

use super::inspect::print_state;
use super::CommandContext;

#[derive(Debug, Args)]
pub struct SimulateCommand {
    /// Session file path (TOML or JSON).
    #[arg(value_name = "PATH")]
    session: PathBuf,

    /// Tear the session down after this many batches. Later batches are ignored.
    #[arg(long, value_name = "N")]
    teardown_after: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchReport {
    index: usize,
    label: Option<String>,
    outcome: BatchOutcome,
}

impl SimulateCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let (mut reconciler, file) = open_session(&self.session)?;
        let mut reports = Vec::with_capacity(file.batches.len());

        for (index, batch) in file.batches.into_iter().enumerate() {
            if self.teardown_after == Some(index) {
                reconciler.teardown();
            }

            let outcome = reconciler.apply(batch.edits);
            info!(
                index,
                changed = outcome.changed.len(),
                rejected = outcome.rejected.len(),
                "Applied batch"
            );
            reports.push(BatchReport {
                index,
                label: batch.label,
                outcome,
            });
        }

        match ctx.format {
            OutputFormat::Json => print_single(&serde_json::json!({
                "batches": reports,
                "nodePool": reconciler.node_pool(),
                "scopeSelection": reconciler.scope_selection(),
                "derived": reconciler.derived(),
            })),
            OutputFormat::Table => {
                for report in &reports {
                    print_report(report);
                }
                if !reports.is_empty() {
                    println!();
                }
                print_state(&reconciler, OutputFormat::Table);
            }
        }

        Ok(())
    }
}

fn print_report(report: &BatchReport) {
    let name = match &report.label {
        Some(label) => format!("batch {} ({label})", report.index + 1),
        None => format!("batch {}", report.index + 1),
    };
    let outcome = &report.outcome;

    let fields: Vec<&str> = outcome.changed.iter().map(|f| f.as_str()).collect();
    if fields.is_empty() {
        print_info(&format!("{name}: no changes"));
    } else {
        print_success(&format!("{name}: changed {}", fields.join(", ")));
    }
    if outcome.deferred_ran > 0 {
        print_info(&format!("{name}: ran {} deferred task(s)", outcome.deferred_ran));
    }
    if outcome.deferred_dropped > 0 {
        print_info(&format!(
            "{name}: dropped {} deferred task(s) after teardown",
            outcome.deferred_dropped
        ));
    }
    for rejection in &outcome.rejected {
        print_warning(&format!("{name}: {rejection}"));
    }
    if let Some(version) = &outcome.unoffered_version {
        print_warning(&format!("{name}: version {version} is no longer offered"));
    }
}
