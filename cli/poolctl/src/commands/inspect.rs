//! Inspect command.
//!
//! Operates purely on local session files (offline).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use gkepool_reconcile::Reconciler;
use serde_json::json;

use crate::output::{display_option, print_fields, print_single, print_warning, OutputFormat};
use crate::session::open_session;

use super::CommandContext;

#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Session file path (TOML or JSON).
    #[arg(value_name = "PATH")]
    session: PathBuf,
}

impl InspectCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let (reconciler, _) = open_session(&self.session)?;
        print_state(&reconciler, ctx.format);
        Ok(())
    }
}

/// Print the pool and its derived values.
pub(super) fn print_state(reconciler: &Reconciler, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_single(&json!({
            "nodePool": reconciler.node_pool(),
            "scopeSelection": reconciler.scope_selection(),
            "derived": reconciler.derived(),
        })),
        OutputFormat::Table => {
            let pool = reconciler.node_pool();
            let derived = reconciler.derived();
            let autoscaling = &pool.autoscaling;

            print_fields(
                "Node pool",
                &[
                    ("name", display_option(&pool.name)),
                    ("version", display_option(&pool.version)),
                    ("new", pool.is_new.to_string()),
                    ("machine type", display_option(&pool.config.machine_type)),
                    ("initial nodes", display_option(&pool.initial_node_count)),
                    ("autoscaling", autoscaling.enabled.to_string()),
                    ("min nodes", display_option(&autoscaling.min_node_count)),
                    ("max nodes", display_option(&autoscaling.max_node_count)),
                    ("auto repair", pool.management.auto_repair.to_string()),
                    ("auto upgrade", pool.management.auto_upgrade.to_string()),
                    (
                        "scope selection",
                        reconciler.scope_selection().oauth_scopes_selection.to_string(),
                    ),
                    ("oauth scopes", pool.config.oauth_scopes.len().to_string()),
                    ("labels", format_labels(pool)),
                ],
            );
            println!();
            print_fields(
                "Derived",
                &[
                    ("max version", display_option(&derived.max_version)),
                    (
                        "cluster below max",
                        derived.cluster_version_is_less_than_max.to_string(),
                    ),
                    ("upgrade available", derived.upgrade_available.to_string()),
                    ("original version", or_dash(&derived.original_cluster_version)),
                    (
                        "machine",
                        derived
                            .edited_machine_choice
                            .as_ref()
                            .map(|choice| choice.display_name.clone())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    ("total nodes", derived.regional_total_node_counts.to_string()),
                ],
            );

            if derived.show_management_warning {
                println!();
                print_warning("imported cluster pool has auto-repair or auto-upgrade disabled");
            }
            if !derived.version_is_offered {
                println!();
                print_warning("node pool version is not among the offered choices");
            }
        }
    }
}

fn format_labels(pool: &gkepool_reconcile::NodePoolConfig) -> String {
    if pool.config.labels.is_empty() {
        return "-".to_string();
    }
    pool.config
        .labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
