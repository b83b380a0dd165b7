//! Machine choice listing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use gkepool_reconcile::MachineChoice;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{display_option, print_output};
use crate::session::open_session;

use super::CommandContext;

#[derive(Debug, Args)]
pub struct MachinesCommand {
    /// Session file path (TOML or JSON).
    #[arg(value_name = "PATH")]
    session: PathBuf,

    /// Only list machines of this family, e.g. `n1`.
    #[arg(long)]
    group: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct MachineRow {
    #[tabled(rename = "")]
    #[serde(skip)]
    marker: &'static str,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Group")]
    group: String,

    #[tabled(rename = "Description")]
    description: String,

    #[tabled(rename = "vCPUs", display = "display_option")]
    guest_cpus: Option<u32>,

    #[tabled(skip)]
    selected: bool,
}

impl MachineRow {
    fn new(choice: &MachineChoice, selected: bool) -> Self {
        Self {
            marker: if selected { "*" } else { "" },
            name: choice.name.clone(),
            group: choice.group.clone(),
            description: choice.description.clone(),
            guest_cpus: choice.guest_cpus,
            selected,
        }
    }
}

impl MachinesCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let (reconciler, _) = open_session(&self.session)?;
        let selected = reconciler.edited_machine_choice().map(|choice| choice.name.as_str());

        let rows: Vec<MachineRow> = reconciler
            .machine_choices()
            .iter()
            .filter(|choice| self.group.as_deref().is_none_or(|group| choice.group == group))
            .map(|choice| MachineRow::new(choice, selected == Some(choice.name.as_str())))
            .collect();

        print_output(&rows, ctx.format);
        Ok(())
    }
}
