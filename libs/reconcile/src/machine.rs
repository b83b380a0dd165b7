//! Machine-type catalog derivation.

use serde::Serialize;

use crate::model::MachineType;

/// Width trailing numbers are padded to in sort keys.
const SORT_SUFFIX_WIDTH: usize = 10;

/// A display-ready machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineChoice {
    pub name: String,
    pub description: String,
    pub display_name: String,
    /// Machine family, e.g. `n1` for `n1-standard-2`.
    pub group: String,
    pub sort_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
}

impl From<&MachineType> for MachineChoice {
    fn from(machine: &MachineType) -> Self {
        Self {
            name: machine.name.clone(),
            description: machine.description.clone(),
            display_name: format!("{} ({})", machine.name, machine.description),
            group: machine_group(&machine.name).to_string(),
            sort_name: sortable_numeric_suffix(&machine.name),
            guest_cpus: machine.guest_cpus,
            memory_mb: machine.memory_mb,
        }
    }
}

/// The part of a machine name before the first hyphen.
pub fn machine_group(name: &str) -> &str {
    name.split('-').next().unwrap_or(name)
}

/// Zero-pad a trailing number so names sort numerically.
///
/// `n1-standard-2` becomes `n1-standard-0000000002`. Names without a trailing
/// number, or made only of digits, are returned unchanged.
pub fn sortable_numeric_suffix(name: &str) -> String {
    let digits_start = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits_start == 0 || digits_start == name.len() {
        return name.to_string();
    }

    let (prefix, digits) = name.split_at(digits_start);
    format!("{prefix}{digits:0>width$}", width = SORT_SUFFIX_WIDTH)
}

/// Build sorted machine choices from a raw catalog.
///
/// The catalog is only read; the result is a fresh list.
pub fn derive_machine_choices(machine_types: &[MachineType]) -> Vec<MachineChoice> {
    let mut choices: Vec<MachineChoice> = machine_types.iter().map(MachineChoice::from).collect();
    choices.sort_by(|a, b| a.sort_name.cmp(&b.sort_name));
    choices
}

/// The choice whose name matches the configured machine type.
pub fn find_machine_choice<'a>(
    choices: &'a [MachineChoice],
    machine_type: Option<&str>,
) -> Option<&'a MachineChoice> {
    let machine_type = machine_type?;
    choices.iter().find(|choice| choice.name == machine_type)
}
