//! Flattens scenario records into atomic step units.

use crate::domain::models::{ScenarioRecord, StepRole, StepUnit};

/// One unit per non-empty field, in scenario order and then Given, When,
/// Then order within a scenario. Absent or blank fields are skipped.
pub fn extract_steps(records: &[ScenarioRecord]) -> Vec<StepUnit> {
    records
        .iter()
        .enumerate()
        .flat_map(|(scenario_index, record)| {
            StepRole::ALL.into_iter().filter_map(move |role| {
                record.field(role).map(|text| StepUnit {
                    scenario_index,
                    role,
                    text: text.to_string(),
                })
            })
        })
        .collect()
}
