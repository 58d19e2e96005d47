use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Longest task name shown untruncated in a tab label.
const TAB_LABEL_MAX_CHARS: usize = 20;

/// One process assessment within a draft.
///
/// Every field is free text or a categorical value chosen in the form; none
/// of them are validated server-side. The wire names are camelCase because
/// the form surface reads and writes the stored JSON directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct ProcessRecord {
    pub id: String,
    pub task_name: String,
    pub process_description: String,
    pub task_goal: String,
    pub perfect_result: String,
    pub ergernis: String,
    pub frequency: String,
    pub volume_variation: String,
    pub hours_per_month: String,
    pub people_involved: String,
    pub costs_excluding_labor: String,
    pub direct_revenue: String,
    pub revenue_increase_potential: String,
    pub data_sources: String,
    pub systems_used: String,
    /// `zeer_goed`, `goed`, `matig` or `slecht`.
    pub data_consistency: String,
    pub data_consistency_notes: String,
    /// `nee`, `ja_soms` or `ja_regelmatig`.
    pub exceptions_require_intervention: String,
    pub exception_percentage: String,
    pub exception_notes: String,
    /// `zeer_kritiek`, `belangrijk`, `nuttig` or `nice_to_have`.
    pub task_criticality: String,
    /// `nee` or `ja`.
    pub compliance_involved: String,
    pub compliance_details: String,
    pub additional_comments: String,
}

impl ProcessRecord {
    /// An empty record with the given id.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Mutable access to an editable field by its wire name. The id is not
    /// editable.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let field = match name {
            "taskName" => &mut self.task_name,
            "processDescription" => &mut self.process_description,
            "taskGoal" => &mut self.task_goal,
            "perfectResult" => &mut self.perfect_result,
            "ergernis" => &mut self.ergernis,
            "frequency" => &mut self.frequency,
            "volumeVariation" => &mut self.volume_variation,
            "hoursPerMonth" => &mut self.hours_per_month,
            "peopleInvolved" => &mut self.people_involved,
            "costsExcludingLabor" => &mut self.costs_excluding_labor,
            "directRevenue" => &mut self.direct_revenue,
            "revenueIncreasePotential" => &mut self.revenue_increase_potential,
            "dataSources" => &mut self.data_sources,
            "systemsUsed" => &mut self.systems_used,
            "dataConsistency" => &mut self.data_consistency,
            "dataConsistencyNotes" => &mut self.data_consistency_notes,
            "exceptionsRequireIntervention" => &mut self.exceptions_require_intervention,
            "exceptionPercentage" => &mut self.exception_percentage,
            "exceptionNotes" => &mut self.exception_notes,
            "taskCriticality" => &mut self.task_criticality,
            "complianceInvolved" => &mut self.compliance_involved,
            "complianceDetails" => &mut self.compliance_details,
            "additionalComments" => &mut self.additional_comments,
            _ => return None,
        };
        Some(field)
    }

    /// Label for the tab at `index`: the task name, shortened, or a numbered
    /// placeholder while the name is still blank.
    pub fn tab_label(&self, index: usize) -> String {
        let name = self.task_name.trim();
        if name.is_empty() {
            return format!("Proces {}", index + 1);
        }

        if name.chars().count() > TAB_LABEL_MAX_CHARS {
            let short: String = name.chars().take(TAB_LABEL_MAX_CHARS).collect();
            format!("{short}...")
        } else {
            name.to_string()
        }
    }
}

/// The process list a brand-new workspace starts with.
pub fn initial_processes() -> Vec<ProcessRecord> {
    vec![ProcessRecord::empty("1")]
}

/// Append an empty process and return its id.
///
/// Ids are sequential numbers; the next one is one past the highest numeric
/// id in the list so a removal never causes an id to be handed out twice.
pub fn add_process(processes: &mut Vec<ProcessRecord>) -> String {
    let next = processes
        .iter()
        .filter_map(|p| p.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        .max(processes.len() as u64)
        + 1;

    let id = next.to_string();
    processes.push(ProcessRecord::empty(id.clone()));
    id
}

/// Remove a process by id. The last remaining process cannot be removed.
pub fn remove_process(processes: &mut Vec<ProcessRecord>, id: &str) -> Result<(), CoreError> {
    let index = processes
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| CoreError::UnknownProcess(id.to_string()))?;

    if processes.len() <= 1 {
        return Err(CoreError::LastProcess);
    }

    processes.remove(index);
    Ok(())
}

/// Set one field of one process.
pub fn update_field(
    processes: &mut [ProcessRecord],
    id: &str,
    field: &str,
    value: String,
) -> Result<(), CoreError> {
    let process = processes
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| CoreError::UnknownProcess(id.to_string()))?;

    let slot = process
        .field_mut(field)
        .ok_or_else(|| CoreError::UnknownField(field.to_string()))?;
    *slot = value;
    Ok(())
}
