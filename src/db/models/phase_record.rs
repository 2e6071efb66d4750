//! Finished-phase history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cycle::{Phase, PhaseCompletion};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord {
    pub id: String,
    pub phase: Phase,
    pub planned_seconds: u32,
    /// Counter value right after this phase ended.
    pub completed_cycles: u32,
    pub completed_at: DateTime<Utc>,
}

impl PhaseRecord {
    pub fn from_completion(completion: &PhaseCompletion, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phase: completion.ended,
            planned_seconds: completion.planned_seconds,
            completed_cycles: completion.completed_cycles,
            completed_at,
        }
    }
}

/// Aggregate of finished Focus phases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FocusSummary {
    pub focus_phases: u32,
    pub focused_seconds: u64,
}
