use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::timestamp;

pub const NOT_SCHEDULED: &str = "Not scheduled yet";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CycleState {
    #[default]
    Idle,
    Scheduled,
    Running,
    Stopped,
}

impl CycleState {
    pub fn is_active(self) -> bool {
        matches!(self, CycleState::Scheduled | CycleState::Running)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    pub status: CycleState,
    /// Set whenever `status` is `Scheduled` or `Running`.
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub next_trigger: Option<NaiveDateTime>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub started_at: Option<NaiveDateTime>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, fire_at: NaiveDateTime) {
        self.status = CycleState::Scheduled;
        self.next_trigger = Some(fire_at);
    }

    /// Moves to `Running`; false when the scheduler is not active.
    pub fn begin_cycle(&mut self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.status = CycleState::Running;
        true
    }

    pub fn stop(&mut self) {
        self.status = CycleState::Stopped;
        self.next_trigger = None;
    }

    pub fn next_trigger_label(&self) -> String {
        match (self.status.is_active(), self.next_trigger) {
            (true, Some(at)) => at.format(timestamp::FORMAT).to_string(),
            _ => NOT_SCHEDULED.to_string(),
        }
    }
}

fn serialize_optional_timestamp<S>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(at) => timestamp::serialize(at, serializer),
        None => serializer.serialize_none(),
    }
}
