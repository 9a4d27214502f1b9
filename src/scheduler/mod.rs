pub mod controller;
pub mod interval;
pub mod state;

pub use controller::{CycleComponents, CycleOutcome, CycleScheduler};
pub use interval::{interval_minutes, minutes_to_duration, MonitoringSchedule};
pub use state::{CycleState, SchedulerState};
