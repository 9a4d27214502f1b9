use std::{fmt, time::Duration};

pub const DEFAULT_INTERVAL_MINUTES: f64 = 60.0;

/// The detection intervals selectable in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitoringSchedule {
    Every30Seconds,
    EveryMinute,
    Every2Minutes,
    Every4Minutes,
    Every30Minutes,
    #[default]
    Hourly,
    Every2Hours,
    Every3Hours,
}

impl MonitoringSchedule {
    pub const ALL: [MonitoringSchedule; 8] = [
        MonitoringSchedule::Every30Seconds,
        MonitoringSchedule::EveryMinute,
        MonitoringSchedule::Every2Minutes,
        MonitoringSchedule::Every4Minutes,
        MonitoringSchedule::Every30Minutes,
        MonitoringSchedule::Hourly,
        MonitoringSchedule::Every2Hours,
        MonitoringSchedule::Every3Hours,
    ];

    /// Case-insensitive match against the settings labels.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|schedule| schedule.label().to_lowercase() == normalized)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MonitoringSchedule::Every30Seconds => "Every 30 seconds",
            MonitoringSchedule::EveryMinute => "Every 1 minute",
            MonitoringSchedule::Every2Minutes => "Every 2 minutes",
            MonitoringSchedule::Every4Minutes => "Every 4 minutes",
            MonitoringSchedule::Every30Minutes => "Every 30 minutes",
            MonitoringSchedule::Hourly => "Hourly",
            MonitoringSchedule::Every2Hours => "Every 2 hours",
            MonitoringSchedule::Every3Hours => "Every 3 hours",
        }
    }

    pub fn minutes(&self) -> f64 {
        match self {
            MonitoringSchedule::Every30Seconds => 0.5,
            MonitoringSchedule::EveryMinute => 1.0,
            MonitoringSchedule::Every2Minutes => 2.0,
            MonitoringSchedule::Every4Minutes => 4.0,
            MonitoringSchedule::Every30Minutes => 30.0,
            MonitoringSchedule::Hourly => 60.0,
            MonitoringSchedule::Every2Hours => 120.0,
            MonitoringSchedule::Every3Hours => 180.0,
        }
    }

    pub fn interval(&self) -> Duration {
        minutes_to_duration(self.minutes())
    }
}

impl fmt::Display for MonitoringSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minutes between detections for a settings value; unrecognized values get 60.
pub fn interval_minutes(schedule: &str) -> f64 {
    MonitoringSchedule::parse(schedule)
        .map(|schedule| schedule.minutes())
        .unwrap_or(DEFAULT_INTERVAL_MINUTES)
}

pub fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::from_secs_f64(minutes * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_labels_map_to_table_values() {
        let table = [
            ("every 30 seconds", 0.5),
            ("every 1 minute", 1.0),
            ("every 2 minutes", 2.0),
            ("every 4 minutes", 4.0),
            ("every 30 minutes", 30.0),
            ("hourly", 60.0),
            ("every 2 hours", 120.0),
            ("every 3 hours", 180.0),
        ];

        for (label, minutes) in table {
            assert_eq!(interval_minutes(label), minutes, "{label}");
            assert_eq!(interval_minutes(&label.to_uppercase()), minutes, "{label}");
        }
    }

    #[test]
    fn unrecognized_labels_default_to_an_hour() {
        assert_eq!(interval_minutes("30 minutes"), 60.0);
        assert_eq!(interval_minutes(""), 60.0);
        assert_eq!(interval_minutes("every 5 minutes"), 60.0);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(interval_minutes("  Every 2 Hours \n"), 120.0);
    }

    #[test]
    fn thirty_seconds_is_a_thirty_second_duration() {
        assert_eq!(
            MonitoringSchedule::Every30Seconds.interval(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn default_schedule_is_hourly() {
        assert_eq!(MonitoringSchedule::default(), MonitoringSchedule::Hourly);
        assert_eq!(MonitoringSchedule::default().interval(), Duration::from_secs(3600));
    }
}
