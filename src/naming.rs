//! Automatic activity naming.
//!
//! New activities are named from the daytime of their start timestamp plus
//! the sport name, e.g. "Morning Running". Reimports never rename.

use chrono::{DateTime, Timelike, Utc};

/// Bucket an hour of day into a human daytime label.
pub fn daytime_of(date: &DateTime<Utc>) -> &'static str {
    match date.hour() {
        4..=9 => "Morning",
        10..=13 => "Noon",
        14..=17 => "Afternoon",
        18..=21 => "Evening",
        _ => "Night",
    }
}

/// Build the automatic name for a new activity.
pub fn automatic_name(date: &DateTime<Utc>, sport_name: Option<&str>) -> String {
    format!("{} {}", daytime_of(date), sport_name.unwrap_or("Workout"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 15, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_daytime_buckets() {
        assert_eq!(daytime_of(&at_hour(7)), "Morning");
        assert_eq!(daytime_of(&at_hour(12)), "Noon");
        assert_eq!(daytime_of(&at_hour(15)), "Afternoon");
        assert_eq!(daytime_of(&at_hour(19)), "Evening");
        assert_eq!(daytime_of(&at_hour(23)), "Night");
        assert_eq!(daytime_of(&at_hour(2)), "Night");
    }

    #[test]
    fn test_automatic_name() {
        assert_eq!(automatic_name(&at_hour(7), Some("Running")), "Morning Running");
        assert_eq!(automatic_name(&at_hour(19), None), "Evening Workout");
    }
}
