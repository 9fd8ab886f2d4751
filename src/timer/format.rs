use chrono::{Duration, NaiveDateTime};

const MICROS_PER_SECOND: i64 = 1_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Layout used for start times in the record file and summaries
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a start time as `YYYY-MM-DD HH:MM:SS` (sub-second part dropped)
pub fn format_start_time(t: &NaiveDateTime) -> String {
    t.format(START_TIME_FORMAT).to_string()
}

/// Render an elapsed duration as `[N day[s], ]H:MM:SS[.ffffff]`.
///
/// Negative durations render as zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_micros = elapsed.num_microseconds().unwrap_or(i64::MAX).max(0);

    let micros = total_micros % MICROS_PER_SECOND;
    let total_secs = total_micros / MICROS_PER_SECOND;
    let days = total_secs / SECONDS_PER_DAY;
    let secs_of_day = total_secs % SECONDS_PER_DAY;

    let hours = secs_of_day / 3600;
    let minutes = (secs_of_day % 3600) / 60;
    let seconds = secs_of_day % 60;

    let mut out = String::new();
    if days > 0 {
        let unit = if days == 1 { "day" } else { "days" };
        out.push_str(&format!("{} {}, ", days, unit));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_whole_seconds() {
        assert_eq!(format_elapsed(Duration::zero()), "0:00:00");
        assert_eq!(format_elapsed(Duration::seconds(5)), "0:00:05");
        assert_eq!(format_elapsed(Duration::seconds(3 * 3600 + 7 * 60 + 9)), "3:07:09");
    }

    #[test]
    fn test_format_microseconds() {
        let d = Duration::seconds(12) + Duration::microseconds(345);
        assert_eq!(format_elapsed(d), "0:00:12.000345");
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_elapsed(Duration::days(1) + Duration::seconds(61)), "1 day, 0:01:01");
        assert_eq!(format_elapsed(Duration::days(2) + Duration::hours(13)), "2 days, 13:00:00");
    }

    #[test]
    fn test_format_negative_is_zero() {
        assert_eq!(format_elapsed(Duration::seconds(-30)), "0:00:00");
    }

    #[test]
    fn test_format_start_time_drops_fraction() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 999_999)
            .unwrap();
        assert_eq!(format_start_time(&t), "2024-01-02 03:04:05");
    }
}
