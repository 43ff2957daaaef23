use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

const TODAY_TOKENS: [&str; 2] = ["Today", "Сегодня"];
const YESTERDAY_TOKENS: [&str; 2] = ["Yesterday", "Вчера"];

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2})\.(\d{2})").unwrap());

/// Turns a display label back into a timestamp.
///
/// Labels that match none of the known shapes resolve to `now`; this never
/// fails.
pub fn parse_display_date(label: &str, now: NaiveDateTime) -> NaiveDateTime {
    if TODAY_TOKENS.iter().any(|token| label.starts_with(token)) {
        return now;
    }

    if YESTERDAY_TOKENS.iter().any(|token| label.starts_with(token)) {
        return now - Duration::days(1);
    }

    if let Some(captures) = DAY_MONTH.captures(label) {
        let day: u32 = captures[1].parse().unwrap_or(1);
        let month: u32 = captures[2].parse().unwrap_or(1);
        if let Some(date) = rolled_date(now.year(), month, day) {
            return date.and_time(NaiveTime::MIN);
        }
    }

    now
}

/// Builds a date the way calendar arithmetic would, letting out-of-range
/// days and months spill into neighbouring months (`31.02` is early March,
/// `00.05` is the last day of April).
fn rolled_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let months = year * 12 + month as i32 - 1;
    let first = NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1)?;
    first.checked_add_signed(Duration::days(i64::from(day) - 1))
}

/// Formats a call start as `Today, HH:MM`, `Yesterday, HH:MM` or
/// `DD.MM, HH:MM`, counting whole elapsed 24 hour periods.
pub fn format_display_date(started_at: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed_days = (now - started_at).num_milliseconds().div_euclid(86_400_000);
    let time = started_at.format("%H:%M");

    match elapsed_days {
        0 => format!("{}, {}", TODAY_TOKENS[0], time),
        1 => format!("{}, {}", YESTERDAY_TOKENS[0], time),
        _ => format!("{}, {}", started_at.format("%d.%m"), time),
    }
}

/// `MM:SS` with both parts zero padded; minutes may exceed 59.
pub fn format_clock(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Start of the calendar day containing `at`.
pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// Last millisecond of the calendar day containing `at`.
pub fn end_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| start_of_day(at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn today_resolves_to_now() {
        let now = at(2026, 3, 10, 14, 5);
        assert_eq!(parse_display_date("Today, 09:15", now), now);
        assert_eq!(parse_display_date("Сегодня, 09:15", now), now);
    }

    #[test]
    fn yesterday_keeps_time_of_day() {
        let now = at(2026, 3, 1, 14, 5);
        assert_eq!(parse_display_date("Yesterday, 23:50", now), at(2026, 2, 28, 14, 5));
        assert_eq!(parse_display_date("Вчера, 08:00", now), at(2026, 2, 28, 14, 5));
    }

    #[test]
    fn day_month_uses_current_year_at_midnight() {
        let now = at(2026, 3, 10, 14, 5);
        assert_eq!(parse_display_date("05.02, 17:45", now), at(2026, 2, 5, 0, 0));
    }

    #[test]
    fn out_of_range_day_month_rolls_over() {
        let now = at(2026, 3, 10, 14, 5);
        assert_eq!(parse_display_date("31.02, 10:00", now), at(2026, 3, 3, 0, 0));
        assert_eq!(parse_display_date("00.05, 10:00", now), at(2026, 4, 30, 0, 0));
        assert_eq!(parse_display_date("01.13, 10:00", now), at(2027, 1, 1, 0, 0));
    }

    #[test]
    fn garbage_falls_back_to_now() {
        let now = at(2026, 3, 10, 14, 5);
        for label in ["", "not a date", "5.3", "??", "Tomorrow, 10:00"] {
            assert_eq!(parse_display_date(label, now), now, "label {label:?}");
        }
    }

    #[test]
    fn formats_relative_labels() {
        let now = at(2026, 3, 10, 14, 5);
        assert_eq!(format_display_date(at(2026, 3, 10, 9, 7), now), "Today, 09:07");
        // 23 hours ago still counts as today.
        assert_eq!(format_display_date(at(2026, 3, 9, 15, 0), now), "Today, 15:00");
        assert_eq!(format_display_date(at(2026, 3, 9, 11, 30), now), "Yesterday, 11:30");
        assert_eq!(format_display_date(at(2026, 2, 27, 8, 0), now), "27.02, 08:00");
    }

    #[test]
    fn clock_pads_both_parts() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(185), "03:05");
        assert_eq!(format_clock(6000), "100:00");
        assert_eq!(format_clock(-4), "00:00");
    }

    #[test]
    fn day_bounds() {
        let now = at(2026, 3, 10, 14, 5);
        assert_eq!(start_of_day(now), at(2026, 3, 10, 0, 0));
        assert_eq!(
            end_of_day(now),
            NaiveDate::from_ymd_opt(2026, 3, 10)
                .unwrap()
                .and_hms_milli_opt(23, 59, 59, 999)
                .unwrap()
        );
    }
}
