use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::dates::{end_of_day, parse_display_date, start_of_day};
use crate::models::{CallRecord, ManagerSummary};

/// Relative reporting window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    All,
}

impl Period {
    /// First instant inside the window, or `None` when unbounded.
    pub fn start(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = start_of_day(now);
        match self {
            Period::Day => Some(today),
            Period::Week => Some(today - Duration::days(7)),
            Period::Month => Some(today - Duration::days(30)),
            Period::All => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Day => "today",
            Period::Week => "last 7 days",
            Period::Month => "last 30 days",
            Period::All => "all time",
        }
    }
}

/// Inclusive calendar range; both ends compare at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let start = self.start.and_time(NaiveTime::MIN);
        let end = end_of_day(self.end.and_time(NaiveTime::MIN));
        at >= start && at <= end
    }
}

/// Settings of the call table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub date_range: Option<DateRange>,
    pub min_score: i32,
    pub search_text: String,
}

pub fn matches_search(name: &str, search_text: &str) -> bool {
    if search_text.trim().is_empty() {
        return true;
    }
    name.to_lowercase().contains(&search_text.to_lowercase())
}

/// Call table view: date range, score threshold and name search. Input
/// order is preserved and unscored calls are kept.
pub fn filter_calls(records: &[CallRecord], state: &FilterState, now: NaiveDateTime) -> Vec<CallRecord> {
    records
        .iter()
        .filter(|call| {
            if let Some(range) = &state.date_range {
                if !range.contains(parse_display_date(&call.display_date, now)) {
                    return false;
                }
            }
            call.score >= state.min_score && matches_search(&call.manager_name, &state.search_text)
        })
        .cloned()
        .collect()
}

/// Calls feeding the department dashboard: scored calls of line managers
/// that fall inside the period, which always ends at the close of today.
pub fn dashboard_calls(
    records: &[CallRecord],
    managers: &[ManagerSummary],
    period: Period,
    now: NaiveDateTime,
) -> Vec<CallRecord> {
    let names: HashSet<&str> = managers
        .iter()
        .filter(|manager| manager.is_line_manager())
        .map(|manager| manager.name.as_str())
        .collect();
    let start = period.start(now);
    let end = end_of_day(now);

    records
        .iter()
        .filter(|call| {
            if !names.contains(call.manager_name.as_str()) || call.score <= 0 {
                return false;
            }
            let at = parse_display_date(&call.display_date, now);
            start.map_or(true, |start| at >= start) && at <= end
        })
        .cloned()
        .collect()
}

/// Calls of a single manager since the start of the period, at or above
/// `min_score`.
pub fn manager_calls(
    records: &[CallRecord],
    manager_name: &str,
    period: Period,
    min_score: i32,
    now: NaiveDateTime,
) -> Vec<CallRecord> {
    let start = period.start(now);

    records
        .iter()
        .filter(|call| call.manager_name == manager_name)
        .filter(|call| {
            start.map_or(true, |start| parse_display_date(&call.display_date, now) >= start)
        })
        .filter(|call| call.score >= min_score)
        .cloned()
        .collect()
}

/// Replaces each manager's `total_calls` with their count in `filtered`.
pub fn recount_managers(managers: &[ManagerSummary], filtered: &[CallRecord]) -> Vec<ManagerSummary> {
    managers
        .iter()
        .map(|manager| ManagerSummary {
            total_calls: filtered
                .iter()
                .filter(|call| call.manager_name == manager.name)
                .count(),
            ..manager.clone()
        })
        .collect()
}
