use chrono::NaiveDateTime;

use crate::filter::{dashboard_calls, manager_calls, Period};
use crate::models::{CallRecord, DashboardStats, ManagerDetailStats, ManagerStat, ManagerSummary};

/// Mean score rounded to the nearest integer, `0` for no calls.
pub fn average_score<'a>(records: impl IntoIterator<Item = &'a CallRecord>) -> i32 {
    let (sum, count) = records
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), call| (sum + i64::from(call.score), count + 1));

    if count == 0 {
        0
    } else {
        (sum as f64 / count as f64).round() as i32
    }
}

/// Department-wide statistics over `records`, broken down per line manager.
///
/// Every line manager appears in `per_manager`, including those without
/// calls. Rows are ordered by call count, highest first; ties keep the
/// order of `managers`.
pub fn aggregate(records: &[CallRecord], managers: &[ManagerSummary]) -> DashboardStats {
    let mut per_manager: Vec<ManagerStat> = managers
        .iter()
        .filter(|manager| manager.is_line_manager())
        .map(|manager| {
            let calls: Vec<&CallRecord> = records
                .iter()
                .filter(|call| call.manager_name == manager.name)
                .collect();
            ManagerStat {
                name: manager.name.clone(),
                avg_score: average_score(calls.iter().copied()),
                count: calls.len(),
            }
        })
        .collect();

    per_manager.sort_by(|a, b| b.count.cmp(&a.count));

    DashboardStats {
        avg_score: average_score(records),
        total_calls: records.len(),
        per_manager,
    }
}

/// Filters `records` to the dashboard window and aggregates the result.
pub fn department_dashboard(
    records: &[CallRecord],
    managers: &[ManagerSummary],
    period: Period,
    now: NaiveDateTime,
) -> DashboardStats {
    let calls = dashboard_calls(records, managers, period, now);
    aggregate(&calls, managers)
}

/// First manager with calls holding the highest value of `key`.
fn first_max_by_key(per_manager: &[ManagerStat], key: impl Fn(&ManagerStat) -> i64) -> Option<&ManagerStat> {
    per_manager
        .iter()
        .filter(|stat| stat.count > 0)
        .fold(None, |best: Option<&ManagerStat>, stat| match best {
            Some(current) if key(current) >= key(stat) => Some(current),
            _ => Some(stat),
        })
}

/// Highest average score among managers with calls. Ties go to the
/// earliest entry of `per_manager`, which is itself ordered by count.
pub fn best_by_score(stats: &DashboardStats) -> Option<&ManagerStat> {
    first_max_by_key(&stats.per_manager, |stat| i64::from(stat.avg_score))
}

/// Highest call count among managers with calls, ties to the earliest.
pub fn best_by_count(stats: &DashboardStats) -> Option<&ManagerStat> {
    first_max_by_key(&stats.per_manager, |stat| stat.count as i64)
}

/// Seconds in an `MM:SS` label. Labels that do not parse count as zero.
pub fn duration_seconds(label: &str) -> u64 {
    let Some((minutes, seconds)) = label.trim().split_once(':') else {
        return 0;
    };
    match (minutes.parse::<u64>(), seconds.parse::<u64>()) {
        (Ok(minutes), Ok(seconds)) => minutes
            .checked_mul(60)
            .and_then(|total| total.checked_add(seconds))
            .unwrap_or(0),
        _ => 0,
    }
}

pub fn format_total_duration(total_seconds: u64) -> String {
    format!("{} min {} sec", total_seconds / 60, total_seconds % 60)
}

/// Detail view of one manager: the calls left after the period and score
/// filters, and their totals. Durations are summed, not averaged.
pub fn manager_detail(
    records: &[CallRecord],
    manager_name: &str,
    period: Period,
    min_score: i32,
    now: NaiveDateTime,
) -> (Vec<CallRecord>, ManagerDetailStats) {
    let calls = manager_calls(records, manager_name, period, min_score, now);
    let total_seconds = calls
        .iter()
        .map(|call| duration_seconds(&call.duration_label))
        .fold(0u64, u64::saturating_add);

    let stats = ManagerDetailStats {
        total_calls: calls.len(),
        avg_score: average_score(&calls),
        total_duration: format_total_duration(total_seconds),
        filtered_calls: calls.len(),
    };

    (calls, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{call, manager, now};
    use crate::filter::{filter_calls, FilterState};
    use crate::models::Role;

    #[test]
    fn unfiltered_total_matches_input_length() {
        let records = vec![
            call("A", 0, "Today"),
            call("B", 55, "garbage"),
            call("C", 100, "01.01, 10:00"),
        ];
        let filtered = filter_calls(&records, &FilterState::default(), now());
        let stats = aggregate(&filtered, &[]);
        assert_eq!(stats.total_calls, records.len());
        assert_eq!(stats.avg_score, 52);
    }

    #[test]
    fn empty_input_yields_zero_average() {
        let stats = aggregate(&[], &[manager("A", None)]);
        assert_eq!(stats.avg_score, 0);
        assert_eq!(stats.total_calls, 0);
        assert_eq!(
            stats.per_manager,
            vec![ManagerStat {
                name: "A".to_string(),
                avg_score: 0,
                count: 0
            }]
        );
    }

    #[test]
    fn average_rounds_half_up() {
        let records = vec![call("A", 70, "Today"), call("A", 71, "Today")];
        assert_eq!(average_score(&records), 71);
        let records = vec![call("A", 70, "Today"), call("A", 70, "Today"), call("A", 71, "Today")];
        assert_eq!(average_score(&records), 70);
    }

    #[test]
    fn min_score_scenario() {
        let records = vec![call("A", 70, "Today"), call("B", 30, "Yesterday")];
        let state = FilterState {
            min_score: 50,
            ..FilterState::default()
        };
        let filtered = filter_calls(&records, &state, now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].manager_name, "A");
        assert_eq!(aggregate(&filtered, &[]).avg_score, 70);
    }

    #[test]
    fn idle_managers_sort_after_active_ones() {
        let managers = vec![manager("Idle", None), manager("Busy", Some(Role::Manager)), manager("Lead", Some(Role::Rop))];
        let records = vec![call("Busy", 80, "Today"), call("Busy", 60, "Today"), call("Lead", 90, "Today")];
        let stats = aggregate(&records, &managers);

        let names: Vec<&str> = stats.per_manager.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Busy", "Idle"]);
        assert_eq!(stats.per_manager[0].avg_score, 70);
        assert_eq!(stats.per_manager[1], ManagerStat { name: "Idle".to_string(), avg_score: 0, count: 0 });
    }

    #[test]
    fn best_managers_prefer_first_on_ties() {
        let managers = vec![manager("A", None), manager("B", None), manager("C", None), manager("D", None)];
        let records = vec![
            call("A", 60, "Today"),
            call("B", 90, "Today"),
            call("B", 50, "Today"),
            call("C", 70, "Today"),
            call("C", 70, "Today"),
        ];
        let stats = aggregate(&records, &managers);
        // per_manager: B(2, 70), C(2, 70), A(1, 60), D(0, 0)
        assert_eq!(best_by_score(&stats).map(|s| s.name.as_str()), Some("B"));
        assert_eq!(best_by_count(&stats).map(|s| s.name.as_str()), Some("B"));
    }

    #[test]
    fn best_managers_skip_idle_rows() {
        let stats = aggregate(&[], &[manager("A", None)]);
        assert!(best_by_score(&stats).is_none());
        assert!(best_by_count(&stats).is_none());
    }

    #[test]
    fn department_dashboard_excludes_unscored() {
        let managers = vec![manager("A", None)];
        let records = vec![call("A", 0, "Today"), call("A", 80, "Today"), call("A", 100, "Yesterday")];
        let stats = department_dashboard(&records, &managers, Period::Day, now());
        assert_eq!(stats.total_calls, 1);
        assert_eq!(stats.avg_score, 80);

        let week = department_dashboard(&records, &managers, Period::Week, now());
        assert_eq!(week.total_calls, 2);
        assert_eq!(week.avg_score, 90);
    }

    #[test]
    fn durations_are_summed() {
        assert_eq!(duration_seconds("02:30") + duration_seconds("01:45"), 255);
        assert_eq!(format_total_duration(255), "4 min 15 sec");
        assert_eq!(duration_seconds("bad"), 0);
        assert_eq!(duration_seconds("1:xx"), 0);
    }

    #[test]
    fn oversized_durations_count_as_malformed() {
        assert_eq!(duration_seconds("307445734561825861:00"), 0);
        assert_eq!(duration_seconds(&format!("{}:00", u64::MAX / 60)), (u64::MAX / 60) * 60);
        assert_eq!(duration_seconds(&format!("{}:{}", u64::MAX / 60, u64::MAX)), 0);

        let mut huge = call("A", 80, "Today");
        huge.duration_label = format!("{}:00", u64::MAX / 60);
        let (_, stats) = manager_detail(&[huge.clone(), huge], "A", Period::All, 0, now());
        assert_eq!(stats.total_calls, 2);
        assert_eq!(stats.total_duration, format_total_duration(u64::MAX));
    }

    #[test]
    fn manager_detail_totals() {
        let mut first = call("A", 80, "Today");
        first.duration_label = "02:30".to_string();
        let mut second = call("A", 61, "Yesterday");
        second.duration_label = "01:45".to_string();
        let mut low = call("A", 10, "Today");
        low.duration_label = "10:00".to_string();
        let records = vec![first, second, low, call("B", 90, "Today")];

        let (calls, stats) = manager_detail(&records, "A", Period::Week, 50, now());
        assert_eq!(calls.len(), 2);
        assert_eq!(
            stats,
            ManagerDetailStats {
                total_calls: 2,
                avg_score: 71,
                total_duration: "4 min 15 sec".to_string(),
                filtered_calls: 2,
            }
        );
    }
}
