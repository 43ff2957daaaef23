use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::aggregate::{aggregate, best_by_count, best_by_score};
use crate::feedback::{feedback_points, format_point};
use crate::filter::{dashboard_calls, Period};
use crate::models::{DashboardData, Department};
use crate::source::DataOrigin;
use crate::state::effective_data;

pub fn build_report(
    department: Department,
    period: Period,
    now: NaiveDateTime,
    data: &DashboardData,
    origin: DataOrigin,
) -> String {
    let (all_calls, managers) = effective_data(data);
    let calls = dashboard_calls(&all_calls, &managers, period, now);
    let stats = aggregate(&calls, &managers);

    let mut output = String::new();

    let _ = writeln!(output, "# Call Analytics Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) at {}",
        department,
        period.label(),
        now.format("%d.%m.%Y %H:%M")
    );
    if origin == DataOrigin::Fallback {
        let _ = writeln!(output);
        let _ = writeln!(output, "> Live data was unavailable; figures below are placeholders.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Scored calls: {}", stats.total_calls);
    let _ = writeln!(output, "- Average score: {}%", stats.avg_score);

    match best_by_score(&stats) {
        Some(best) => {
            let _ = writeln!(output, "- Best score: {} ({}%)", best.name, best.avg_score);
        }
        None => {
            let _ = writeln!(output, "- Best score: none");
        }
    }
    match best_by_count(&stats) {
        Some(best) => {
            let _ = writeln!(output, "- Most calls: {} ({} calls)", best.name, best.count);
        }
        None => {
            let _ = writeln!(output, "- Most calls: none");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Managers");

    if stats.per_manager.is_empty() {
        let _ = writeln!(output, "No managers in this department.");
    } else {
        for manager in stats.per_manager.iter() {
            let _ = writeln!(
                output,
                "- {}: {} calls (avg score {}%)",
                manager.name, manager.count, manager.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");

    let with_feedback: Vec<_> = calls
        .iter()
        .filter_map(|call| feedback_points(&call.feedback).first().map(|point| (call, format_point(point))))
        .collect();
    if with_feedback.is_empty() {
        let _ = writeln!(output, "No feedback recorded for this window.");
    } else {
        for (call, point) in with_feedback.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}%): {}",
                call.manager_name, call.display_date, call.score, point
            );
        }
    }

    output
}
