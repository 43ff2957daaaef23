use std::io::Write;

use serde::Serialize;

use crate::feedback::flatten;
use crate::models::CallRecord;

#[derive(Serialize)]
struct CsvRow<'a> {
    id: String,
    manager: &'a str,
    date: &'a str,
    duration: &'a str,
    score: i32,
    summary: String,
    feedback: String,
}

/// Writes the call table as CSV and returns the number of rows written.
pub fn write_calls_csv<W: Write>(writer: W, calls: &[CallRecord]) -> anyhow::Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);

    for call in calls {
        csv.serialize(CsvRow {
            id: call.id.to_string(),
            manager: &call.manager_name,
            date: &call.display_date,
            duration: &call.duration_label,
            score: call.score,
            summary: flatten(&call.mistakes),
            feedback: flatten(&call.feedback),
        })?;
    }

    csv.flush()?;
    Ok(calls.len())
}
