use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dates::{format_clock, format_display_date};
use crate::models::{CallRecord, Department, EvaluationBlock, ManagerSummary, Role};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        ("1000001", "Anna Sokolova", Some("anna_sok"), "dima", "manager"),
        ("1000002", "Dmitry Volkov", Some("dvolkov"), "dima", "manager"),
        ("1000003", "Igor Belov", None, "ruzanna", "manager"),
        ("1000004", "Ruzanna Avetisyan", Some("ruzanna_a"), "ruzanna", "rop"),
        ("1000005", "Pavel Orlov", Some("porlov"), "all", "admin"),
    ];

    // (call suffix, telegram id, hours ago, seconds, raw score, mistakes, recommendations)
    let calls = vec![
        (1u32, "1000001", 2i64, 270i32, Some(9i32), "1. Price named too early.", "1. Summarise next steps."),
        (2, "1000002", 5, 190, Some(7), "1. No follow-up date.", "1. Good objection handling."),
        (3, "1000003", 26, 125, Some(4), "1. No needs discovery.", "1. Ask a qualifying question."),
        (4, "1000001", 30, 302, Some(8), "", "1. Offer the express option."),
        (5, "1000004", 50, 400, Some(9), "", "1. Reference call for the team."),
        (6, "1000002", 24 * 9, 180, Some(6), "1. Passive closing.", "1. Fix the next call date."),
        (7, "1000003", 24 * 40, 155, Some(3), "1. Gave up early.", "1. Work the objection script."),
        (8, "1000001", 1, 184, None, "", ""),
    ];

    for department in [Department::B2g, Department::B2b] {
        let prefix = department.table_prefix();

        sqlx::query(&format!(
            "INSERT INTO {prefix}_avatars (id, name, prompt, description) \
             VALUES (1, 'Procurement officer', 'You are a cautious procurement officer.', 'Default roleplay client') \
             ON CONFLICT (id) DO NOTHING"
        ))
        .execute(pool)
        .await?;

        let mut user_ids: HashMap<&str, Uuid> = HashMap::new();
        for (telegram_id, name, username, team, role) in &users {
            let id: Uuid = sqlx::query(&format!(
                r#"
                INSERT INTO {prefix}_users (id, telegram_id, name, telegram_username, team, role)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (telegram_id) DO UPDATE
                SET name = EXCLUDED.name, team = EXCLUDED.team, role = EXCLUDED.role, updated_at = NOW()
                RETURNING id
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(telegram_id)
            .bind(name)
            .bind(username)
            .bind(team)
            .bind(role)
            .fetch_one(pool)
            .await?
            .get("id");
            user_ids.insert(*telegram_id, id);
        }

        for (suffix, telegram_id, hours_ago, seconds, score, mistakes, recommendations) in &calls {
            let user_id = user_ids
                .get(telegram_id)
                .copied()
                .context("seed call references an unknown user")?;
            let call_id = seed_call_id(department, *suffix)?;
            let started_at = Utc::now() - Duration::hours(*hours_ago);
            let evaluation = score.map(|score| {
                json!({
                    "criteria": [
                        {"name": "Greeting", "score": score, "feedback": "Clear introduction."},
                        {"name": "Needs discovery", "score": score, "feedback": ""},
                        {"name": "Closing", "score": score, "feedback": "Agree on the next step."}
                    ]
                })
            });

            sqlx::query(&format!(
                r#"
                INSERT INTO {prefix}_calls
                (id, user_id, avatar_id, started_at, ended_at, duration_seconds, transcript,
                 evaluation_json, score, mistakes, recommendations)
                VALUES ($1, $2, 1, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (id) DO NOTHING
                "#
            ))
            .bind(call_id)
            .bind(user_id)
            .bind(started_at)
            .bind(started_at + Duration::seconds(i64::from(*seconds)))
            .bind(*seconds)
            .bind("Client: Hello.\nManager: Good afternoon, thanks for picking up.")
            .bind(evaluation)
            .bind(*score)
            .bind(*mistakes)
            .bind(*recommendations)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

fn seed_call_id(department: Department, suffix: u32) -> anyhow::Result<Uuid> {
    let family = match department {
        Department::B2g => 1,
        Department::B2b => 2,
    };
    Ok(Uuid::parse_str(&format!(
        "5eed0000-0000-4000-800{family}-{suffix:012}"
    ))?)
}

/// Raw call joined with its owner, before any display formatting.
#[derive(Debug, Clone)]
pub struct CallRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: Option<i32>,
    pub transcript: Option<String>,
    pub score: Option<i32>,
    pub mistakes: Option<String>,
    pub recommendations: Option<String>,
    pub evaluation_json: Option<serde_json::Value>,
    pub user_name: Option<String>,
    pub telegram_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub telegram_username: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct CallStatRow {
    pub user_id: Uuid,
    pub duration_seconds: Option<i32>,
    pub score: Option<i32>,
}

/// All calls of a department, newest first.
pub async fn fetch_calls(pool: &PgPool, department: Department) -> Result<Vec<CallRecord>, sqlx::Error> {
    let prefix = department.table_prefix();
    let records = sqlx::query(&format!(
        "SELECT c.id, c.user_id, c.started_at, c.duration_seconds, c.transcript, c.score, \
         c.mistakes, c.recommendations, c.evaluation_json, \
         u.name AS user_name, u.telegram_username \
         FROM {prefix}_calls c \
         LEFT JOIN {prefix}_users u ON u.id = c.user_id \
         ORDER BY c.started_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    let now = Local::now().naive_local();
    let mut calls = Vec::with_capacity(records.len());

    for row in records {
        let row = CallRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            started_at: row.try_get("started_at")?,
            duration_seconds: row.try_get("duration_seconds")?,
            transcript: row.try_get("transcript")?,
            score: row.try_get("score")?,
            mistakes: row.try_get("mistakes")?,
            recommendations: row.try_get("recommendations")?,
            evaluation_json: row.try_get("evaluation_json")?,
            user_name: row.try_get("user_name")?,
            telegram_username: row.try_get("telegram_username")?,
        };
        calls.push(call_record_from_row(row, now));
    }

    Ok(calls)
}

/// Active users of a department with totals over all of their calls.
pub async fn fetch_manager_stats(
    pool: &PgPool,
    department: Department,
) -> Result<Vec<ManagerSummary>, sqlx::Error> {
    let prefix = department.table_prefix();
    let users_sql = format!(
        "SELECT id, name, telegram_username, role FROM {prefix}_users \
         WHERE is_active = TRUE ORDER BY created_at, name"
    );
    let calls_sql = format!("SELECT user_id, duration_seconds, score FROM {prefix}_calls");

    let (user_rows, call_rows) = tokio::try_join!(
        sqlx::query(&users_sql).fetch_all(pool),
        sqlx::query(&calls_sql).fetch_all(pool),
    )?;

    let users = user_rows
        .iter()
        .map(|row| {
            Ok(UserRow {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                telegram_username: row.try_get("telegram_username")?,
                role: row.try_get("role")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    let calls = call_rows
        .iter()
        .map(|row| {
            Ok(CallStatRow {
                user_id: row.try_get("user_id")?,
                duration_seconds: row.try_get("duration_seconds")?,
                score: row.try_get("score")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(summarize_managers(users, &calls))
}

fn avatar_url(username: Option<&str>, fallback: Uuid) -> String {
    match username {
        Some(username) if !username.is_empty() => format!("https://i.pravatar.cc/150?u={username}"),
        _ => format!("https://i.pravatar.cc/150?u={fallback}"),
    }
}

/// Shapes a stored call for display. Raw scores (1-10) become percentages.
pub fn call_record_from_row(row: CallRow, now: NaiveDateTime) -> CallRecord {
    let started_at = row.started_at.with_timezone(&Local).naive_local();

    CallRecord {
        id: row.id,
        manager_name: row.user_name.unwrap_or_else(|| "Unknown".to_string()),
        avatar_url: avatar_url(row.telegram_username.as_deref(), row.user_id),
        duration_label: format_clock(i64::from(row.duration_seconds.unwrap_or(0))),
        display_date: format_display_date(started_at, now),
        score: row.score.map_or(0, |score| score * 10),
        audio_url: "#".to_string(),
        kommo_url: "#".to_string(),
        transcript: row.transcript.unwrap_or_default(),
        feedback: row.recommendations.unwrap_or_default(),
        mistakes: row.mistakes.unwrap_or_default(),
        blocks: evaluation_blocks(row.evaluation_json.as_ref()),
    }
}

/// Named criteria of an evaluation payload. Anything without a
/// `criteria` array yields no blocks.
pub fn evaluation_blocks(evaluation: Option<&serde_json::Value>) -> Vec<EvaluationBlock> {
    let Some(criteria) = evaluation
        .and_then(|value| value.get("criteria"))
        .and_then(|criteria| criteria.as_array())
    else {
        return Vec::new();
    };

    criteria
        .iter()
        .enumerate()
        .map(|(index, criterion)| EvaluationBlock {
            id: format!("block-{index}"),
            name: criterion
                .get("name")
                .and_then(|name| name.as_str())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Criterion {}", index + 1)),
            score: criterion
                .get("score")
                .and_then(|score| score.as_f64())
                .map_or(0, |score| score.round() as i32),
            max_score: 10,
            feedback: criterion
                .get("feedback")
                .and_then(|feedback| feedback.as_str())
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

/// Groups calls by owner and computes per-user totals, keeping user order.
pub fn summarize_managers(users: Vec<UserRow>, calls: &[CallStatRow]) -> Vec<ManagerSummary> {
    let mut by_user: HashMap<Uuid, Vec<&CallStatRow>> = HashMap::new();
    for call in calls {
        by_user.entry(call.user_id).or_default().push(call);
    }

    users
        .into_iter()
        .map(|user| {
            let user_calls = by_user.get(&user.id).map(Vec::as_slice).unwrap_or_default();
            let total_calls = user_calls.len();
            let (avg_score, avg_duration) = if total_calls == 0 {
                (0, 0)
            } else {
                let score_sum: i64 = user_calls.iter().map(|c| i64::from(c.score.unwrap_or(0))).sum();
                let duration_sum: i64 = user_calls
                    .iter()
                    .map(|c| i64::from(c.duration_seconds.unwrap_or(0)))
                    .sum();
                let count = total_calls as f64;
                (
                    (score_sum as f64 / count * 10.0).round() as i32,
                    (duration_sum as f64 / count).round() as i64,
                )
            };

            ManagerSummary {
                id: user.id,
                avatar_url: avatar_url(user.telegram_username.as_deref(), user.id),
                name: user.name,
                total_calls,
                avg_score,
                avg_duration: format_clock(avg_duration),
                conversion_rate: "N/A".to_string(),
                role: Some(Role::from(user.role)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(score: Option<i32>, seconds: Option<i32>) -> CallRow {
        CallRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_seconds: seconds,
            transcript: None,
            score,
            mistakes: Some("1. Interrupted the client.".to_string()),
            recommendations: None,
            evaluation_json: None,
            user_name: None,
            telegram_username: None,
        }
    }

    #[test]
    fn rescales_scores_and_formats_duration() {
        let now = Local::now().naive_local();
        let record = call_record_from_row(row(Some(7), Some(125)), now);
        assert_eq!(record.score, 70);
        assert_eq!(record.duration_label, "02:05");
        assert!(record.display_date.starts_with("Today, "));

        let unscored = call_record_from_row(row(None, None), now);
        assert_eq!(unscored.score, 0);
        assert_eq!(unscored.duration_label, "00:00");
    }

    #[test]
    fn missing_user_and_text_fields_get_defaults() {
        let source = row(Some(10), Some(60));
        let user_id = source.user_id;
        let record = call_record_from_row(source, Local::now().naive_local());
        assert_eq!(record.manager_name, "Unknown");
        assert_eq!(record.avatar_url, format!("https://i.pravatar.cc/150?u={user_id}"));
        assert_eq!(record.transcript, "");
        assert_eq!(record.feedback, "");
        assert_eq!(record.mistakes, "1. Interrupted the client.");
        assert_eq!(record.score, 100);
    }

    #[test]
    fn older_calls_get_day_month_labels() {
        let mut source = row(Some(5), Some(60));
        source.started_at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let now = NaiveDateTime::parse_from_str("2026-03-10 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let record = call_record_from_row(source, now);
        assert!(record.display_date.starts_with("0"), "{}", record.display_date);
        assert!(record.display_date.contains(".01, "), "{}", record.display_date);
    }

    #[test]
    fn evaluation_criteria_become_blocks() {
        let payload = json!({
            "criteria": [
                {"name": "Greeting", "score": 8, "feedback": "Warm"},
                {"score": 6},
                {"name": "", "feedback": "Missing score"}
            ]
        });
        let blocks = evaluation_blocks(Some(&payload));
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].id, "block-0");
        assert_eq!(blocks[0].name, "Greeting");
        assert_eq!(blocks[0].feedback, "Warm");
        assert_eq!(blocks[1].name, "Criterion 2");
        assert_eq!(blocks[1].score, 6);
        assert_eq!(blocks[2].name, "Criterion 3");
        assert_eq!(blocks[2].score, 0);
        assert!(blocks.iter().all(|b| b.max_score == 10));

        assert!(evaluation_blocks(None).is_empty());
        assert!(evaluation_blocks(Some(&json!({"summary": "no criteria"}))).is_empty());
    }

    #[test]
    fn manager_summaries_average_raw_scores() {
        let active = Uuid::new_v4();
        let idle = Uuid::new_v4();
        let users = vec![
            UserRow {
                id: active,
                name: "Anna".to_string(),
                telegram_username: Some("anna".to_string()),
                role: "manager".to_string(),
            },
            UserRow {
                id: idle,
                name: "Ruzanna".to_string(),
                telegram_username: None,
                role: "rop".to_string(),
            },
        ];
        let calls = vec![
            CallStatRow { user_id: active, duration_seconds: Some(100), score: Some(7) },
            CallStatRow { user_id: active, duration_seconds: Some(125), score: Some(8) },
            CallStatRow { user_id: active, duration_seconds: None, score: None },
            CallStatRow { user_id: Uuid::new_v4(), duration_seconds: Some(10), score: Some(1) },
        ];

        let summaries = summarize_managers(users, &calls);
        assert_eq!(summaries.len(), 2);

        let anna = &summaries[0];
        assert_eq!(anna.total_calls, 3);
        // (7 + 8 + 0) / 3 * 10
        assert_eq!(anna.avg_score, 50);
        assert_eq!(anna.avg_duration, "01:15");
        assert_eq!(anna.avatar_url, "https://i.pravatar.cc/150?u=anna");
        assert_eq!(anna.role, Some(Role::Manager));

        let ruzanna = &summaries[1];
        assert_eq!(ruzanna.total_calls, 0);
        assert_eq!(ruzanna.avg_score, 0);
        assert_eq!(ruzanna.avg_duration, "00:00");
        assert_eq!(ruzanna.conversion_rate, "N/A");
        assert!(!ruzanna.is_line_manager());
    }

    #[test]
    fn seed_ids_differ_per_department() {
        let b2g = seed_call_id(Department::B2g, 3).unwrap();
        let b2b = seed_call_id(Department::B2b, 3).unwrap();
        assert_ne!(b2g, b2b);
    }
}
