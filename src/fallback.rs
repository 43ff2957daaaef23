//! Built-in placeholder dataset shown whenever live data is unavailable.
//!
//! The content is fixed so every failure path renders exactly the same
//! screen.

use uuid::Uuid;

use crate::models::{CallRecord, DashboardData, EvaluationBlock, ManagerSummary, Role};

struct PlaceholderManager {
    id: u128,
    name: &'static str,
    total_calls: usize,
    avg_score: i32,
    avg_duration: &'static str,
    role: Option<&'static str>,
}

const MANAGERS: [PlaceholderManager; 5] = [
    PlaceholderManager {
        id: 0x6f1c2a40_0000_4000_8000_000000000001,
        name: "Anna Sokolova",
        total_calls: 3,
        avg_score: 84,
        avg_duration: "04:12",
        role: Some("manager"),
    },
    PlaceholderManager {
        id: 0x6f1c2a40_0000_4000_8000_000000000002,
        name: "Dmitry Volkov",
        total_calls: 2,
        avg_score: 65,
        avg_duration: "03:05",
        role: Some("manager"),
    },
    PlaceholderManager {
        id: 0x6f1c2a40_0000_4000_8000_000000000003,
        name: "Igor Belov",
        total_calls: 2,
        avg_score: 35,
        avg_duration: "02:20",
        role: None,
    },
    PlaceholderManager {
        id: 0x6f1c2a40_0000_4000_8000_000000000004,
        name: "Ruzanna Avetisyan",
        total_calls: 1,
        avg_score: 90,
        avg_duration: "06:40",
        role: Some("rop"),
    },
    PlaceholderManager {
        id: 0x6f1c2a40_0000_4000_8000_000000000005,
        name: "System Admin",
        total_calls: 0,
        avg_score: 0,
        avg_duration: "00:00",
        role: Some("admin"),
    },
];

struct PlaceholderCall {
    id: u128,
    name: &'static str,
    duration: &'static str,
    date: &'static str,
    score: i32,
    transcript: &'static str,
    feedback: &'static str,
    mistakes: &'static str,
}

const CALLS: [PlaceholderCall; 8] = [
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000001,
        name: "Anna Sokolova",
        duration: "04:30",
        date: "Today, 10:15",
        score: 90,
        transcript: "Client: Hello, I saw your tender offer.\nManager: Good morning! Let me walk you through the terms.",
        feedback: "1. Keep summarising the next steps at the end of the call.",
        mistakes: "1. Pricing was mentioned before the needs were clear.",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000002,
        name: "Dmitry Volkov",
        duration: "03:10",
        date: "Today, 09:40",
        score: 70,
        transcript: "Client: We already have a supplier.\nManager: Understood, what would make you consider a second one?",
        feedback: "1. Good handling of the first objection.",
        mistakes: "1. No follow-up date was agreed.",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000003,
        name: "Igor Belov",
        duration: "02:05",
        date: "Yesterday, 16:20",
        score: 40,
        transcript: "Client: Send me an email.\nManager: Sure, goodbye.",
        feedback: "1. Ask a qualifying question before accepting the brush-off.",
        mistakes: "1. The call ended without discovering any need.",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000004,
        name: "Anna Sokolova",
        duration: "05:02",
        date: "Yesterday, 11:05",
        score: 80,
        transcript: "Client: What are the delivery times?\nManager: Two weeks for the standard package.",
        feedback: "1. Mention the express option proactively.",
        mistakes: "",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000005,
        name: "Ruzanna Avetisyan",
        duration: "06:40",
        date: "Yesterday, 10:00",
        score: 90,
        transcript: "Manager: Let's review the quarterly plan together.",
        feedback: "1. Reference call for the team.",
        mistakes: "",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000006,
        name: "Dmitry Volkov",
        duration: "03:00",
        date: "02.01, 15:30",
        score: 60,
        transcript: "Client: Call me next month.\nManager: I will, thank you.",
        feedback: "1. Pin down an exact date for the next call.",
        mistakes: "1. Too passive at the closing stage.",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000007,
        name: "Igor Belov",
        duration: "02:35",
        date: "01.01, 12:00",
        score: 30,
        transcript: "Client: Not interested.",
        feedback: "1. Work through the objection script.",
        mistakes: "1. Gave up after the first objection.",
    },
    PlaceholderCall {
        id: 0x0c5e7b10_0000_4000_8000_000000000008,
        name: "Anna Sokolova",
        duration: "03:04",
        date: "Today, 08:55",
        score: 0,
        transcript: "",
        feedback: "",
        mistakes: "",
    },
];

const CRITERIA: [&str; 3] = ["Greeting", "Needs discovery", "Closing"];

fn avatar_url(key: impl std::fmt::Display) -> String {
    format!("https://i.pravatar.cc/150?u={key}")
}

pub fn fallback_managers() -> Vec<ManagerSummary> {
    MANAGERS
        .iter()
        .map(|manager| ManagerSummary {
            id: Uuid::from_u128(manager.id),
            name: manager.name.to_string(),
            avatar_url: avatar_url(Uuid::from_u128(manager.id)),
            total_calls: manager.total_calls,
            avg_score: manager.avg_score,
            avg_duration: manager.avg_duration.to_string(),
            conversion_rate: "N/A".to_string(),
            role: manager.role.map(|role| Role::from(role.to_string())),
        })
        .collect()
}

pub fn fallback_calls() -> Vec<CallRecord> {
    CALLS
        .iter()
        .map(|call| {
            let blocks = if call.score > 0 {
                CRITERIA
                    .iter()
                    .enumerate()
                    .map(|(index, name)| EvaluationBlock {
                        id: format!("block-{index}"),
                        name: name.to_string(),
                        score: call.score / 10,
                        max_score: 10,
                        feedback: String::new(),
                    })
                    .collect()
            } else {
                Vec::new()
            };

            CallRecord {
                id: Uuid::from_u128(call.id),
                manager_name: call.name.to_string(),
                avatar_url: avatar_url(call.name.replace(' ', "_").to_lowercase()),
                duration_label: call.duration.to_string(),
                display_date: call.date.to_string(),
                score: call.score,
                audio_url: "#".to_string(),
                kommo_url: "#".to_string(),
                transcript: call.transcript.to_string(),
                feedback: call.feedback.to_string(),
                mistakes: call.mistakes.to_string(),
                blocks,
            }
        })
        .collect()
}

pub fn fallback_data() -> DashboardData {
    DashboardData {
        calls: fallback_calls(),
        managers: fallback_managers(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_is_stable_between_calls() {
        assert_eq!(fallback_data(), fallback_data());
    }

    #[test]
    fn calls_belong_to_known_managers() {
        let managers = fallback_managers();
        for call in fallback_calls() {
            assert!(managers.iter().any(|m| m.name == call.manager_name), "{}", call.manager_name);
            assert!((0..=100).contains(&call.score));
        }
    }
}
