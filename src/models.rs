use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Business unit owning a separate set of user and call tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    /// State clients.
    B2g,
    /// Commercial clients.
    B2b,
}

impl Department {
    /// Anything other than `b2g` is routed to the commercial department,
    /// and a missing value means `b2g`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            None | Some("b2g") => Department::B2g,
            Some(_) => Department::B2b,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::B2g => "b2g",
            Department::B2b => "b2b",
        }
    }

    /// Prefix of the table family holding this department's data.
    pub fn table_prefix(&self) -> &'static str {
        match self {
            Department::B2g => "r1",
            Department::B2b => "d1",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Manager,
    Rop,
    Admin,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "manager" => Role::Manager,
            "rop" => Role::Rop,
            "admin" => Role::Admin,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Manager => "manager".to_string(),
            Role::Rop => "rop".to_string(),
            Role::Admin => "admin".to_string(),
            Role::Other(value) => value,
        }
    }
}

/// One scored criterion of an AI evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationBlock {
    pub id: String,
    pub name: String,
    pub score: i32,
    pub max_score: i32,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: Uuid,
    #[serde(rename = "name")]
    pub manager_name: String,
    pub avatar_url: String,
    #[serde(rename = "callDuration")]
    pub duration_label: String,
    #[serde(rename = "date")]
    pub display_date: String,
    /// Percentage in `[0, 100]`.
    pub score: i32,
    pub audio_url: String,
    pub kommo_url: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default, rename = "aiFeedback")]
    pub feedback: String,
    #[serde(default, rename = "summary")]
    pub mistakes: String,
    #[serde(default)]
    pub blocks: Vec<EvaluationBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: String,
    pub total_calls: usize,
    pub avg_score: i32,
    pub avg_duration: String,
    pub conversion_rate: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl ManagerSummary {
    /// Only plain managers (or rows without a role) take part in
    /// department-wide dashboards.
    pub fn is_line_manager(&self) -> bool {
        matches!(self.role, None | Some(Role::Manager))
    }
}

/// Per-manager slice of a department dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStat {
    pub name: String,
    pub avg_score: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub avg_score: i32,
    pub total_calls: usize,
    pub per_manager: Vec<ManagerStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDetailStats {
    pub total_calls: usize,
    pub avg_score: i32,
    pub total_duration: String,
    pub filtered_calls: usize,
}

/// Both collections a dashboard view is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub calls: Vec<CallRecord>,
    pub managers: Vec<ManagerSummary>,
}
