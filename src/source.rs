use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db;
use crate::error::FetchError;
use crate::fallback::fallback_data;
use crate::models::{CallRecord, DashboardData, Department, ManagerSummary};
use crate::state::DashboardState;

/// Wire shape of every `/api/calls` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<T, FetchError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(FetchError::Rejected("response carried no data".to_string())),
            (false, _) => Err(FetchError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

/// Somewhere calls and manager summaries of a department can be read from.
#[async_trait]
pub trait CallSource: Send + Sync {
    async fn fetch_calls(&self, department: Department) -> Result<Vec<CallRecord>, FetchError>;

    async fn fetch_managers(&self, department: Department) -> Result<Vec<ManagerSummary>, FetchError>;
}

pub struct PgCallSource {
    pool: PgPool,
}

impl PgCallSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallSource for PgCallSource {
    async fn fetch_calls(&self, department: Department) -> Result<Vec<CallRecord>, FetchError> {
        Ok(db::fetch_calls(&self.pool, department).await?)
    }

    async fn fetch_managers(&self, department: Department) -> Result<Vec<ManagerSummary>, FetchError> {
        Ok(db::fetch_manager_stats(&self.pool, department).await?)
    }
}

/// Reads from a running dashboard server's `/api/calls` endpoint.
pub struct HttpCallSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCallSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T>(&self, department: Department, kind: &str) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(format!("{}/api/calls", self.base_url))
            .query(&[("department", department.as_str()), ("type", kind)])
            .send()
            .await?;
        let status = response.status();

        match response.json::<Envelope<T>>().await {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(FetchError::Status(status.as_u16())),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl CallSource for HttpCallSource {
    async fn fetch_calls(&self, department: Department) -> Result<Vec<CallRecord>, FetchError> {
        self.get(department, "calls").await
    }

    async fn fetch_managers(&self, department: Department) -> Result<Vec<ManagerSummary>, FetchError> {
        self.get(department, "managers").await
    }
}

/// Fetches calls and managers together; either failure fails both.
pub async fn fetch_dashboard_data<S>(source: &S, department: Department) -> Result<DashboardData, FetchError>
where
    S: CallSource + ?Sized,
{
    let (calls, managers) = tokio::try_join!(
        source.fetch_calls(department),
        source.fetch_managers(department)
    )?;
    Ok(DashboardData { calls, managers })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub data: DashboardData,
    pub origin: DataOrigin,
}

/// Swaps any fetch failure for the built-in dataset. Live and placeholder
/// data are never mixed.
pub fn or_fallback(result: Result<DashboardData, FetchError>, department: Department) -> LoadedData {
    match result {
        Ok(data) => LoadedData {
            data,
            origin: DataOrigin::Live,
        },
        Err(err) => {
            tracing::warn!(%department, error = %err, "falling back to placeholder data");
            LoadedData {
                data: fallback_data(),
                origin: DataOrigin::Fallback,
            }
        }
    }
}

pub async fn load_dashboard_data<S>(source: &S, department: Department) -> LoadedData
where
    S: CallSource + ?Sized,
{
    or_fallback(fetch_dashboard_data(source, department).await, department)
}

/// Loads the screen's department only when its view shows call lists.
pub async fn load_for_screen<S>(source: &S, screen: &DashboardState) -> LoadedData
where
    S: CallSource + ?Sized,
{
    if !screen.needs_fetch() {
        return LoadedData {
            data: DashboardData {
                calls: Vec::new(),
                managers: Vec::new(),
            },
            origin: DataOrigin::Live,
        };
    }
    load_dashboard_data(source, screen.department).await
}
