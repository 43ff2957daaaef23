//! Dashboard screen state and the views derived from it.
//!
//! All changes go through [`reduce`]; everything shown on screen is
//! recomputed from the state and the loaded data by [`compute`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{best_by_count, best_by_score, department_dashboard, manager_detail};
use crate::fallback::{fallback_calls, fallback_managers};
use crate::filter::{filter_calls, recount_managers, DateRange, FilterState, Period};
use crate::models::{
    CallRecord, DashboardData, DashboardStats, Department, ManagerDetailStats, ManagerStat, ManagerSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    Daily,
    RealCalls,
    AiCalls,
}

/// Calendar selection that has not been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
    pub department: Department,
    pub view: View,
    pub score_filter: i32,
    pub pending_range: PendingRange,
    pub active_range: Option<DateRange>,
    pub search_text: String,
    pub dashboard_period: Period,
    pub manager_period: Period,
    pub manager_min_score: i32,
    pub selected_manager: Option<String>,
    pub selected_call: Option<Uuid>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            department: Department::B2g,
            view: View::Dashboard,
            score_filter: 80,
            pending_range: PendingRange::default(),
            active_range: None,
            search_text: String::new(),
            dashboard_period: Period::Day,
            manager_period: Period::Month,
            manager_min_score: 0,
            selected_manager: None,
            selected_call: None,
        }
    }
}

impl DashboardState {
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            date_range: self.active_range,
            min_score: self.score_filter,
            search_text: self.search_text.clone(),
        }
    }

    /// Call lists are only loaded for the call views.
    pub fn needs_fetch(&self) -> bool {
        match self.view {
            View::RealCalls | View::AiCalls => true,
            View::Dashboard | View::Daily => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    SelectDepartment(Department),
    SelectView(View),
    SetScoreFilter(i32),
    PickDate(NaiveDate),
    ApplyDateRange,
    ClearDateRange,
    SetSearch(String),
    SetDashboardPeriod(Period),
    SelectManager(String),
    CloseManager,
    SetManagerPeriod(Period),
    SetManagerMinScore(i32),
    SelectCall(Uuid),
    CloseCall,
}

pub fn reduce(state: DashboardState, action: Action) -> DashboardState {
    match action {
        Action::SelectDepartment(department) => DashboardState {
            department,
            selected_manager: None,
            selected_call: None,
            ..state
        },
        Action::SelectView(view) => DashboardState { view, ..state },
        Action::SetScoreFilter(score) => DashboardState {
            score_filter: score.clamp(0, 100),
            ..state
        },
        Action::PickDate(date) => DashboardState {
            pending_range: pick_date(state.pending_range, date),
            ..state
        },
        Action::ApplyDateRange => match state.pending_range {
            PendingRange {
                start: Some(start),
                end: Some(end),
            } => DashboardState {
                active_range: Some(DateRange { start, end }),
                ..state
            },
            _ => state,
        },
        Action::ClearDateRange => DashboardState {
            pending_range: PendingRange::default(),
            active_range: None,
            ..state
        },
        Action::SetSearch(search_text) => DashboardState { search_text, ..state },
        Action::SetDashboardPeriod(dashboard_period) => DashboardState {
            dashboard_period,
            ..state
        },
        Action::SelectManager(name) => DashboardState {
            selected_manager: Some(name),
            ..state
        },
        Action::CloseManager => DashboardState {
            selected_manager: None,
            ..state
        },
        Action::SetManagerPeriod(manager_period) => DashboardState {
            manager_period,
            ..state
        },
        Action::SetManagerMinScore(score) => DashboardState {
            manager_min_score: score.clamp(0, 100),
            ..state
        },
        Action::SelectCall(id) => DashboardState {
            selected_call: Some(id),
            ..state
        },
        Action::CloseCall => DashboardState {
            selected_call: None,
            ..state
        },
    }
}

/// First pick starts a range, a later pick closes it, an earlier pick
/// becomes the new start. A pick after a complete range starts over.
fn pick_date(pending: PendingRange, date: NaiveDate) -> PendingRange {
    match pending {
        PendingRange {
            start: Some(start),
            end: None,
        } if date >= start => PendingRange {
            start: Some(start),
            end: Some(date),
        },
        PendingRange {
            start: Some(start),
            end: None,
        } => PendingRange {
            start: Some(date),
            end: Some(start),
        },
        _ => PendingRange {
            start: Some(date),
            end: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerDetailView {
    pub name: String,
    pub calls: Vec<CallRecord>,
    pub stats: ManagerDetailStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub calls: Vec<CallRecord>,
    pub managers: Vec<ManagerSummary>,
    pub dashboard: DashboardStats,
    pub best_by_score: Option<ManagerStat>,
    pub best_by_count: Option<ManagerStat>,
    pub manager_detail: Option<ManagerDetailView>,
    pub selected_call: Option<CallRecord>,
}

/// Collections fall back to the placeholder set individually while empty.
pub fn effective_data(data: &DashboardData) -> (Vec<CallRecord>, Vec<ManagerSummary>) {
    let calls = if data.calls.is_empty() {
        fallback_calls()
    } else {
        data.calls.clone()
    };
    let managers = if data.managers.is_empty() {
        fallback_managers()
    } else {
        data.managers.clone()
    };
    (calls, managers)
}

pub fn compute(state: &DashboardState, data: &DashboardData, now: NaiveDateTime) -> DashboardView {
    let (all_calls, all_managers) = effective_data(data);

    let calls = filter_calls(&all_calls, &state.filter_state(), now);
    let managers = recount_managers(&all_managers, &calls);
    let dashboard = department_dashboard(&all_calls, &all_managers, state.dashboard_period, now);

    let manager_detail = state.selected_manager.as_ref().map(|name| {
        let (calls, stats) = manager_detail(
            &all_calls,
            name,
            state.manager_period,
            state.manager_min_score,
            now,
        );
        ManagerDetailView {
            name: name.clone(),
            calls,
            stats,
        }
    });

    let selected_call = state
        .selected_call
        .and_then(|id| all_calls.iter().find(|call| call.id == id).cloned());

    DashboardView {
        best_by_score: best_by_score(&dashboard).cloned(),
        best_by_count: best_by_count(&dashboard).cloned(),
        calls,
        managers,
        dashboard,
        manager_detail,
        selected_call,
    }
}
