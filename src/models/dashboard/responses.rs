use serde::Serialize;
use ts_rs::TS;

use crate::workload::{DashboardOverview, GradeSummary, WeekInfo};

/// 年级负荷看板
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardResponse {
    pub week: WeekInfo,
    pub overview: DashboardOverview,
    pub grades: Vec<GradeSummary>,
    pub degraded: bool,
}
