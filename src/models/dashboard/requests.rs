use serde::Deserialize;
use ts_rs::TS;

/// 看板查询参数，未指定周时取当前周
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardQuery {
    pub grade: Option<i32>,
    pub week_number: Option<i32>,
    pub year: Option<i32>,
}
