use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::models::assignments::entities::AssignmentKind;
use crate::workload::{QuotaUsage, WeekInfo};

/// 当前 ISO 周信息
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct WeekInfoResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub week: WeekInfo,
    pub start_date: chrono::NaiveDate, // 周一
    pub end_date: chrono::NaiveDate,   // 周日
}

/// 配额预检结果，按班级列出已用 / 上限
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct QuotaCheckResponse {
    pub week: WeekInfo,
    pub kind: AssignmentKind,
    pub classes: BTreeMap<String, QuotaUsage>,
    // 所有班级均有剩余名额
    pub available: bool,
    // 存储不可用时返回默认值
    pub degraded: bool,
}
