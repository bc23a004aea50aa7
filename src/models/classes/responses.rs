use super::entities::Class;
use crate::workload::{WeekInfo, WeeklyQuota};
use serde::Serialize;
use ts_rs::TS;

// 班级列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassListResponse {
    pub items: Vec<Class>,
}

// 班级周配额响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassQuotaResponse {
    pub class: Class,
    pub week: WeekInfo,
    pub quota: WeeklyQuota,
    pub degraded: bool,
}
