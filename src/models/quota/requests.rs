use serde::Deserialize;
use ts_rs::TS;

use crate::models::assignments::entities::AssignmentKind;

/// 布置前的配额预检请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct QuotaCheckRequest {
    pub class_ids: Vec<String>,
    pub kind: AssignmentKind,
    pub week_number: Option<i32>,
    pub year: Option<i32>,
}
