use serde::Serialize;
use ts_rs::TS;

use super::entities::{Assignment, DisplayStatus};
use crate::models::common::PaginationInfo;
use crate::workload::QuotaViolation;

/// 任务详情（附带按当前周推导的展示状态）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub display_status: DisplayStatus,
}

/// 任务列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentListResponse {
    pub items: Vec<AssignmentResponse>,
    pub pagination: PaginationInfo,
}

/// 配额不足时返回的班级明细
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct QuotaExceededResponse {
    pub violations: Vec<QuotaViolation>,
}
