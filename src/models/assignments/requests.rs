use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::{AssignmentKind, AssignmentStatus};
use crate::models::common::PaginationQuery;

/// 创建任务请求
///
/// 未指定 week_number / year 时落在当前 ISO 周
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub kind: AssignmentKind,
    pub class_ids: Vec<String>,
    pub week_number: Option<i32>,
    pub year: Option<i32>,
    pub due_date: Option<DateTime<Utc>>, // ISO 8601 格式
    // 默认直接发布；为 false 时保存为草稿，不占用配额
    pub publish: Option<bool>,
}

/// 更新任务状态请求
///
/// status 以字符串接收，便于返回字段级校验错误
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct UpdateAssignmentStatusRequest {
    pub status: String,
}

/// 任务列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub class_id: Option<String>,
    pub kind: Option<AssignmentKind>,
    pub status: Option<AssignmentStatus>,
    pub week_number: Option<i32>,
    pub year: Option<i32>,
    pub created_by: Option<i64>,
    pub search: Option<String>,
}

// 用于存储层的内部查询参数
#[derive(Debug, Clone, Default)]
pub struct AssignmentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub class_id: Option<String>,
    pub kind: Option<AssignmentKind>,
    pub status: Option<AssignmentStatus>,
    pub week_number: Option<i32>,
    pub year: Option<i32>,
    pub created_by: Option<i64>,
    pub search: Option<String>,
}

impl From<AssignmentListParams> for AssignmentListQuery {
    fn from(params: AssignmentListParams) -> Self {
        Self {
            page: params.pagination.page,
            size: params.pagination.size,
            class_id: params.class_id,
            kind: params.kind,
            status: params.status,
            week_number: params.week_number,
            year: params.year,
            created_by: params.created_by,
            search: params.search,
        }
    }
}

// 存储层写入用的新任务（已完成校验，周已确定）
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub kind: AssignmentKind,
    pub class_ids: Vec<String>,
    pub week_number: i32,
    pub year: i32,
    pub status: AssignmentStatus,
    pub created_by: i64,
    pub due_date: Option<DateTime<Utc>>,
}
