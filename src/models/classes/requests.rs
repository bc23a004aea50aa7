use serde::Deserialize;
use ts_rs::TS;

// 班级查询参数（来自HTTP请求）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassQueryParams {
    pub grade: Option<i32>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

// 创建班级请求
//
// id 必须以年级数字开头，例如 grade = 7 时 id 为 "7A"
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateClassRequest {
    pub id: String,
    pub grade: i32,
    pub name: Option<String>,
}

// 更新班级请求：仅允许改名与启停
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

// 班级周配额查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassQuotaParams {
    pub week_number: Option<i32>,
    pub year: Option<i32>,
}
