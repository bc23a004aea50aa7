use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 班级（如 7A、8C），创建后仅可改名或停用
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    // 班级编号：年级 + 字母
    pub id: String,
    // 年级（7/8/9）
    pub grade: i32,
    // 显示名称
    pub name: String,
    // 是否启用
    pub is_active: bool,
    // 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
    // 更新时间
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
