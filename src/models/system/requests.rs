use serde::Deserialize;
use ts_rs::TS;

/// 更新配置请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct UpdateSettingRequest {
    pub value: String,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SettingAuditQuery {
    pub key: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}
