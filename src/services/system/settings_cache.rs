//! 后台可改设置的内存副本
//!
//! 启动时从 system_settings 整表载入，管理员修改后逐项覆盖。
//! 读取时值缺失或无法解析，一律回退到静态配置。

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::models::system::entities::KnownSettingKey;

static SETTINGS: Lazy<RwLock<HashMap<String, String>>> = Lazy::new(Default::default);

pub struct DynamicConfig;

impl DynamicConfig {
    /// 整表替换
    pub async fn init(settings: Vec<(String, String)>) {
        let mut guard = SETTINGS.write().await;
        *guard = settings.into_iter().collect();
        tracing::info!("Loaded {} dynamic settings", guard.len());
    }

    pub async fn update(key: &str, value: &str) {
        SETTINGS
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        tracing::debug!("Dynamic setting {} = {}", key, value);
    }

    async fn raw(key: KnownSettingKey) -> Option<String> {
        SETTINGS.read().await.get(key.as_str()).cloned()
    }

    async fn parsed<T: FromStr>(key: KnownSettingKey) -> Option<T> {
        Self::raw(key).await?.trim().parse().ok()
    }

    async fn json<T: DeserializeOwned>(key: KnownSettingKey) -> Option<T> {
        serde_json::from_str(&Self::raw(key).await?).ok()
    }

    pub async fn system_name() -> String {
        Self::raw(KnownSettingKey::SystemName)
            .await
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| AppConfig::get().app.system_name.clone())
    }

    /// 分钟
    pub async fn access_token_expiry() -> i64 {
        Self::parsed(KnownSettingKey::AccessTokenExpiry)
            .await
            .unwrap_or(AppConfig::get().jwt.access_token_expiry)
    }

    /// 天
    pub async fn refresh_token_expiry() -> i64 {
        Self::parsed(KnownSettingKey::RefreshTokenExpiry)
            .await
            .unwrap_or(AppConfig::get().jwt.refresh_token_expiry)
    }

    pub async fn quota_task_max() -> i64 {
        Self::parsed::<i64>(KnownSettingKey::QuotaTaskMax)
            .await
            .filter(|v| *v >= 0)
            .unwrap_or(AppConfig::get().quota.task_max)
    }

    pub async fn quota_exam_max() -> i64 {
        Self::parsed::<i64>(KnownSettingKey::QuotaExamMax)
            .await
            .filter(|v| *v >= 0)
            .unwrap_or(AppConfig::get().quota.exam_max)
    }

    pub async fn cors_allowed_origins() -> Vec<String> {
        Self::json(KnownSettingKey::CorsAllowedOrigins)
            .await
            .unwrap_or_else(|| AppConfig::get().cors.allowed_origins.clone())
    }

    /// 秒
    pub async fn cors_max_age() -> usize {
        Self::parsed(KnownSettingKey::CorsMaxAge)
            .await
            .unwrap_or(AppConfig::get().cors.max_age)
    }
}
