pub mod settings;
pub mod settings_cache;

pub use settings_cache::DynamicConfig;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::AppConfig;
use crate::models::system::{entities::KnownSettingKey, requests::SettingAuditQuery};

request_scoped_service!(SystemService);

impl SystemService {
    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 公开设置（含配额上限）
    pub async fn get_settings(&self) -> ActixResult<HttpResponse> {
        settings::get_settings(self).await
    }

    // 全部设置项
    pub async fn get_admin_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_admin_settings(self, request).await
    }

    // 修改单个设置并记录审计
    pub async fn update_setting(
        &self,
        request: &HttpRequest,
        key: KnownSettingKey,
        value: String,
    ) -> ActixResult<HttpResponse> {
        settings::update_setting(self, request, key, value).await
    }

    // 审计日志
    pub async fn get_setting_audits(
        &self,
        request: &HttpRequest,
        query: SettingAuditQuery,
    ) -> ActixResult<HttpResponse> {
        settings::get_setting_audits(self, request, query).await
    }
}
