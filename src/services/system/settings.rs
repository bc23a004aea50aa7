use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{DynamicConfig, SystemService};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    system::{
        entities::KnownSettingKey,
        requests::SettingAuditQuery,
        responses::{AdminSettingsListResponse, SettingResponse, SystemSettingsResponse},
    },
};
use crate::workload::QuotaLimits;

/// 获取公开系统设置（只读）
pub async fn get_settings(service: &SystemService) -> ActixResult<HttpResponse> {
    let config = service.get_config();
    let limits = QuotaLimits::resolve().await;

    let response = SystemSettingsResponse {
        system_name: DynamicConfig::system_name().await,
        task_max_per_week: limits.task_max,
        exam_max_per_week: limits.exam_max,
        supported_grades: config.quota.supported_grades.clone(),
        environment: config.app.environment.clone(),
        log_level: config.app.log_level.clone(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Settings retrieved successfully",
    )))
}

/// 获取所有管理员配置
pub async fn get_admin_settings(
    service: &SystemService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).list_all_settings().await {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AdminSettingsListResponse { settings },
            "Admin settings retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::InternalServerError,
        )),
    }
}

/// 更新单个配置
pub async fn update_setting(
    service: &SystemService,
    request: &HttpRequest,
    key: KnownSettingKey,
    value: String,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user id",
        )));
    };

    let value = match key.validate_value(&value) {
        Ok(value) => value,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::SettingInvalid, msg)));
        }
    };

    let storage = service.get_storage(request);

    // 值未变化时不写审计
    match storage.get_setting_by_key(key.as_str()).await {
        Ok(Some(current)) if current.value == value => {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(
                SettingResponse { setting: current },
                "Setting unchanged",
            )));
        }
        Ok(_) => {}
        Err(e) => return Ok(crate::services::error_response(&e, ErrorCode::SettingNotFound)),
    }

    // 获取客户端 IP
    let ip_address = request
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    let setting = match storage
        .update_setting(key.as_str(), &value, user_id, ip_address)
        .await
    {
        Ok(setting) => setting,
        Err(e) => return Ok(crate::services::error_response(&e, ErrorCode::SettingNotFound)),
    };

    // 更新缓存，配额上限随即生效
    DynamicConfig::update(key.as_str(), &value).await;
    info!("Setting {} changed to {} by user {}", key.as_str(), value, user_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SettingResponse { setting },
        "Setting updated successfully",
    )))
}

/// 获取审计日志
pub async fn get_setting_audits(
    service: &SystemService,
    request: &HttpRequest,
    query: SettingAuditQuery,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).list_setting_audits(query).await {
        Ok(audits) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            audits,
            "Setting audits retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::InternalServerError,
        )),
    }
}
