use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use super::ClassService;
use crate::models::classes::{
    entities::Class, requests::ClassQuotaParams, responses::ClassQuotaResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_class_id;
use crate::workload::{QuotaLedger, QuotaLimits, WeekInfo, WeeklyQuota};

/// 存储不可用时用路径中的编号拼出的班级
fn placeholder_class(class_id: &str) -> Class {
    let grade = validate_class_id(class_id).map_or(0, |(_, grade)| grade);
    let now = chrono::Utc::now();
    Class {
        id: class_id.to_string(),
        grade,
        name: class_id.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub async fn get_class_quota(
    service: &ClassService,
    request: &HttpRequest,
    class_id: String,
    params: ClassQuotaParams,
) -> ActixResult<HttpResponse> {
    let week = match WeekInfo::resolve(params.week_number, params.year, chrono::Utc::now()) {
        Ok(week) => week,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::InvalidWeek, e.message())));
        }
    };

    let storage = service.get_storage(request);
    let limits = QuotaLimits::resolve().await;

    let (class, quota, degraded) = match storage.get_class_by_id(&class_id).await {
        Ok(Some(class)) => {
            let ledger = QuotaLedger::new(storage, limits);
            let (quota, degraded) = ledger.weekly_quota(&class.id, week).await;
            (class, quota, degraded)
        }
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ClassNotFound,
                "Class not found",
            )));
        }
        Err(e) => {
            warn!("查询班级 {} 失败，返回默认配额: {}", class_id, e);
            (placeholder_class(&class_id), WeeklyQuota::new(0, 0, limits), true)
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ClassQuotaResponse {
            class,
            week,
            quota,
            degraded,
        },
        "Class quota retrieved successfully",
    )))
}
