use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::QuotaService;
use crate::models::quota::{requests::QuotaCheckRequest, responses::QuotaCheckResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_class_ids;
use crate::workload::{QuotaLedger, QuotaLimits, WeekInfo};

pub async fn check_quota(
    service: &QuotaService,
    request: &HttpRequest,
    req: QuotaCheckRequest,
) -> ActixResult<HttpResponse> {
    let class_ids = match validate_class_ids(&req.class_ids) {
        Ok(ids) => ids,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
        }
    };
    let week = match WeekInfo::resolve(req.week_number, req.year, chrono::Utc::now()) {
        Ok(week) => week,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::InvalidWeek, e.message())));
        }
    };

    let ledger = QuotaLedger::new(service.get_storage(request), QuotaLimits::resolve().await);
    let check = ledger.check_quota(&class_ids, week, req.kind).await;

    let response = QuotaCheckResponse {
        week,
        kind: req.kind,
        available: check.all_available(),
        classes: check.usage,
        degraded: check.degraded,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Quota checked successfully",
    )))
}
