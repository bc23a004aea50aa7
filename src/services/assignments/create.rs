use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, with_display_status};
use crate::middlewares::RequireJWT;
use crate::models::assignments::{
    entities::AssignmentStatus,
    requests::{CreateAssignmentRequest, NewAssignment},
    responses::QuotaExceededResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::{validate_class_ids, validate_required_text};
use crate::workload::{QuotaLimits, QuotaWrite, WeekInfo, current_week_info};

const TITLE_MAX_CHARS: usize = 200;
const SUBJECT_MAX_CHARS: usize = 100;

fn invalid(code: ErrorCode, msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg))
}

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    req: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user id",
        )));
    };

    // 字段校验
    let title = match validate_required_text("title", &req.title, TITLE_MAX_CHARS) {
        Ok(title) => title,
        Err(msg) => return Ok(invalid(ErrorCode::ValidationFailed, msg)),
    };
    let subject = match validate_required_text("subject", &req.subject, SUBJECT_MAX_CHARS) {
        Ok(subject) => subject,
        Err(msg) => return Ok(invalid(ErrorCode::ValidationFailed, msg)),
    };
    let class_ids = match validate_class_ids(&req.class_ids) {
        Ok(ids) => ids,
        Err(msg) => return Ok(invalid(ErrorCode::ValidationFailed, msg)),
    };

    let now = chrono::Utc::now();
    let week = match WeekInfo::resolve(req.week_number, req.year, now) {
        Ok(week) => week,
        Err(e) => return Ok(invalid(ErrorCode::InvalidWeek, e.message())),
    };

    let storage = service.get_storage(request);

    // 目标班级必须存在且处于启用状态
    let classes = match storage.get_classes_by_ids(&class_ids).await {
        Ok(classes) => classes,
        Err(e) => {
            return Ok(crate::services::error_response(
                &e,
                ErrorCode::AssignmentCreationFailed,
            ));
        }
    };
    if let Some(missing) = class_ids
        .iter()
        .find(|id| !classes.iter().any(|class| &class.id == *id))
    {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            format!("Class {missing} not found"),
        )));
    }
    if let Some(inactive) = classes.iter().find(|class| !class.is_active) {
        return Ok(invalid(
            ErrorCode::ClassInactive,
            format!("Class {} is not active", inactive.id),
        ));
    }

    let status = if req.publish.unwrap_or(true) {
        AssignmentStatus::Published
    } else {
        AssignmentStatus::Draft
    };

    let new_assignment = NewAssignment {
        title,
        subject,
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        kind: req.kind,
        class_ids,
        week_number: week.week_number,
        year: week.year,
        status,
        created_by: user_id,
        due_date: req.due_date,
    };

    let limits = QuotaLimits::resolve().await;
    match storage.create_assignment(new_assignment, limits).await {
        Ok(QuotaWrite::Committed(assignment)) => {
            info!(
                "Assignment {} ({} {}) created by user {} for {:?} in {}-W{:02}",
                assignment.id,
                assignment.kind,
                assignment.status,
                user_id,
                assignment.class_ids,
                week.year,
                week.week_number
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                with_display_status(assignment, current_week_info(now)),
                "Assignment created successfully",
            )))
        }
        Ok(QuotaWrite::Rejected(violations)) => {
            info!(
                "Assignment by user {} rejected, weekly quota full for {:?}",
                user_id,
                violations.iter().map(|v| &v.class_id).collect::<Vec<_>>()
            );
            Ok(quota_exceeded(violations))
        }
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::AssignmentCreationFailed,
        )),
    }
}

/// 409：列出已满的班级
pub(crate) fn quota_exceeded(violations: Vec<crate::workload::QuotaViolation>) -> HttpResponse {
    let full = violations
        .iter()
        .map(|v| v.class_id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    HttpResponse::Conflict().json(ApiResponse::error(
        ErrorCode::QuotaExceeded,
        QuotaExceededResponse { violations },
        format!("Weekly quota exceeded for class: {full}"),
    ))
}
