use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, can_manage, create::quota_exceeded, with_display_status};
use crate::errors::LoadBoardError;
use crate::middlewares::RequireJWT;
use crate::models::assignments::{
    entities::AssignmentStatus, requests::UpdateAssignmentStatusRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::workload::{QuotaLimits, QuotaWrite, Transition, current_week_info, plan_transition};

pub async fn update_status(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    req: UpdateAssignmentStatusRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user id",
        )));
    };
    let is_admin = RequireJWT::is_admin(request);

    let target = match req.status.trim().parse::<AssignmentStatus>() {
        Ok(status) => status,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
        }
    };

    let storage = service.get_storage(request);

    let assignment = match storage.get_assignment_by_id(assignment_id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::AssignmentNotFound,
                "Assignment not found",
            )));
        }
        Err(e) => {
            return Ok(crate::services::error_response(
                &e,
                ErrorCode::AssignmentNotFound,
            ));
        }
    };

    if !can_manage(&assignment, user_id, is_admin) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AssignmentPermissionDenied,
            "You can only change assignments you created",
        )));
    }

    let current_week = current_week_info(chrono::Utc::now());
    let recheck = match plan_transition(assignment.status, target, is_admin) {
        Ok(Transition::Unchanged) => {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(
                with_display_status(assignment, current_week),
                "Status unchanged",
            )));
        }
        Ok(Transition::Apply) => None,
        Ok(Transition::Publish) => Some(QuotaLimits::resolve().await),
        Err(e @ LoadBoardError::Authorization(_)) => {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::AssignmentPermissionDenied,
                e.message(),
            )));
        }
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::InvalidStatusTransition,
                e.message(),
            )));
        }
    };

    let from = assignment.status;
    match storage
        .update_assignment_status(assignment_id, target, recheck)
        .await
    {
        Ok(QuotaWrite::Committed(updated)) => {
            info!(
                "Assignment {} status {} -> {} by user {}",
                assignment_id, from, target, user_id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                with_display_status(updated, current_week),
                "Assignment status updated successfully",
            )))
        }
        Ok(QuotaWrite::Rejected(violations)) => {
            info!(
                "Publishing assignment {} rejected, weekly quota full",
                assignment_id
            );
            Ok(quota_exceeded(violations))
        }
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::AssignmentNotFound,
        )),
    }
}
