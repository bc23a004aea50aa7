use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, can_manage};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode};

pub async fn delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user id",
        )));
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

    if !can_manage(&assignment, user_id, RequireJWT::is_admin(request)) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AssignmentPermissionDenied,
            "You can only delete assignments you created",
        )));
    }

    match storage.delete_assignment(assignment_id).await {
        Ok(true) => {
            tracing::info!("Assignment {} deleted by user {}", assignment_id, user_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Assignment deleted successfully",
            )))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AssignmentNotFound,
            "Assignment not found",
        ))),
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::InternalServerError,
        )),
    }
}
