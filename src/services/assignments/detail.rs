use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, with_display_status};
use crate::models::ErrorCode;
use crate::services::lookup_response;
use crate::workload::current_week_info;

/// 详情里的 status 按当前周投影
pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let week = current_week_info(chrono::Utc::now());
    let found = service
        .get_storage(request)
        .get_assignment_by_id(assignment_id)
        .await
        .map(|a| a.map(|a| with_display_status(a, week)));
    Ok(lookup_response(found, ErrorCode::AssignmentNotFound, "Assignment"))
}
