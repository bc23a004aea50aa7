use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, with_display_status};
use crate::models::assignments::{
    requests::{AssignmentListParams, AssignmentListQuery},
    responses::AssignmentListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_class_id;
use crate::workload::current_week_info;

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    params: AssignmentListParams,
) -> ActixResult<HttpResponse> {
    let mut query = AssignmentListQuery::from(params);

    // 班级编号大小写不敏感
    if let Some(class_id) = query.class_id.take() {
        match validate_class_id(&class_id) {
            Ok((class_id, _)) => query.class_id = Some(class_id),
            Err(msg) => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
            }
        }
    }

    let storage = service.get_storage(request);
    let current_week = current_week_info(chrono::Utc::now());

    match storage.list_assignments_with_pagination(query).await {
        Ok(page) => {
            let response = AssignmentListResponse {
                items: page
                    .items
                    .into_iter()
                    .map(|a| with_display_status(a, current_week))
                    .collect(),
                pagination: page.pagination,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Assignment list retrieved successfully",
            )))
        }
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::InternalServerError,
        )),
    }
}
