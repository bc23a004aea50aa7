use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::models::{ApiResponse, ErrorCode, classes::requests::UpdateClassRequest};

pub async fn update_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: String,
    mut update_data: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    if let Some(name) = update_data.name.take() {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ClassUpdateFailed,
                "Class name must not be empty",
            )));
        }
        update_data.name = Some(name);
    }

    let storage = service.get_storage(request);

    match storage.update_class(&class_id, update_data).await {
        Ok(Some(class)) => {
            info!(
                "Class {} updated (name: {}, active: {})",
                class.id, class.name, class.is_active
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                class,
                "Class updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            "Class not found",
        ))),
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::ClassUpdateFailed,
        )),
    }
}
