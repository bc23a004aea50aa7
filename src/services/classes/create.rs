use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::config::AppConfig;
use crate::models::classes::requests::CreateClassRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_class_id;

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    mut class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    // 编号格式与年级一致性
    let (class_id, grade) = match validate_class_id(&class_data.id) {
        Ok(parsed) => parsed,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ClassCreationFailed, msg)));
        }
    };
    if grade != class_data.grade {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ClassCreationFailed,
            format!(
                "Class id {} does not belong to grade {}",
                class_id, class_data.grade
            ),
        )));
    }
    if !AppConfig::get().quota.supported_grades.contains(&grade) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ClassCreationFailed,
            format!("Unsupported grade: {grade}"),
        )));
    }
    class_data.id = class_id;
    class_data.name = class_data
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let storage = service.get_storage(request);

    match storage.create_class(class_data).await {
        Ok(class) => {
            info!("Class {} (grade {}) created", class.id, class.grade);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(class, "Class created successfully")))
        }
        Err(e) if e.is_unique_violation() => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ClassAlreadyExists, "Class already exists"),
        )),
        Err(e) => Ok(crate::services::error_response(
            &e,
            ErrorCode::ClassCreationFailed,
        )),
    }
}
