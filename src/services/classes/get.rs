use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::ErrorCode;
use crate::services::lookup_response;

pub async fn get_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: String,
) -> ActixResult<HttpResponse> {
    let found = service.get_storage(request).get_class_by_id(&class_id).await;
    Ok(lookup_response(found, ErrorCode::ClassNotFound, "Class"))
}
