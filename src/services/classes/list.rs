use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::classes::requests::ClassQueryParams;
use crate::services::list_response;

/// 年级、启用状态筛选
pub async fn list_classes(
    service: &ClassService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ActixResult<HttpResponse> {
    let classes = service.get_storage(request).list_classes(query).await;
    Ok(list_response(classes, "Classes"))
}
