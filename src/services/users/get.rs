use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::ErrorCode;
use crate::models::users::responses::UserResponse;
use crate::services::lookup_response;

pub async fn get_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let found = service.get_storage(request).get_user_by_id(user_id).await;
    Ok(lookup_response(
        found.map(|user| user.map(|user| UserResponse { user })),
        ErrorCode::UserNotFound,
        "User",
    ))
}
