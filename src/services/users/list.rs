use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::users::requests::{UserListParams, UserListQuery};
use crate::services::list_response;

pub async fn list_users(
    service: &UserService,
    query: UserListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let page = service
        .get_storage(request)
        .list_users_with_pagination(UserListQuery::from(query))
        .await;
    Ok(list_response(page, "Users"))
}
