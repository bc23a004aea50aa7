use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RateLimit, RequireJWT, RequireRole};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, UpdateUserRequest, UserListParams};
use crate::services::UserService;
use crate::utils::SafeIDI64;

static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

async fn create_user(
    req: HttpRequest,
    body: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(body.into_inner(), &req).await
}

async fn get_user(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(id.0, &req).await
}

async fn update_user(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.update_user(id.0, body.into_inner(), &req).await
}

async fn delete_user(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.delete_user(id.0, &req).await
}

/// 账号管理，仅管理员可用
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(RequireRole::new_any(UserRole::admin_roles()))
            .wrap(RateLimit::api())
            .wrap(RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_users))
                    .route(web::post().to(create_user)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_user))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    use crate::cache::{ObjectCache, object_cache::moka::MokaCacheWrapper};
    use crate::models::ErrorCode;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::test_support::seed_teacher;
    use crate::utils::jwt::JwtUtils;

    fn bearer(user_id: i64, role: &str) -> (&'static str, String) {
        let token = JwtUtils::generate_token_pair(
            user_id,
            role,
            chrono::Duration::minutes(5),
            chrono::Duration::days(1),
        )
        .unwrap()
        .access_token;
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_admin_only_account_management() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
        let teacher = seed_teacher(storage.as_ref(), "pak_joko").await;
        let admin = storage
            .create_user(CreateUserRequest {
                username: "tata_usaha".into(),
                email: "tu@sekolah.sch.id".into(),
                password: "not-a-real-hash".into(),
                role: UserRole::Admin,
                display_name: None,
            })
            .await
            .unwrap()
            .id;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(cache))
                .configure(configure_user_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/users")
            .insert_header(bearer(teacher, "teacher"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(bearer(admin, "admin"))
            .set_json(json!({
                "username": "bu_rina",
                "email": "rina@sekolah.sch.id",
                "password": "Kelas9Bahasa",
                "role": "teacher",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["user"]["username"], "bu_rina");

        // 同名账号
        let req = test::TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(bearer(admin, "admin"))
            .set_json(json!({
                "username": "pak_joko",
                "email": "joko2@sekolah.sch.id",
                "password": "Kelas9Bahasa",
                "role": "teacher",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/users/{admin}"))
            .insert_header(bearer(admin, "admin"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CanNotDeleteCurrentUser as i32);
    }
}
