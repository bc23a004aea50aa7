use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::requests::LoginRequest;
use crate::services::AuthService;

static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

async fn login(
    req: HttpRequest,
    user_data: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(user_data.into_inner(), &req).await
}

async fn refresh_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&request).await
}

async fn logout() -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout().await
}

async fn get_user(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.get_user(&request).await
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/login")
                    .wrap(middlewares::RateLimit::login())
                    .route(web::post().to(login)),
            )
            .route("/refresh", web::post().to(refresh_token))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/logout", web::post().to(logout))
                    .route("/me", web::get().to(get_user)),
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
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::password::hash_password;

    #[actix_web::test]
    async fn test_login_then_me() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
        storage
            .create_user(CreateUserRequest {
                username: "bu_dewi".into(),
                email: "dewi@sekolah.sch.id".into(),
                password: hash_password("Kelas7Ipa").unwrap(),
                role: UserRole::Teacher,
                display_name: Some("Dewi".into()),
            })
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache))
                .configure(configure_auth_routes),
        )
        .await;

        let login_as = |identifier: &str, password: &str| {
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .insert_header(("X-Forwarded-For", "192.0.2.71"))
                .set_json(json!({ "username": identifier, "password": password }))
                .to_request()
        };

        let resp = test::call_service(&app, login_as("bu_dewi", "salah-sandi")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // 邮箱同样可以登录
        let resp = test::call_service(&app, login_as("dewi@sekolah.sch.id", "Kelas7Ipa")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.response()
                .cookies()
                .any(|c| c.name() == "refresh_token" && !c.value().is_empty())
        );
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["user"]["role"], "teacher");
        let token = body["data"]["access_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["user"]["username"], "bu_dewi");
    }
}
