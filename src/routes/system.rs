use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::system::requests::{SettingAuditQuery, UpdateSettingRequest};
use crate::models::users::entities::UserRole;
use crate::services::SystemService;
use crate::utils::SafeSettingKey;

static SYSTEM_SERVICE: Lazy<SystemService> = Lazy::new(SystemService::new_lazy);

async fn get_settings() -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_settings().await
}

async fn get_admin_settings(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_admin_settings(&request).await
}

async fn update_setting(
    request: HttpRequest,
    key: SafeSettingKey,
    body: web::Json<UpdateSettingRequest>,
) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE
        .update_setting(&request, key.0, body.into_inner().value)
        .await
}

async fn get_setting_audits(
    request: HttpRequest,
    query: web::Query<SettingAuditQuery>,
) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE
        .get_setting_audits(&request, query.into_inner())
        .await
}

pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/system")
            .wrap(middleware::Compress::default())
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("/settings", web::get().to(get_settings))
                    .route("/admin/settings", web::get().to(get_admin_settings))
                    .route("/admin/settings/audits", web::get().to(get_setting_audits))
                    .route("/admin/settings/{key}", web::put().to(update_setting)),
            ),
    );
}
