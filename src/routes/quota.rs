use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::quota::requests::QuotaCheckRequest;
use crate::services::QuotaService;

static QUOTA_SERVICE: Lazy<QuotaService> = Lazy::new(QuotaService::new_lazy);

async fn current_week() -> ActixResult<HttpResponse> {
    QUOTA_SERVICE.current_week().await
}

async fn check_quota(
    req: HttpRequest,
    body: web::Json<QuotaCheckRequest>,
) -> ActixResult<HttpResponse> {
    QUOTA_SERVICE.check_quota(&req, body.into_inner()).await
}

pub fn configure_quota_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/quota")
            .wrap(middlewares::RequireJWT)
            .route("/week", web::get().to(current_week))
            .route("/check", web::post().to(check_quota)),
    );
}
