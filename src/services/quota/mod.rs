pub mod check;
pub mod week;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::quota::requests::QuotaCheckRequest;

request_scoped_service!(QuotaService);

impl QuotaService {
    // 当前 ISO 周
    pub async fn current_week(&self) -> ActixResult<HttpResponse> {
        week::current_week().await
    }

    // 布置前配额预检
    pub async fn check_quota(
        &self,
        request: &HttpRequest,
        req: QuotaCheckRequest,
    ) -> ActixResult<HttpResponse> {
        check::check_quota(self, request, req).await
    }
}
