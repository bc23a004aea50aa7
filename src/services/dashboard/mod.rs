pub mod load;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::dashboard::requests::DashboardQuery;

request_scoped_service!(DashboardService);

impl DashboardService {
    // 年级负荷看板
    pub async fn get_load(
        &self,
        request: &HttpRequest,
        query: DashboardQuery,
    ) -> ActixResult<HttpResponse> {
        load::get_load(self, request, query).await
    }
}
