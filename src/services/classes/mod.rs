pub mod create;
pub mod get;
pub mod list;
pub mod quota;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::classes::requests::{
    ClassQueryParams, ClassQuotaParams, CreateClassRequest, UpdateClassRequest,
};

request_scoped_service!(ClassService);

impl ClassService {
    // 获取班级列表
    pub async fn list_classes(
        &self,
        request: &HttpRequest,
        query: ClassQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_classes(self, request, query).await
    }

    pub async fn create_class(
        &self,
        req: &HttpRequest,
        class_data: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_class(self, req, class_data).await
    }

    // 根据班级编号获取班级信息
    pub async fn get_class(
        &self,
        req: &HttpRequest,
        class_id: String,
    ) -> ActixResult<HttpResponse> {
        get::get_class(self, req, class_id).await
    }

    // 改名或启停班级
    pub async fn update_class(
        &self,
        req: &HttpRequest,
        class_id: String,
        update_data: UpdateClassRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_class(self, req, class_id, update_data).await
    }

    // 班级某周的配额快照
    pub async fn get_class_quota(
        &self,
        req: &HttpRequest,
        class_id: String,
        params: ClassQuotaParams,
    ) -> ActixResult<HttpResponse> {
        quota::get_class_quota(self, req, class_id, params).await
    }
}
