use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::classes::requests::{
    ClassQueryParams, ClassQuotaParams, CreateClassRequest, UpdateClassRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::ClassService;
use crate::utils::SafeClassId;

static CLASS_SERVICE: Lazy<ClassService> = Lazy::new(ClassService::new_lazy);

async fn list_classes(
    req: HttpRequest,
    query: web::Query<ClassQueryParams>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_classes(&req, query.into_inner()).await
}

async fn create_class(
    req: HttpRequest,
    class_data: web::Json<CreateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .create_class(&req, class_data.into_inner())
        .await
}

async fn get_class(req: HttpRequest, class_id: SafeClassId) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.get_class(&req, class_id.0).await
}

async fn update_class(
    req: HttpRequest,
    class_id: SafeClassId,
    update_data: web::Json<UpdateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .update_class(&req, class_id.0, update_data.into_inner())
        .await
}

async fn get_class_quota(
    req: HttpRequest,
    class_id: SafeClassId,
    query: web::Query<ClassQuotaParams>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .get_class_quota(&req, class_id.0, query.into_inner())
        .await
}

pub fn configure_classes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(web::get().to(list_classes)).route(
                    web::post()
                        .to(create_class)
                        // 班级名册由管理员维护
                        .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                ),
            )
            .service(web::resource("/{class_id}/quota").route(web::get().to(get_class_quota)))
            .service(
                web::resource("/{class_id}")
                    .route(web::get().to(get_class))
                    .route(
                        web::put()
                            .to(update_class)
                            // 仅管理员可改名或停用班级
                            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    use crate::models::ErrorCode;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    #[actix_web::test]
    async fn test_quota_snapshot_degrades_without_store() {
        let storage: Arc<dyn Storage> =
            Arc::new(SeaOrmStorage::new_unmigrated_in_memory().await.unwrap());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .route("/classes/{class_id}/quota", web::get().to(get_class_quota)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/classes/8b/quota?week_number=10&year=2025")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let data = &body["data"];
        assert_eq!(data["degraded"], true);
        assert_eq!(data["class"]["id"], "8B");
        assert_eq!(data["class"]["grade"], 8);
        assert_eq!(data["quota"]["tasks_used"], 0);
        assert_eq!(data["quota"]["task_max"], 2);
        assert_eq!(data["quota"]["exam_max"], 2);
    }

    #[actix_web::test]
    async fn test_create_rejects_unsupported_grade() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .route("/classes", web::post().to(create_class)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/classes")
            .set_json(json!({ "id": "10A", "grade": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ClassCreationFailed as i32);
        assert!(storage.get_class_by_id("10A").await.unwrap().is_none());

        let req = test::TestRequest::post()
            .uri("/classes")
            .set_json(json!({ "id": "9a", "grade": 9 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }
}
