use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use std::sync::Arc;
use ts_rs::TS;

use crate::errors::{LoadBoardError, Result};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 路由层的服务单例：构造时不持有存储，处理请求时从 app_data 取
macro_rules! request_scoped_service {
    ($name:ident) => {
        pub struct $name {
            _private: (),
        }

        impl $name {
            pub fn new_lazy() -> Self {
                Self { _private: () }
            }

            pub(crate) fn get_storage(
                &self,
                request: &actix_web::HttpRequest,
            ) -> std::sync::Arc<dyn crate::storage::Storage> {
                crate::services::request_storage(request)
            }
        }
    };
}

pub mod assignments;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod quota;
pub mod system;
pub mod users;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use quota::QuotaService;
pub use system::SystemService;
pub use users::UserService;

/// main 在 App 上注册的存储实例
pub(crate) fn request_storage(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .expect("Storage not registered in app data")
        .get_ref()
        .clone()
}

/// 把存储 / 业务错误映射为统一响应
///
/// `fallback` 是资源不存在时的错误码；其余存储错误只记日志，不把底层报错返回给客户端。
pub(crate) fn error_response(err: &LoadBoardError, fallback: ErrorCode) -> HttpResponse {
    match err {
        LoadBoardError::Validation(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg.as_str())),
        LoadBoardError::NotFound(msg) => {
            HttpResponse::NotFound().json(ApiResponse::error_empty(fallback, msg.as_str()))
        }
        LoadBoardError::Authentication(msg) => HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::Unauthorized, msg.as_str())),
        LoadBoardError::Authorization(msg) => HttpResponse::Forbidden()
            .json(ApiResponse::error_empty(ErrorCode::Forbidden, msg.as_str())),
        _ if err.is_unavailable() || err.is_write_conflict() => {
            tracing::error!("Storage unavailable: {}", err);
            HttpResponse::ServiceUnavailable().json(ApiResponse::error_empty(
                ErrorCode::ServiceUnavailable,
                "Storage is temporarily unavailable, please retry",
            ))
        }
        _ => {
            tracing::error!("Request failed: {}", err);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Internal server error",
            ))
        }
    }
}

/// 按主键查询单条记录：找到 200，不存在 404
pub(crate) fn lookup_response<T: Serialize + TS>(
    result: Result<Option<T>>,
    not_found: ErrorCode,
    entity: &str,
) -> HttpResponse {
    match result {
        Ok(Some(data)) => HttpResponse::Ok().json(ApiResponse::success(data, format!("{entity} found"))),
        Ok(None) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(not_found, format!("{entity} not found"))),
        Err(e) => error_response(&e, not_found),
    }
}

pub(crate) fn list_response<T: Serialize + TS>(result: Result<T>, entity: &str) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data, format!("{entity} listed"))),
        Err(e) => error_response(&e, ErrorCode::InternalServerError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (LoadBoardError::validation("bad"), StatusCode::BAD_REQUEST),
            (LoadBoardError::not_found("gone"), StatusCode::NOT_FOUND),
            (LoadBoardError::authorization("no"), StatusCode::FORBIDDEN),
            (
                LoadBoardError::database_connection("refused"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LoadBoardError::write_conflict("busy"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LoadBoardError::database_operation("syntax"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(
                error_response(&err, ErrorCode::InternalServerError).status(),
                status,
                "{err}"
            );
        }
    }

    #[actix_web::test]
    async fn test_storage_failure_hides_driver_text() {
        let err = LoadBoardError::database_operation("查询班级失败: no such table: classes");
        let resp = error_response(&err, ErrorCode::ClassNotFound);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], ErrorCode::InternalServerError as i32);
        assert!(!body["message"].as_str().unwrap().contains("no such table"));
    }
}
