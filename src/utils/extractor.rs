//! 路径参数提取器
//!
//! 在进入业务逻辑前完成格式校验，失败时直接返回统一的错误响应。

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use std::future::{Ready, ready};

use crate::models::system::entities::KnownSettingKey;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_class_id;

fn bad_path(message: impl Into<String>) -> actix_web::Error {
    let message = message.into();
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

fn path_segment<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, actix_web::Error> {
    req.match_info()
        .get(name)
        .ok_or_else(|| bad_path(format!("Missing path parameter: {name}")))
}

/// 正整数 ID（对应路由中的 `{id}`）
#[derive(Debug, Clone, Copy)]
pub struct SafeIDI64(pub i64);

impl FromRequest for SafeIDI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(path_segment(req, "id").and_then(|raw| match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(SafeIDI64(id)),
            _ => Err(bad_path(format!("Invalid id: {raw}"))),
        }))
    }
}

/// 班级编号（对应路由中的 `{class_id}`，统一为大写）
#[derive(Debug, Clone)]
pub struct SafeClassId(pub String);

impl FromRequest for SafeClassId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(path_segment(req, "class_id").and_then(|raw| {
            validate_class_id(raw)
                .map(|(class_id, _)| SafeClassId(class_id))
                .map_err(bad_path)
        }))
    }
}

/// 系统设置键（对应路由中的 `{key}`，只接受已知键）
#[derive(Debug, Clone, Copy)]
pub struct SafeSettingKey(pub KnownSettingKey);

impl FromRequest for SafeSettingKey {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(path_segment(req, "key").and_then(|raw| {
            raw.parse::<KnownSettingKey>()
                .map(SafeSettingKey)
                .map_err(|_| bad_path(format!("Unknown setting key: {raw}")))
        }))
    }
}
