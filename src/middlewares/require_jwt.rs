/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>`，并把当前用户写入请求扩展。
 * 用户信息按 token 缓存在 ObjectCache 中，未命中时回源存储并检查账号状态。
 *
 * ```rust,ignore
 * web::scope("/api/v1/assignments")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_assignments))
 * ```
 *
 * 处理函数中通过 `RequireJWT::extract_user_claims(&req)` 获取当前用户。
 */

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::User;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

use super::create_error_response;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{StatusCode, header},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败原因，只用于日志与响应文案
#[derive(Debug)]
enum AuthFailure {
    MissingToken,
    InvalidToken,
    NotConfigured(&'static str),
    UnknownUser,
    Inactive,
    Lookup(String),
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::MissingToken => write!(f, "missing bearer token"),
            AuthFailure::InvalidToken => write!(f, "invalid or expired token"),
            AuthFailure::NotConfigured(what) => write!(f, "{what} not configured"),
            AuthFailure::UnknownUser => write!(f, "user no longer exists"),
            AuthFailure::Inactive => write!(f, "user is not active"),
            AuthFailure::Lookup(e) => write!(f, "user lookup failed: {e}"),
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn app_data<T: ?Sized + 'static>(
    req: &ServiceRequest,
    what: &'static str,
) -> Result<Arc<T>, AuthFailure> {
    req.app_data::<web::Data<Arc<T>>>()
        .map(|data| data.get_ref().clone())
        .ok_or(AuthFailure::NotConfigured(what))
}

/// 校验 access token 并解析当前用户；按 token 缓存用户，缓存未命中时回源存储
async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = bearer_token(req).ok_or(AuthFailure::MissingToken)?;
    let claims = JwtUtils::verify_access_token(token).map_err(|e| {
        debug!("Access token rejected: {}", e);
        AuthFailure::InvalidToken
    })?;

    let cache = app_data::<dyn ObjectCache>(req, "cache")?;
    let cache_key = format!("user:{token}");
    if let CacheResult::Found(user) = cache.get_json::<User>(&cache_key).await {
        return Ok(user);
    }

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthFailure::InvalidToken)?;
    let storage = app_data::<dyn Storage>(req, "storage")?;
    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| AuthFailure::Lookup(e.to_string()))?
        .ok_or(AuthFailure::UnknownUser)?;

    if !user.is_active() {
        return Err(AuthFailure::Inactive);
    }

    cache
        .insert_json(cache_key, &user, AppConfig::get().cache.default_ttl)
        .await;
    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match authenticate(&req).await {
                Ok(user) => {
                    debug!("Authenticated user {} for {}", user.id, req.path());
                    req.extensions_mut().insert(user);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(failure) => {
                    info!("Authentication failed for {}: {}", req.path(), failure);
                    let message = format!("Unauthorized: {failure}");
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &message,
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 处理函数读取当前用户
impl RequireJWT {
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn is_admin(req: &actix_web::HttpRequest) -> bool {
        req.extensions().get::<User>().is_some_and(User::is_admin)
    }
}
