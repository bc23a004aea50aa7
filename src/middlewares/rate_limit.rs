/*!
 * 速率限制中间件
 *
 * 固定窗口计数：同一限制键在一个窗口内最多放行 `max_requests` 次，
 * 窗口编号取 `unix 秒 / window_secs`，窗口切换后计数自然归零。
 *
 * ```rust,ignore
 * web::scope("/api/v1/auth")
 *     .service(
 *         web::resource("/login")
 *             .wrap(RateLimit::login())
 *             .route(web::post().to(login)),
 *     )
 * ```
 *
 * 已通过 RequireJWT 的请求按用户计数，其余按客户端 IP 计数。
 * 超限返回 429，并带 `Retry-After`。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};

/// 计数表，条目存活一个最长窗口
static WINDOW_COUNTERS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(MAX_WINDOW_SECS))
        .max_capacity(100_000)
        .build()
});

const MAX_WINDOW_SECS: u64 = 3600;

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    scope: &'static str,
}

impl RateLimit {
    pub fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, MAX_WINDOW_SECS),
            scope,
        }
    }

    /// 登录：每 IP 每分钟 5 次
    pub fn login() -> Self {
        Self::new("login", 5, 60)
    }

    /// 业务接口：每分钟 100 次
    pub fn api() -> Self {
        Self::new("api", 100, 60)
    }

    /// 当前窗口编号与窗口剩余秒数
    fn window(&self, now_secs: u64) -> (u64, u64) {
        let index = now_secs / self.window_secs;
        let reset = self.window_secs - now_secs % self.window_secs;
        (index, reset)
    }

    fn counter_key(&self, subject: &str, window_index: u64) -> String {
        format!("{}:{}:{}", self.scope, subject, window_index)
    }
}

/// 限制主体：已认证用户优先，其次客户端 IP
fn limit_subject(req: &ServiceRequest) -> String {
    if let Some(user_id) = req.extensions().get::<User>().map(|u| u.id) {
        return format!("user:{user_id}");
    }
    format!("ip:{}", client_ip(req))
}

/// 客户端 IP：连接信息优先，代理头只接受合法地址
fn client_ip(req: &ServiceRequest) -> String {
    let from_connection = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);
    if let Some(ip) = from_connection.as_deref().and_then(parse_ip) {
        return ip;
    }

    ["X-Forwarded-For", "X-Real-IP"]
        .iter()
        .filter_map(|name| req.headers().get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .find_map(parse_ip)
        .or(from_connection)
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_ip(raw: &str) -> Option<String> {
    raw.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// 计数加一并返回新值
async fn bump(key: String) -> u32 {
    WINDOW_COUNTERS
        .entry(key)
        .and_upsert_with(|entry| {
            let next = entry.map_or(1, |e| e.into_value().saturating_add(1));
            std::future::ready(next)
        })
        .await
        .into_value()
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please retry later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let limit = self.limit.clone();

        Box::pin(async move {
            let now_secs = chrono::Utc::now().timestamp().max(0) as u64;
            let (window_index, reset) = limit.window(now_secs);
            let subject = limit_subject(&req);
            let count = bump(limit.counter_key(&subject, window_index)).await;

            if count > limit.max_requests {
                warn!(
                    "Rate limit exceeded: scope={} subject={} count={}/{}",
                    limit.scope, subject, count, limit.max_requests
                );
                return Ok(req.into_response(too_many_requests(reset).map_into_right_body()));
            }

            let mut res = srv.call(req).await?.map_into_left_body();
            let remaining = limit.max_requests - count;
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(limit.max_requests),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundaries() {
        let limit = RateLimit::new("t", 3, 60);
        assert_eq!(limit.window(0), (0, 60));
        assert_eq!(limit.window(59), (0, 1));
        assert_eq!(limit.window(60), (1, 60));
        assert_eq!(RateLimit::new("t", 3, 0).window_secs, 1);
    }

    #[test]
    fn test_parse_ip() {
        assert_eq!(parse_ip(" 203.0.113.9 ").as_deref(), Some("203.0.113.9"));
        assert_eq!(parse_ip("::1").as_deref(), Some("::1"));
        assert!(parse_ip("203.0.113.9, 10.0.0.1").is_none());
        assert!(parse_ip("unknown").is_none());
    }

    #[tokio::test]
    async fn test_counter_per_window() {
        let limit = RateLimit::login();
        let key = limit.counter_key("ip:198.51.100.7", 42);
        for expected in 1..=3 {
            assert_eq!(bump(key.clone()).await, expected);
        }
        assert_eq!(bump(limit.counter_key("ip:198.51.100.7", 43)).await, 1);
    }

    #[actix_web::test]
    async fn test_limit_returns_429() {
        use actix_web::{App, test, web};

        let app = test::init_service(
            App::new().service(
                web::resource("/limited")
                    .wrap(RateLimit::new("test-429", 2, 3600))
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let call = || {
            test::TestRequest::get()
                .uri("/limited")
                .insert_header(("X-Forwarded-For", "192.0.2.44"))
                .to_request()
        };
        let first = test::call_service(&app, call()).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers().get("x-ratelimit-remaining").unwrap(), "1");
        assert_eq!(test::call_service(&app, call()).await.status(), StatusCode::OK);

        let blocked = test::call_service(&app, call()).await;
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(blocked.headers().contains_key("Retry-After"));
    }
}
