use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireJWT;
use crate::models::auth::responses::{RefreshTokenResponse, UserInfoResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::system::DynamicConfig;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let rejected = || {
        // 清除无效的 refresh token cookie
        HttpResponse::Unauthorized()
            .cookie(JwtUtils::create_empty_refresh_token_cookie())
            .json(ApiResponse::error_empty(
                ErrorCode::RefreshTokenInvalid,
                "Login expired or invalid, please login again",
            ))
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!("Refresh token rejected: {}", e);
            return Ok(rejected());
        }
    };

    // 停用或删除的账号不再续期
    let storage = service.get_storage(request);
    let user_id = claims.sub.parse::<i64>().unwrap_or_default();
    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active() => {}
        Ok(_) => return Ok(rejected()),
        Err(e) => {
            tracing::error!("Refresh lookup failed: {}", e);
            return Ok(crate::services::error_response(
                &e,
                ErrorCode::RefreshTokenInvalid,
            ));
        }
    }

    let access_minutes = DynamicConfig::access_token_expiry().await;
    match JwtUtils::refresh_access_token(&refresh_token, chrono::Duration::minutes(access_minutes))
    {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: access_minutes * 60,
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            tracing::error!("Refresh token failed: {}", e);
            Ok(rejected())
        }
    }
}

pub async fn handle_get_user(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match RequireJWT::extract_user_claims(request) {
        Some(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        ))),
        None => Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        ))),
    }
}
