#[macro_use]
mod macros;

pub mod assignments;
pub mod auth;
pub mod classes;
pub mod common;
pub mod dashboard;
pub mod quota;
pub mod system;
pub mod users;

pub use common::{ApiResponse, PageWindow, PaginatedResponse, PaginationInfo, PaginationQuery};

use serde::Serialize;

/// 业务错误码
///
/// - 0: 成功
/// - 1xxx: 通用错误
/// - 2xxx: 认证
/// - 3xxx: 用户
/// - 4xxx: 班级
/// - 5xxx: 任务与周配额
/// - 6xxx: 系统设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1006,
    ValidationFailed = 1007,
    RateLimitExceeded = 1029,

    AuthFailed = 2000,
    RefreshTokenInvalid = 2001,

    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,
    CanNotDeleteCurrentUser = 3008,

    ClassNotFound = 4000,
    ClassAlreadyExists = 4001,
    ClassCreationFailed = 4002,
    ClassInactive = 4003,
    ClassUpdateFailed = 4004,

    AssignmentNotFound = 5000,
    AssignmentCreationFailed = 5001,
    AssignmentPermissionDenied = 5002,
    InvalidStatusTransition = 5003,
    QuotaExceeded = 5004,
    InvalidWeek = 5005,

    SettingNotFound = 6000,
    SettingInvalid = 6001,
}
