pub mod assignments;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod quota;
pub mod system;
pub mod users;

pub use assignments::configure_assignments_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use dashboard::configure_dashboard_routes;
pub use quota::configure_quota_routes;
pub use system::configure_system_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 注册全部 `/api/v1` 路由
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_classes_routes)
        .configure(configure_assignments_routes)
        .configure(configure_quota_routes)
        .configure(configure_dashboard_routes)
        .configure(configure_system_routes);
}
