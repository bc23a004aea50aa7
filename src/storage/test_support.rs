//! 存储层测试数据

use super::Storage;
use crate::models::classes::requests::CreateClassRequest;
use crate::models::users::{entities::UserRole, requests::CreateUserRequest};

pub(crate) async fn seed_teacher(storage: &dyn Storage, username: &str) -> i64 {
    storage
        .create_user(CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@sekolah.sch.id"),
            password: "not-a-real-hash".to_string(),
            role: UserRole::Teacher,
            display_name: None,
        })
        .await
        .unwrap()
        .id
}

/// 班级编号首位数字即年级
pub(crate) async fn seed_class(storage: &dyn Storage, class_id: &str) {
    let grade = class_id[..1].parse().unwrap();
    storage
        .create_class(CreateClassRequest {
            id: class_id.to_string(),
            grade,
            name: None,
        })
        .await
        .unwrap();
}
