use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    PaginatedResponse,
    assignments::{
        entities::{Assignment, AssignmentKind, AssignmentStatus},
        requests::{AssignmentListQuery, NewAssignment},
    },
    classes::{
        entities::Class,
        requests::{ClassQueryParams, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    system::{
        entities::SystemSetting, requests::SettingAuditQuery, responses::SettingAuditListResponse,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::workload::{ClassUsage, QuotaLimits, QuotaWrite, WeekInfo};

use crate::errors::Result;

pub mod sea_orm_storage;

#[cfg(test)]
pub(crate) mod test_support;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段为已哈希的密码）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 班级管理方法
    // 创建班级
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    // 通过编号获取班级
    async fn get_class_by_id(&self, class_id: &str) -> Result<Option<Class>>;
    // 批量获取班级
    async fn get_classes_by_ids(&self, class_ids: &[String]) -> Result<Vec<Class>>;
    // 列出班级
    async fn list_classes(&self, query: ClassQueryParams) -> Result<ClassListResponse>;
    // 更新班级名称或启用状态
    async fn update_class(
        &self,
        class_id: &str,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>>;

    /// 任务管理方法
    // 创建任务，事务内复核所有目标班级的配额
    async fn create_assignment(
        &self,
        assignment: NewAssignment,
        limits: QuotaLimits,
    ) -> Result<QuotaWrite<Assignment>>;
    // 通过ID获取任务（含目标班级）
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>>;
    // 列出任务
    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<PaginatedResponse<Assignment>>;
    // 更新任务状态，recheck 为 Some 时在事务内复核配额（进入 published）
    async fn update_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
        recheck: Option<QuotaLimits>,
    ) -> Result<QuotaWrite<Assignment>>;
    // 删除任务及其班级关联
    async fn delete_assignment(&self, id: i64) -> Result<bool>;

    /// 周配额统计方法
    // 统计各班级某周某类型的已发布任务数量
    async fn count_published_by_class(
        &self,
        class_ids: &[String],
        week: WeekInfo,
        kind: AssignmentKind,
    ) -> Result<HashMap<String, i64>>;
    // 启用班级在某周的使用量
    async fn list_class_usage(&self, week: WeekInfo, grade: Option<i32>)
    -> Result<Vec<ClassUsage>>;

    /// 系统设置方法
    // 获取所有设置
    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>>;
    // 通过 key 获取设置
    async fn get_setting_by_key(&self, key: &str) -> Result<Option<SystemSetting>>;
    // 更新设置并写入审计日志
    async fn update_setting(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting>;
    // 获取审计日志
    async fn list_setting_audits(&self, query: SettingAuditQuery)
    -> Result<SettingAuditListResponse>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
