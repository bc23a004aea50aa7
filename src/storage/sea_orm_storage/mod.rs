//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod classes;
mod quota;
mod system_settings;
mod users;

use crate::config::AppConfig;
use crate::errors::{LoadBoardError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// 由连接串推断的数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Sqlite,
    Postgres,
    MySql,
}

impl Backend {
    /// 返回数据库类型与规范化后的连接串；裸文件路径按 SQLite 处理
    fn detect(url: &str) -> Result<(Self, String)> {
        const SERVER_SCHEMES: [(&str, Backend); 4] = [
            ("postgres://", Backend::Postgres),
            ("postgresql://", Backend::Postgres),
            ("mysql://", Backend::MySql),
            ("mariadb://", Backend::MySql),
        ];

        if url.starts_with("sqlite:") {
            return Ok((Backend::Sqlite, url.to_string()));
        }
        if let Some((_, backend)) = SERVER_SCHEMES.iter().find(|(p, _)| url.starts_with(p)) {
            return Ok((*backend, url.to_string()));
        }
        if url.ends_with(".db") || url.ends_with(".sqlite") {
            return Ok((Backend::Sqlite, format!("sqlite://{url}?mode=rwc")));
        }
        Err(LoadBoardError::database_config(format!(
            "无法识别的数据库地址: {url}（支持 sqlite:、postgres://、mysql:// 或 .db/.sqlite 文件）"
        )))
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按配置连接数据库并执行迁移
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let (backend, url) = Backend::detect(&config.database.url)?;

        let db = match backend {
            Backend::Sqlite => {
                let acquire = Duration::from_secs(config.database.timeout);
                Self::connect_sqlite(&url, config.database.pool_size, acquire).await?
            }
            Backend::Postgres | Backend::MySql => Self::connect_server(&url, config).await?,
        };
        Self::migrate(&db).await?;

        info!("数据库就绪 ({:?})", backend);
        Ok(Self { db })
    }

    async fn migrate(db: &DatabaseConnection) -> Result<()> {
        Migrator::up(db, None)
            .await
            .map_err(|e| LoadBoardError::database_operation(format!("数据库迁移失败: {e}")))
    }

    /// SQLite：WAL，外键开启，写锁等待 5 秒
    async fn connect_sqlite(
        url: &str,
        pool_size: u32,
        acquire_timeout: Duration,
    ) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LoadBoardError::database_config(format!("SQLite 地址无效: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| LoadBoardError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// PostgreSQL / MySQL
    async fn connect_server(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let timeout = Duration::from_secs(config.database.timeout);
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(timeout)
            .acquire_timeout(timeout)
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| LoadBoardError::database_connection(format!("数据库连接失败: {e}")))
    }

    /// 单连接内存库；连接断开即丢数据，所以连接常驻
    #[cfg(test)]
    async fn connect_memory() -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| LoadBoardError::database_config(e.to_string()))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| LoadBoardError::database_connection(e.to_string()))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Result<Self> {
        let db = Self::connect_memory().await?;
        Self::migrate(&db).await?;
        Ok(Self { db })
    }

    /// 文件库 + 多连接池，事务之间真正并发
    #[cfg(test)]
    pub(crate) async fn new_sqlite_file(path: &std::path::Path, pool_size: u32) -> Result<Self> {
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = Self::connect_sqlite(&url, pool_size, Duration::from_secs(30)).await?;
        Self::migrate(&db).await?;
        Ok(Self { db })
    }

    /// 未执行迁移的内存库，所有查询都会失败
    #[cfg(test)]
    pub(crate) async fn new_unmigrated_in_memory() -> Result<Self> {
        Ok(Self {
            db: Self::connect_memory().await?,
        })
    }
}

// Storage trait 实现
use std::collections::HashMap;

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
use crate::storage::Storage;
use crate::workload::{ClassUsage, QuotaLimits, QuotaWrite, WeekInfo};
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 班级模块
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, class_id: &str) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn get_classes_by_ids(&self, class_ids: &[String]) -> Result<Vec<Class>> {
        self.get_classes_by_ids_impl(class_ids).await
    }

    async fn list_classes(&self, query: ClassQueryParams) -> Result<ClassListResponse> {
        self.list_classes_impl(query).await
    }

    async fn update_class(
        &self,
        class_id: &str,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        self.update_class_impl(class_id, update).await
    }

    // 任务模块
    async fn create_assignment(
        &self,
        assignment: NewAssignment,
        limits: QuotaLimits,
    ) -> Result<QuotaWrite<Assignment>> {
        self.create_assignment_impl(assignment, limits).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<PaginatedResponse<Assignment>> {
        self.list_assignments_with_pagination_impl(query).await
    }

    async fn update_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
        recheck: Option<QuotaLimits>,
    ) -> Result<QuotaWrite<Assignment>> {
        self.update_assignment_status_impl(id, status, recheck)
            .await
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool> {
        self.delete_assignment_impl(id).await
    }

    // 周配额统计
    async fn count_published_by_class(
        &self,
        class_ids: &[String],
        week: WeekInfo,
        kind: AssignmentKind,
    ) -> Result<HashMap<String, i64>> {
        self.count_published_by_class_impl(class_ids, week, kind)
            .await
    }

    async fn list_class_usage(
        &self,
        week: WeekInfo,
        grade: Option<i32>,
    ) -> Result<Vec<ClassUsage>> {
        self.list_class_usage_impl(week, grade).await
    }

    // 系统设置模块
    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>> {
        self.list_all_settings_impl().await
    }

    async fn get_setting_by_key(&self, key: &str) -> Result<Option<SystemSetting>> {
        self.get_setting_by_key_impl(key).await
    }

    async fn update_setting(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting> {
        self.update_setting_impl(key, value, user_id, ip_address)
            .await
    }

    async fn list_setting_audits(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse> {
        self.list_setting_audits_impl(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        assert_eq!(
            Backend::detect("loadboard.db").unwrap(),
            (Backend::Sqlite, "sqlite://loadboard.db?mode=rwc".to_string())
        );
        assert_eq!(
            Backend::detect("sqlite::memory:").unwrap().0,
            Backend::Sqlite
        );
        assert_eq!(
            Backend::detect("postgresql://u:p@db/loadboard").unwrap(),
            (Backend::Postgres, "postgresql://u:p@db/loadboard".to_string())
        );
        assert_eq!(Backend::detect("mariadb://db/lb").unwrap().0, Backend::MySql);
        assert!(Backend::detect("redis://cache").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_storage_is_migrated() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        assert_eq!(storage.count_users().await.unwrap(), 0);
        assert!(!storage.list_all_settings().await.unwrap().is_empty());
    }
}
