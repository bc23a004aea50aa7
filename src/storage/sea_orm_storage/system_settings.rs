//! 系统设置与修改审计

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entity::system_settings::{self, Entity as SystemSettings};
use crate::entity::system_settings_audit::{self as audit, Entity as SystemSettingsAudit};
use crate::errors::{LoadBoardError, Result, db_err};
use crate::models::{
    common::PageWindow,
    system::{
        entities::SystemSetting, requests::SettingAuditQuery, responses::SettingAuditListResponse,
    },
};

use super::SeaOrmStorage;

impl SeaOrmStorage {
    pub(crate) async fn list_all_settings_impl(&self) -> Result<Vec<SystemSetting>> {
        let rows = SystemSettings::find()
            .order_by_asc(system_settings::Column::Key)
            .all(&self.db)
            .await
            .map_err(db_err("获取设置列表失败"))?;

        Ok(rows.into_iter().map(system_settings::Model::into_setting).collect())
    }

    pub(crate) async fn get_setting_by_key_impl(&self, key: &str) -> Result<Option<SystemSetting>> {
        Ok(SystemSettings::find_by_id(key)
            .one(&self.db)
            .await
            .map_err(db_err("获取设置失败"))?
            .map(system_settings::Model::into_setting))
    }

    /// 写入新值并追加一条审计记录，两者在同一事务内提交
    pub(crate) async fn update_setting_impl(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let current = SystemSettings::find_by_id(key)
            .one(&txn)
            .await
            .map_err(db_err("获取设置失败"))?
            .ok_or_else(|| LoadBoardError::not_found(format!("配置项不存在: {key}")))?;
        let previous = current.value.clone();

        let mut row: system_settings::ActiveModel = current.into();
        row.value = Set(value.to_string());
        row.updated_at = Set(now);
        row.updated_by = Set(Some(user_id));
        let saved = row.update(&txn).await.map_err(db_err("更新设置失败"))?;

        audit::ActiveModel {
            setting_key: Set(key.to_string()),
            old_value: Set(Some(previous)),
            new_value: Set(value.to_string()),
            changed_by: Set(user_id),
            changed_at: Set(now),
            ip_address: Set(ip_address),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("写入审计日志失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(saved.into_setting())
    }

    /// 最近的修改在前，可按 key 过滤
    pub(crate) async fn list_setting_audits_impl(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse> {
        let window = PageWindow::resolve(query.page, query.size, 20);

        let mut select = SystemSettingsAudit::find();
        if let Some(key) = query.key.as_deref() {
            select = select.filter(audit::Column::SettingKey.eq(key));
        }
        let paginator = select
            .order_by_desc(audit::Column::ChangedAt)
            .order_by_desc(audit::Column::Id)
            .paginate(&self.db, window.size);

        let total = paginator
            .num_items()
            .await
            .map_err(db_err("统计审计日志失败"))?;
        let rows = paginator
            .fetch_page(window.index())
            .await
            .map_err(db_err("获取审计日志失败"))?;

        Ok(SettingAuditListResponse {
            audits: rows.into_iter().map(audit::Model::into_audit).collect(),
            pagination: window.info(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::seed_teacher;

    #[tokio::test]
    async fn test_update_setting_writes_audit() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_teacher(&storage, "admin_tu").await;

        let seeded = storage
            .get_setting_by_key_impl("quota.task_max")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seeded.value, "2");

        let updated = storage
            .update_setting_impl("quota.task_max", "3", admin, Some("10.0.0.8".into()))
            .await
            .unwrap();
        assert_eq!(updated.value, "3");
        assert_eq!(updated.updated_by, Some(admin));

        // 第二次更新，审计记录的自增 ID 不冲突
        storage
            .update_setting_impl("quota.task_max", "4", admin, None)
            .await
            .unwrap();

        let audits = storage
            .list_setting_audits_impl(SettingAuditQuery {
                key: Some("quota.task_max".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audits.pagination.total, 2);
        // 同一秒内的两次修改按 id 倒序
        let values: Vec<&str> = audits.audits.iter().map(|a| a.new_value.as_str()).collect();
        assert_eq!(values, vec!["4", "3"]);
        assert_eq!(audits.audits[0].old_value.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_update_unknown_setting_is_not_found() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_teacher(&storage, "admin_tu").await;
        let err = storage
            .update_setting_impl("upload.max_size", "1", admin, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}
