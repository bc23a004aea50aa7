use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 可在后台修改的配置项初始值：(key, value, value_type, description)
const DEFAULT_SETTINGS: [(&str, &str, &str, &str); 7] = [
    ("app.system_name", "周负荷看板", "string", "系统名称"),
    ("jwt.access_token_expiry", "60", "integer", "Access Token 有效期（分钟）"),
    ("jwt.refresh_token_expiry", "7", "integer", "Refresh Token 有效期（天）"),
    ("quota.task_max", "2", "integer", "每班每周任务上限"),
    ("quota.exam_max", "2", "integer", "每班每周考试上限"),
    (
        "cors.allowed_origins",
        r#"["http://localhost:5173"]"#,
        "json_array",
        "允许的跨域来源",
    ),
    ("cors.max_age", "86400", "integer", "预检请求缓存时间（秒）"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Settings::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(Settings::Value).text().not_null())
                    .col(ColumnDef::new(Settings::ValueType).string().not_null())
                    .col(ColumnDef::new(Settings::Description).text().null())
                    .col(ColumnDef::new(Settings::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Settings::UpdatedBy).big_integer().null())
                    .to_owned(),
            )
            .await?;

        // 审计表不加外键：删除管理员后记录仍保留
        manager
            .create_table(
                Table::create()
                    .table(Audit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Audit::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Audit::SettingKey).string().not_null())
                    .col(ColumnDef::new(Audit::OldValue).text().null())
                    .col(ColumnDef::new(Audit::NewValue).text().not_null())
                    .col(ColumnDef::new(Audit::ChangedBy).big_integer().not_null())
                    .col(ColumnDef::new(Audit::ChangedAt).big_integer().not_null())
                    .col(ColumnDef::new(Audit::IpAddress).string().null())
                    .to_owned(),
            )
            .await?;

        // 审计列表按 key 过滤、按时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_system_settings_audit_key_time")
                    .table(Audit::Table)
                    .col(Audit::SettingKey)
                    .col(Audit::ChangedAt)
                    .to_owned(),
            )
            .await?;

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let mut seed = Query::insert();
        seed.into_table(Settings::Table).columns([
            Settings::Key,
            Settings::Value,
            Settings::ValueType,
            Settings::Description,
            Settings::UpdatedAt,
        ]);
        for (key, value, value_type, description) in DEFAULT_SETTINGS {
            seed.values_panic([
                key.into(),
                value.into(),
                value_type.into(),
                description.into(),
                now.into(),
            ]);
        }
        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Audit::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Settings {
    #[sea_orm(iden = "system_settings")]
    Table,
    Key,
    Value,
    ValueType,
    Description,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum Audit {
    #[sea_orm(iden = "system_settings_audit")]
    Table,
    Id,
    SettingKey,
    OldValue,
    NewValue,
    ChangedBy,
    ChangedAt,
    IpAddress,
}
