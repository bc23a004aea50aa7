use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{Result, db_err};
use crate::models::{
    PageWindow,
    users::{
        entities::{User, UserStatus},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};

/// 列表筛选：关键字匹配用户名 / 邮箱 / 显示名，角色与状态精确匹配
fn list_condition(query: &UserListQuery) -> Condition {
    let mut cond = Condition::all();

    if let Some(keyword) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let escaped = escape_like_pattern(keyword);
        cond = cond.add(
            Condition::any()
                .add(Column::Username.contains(&escaped))
                .add(Column::Email.contains(&escaped))
                .add(Column::DisplayName.contains(&escaped)),
        );
    }
    if let Some(role) = &query.role {
        cond = cond.add(Column::Role.eq(role.to_string()));
    }
    if let Some(status) = &query.status {
        cond = cond.add(Column::Status.eq(status.to_string()));
    }
    cond
}

impl SeaOrmStorage {
    async fn find_user_where(&self, cond: Condition) -> Result<Option<User>> {
        Ok(Users::find()
            .filter(cond)
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?
            .map(|m| m.into_user()))
    }

    /// 新账号默认启用；password 已是哈希
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let inserted = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            display_name: Set(req.display_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err("创建用户失败"))?;

        Ok(inserted.into_user())
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        self.find_user_where(Condition::all().add(Column::Id.eq(id)))
            .await
    }

    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        self.find_user_where(Condition::all().add(Column::Username.eq(username)))
            .await
    }

    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        self.find_user_where(Condition::all().add(Column::Email.eq(email)))
            .await
    }

    /// 登录时用户名和邮箱都可作为标识
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        self.find_user_where(
            Condition::any()
                .add(Column::Username.eq(identifier))
                .add(Column::Email.eq(identifier)),
        )
        .await
    }

    /// 分页列出用户，新建的在前
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let window = PageWindow::resolve(query.page, query.size, 10);

        let paginator = Users::find()
            .filter(list_condition(&query))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, window.size);

        let total = paginator
            .num_items()
            .await
            .map_err(db_err("统计用户数量失败"))?;
        let rows = paginator
            .fetch_page(window.index())
            .await
            .map_err(db_err("查询用户列表失败"))?;

        Ok(UserListResponse {
            items: rows.into_iter().map(|m| m.into_user()).collect(),
            pagination: window.info(total),
        })
    }

    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err("更新最后登录时间失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 只写入请求里给出的字段，用户不存在时返回 None
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        let Some(existing) = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(password_hash) = update.password {
            model.password_hash = Set(password_hash);
        }
        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(display_name) = update.display_name {
            model.display_name = Set(Some(display_name));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&self.db)
            .await
            .map_err(db_err("更新用户失败"))?;

        Ok(Some(updated.into_user()))
    }

    /// 该用户创建的任务随外键级联删除
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除用户失败"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(db_err("统计用户数量失败"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::test_support::seed_teacher;

    #[tokio::test]
    async fn test_lookup_by_username_or_email() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let id = seed_teacher(&storage, "pak_budi").await;

        let by_email = storage
            .get_user_by_username_or_email_impl("pak_budi@sekolah.sch.id")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id);
        assert!(storage.get_user_by_email_impl("nobody@x.id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_partial_update() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let budi = seed_teacher(&storage, "pak_budi").await;
        seed_teacher(&storage, "bu_ani").await;

        let updated = storage
            .update_user_impl(
                budi,
                UpdateUserRequest {
                    email: None,
                    password: None,
                    role: Some(UserRole::Admin),
                    status: Some(UserStatus::Suspended),
                    display_name: Some("Budi Santoso".into()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.email, "pak_budi@sekolah.sch.id");

        let admins = storage
            .list_users_with_pagination_impl(UserListQuery {
                page: None,
                size: None,
                role: Some(UserRole::Admin),
                status: None,
                search: Some("santoso".into()),
            })
            .await
            .unwrap();
        assert_eq!(admins.pagination.total, 1);
        assert_eq!(admins.items[0].id, budi);

        assert!(
            storage
                .update_user_impl(9_999, UpdateUserRequest {
                    email: None,
                    password: None,
                    role: None,
                    status: None,
                    display_name: None,
                })
                .await
                .unwrap()
                .is_none()
        );
    }
}
