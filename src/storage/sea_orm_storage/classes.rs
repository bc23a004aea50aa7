//! 班级存储操作

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::errors::{Result, db_err};
use crate::models::classes::{
    entities::Class,
    requests::{ClassQueryParams, CreateClassRequest, UpdateClassRequest},
    responses::ClassListResponse,
};
use crate::utils::escape_like_pattern;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建班级，未提供名称时以编号作为名称
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();
        let name = req
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| req.id.clone());

        let model = ActiveModel {
            id: Set(req.id),
            grade: Set(req.grade),
            name: Set(name),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建班级失败"))?;

        Ok(result.into_class())
    }

    /// 通过编号获取班级
    pub async fn get_class_by_id_impl(&self, class_id: &str) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err("查询班级失败"))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 批量获取班级
    pub async fn get_classes_by_ids_impl(&self, class_ids: &[String]) -> Result<Vec<Class>> {
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Classes::find()
            .filter(Column::Id.is_in(class_ids.iter().cloned()))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询班级失败"))?;

        Ok(result.into_iter().map(|m| m.into_class()).collect())
    }

    /// 列出班级（按年级、编号排序）
    pub async fn list_classes_impl(&self, query: ClassQueryParams) -> Result<ClassListResponse> {
        let mut select = Classes::find();

        if let Some(grade) = query.grade {
            select = select.filter(Column::Grade.eq(grade));
        }

        if let Some(active) = query.active {
            select = select.filter(Column::IsActive.eq(active));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Id.contains(&escaped))
                    .add(Column::Name.contains(&escaped)),
            );
        }

        let classes = select
            .order_by_asc(Column::Grade)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询班级列表失败"))?;

        Ok(ClassListResponse {
            items: classes.into_iter().map(|m| m.into_class()).collect(),
        })
    }

    /// 更新班级名称或启用状态
    pub async fn update_class_impl(
        &self,
        class_id: &str,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        // 先检查班级是否存在
        let existing = self.get_class_by_id_impl(class_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(class_id.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }

        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model.update(&self.db).await.map_err(db_err("更新班级失败"))?;

        self.get_class_by_id_impl(class_id).await
    }
}
