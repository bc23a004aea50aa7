//! 任务存储操作
//!
//! 创建与发布在同一事务内完成"统计 - 比较 - 写入"，
//! 并发写冲突时整体重试，重试时的重新统计能看到胜出方的写入。

use std::collections::HashMap;

use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, IsolationLevel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};

use super::SeaOrmStorage;
use super::quota::count_published;
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::class_assignments::{
    ActiveModel as LinkActiveModel, Column as LinkColumn, Entity as ClassAssignments,
};
use crate::errors::{LoadBoardError, Result, db_err};
use crate::models::{
    PageWindow, PaginatedResponse,
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentListQuery, NewAssignment},
    },
};
use crate::utils::escape_like_pattern;
use crate::workload::{QuotaLimits, QuotaWrite, WeekInfo, find_violations};

/// 写冲突时的最大尝试次数
const MAX_WRITE_ATTEMPTS: usize = 3;

/// 读取任务关联的班级编号
async fn load_class_ids<C: ConnectionTrait>(
    conn: &C,
    assignment_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>> {
    if assignment_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = ClassAssignments::find()
        .filter(LinkColumn::AssignmentId.is_in(assignment_ids.iter().copied()))
        .order_by_asc(LinkColumn::ClassId)
        .all(conn)
        .await
        .map_err(db_err("查询任务班级失败"))?;

    let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
    for link in links {
        grouped
            .entry(link.assignment_id)
            .or_default()
            .push(link.class_id);
    }
    Ok(grouped)
}

impl SeaOrmStorage {
    /// SQLite 不支持设置隔离级别，其事务本身即串行化写入
    fn write_isolation(&self) -> Option<IsolationLevel> {
        match self.db.get_database_backend() {
            DbBackend::Sqlite => None,
            _ => Some(IsolationLevel::Serializable),
        }
    }

    /// 创建任务（发布状态下复核配额）
    pub async fn create_assignment_impl(
        &self,
        req: NewAssignment,
        limits: QuotaLimits,
    ) -> Result<QuotaWrite<Assignment>> {
        let mut attempt = 1;
        loop {
            match self.try_create_assignment(&req, limits).await {
                Err(e) if e.is_write_conflict() && attempt < MAX_WRITE_ATTEMPTS => {
                    warn!("创建任务发生写冲突，第 {} 次重试: {}", attempt, e);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_create_assignment(
        &self,
        req: &NewAssignment,
        limits: QuotaLimits,
    ) -> Result<QuotaWrite<Assignment>> {
        if req.class_ids.is_empty() {
            return Err(LoadBoardError::validation("至少需要一个目标班级"));
        }

        let txn = self
            .db
            .begin_with_config(self.write_isolation(), None)
            .await
            .map_err(db_err("开启事务失败"))?;

        if req.status.occupies_quota() {
            let week = WeekInfo {
                week_number: req.week_number,
                year: req.year,
            };
            let counts = count_published(&txn, &req.class_ids, week, req.kind).await?;
            let violations = find_violations(&req.class_ids, &counts, limits.max_for(req.kind));
            if !violations.is_empty() {
                txn.rollback().await.map_err(db_err("回滚事务失败"))?;
                info!(
                    "配额已满，拒绝创建任务: {:?}",
                    violations.iter().map(|v| &v.class_id).collect::<Vec<_>>()
                );
                return Ok(QuotaWrite::Rejected(violations));
            }
        }

        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            title: Set(req.title.clone()),
            subject: Set(req.subject.clone()),
            description: Set(req.description.clone()),
            kind: Set(req.kind.as_str().to_string()),
            week_number: Set(req.week_number),
            year: Set(req.year),
            status: Set(req.status.as_str().to_string()),
            created_by: Set(req.created_by),
            due_date: Set(req.due_date.map(|dt| dt.timestamp())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&txn).await.map_err(db_err("创建任务失败"))?;

        let links = req.class_ids.iter().map(|class_id| LinkActiveModel {
            assignment_id: Set(inserted.id),
            class_id: Set(class_id.clone()),
            ..Default::default()
        });
        ClassAssignments::insert_many(links)
            .exec(&txn)
            .await
            .map_err(db_err("创建任务班级关联失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        let mut class_ids = req.class_ids.clone();
        class_ids.sort();
        Ok(QuotaWrite::Committed(inserted.into_assignment(class_ids)))
    }

    /// 通过 ID 获取任务
    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<Assignment>> {
        let Some(model) = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询任务失败"))?
        else {
            return Ok(None);
        };

        let mut links = load_class_ids(&self.db, &[id]).await?;
        Ok(Some(model.into_assignment(links.remove(&id).unwrap_or_default())))
    }

    /// 分页列出任务
    pub async fn list_assignments_with_pagination_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<PaginatedResponse<Assignment>> {
        let window = PageWindow::resolve(query.page, query.size, 10);

        let mut select = Assignments::find();

        // 班级筛选
        if let Some(ref class_id) = query.class_id {
            select = select.filter(
                Column::Id.in_subquery(
                    Query::select()
                        .column(LinkColumn::AssignmentId)
                        .from(ClassAssignments)
                        .and_where(LinkColumn::ClassId.eq(class_id.as_str()))
                        .to_owned(),
                ),
            );
        }

        if let Some(kind) = query.kind {
            select = select.filter(Column::Kind.eq(kind.as_str()));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        if let Some(week_number) = query.week_number {
            select = select.filter(Column::WeekNumber.eq(week_number));
        }

        if let Some(year) = query.year {
            select = select.filter(Column::Year.eq(year));
        }

        if let Some(created_by) = query.created_by {
            select = select.filter(Column::CreatedBy.eq(created_by));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                sea_orm::Condition::any()
                    .add(Column::Title.contains(&escaped))
                    .add(Column::Subject.contains(&escaped)),
            );
        }

        // 排序：新周在前
        select = select
            .order_by_desc(Column::Year)
            .order_by_desc(Column::WeekNumber)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, window.size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询任务总数失败"))?;

        let models = paginator
            .fetch_page(window.index())
            .await
            .map_err(db_err("查询任务列表失败"))?;

        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let mut links = load_class_ids(&self.db, &ids).await?;

        Ok(PaginatedResponse {
            items: models
                .into_iter()
                .map(|m| {
                    let class_ids = links.remove(&m.id).unwrap_or_default();
                    m.into_assignment(class_ids)
                })
                .collect(),
            pagination: window.info(total),
        })
    }

    /// 更新任务状态
    pub async fn update_assignment_status_impl(
        &self,
        id: i64,
        status: AssignmentStatus,
        recheck: Option<QuotaLimits>,
    ) -> Result<QuotaWrite<Assignment>> {
        let mut attempt = 1;
        loop {
            match self.try_update_assignment_status(id, status, recheck).await {
                Err(e) if e.is_write_conflict() && attempt < MAX_WRITE_ATTEMPTS => {
                    warn!("更新任务 {} 状态发生写冲突，第 {} 次重试: {}", id, attempt, e);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_update_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
        recheck: Option<QuotaLimits>,
    ) -> Result<QuotaWrite<Assignment>> {
        let txn = self
            .db
            .begin_with_config(self.write_isolation(), None)
            .await
            .map_err(db_err("开启事务失败"))?;

        let model = Assignments::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询任务失败"))?
            .ok_or_else(|| LoadBoardError::not_found(format!("任务不存在: {id}")))?;

        let class_ids = load_class_ids(&txn, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        let current = model.clone().into_assignment(class_ids.clone());

        if let Some(limits) = recheck {
            let week = WeekInfo {
                week_number: current.week_number,
                year: current.year,
            };
            let counts = count_published(&txn, &class_ids, week, current.kind).await?;
            let violations = find_violations(&class_ids, &counts, limits.max_for(current.kind));
            if !violations.is_empty() {
                txn.rollback().await.map_err(db_err("回滚事务失败"))?;
                info!("配额已满，拒绝发布任务 {}", id);
                return Ok(QuotaWrite::Rejected(violations));
            }
        }

        let mut active: ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().timestamp());
        let updated = active.update(&txn).await.map_err(db_err("更新任务状态失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(QuotaWrite::Committed(updated.into_assignment(class_ids)))
    }

    /// 删除任务及班级关联
    pub async fn delete_assignment_impl(&self, id: i64) -> Result<bool> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        ClassAssignments::delete_many()
            .filter(LinkColumn::AssignmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除任务班级关联失败"))?;

        let result = Assignments::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err("删除任务失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::AssignmentKind;
    use crate::storage::test_support::{seed_class, seed_teacher};

    fn draft(teacher: i64, class_ids: &[&str]) -> NewAssignment {
        NewAssignment {
            title: "Proyek kelompok".into(),
            subject: "Bahasa Indonesia".into(),
            description: Some("Presentasi hari Jumat".into()),
            kind: AssignmentKind::Task,
            class_ids: class_ids.iter().map(|s| s.to_string()).collect(),
            week_number: 30,
            year: 2025,
            status: AssignmentStatus::Draft,
            created_by: teacher,
            due_date: None,
        }
    }

    fn committed(write: QuotaWrite<Assignment>) -> Assignment {
        match write {
            QuotaWrite::Committed(a) => a,
            QuotaWrite::Rejected(v) => panic!("unexpected rejection: {v:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let teacher = seed_teacher(&storage, "guru_bindo").await;
        seed_class(&storage, "8C").await;
        seed_class(&storage, "8A").await;

        let created = committed(
            storage
                .create_assignment_impl(draft(teacher, &["8C", "8A"]), QuotaLimits::default())
                .await
                .unwrap(),
        );
        assert_eq!(created.class_ids, ["8A", "8C"]);
        assert_eq!(created.status, AssignmentStatus::Draft);

        let fetched = storage
            .get_assignment_by_id_impl(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.class_ids, ["8A", "8C"]);
        assert_eq!(fetched.description.as_deref(), Some("Presentasi hari Jumat"));

        let by_class = storage
            .list_assignments_with_pagination_impl(AssignmentListQuery {
                class_id: Some("8C".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_class.pagination.total, 1);

        let none = storage
            .list_assignments_with_pagination_impl(AssignmentListQuery {
                status: Some(AssignmentStatus::Published),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.items.is_empty());
    }

    #[tokio::test]
    async fn test_drafts_do_not_need_quota_but_publishing_does() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let teacher = seed_teacher(&storage, "guru_bindo").await;
        seed_class(&storage, "9B").await;
        let limits = QuotaLimits::new(1, 1);

        let first = committed(
            storage
                .create_assignment_impl(draft(teacher, &["9B"]), limits)
                .await
                .unwrap(),
        );
        let second = committed(
            storage
                .create_assignment_impl(draft(teacher, &["9B"]), limits)
                .await
                .unwrap(),
        );

        let published = committed(
            storage
                .update_assignment_status_impl(first.id, AssignmentStatus::Published, Some(limits))
                .await
                .unwrap(),
        );
        assert_eq!(published.status, AssignmentStatus::Published);

        let rejected = storage
            .update_assignment_status_impl(second.id, AssignmentStatus::Published, Some(limits))
            .await
            .unwrap();
        assert!(matches!(rejected, QuotaWrite::Rejected(ref v) if v[0].class_id == "9B"));

        let unchanged = storage.get_assignment_by_id_impl(second.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, AssignmentStatus::Draft);
    }

    #[tokio::test]
    async fn test_update_missing_assignment_is_not_found() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let err = storage
            .update_assignment_status_impl(404, AssignmentStatus::Graded, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn test_delete_removes_links() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let teacher = seed_teacher(&storage, "guru_bindo").await;
        seed_class(&storage, "7D").await;

        let mut req = draft(teacher, &["7D"]);
        req.status = AssignmentStatus::Published;
        let created = committed(
            storage
                .create_assignment_impl(req, QuotaLimits::default())
                .await
                .unwrap(),
        );

        assert!(storage.delete_assignment_impl(created.id).await.unwrap());
        assert!(!storage.delete_assignment_impl(created.id).await.unwrap());

        let week = WeekInfo {
            week_number: 30,
            year: 2025,
        };
        let counts = storage
            .count_published_by_class_impl(&["7D".to_string()], week, AssignmentKind::Task)
            .await
            .unwrap();
        assert!(counts.is_empty());
    }
}
