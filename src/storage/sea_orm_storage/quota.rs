//! 周配额统计

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use super::SeaOrmStorage;
use crate::entity::assignments::{Column as AssignmentColumn, Entity as Assignments};
use crate::entity::class_assignments::{Column as LinkColumn, Entity as ClassAssignments};
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::errors::{Result, db_err};
use crate::models::assignments::entities::{AssignmentKind, AssignmentStatus};
use crate::workload::{ClassUsage, WeekInfo};

/// 统计各班级某周某类型的已发布任务数（按任务去重）
///
/// 在事务内调用时与随后的写入处于同一快照
pub(super) async fn count_published<C: ConnectionTrait>(
    conn: &C,
    class_ids: &[String],
    week: WeekInfo,
    kind: AssignmentKind,
) -> Result<HashMap<String, i64>> {
    if class_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = ClassAssignments::find()
        .inner_join(Assignments)
        .filter(LinkColumn::ClassId.is_in(class_ids.iter().cloned()))
        .filter(AssignmentColumn::Status.eq(AssignmentStatus::Published.as_str()))
        .filter(AssignmentColumn::WeekNumber.eq(week.week_number))
        .filter(AssignmentColumn::Year.eq(week.year))
        .filter(AssignmentColumn::Kind.eq(kind.as_str()))
        .all(conn)
        .await
        .map_err(db_err("统计周配额失败"))?;

    let mut distinct: HashMap<String, HashSet<i64>> = HashMap::new();
    for link in links {
        distinct
            .entry(link.class_id)
            .or_default()
            .insert(link.assignment_id);
    }

    Ok(distinct
        .into_iter()
        .map(|(class_id, ids)| (class_id, ids.len() as i64))
        .collect())
}

impl SeaOrmStorage {
    pub async fn count_published_by_class_impl(
        &self,
        class_ids: &[String],
        week: WeekInfo,
        kind: AssignmentKind,
    ) -> Result<HashMap<String, i64>> {
        count_published(&self.db, class_ids, week, kind).await
    }

    /// 启用班级在某周的任务 / 考试使用量
    pub async fn list_class_usage_impl(
        &self,
        week: WeekInfo,
        grade: Option<i32>,
    ) -> Result<Vec<ClassUsage>> {
        let mut select = Classes::find().filter(ClassColumn::IsActive.eq(true));
        if let Some(grade) = grade {
            select = select.filter(ClassColumn::Grade.eq(grade));
        }

        let classes = select
            .order_by_asc(ClassColumn::Grade)
            .order_by_asc(ClassColumn::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询班级列表失败"))?;

        let class_ids: Vec<String> = classes.iter().map(|c| c.id.clone()).collect();
        let tasks = count_published(&self.db, &class_ids, week, AssignmentKind::Task).await?;
        let exams = count_published(&self.db, &class_ids, week, AssignmentKind::Exam).await?;

        Ok(classes
            .into_iter()
            .map(|model| {
                let tasks_used = tasks.get(&model.id).copied().unwrap_or(0);
                let exams_used = exams.get(&model.id).copied().unwrap_or(0);
                ClassUsage {
                    class: model.into_class(),
                    tasks_used,
                    exams_used,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::requests::NewAssignment;
    use crate::models::classes::requests::UpdateClassRequest;
    use crate::storage::test_support::{seed_class, seed_teacher};
    use crate::workload::{QuotaLimits, QuotaWrite};

    fn assignment(
        teacher: i64,
        kind: AssignmentKind,
        class_ids: &[&str],
        week: WeekInfo,
        status: AssignmentStatus,
    ) -> NewAssignment {
        NewAssignment {
            title: "Ulangan harian".into(),
            subject: "IPA".into(),
            description: None,
            kind,
            class_ids: class_ids.iter().map(|s| s.to_string()).collect(),
            week_number: week.week_number,
            year: week.year,
            status,
            created_by: teacher,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_class_usage_counts_each_link_and_skips_inactive() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let teacher = seed_teacher(&storage, "guru_ipa").await;
        for id in ["7A", "7B", "8A"] {
            seed_class(&storage, id).await;
        }

        let week = WeekInfo {
            week_number: 20,
            year: 2025,
        };
        let other_week = WeekInfo {
            week_number: 21,
            year: 2025,
        };
        let limits = QuotaLimits::default();

        let writes = [
            assignment(teacher, AssignmentKind::Task, &["7A", "7B"], week, AssignmentStatus::Published),
            assignment(teacher, AssignmentKind::Exam, &["7A"], week, AssignmentStatus::Published),
            assignment(teacher, AssignmentKind::Exam, &["7A"], week, AssignmentStatus::Draft),
            assignment(teacher, AssignmentKind::Task, &["8A"], other_week, AssignmentStatus::Published),
        ];
        for w in writes {
            let result = storage.create_assignment_impl(w, limits).await.unwrap();
            assert!(matches!(result, QuotaWrite::Committed(_)));
        }

        storage
            .update_class_impl(
                "7B",
                UpdateClassRequest {
                    name: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();

        let usage = storage.list_class_usage_impl(week, None).await.unwrap();
        let summary: Vec<(&str, i64, i64)> = usage
            .iter()
            .map(|u| (u.class.id.as_str(), u.tasks_used, u.exams_used))
            .collect();
        assert_eq!(summary, [("7A", 1, 1), ("8A", 0, 0)]);

        let eighth = storage.list_class_usage_impl(other_week, Some(8)).await.unwrap();
        assert_eq!(eighth.len(), 1);
        assert_eq!(eighth[0].tasks_used, 1);
    }
}
