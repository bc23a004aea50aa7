//! 周配额台账
//!
//! 按 (班级, ISO 周, 类型) 统计已发布任务数量并与上限比较。
//! 读路径在存储不可用时降级为 used = 0，写路径的复核在存储事务内完成。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use ts_rs::TS;

use super::classifier::{ClassStatus, LoadClassification, classify_class};
use super::week::WeekInfo;
use crate::config::{DEFAULT_EXAM_MAX, DEFAULT_TASK_MAX};
use crate::errors::Result;
use crate::models::assignments::entities::AssignmentKind;
use crate::models::classes::entities::Class;
use crate::services::system::DynamicConfig;
use crate::storage::Storage;

/// 每班每周的容量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub task_max: i64,
    pub exam_max: i64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            task_max: DEFAULT_TASK_MAX,
            exam_max: DEFAULT_EXAM_MAX,
        }
    }
}

impl QuotaLimits {
    pub fn new(task_max: i64, exam_max: i64) -> Self {
        Self { task_max, exam_max }
    }

    /// 从动态配置读取当前容量（未设置时回退到静态配置）
    pub async fn resolve() -> Self {
        Self {
            task_max: DynamicConfig::quota_task_max().await,
            exam_max: DynamicConfig::quota_exam_max().await,
        }
    }

    pub fn max_for(&self, kind: AssignmentKind) -> i64 {
        match kind {
            AssignmentKind::Task => self.task_max,
            AssignmentKind::Exam => self.exam_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct QuotaUsage {
    pub used: i64,
    pub max: i64,
}

impl QuotaUsage {
    pub fn has_room(&self) -> bool {
        self.used < self.max
    }
}

/// 已满的班级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct QuotaViolation {
    pub class_id: String,
    pub used: i64,
    pub max: i64,
}

/// 带配额复核的写入结果
#[derive(Debug)]
pub enum QuotaWrite<T> {
    Committed(T),
    Rejected(Vec<QuotaViolation>),
}

/// 找出再增加一项即超出上限的班级
pub fn find_violations(
    class_ids: &[String],
    counts: &HashMap<String, i64>,
    max: i64,
) -> Vec<QuotaViolation> {
    class_ids
        .iter()
        .filter_map(|class_id| {
            let used = counts.get(class_id).copied().unwrap_or(0);
            (used + 1 > max).then(|| QuotaViolation {
                class_id: class_id.clone(),
                used,
                max,
            })
        })
        .collect()
}

/// 班级本周两类任务的使用量（存储层统计结果）
#[derive(Debug, Clone)]
pub struct ClassUsage {
    pub class: Class,
    pub tasks_used: i64,
    pub exams_used: i64,
}

/// 单个班级的周配额快照
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct WeeklyQuota {
    pub tasks_used: i64,
    pub exams_used: i64,
    pub task_max: i64,
    pub exam_max: i64,
    pub tasks_remaining: i64,
    pub exams_remaining: i64,
    #[serde(flatten)]
    #[ts(flatten)]
    pub load: LoadClassification,
}

impl WeeklyQuota {
    pub fn new(tasks_used: i64, exams_used: i64, limits: QuotaLimits) -> Self {
        Self {
            tasks_used,
            exams_used,
            task_max: limits.task_max,
            exam_max: limits.exam_max,
            tasks_remaining: (limits.task_max - tasks_used).max(0),
            exams_remaining: (limits.exam_max - exams_used).max(0),
            load: classify_class(tasks_used, exams_used, limits.task_max, limits.exam_max),
        }
    }
}

/// 配额检查结果
#[derive(Debug, Clone)]
pub struct QuotaCheck {
    pub usage: BTreeMap<String, QuotaUsage>,
    pub degraded: bool,
}

impl QuotaCheck {
    pub fn all_available(&self) -> bool {
        self.usage.values().all(QuotaUsage::has_room)
    }
}

pub struct QuotaLedger {
    storage: Arc<dyn Storage>,
    limits: QuotaLimits,
}

impl QuotaLedger {
    pub fn new(storage: Arc<dyn Storage>, limits: QuotaLimits) -> Self {
        Self { storage, limits }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// 单个班级某类型的已用数量，存储不可用时返回 0
    pub async fn compute_usage(&self, class_id: &str, week: WeekInfo, kind: AssignmentKind) -> i64 {
        let class_ids = [class_id.to_string()];
        match self
            .storage
            .count_published_by_class(&class_ids, week, kind)
            .await
        {
            Ok(counts) => counts.get(class_id).copied().unwrap_or(0),
            Err(e) => {
                warn!("统计班级 {} 周配额失败，按 0 处理: {}", class_id, e);
                0
            }
        }
    }

    /// 批量检查多个班级的配额，存储不可用时每个班级返回 {used: 0, max: 默认值}
    pub async fn check_quota(
        &self,
        class_ids: &[String],
        week: WeekInfo,
        kind: AssignmentKind,
    ) -> QuotaCheck {
        let max = self.limits.max_for(kind);

        let (counts, degraded) = match self
            .storage
            .count_published_by_class(class_ids, week, kind)
            .await
        {
            Ok(counts) => (counts, false),
            Err(e) => {
                warn!(
                    "配额检查降级（{} 个班级，{} 年第 {} 周）: {}",
                    class_ids.len(),
                    week.year,
                    week.week_number,
                    e
                );
                (HashMap::new(), true)
            }
        };

        let usage = class_ids
            .iter()
            .map(|class_id| {
                let used = counts.get(class_id).copied().unwrap_or(0);
                (class_id.clone(), QuotaUsage { used, max })
            })
            .collect();

        QuotaCheck { usage, degraded }
    }

    /// 单个班级的周配额快照，第二个返回值表示是否降级
    pub async fn weekly_quota(&self, class_id: &str, week: WeekInfo) -> (WeeklyQuota, bool) {
        let class_ids = [class_id.to_string()];
        let tasks = self
            .storage
            .count_published_by_class(&class_ids, week, AssignmentKind::Task)
            .await;
        let exams = self
            .storage
            .count_published_by_class(&class_ids, week, AssignmentKind::Exam)
            .await;

        match (tasks, exams) {
            (Ok(tasks), Ok(exams)) => (
                WeeklyQuota::new(
                    tasks.get(class_id).copied().unwrap_or(0),
                    exams.get(class_id).copied().unwrap_or(0),
                    self.limits,
                ),
                false,
            ),
            (Err(e), _) | (_, Err(e)) => {
                warn!("读取班级 {} 周配额失败，返回默认值: {}", class_id, e);
                (WeeklyQuota::new(0, 0, self.limits), true)
            }
        }
    }

    /// 启用班级本周的负荷状态，供看板汇总
    pub async fn class_statuses(
        &self,
        week: WeekInfo,
        grade: Option<i32>,
    ) -> Result<Vec<ClassStatus>> {
        let usage = self.storage.list_class_usage(week, grade).await?;
        let limits = (self.limits.task_max, self.limits.exam_max);

        Ok(usage
            .into_iter()
            .map(|u| {
                ClassStatus::new(
                    u.class.id,
                    u.class.name,
                    u.class.grade,
                    (u.tasks_used, u.exams_used),
                    limits,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::AssignmentStatus;
    use crate::models::assignments::requests::NewAssignment;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::test_support::{seed_class, seed_teacher};

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn week() -> WeekInfo {
        WeekInfo {
            week_number: 12,
            year: 2025,
        }
    }

    fn new_assignment(teacher: i64, kind: AssignmentKind, class_ids: &[&str]) -> NewAssignment {
        NewAssignment {
            title: "Latihan soal".to_string(),
            subject: "Matematika".to_string(),
            description: None,
            kind,
            class_ids: ids(class_ids),
            week_number: week().week_number,
            year: week().year,
            status: AssignmentStatus::Published,
            created_by: teacher,
            due_date: None,
        }
    }

    async fn ledger_with_classes(classes: &[&str]) -> (Arc<dyn Storage>, i64) {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
        let teacher = seed_teacher(storage.as_ref(), "guru_satu").await;
        for class_id in classes {
            seed_class(storage.as_ref(), class_id).await;
        }
        (storage, teacher)
    }

    #[test]
    fn test_find_violations() {
        let counts = HashMap::from([("7A".to_string(), 2), ("7B".to_string(), 1)]);
        let violations = find_violations(&ids(&["7A", "7B", "7C"]), &counts, 2);
        assert_eq!(
            violations,
            vec![QuotaViolation {
                class_id: "7A".to_string(),
                used: 2,
                max: 2
            }]
        );
        assert_eq!(find_violations(&ids(&["7C"]), &counts, 0).len(), 1);
    }

    #[test]
    fn test_weekly_quota_snapshot() {
        let quota = WeeklyQuota::new(3, 1, QuotaLimits::default());
        assert_eq!(quota.tasks_remaining, 0);
        assert_eq!(quota.exams_remaining, 1);
        assert_eq!(quota.load.load_percentage, 100);
    }

    #[tokio::test]
    async fn test_usage_is_monotonic_and_ignores_unpublished() {
        let (storage, teacher) = ledger_with_classes(&["7A", "7B"]).await;
        let ledger = QuotaLedger::new(storage.clone(), QuotaLimits::new(5, 5));

        assert_eq!(ledger.compute_usage("7A", week(), AssignmentKind::Task).await, 0);

        let mut last = 0;
        for _ in 0..3 {
            let written = storage
                .create_assignment(
                    new_assignment(teacher, AssignmentKind::Task, &["7A"]),
                    ledger.limits(),
                )
                .await
                .unwrap();
            assert!(matches!(written, QuotaWrite::Committed(_)));

            let used = ledger.compute_usage("7A", week(), AssignmentKind::Task).await;
            assert_eq!(used, last + 1);
            last = used;
        }

        // 其他班级、其他类型不受影响
        assert_eq!(ledger.compute_usage("7B", week(), AssignmentKind::Task).await, 0);
        assert_eq!(ledger.compute_usage("7A", week(), AssignmentKind::Exam).await, 0);

        // 评价后不再占用名额
        let page = storage
            .list_assignments_with_pagination(Default::default())
            .await
            .unwrap();
        let graded = page.items[0].id;
        storage
            .update_assignment_status(graded, AssignmentStatus::Graded, None)
            .await
            .unwrap();
        assert_eq!(ledger.compute_usage("7A", week(), AssignmentKind::Task).await, 2);
    }

    #[tokio::test]
    async fn test_check_quota_reports_each_class() {
        let (storage, teacher) = ledger_with_classes(&["8A", "8B"]).await;
        let ledger = QuotaLedger::new(storage.clone(), QuotaLimits::default());

        for _ in 0..2 {
            storage
                .create_assignment(
                    new_assignment(teacher, AssignmentKind::Exam, &["8A"]),
                    ledger.limits(),
                )
                .await
                .unwrap();
        }

        let check = ledger
            .check_quota(&ids(&["8A", "8B"]), week(), AssignmentKind::Exam)
            .await;
        assert!(!check.degraded);
        assert_eq!(check.usage["8A"], QuotaUsage { used: 2, max: 2 });
        assert_eq!(check.usage["8B"], QuotaUsage { used: 0, max: 2 });
        assert!(!check.all_available());
    }

    #[tokio::test]
    async fn test_create_rejected_when_full() {
        let (storage, teacher) = ledger_with_classes(&["9A", "9B"]).await;
        let limits = QuotaLimits::default();

        for _ in 0..2 {
            storage
                .create_assignment(new_assignment(teacher, AssignmentKind::Task, &["9A"]), limits)
                .await
                .unwrap();
        }

        // 多班级布置要么全部成功，要么全部拒绝
        let result = storage
            .create_assignment(
                new_assignment(teacher, AssignmentKind::Task, &["9A", "9B"]),
                limits,
            )
            .await
            .unwrap();
        match result {
            QuotaWrite::Rejected(violations) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].class_id, "9A");
            }
            QuotaWrite::Committed(_) => panic!("expected rejection"),
        }

        let ledger = QuotaLedger::new(storage, limits);
        assert_eq!(ledger.compute_usage("9B", week(), AssignmentKind::Task).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_slot_race_admits_exactly_one() {
        const WRITERS: usize = 8;

        let path = std::env::temp_dir().join(format!(
            "loadboard-race-{}-{}.db",
            std::process::id(),
            rand::random::<u32>()
        ));
        let storage: Arc<dyn Storage> = Arc::new(
            SeaOrmStorage::new_sqlite_file(&path, WRITERS as u32)
                .await
                .unwrap(),
        );
        let teacher = seed_teacher(storage.as_ref(), "guru_balapan").await;
        let limits = QuotaLimits::default();

        for class_id in ["7A", "7B", "7C", "7D", "7E"] {
            seed_class(storage.as_ref(), class_id).await;
            storage
                .create_assignment(new_assignment(teacher, AssignmentKind::Task, &[class_id]), limits)
                .await
                .unwrap();

            // 只剩一个名额，多个连接同时抢
            let writers = (0..WRITERS).map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .create_assignment(
                            new_assignment(teacher, AssignmentKind::Task, &[class_id]),
                            limits,
                        )
                        .await
                })
            });
            let results: Vec<_> = futures_util::future::join_all(writers)
                .await
                .into_iter()
                .map(|joined| joined.unwrap().unwrap())
                .collect();

            let committed = results
                .iter()
                .filter(|r| matches!(r, QuotaWrite::Committed(_)))
                .count();
            assert_eq!(committed, 1, "class {class_id}");
            assert_eq!(results.len() - committed, WRITERS - 1, "class {class_id}");

            let ledger = QuotaLedger::new(storage.clone(), limits);
            assert_eq!(ledger.compute_usage(class_id, week(), AssignmentKind::Task).await, 2);
        }

        drop(storage);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[tokio::test]
    async fn test_degraded_mode_returns_defaults() {
        let storage: Arc<dyn Storage> =
            Arc::new(SeaOrmStorage::new_unmigrated_in_memory().await.unwrap());
        let ledger = QuotaLedger::new(storage, QuotaLimits::default());

        let check = ledger
            .check_quota(&ids(&["7A", "7B", "7C"]), week(), AssignmentKind::Task)
            .await;
        assert!(check.degraded);
        assert_eq!(check.usage.len(), 3);
        for usage in check.usage.values() {
            assert_eq!(*usage, QuotaUsage { used: 0, max: 2 });
        }

        assert_eq!(ledger.compute_usage("7A", week(), AssignmentKind::Exam).await, 0);

        let (quota, degraded) = ledger.weekly_quota("7A", week()).await;
        assert!(degraded);
        assert_eq!(quota.tasks_used, 0);
        assert_eq!(quota.task_max, 2);
    }
}
