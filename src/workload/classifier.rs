//! 负荷分级与按年级汇总

use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum LoadTier {
    Low,    // < 50%
    Medium, // 50% ~ 99%
    Full,   // >= 100%
}

impl LoadTier {
    pub fn from_percentage(load_percentage: i64) -> Self {
        match load_percentage {
            p if p >= 100 => LoadTier::Full,
            p if p >= 50 => LoadTier::Medium,
            _ => LoadTier::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct LoadClassification {
    pub load_percentage: i64,
    pub is_overloaded: bool,
    pub tier: LoadTier,
}

/// 计算单个班级的负荷百分比
pub fn classify_class(
    tasks_used: i64,
    exams_used: i64,
    task_max: i64,
    exam_max: i64,
) -> LoadClassification {
    let used = tasks_used.max(0) + exams_used.max(0);
    let capacity = task_max.max(0) + exam_max.max(0);
    let load_percentage = load_percentage(used, capacity);

    LoadClassification {
        load_percentage,
        is_overloaded: load_percentage >= 100,
        tier: LoadTier::from_percentage(load_percentage),
    }
}

/// round(100 * used / capacity)，0.5 向上取整
fn load_percentage(used: i64, capacity: i64) -> i64 {
    if capacity == 0 {
        return if used > 0 { 100 } else { 0 };
    }
    (200 * used + capacity) / (2 * capacity)
}

/// 单个班级的本周负荷
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct ClassStatus {
    pub class_id: String,
    pub class_name: String,
    pub grade: i32,
    pub tasks_used: i64,
    pub exams_used: i64,
    pub task_max: i64,
    pub exam_max: i64,
    #[serde(flatten)]
    #[ts(flatten)]
    pub load: LoadClassification,
}

impl ClassStatus {
    pub fn new(
        class_id: impl Into<String>,
        class_name: impl Into<String>,
        grade: i32,
        (tasks_used, exams_used): (i64, i64),
        (task_max, exam_max): (i64, i64),
    ) -> Self {
        Self {
            class_id: class_id.into(),
            class_name: class_name.into(),
            grade,
            tasks_used,
            exams_used,
            task_max,
            exam_max,
            load: classify_class(tasks_used, exams_used, task_max, exam_max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct GradeSummary {
    pub grade: i32,
    pub total: i64,
    pub avg_load: i64,
    pub max_load: i64,
    pub overloaded_count: i64,
    pub classes: Vec<ClassStatus>,
}

/// 按年级汇总，年级升序，年级内按班级编号排序
pub fn aggregate_by_grade(statuses: &[ClassStatus]) -> Vec<GradeSummary> {
    let mut sorted: Vec<&ClassStatus> = statuses.iter().collect();
    sorted.sort_by(|a, b| a.grade.cmp(&b.grade).then_with(|| a.class_id.cmp(&b.class_id)));

    let mut summaries: Vec<GradeSummary> = Vec::new();
    for status in sorted {
        match summaries.last_mut() {
            Some(summary) if summary.grade == status.grade => summary.classes.push(status.clone()),
            _ => summaries.push(GradeSummary {
                grade: status.grade,
                total: 0,
                avg_load: 0,
                max_load: 0,
                overloaded_count: 0,
                classes: vec![status.clone()],
            }),
        }
    }

    for summary in &mut summaries {
        fill_summary(summary);
    }
    summaries
}

/// 为没有班级的年级生成空汇总（降级模式或尚未建班）
pub fn empty_grade(grade: i32) -> GradeSummary {
    GradeSummary {
        grade,
        total: 0,
        avg_load: 0,
        max_load: 0,
        overloaded_count: 0,
        classes: Vec::new(),
    }
}

fn fill_summary(summary: &mut GradeSummary) {
    let loads: Vec<i64> = summary
        .classes
        .iter()
        .map(|c| c.load.load_percentage)
        .collect();

    summary.total = loads.len() as i64;
    summary.avg_load = rounded_mean(&loads);
    summary.max_load = loads.iter().copied().max().unwrap_or(0);
    summary.overloaded_count = summary
        .classes
        .iter()
        .filter(|c| c.load.is_overloaded)
        .count() as i64;
}

fn rounded_mean(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let n = values.len() as i64;
    let sum: i64 = values.iter().sum();
    (2 * sum + n) / (2 * n)
}

/// 看板总览
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardOverview {
    pub total_classes: i64,
    pub overloaded_classes: i64,
    pub avg_load: i64,
    pub tasks_used: i64,
    pub exams_used: i64,
}

pub fn summarize(grades: &[GradeSummary]) -> DashboardOverview {
    let classes: Vec<&ClassStatus> = grades.iter().flat_map(|g| g.classes.iter()).collect();
    let loads: Vec<i64> = classes.iter().map(|c| c.load.load_percentage).collect();

    DashboardOverview {
        total_classes: classes.len() as i64,
        overloaded_classes: classes.iter().filter(|c| c.load.is_overloaded).count() as i64,
        avg_load: rounded_mean(&loads),
        tasks_used: classes.iter().map(|c| c.tasks_used).sum(),
        exams_used: classes.iter().map(|c| c.exams_used).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: &str, grade: i32, tasks: i64, exams: i64) -> ClassStatus {
        ClassStatus::new(id, format!("Kelas {id}"), grade, (tasks, exams), (2, 2))
    }

    #[test]
    fn test_load_boundaries() {
        assert_eq!(classify_class(0, 0, 2, 2).load_percentage, 0);
        assert_eq!(classify_class(1, 0, 2, 2).load_percentage, 25);
        assert_eq!(classify_class(1, 1, 2, 2).load_percentage, 50);
        assert_eq!(classify_class(2, 1, 2, 2).load_percentage, 75);

        let full = classify_class(2, 2, 2, 2);
        assert_eq!(full.load_percentage, 100);
        assert!(full.is_overloaded);
        assert_eq!(full.tier, LoadTier::Full);

        let over = classify_class(3, 2, 2, 2);
        assert_eq!(over.load_percentage, 125);
        assert!(over.is_overloaded);
    }

    #[test]
    fn test_rounding_half_up() {
        // 1/3 = 33.3 -> 33, 2/3 = 66.7 -> 67, 1/8 = 12.5 -> 13
        assert_eq!(classify_class(1, 0, 2, 1).load_percentage, 33);
        assert_eq!(classify_class(2, 0, 2, 1).load_percentage, 67);
        assert_eq!(classify_class(1, 0, 4, 4).load_percentage, 13);
    }

    #[test]
    fn test_zero_capacity() {
        assert_eq!(classify_class(0, 0, 0, 0).load_percentage, 0);
        assert!(!classify_class(0, 0, 0, 0).is_overloaded);
        assert!(classify_class(1, 0, 0, 0).is_overloaded);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(LoadTier::from_percentage(0), LoadTier::Low);
        assert_eq!(LoadTier::from_percentage(49), LoadTier::Low);
        assert_eq!(LoadTier::from_percentage(50), LoadTier::Medium);
        assert_eq!(LoadTier::from_percentage(99), LoadTier::Medium);
        assert_eq!(LoadTier::from_percentage(100), LoadTier::Full);
    }

    #[test]
    fn test_aggregate_by_grade() {
        let statuses = vec![
            status("8B", 8, 2, 2),
            status("7B", 7, 1, 0),
            status("7A", 7, 1, 1),
            status("8A", 8, 0, 0),
            status("7C", 7, 2, 2),
        ];

        let grades = aggregate_by_grade(&statuses);
        assert_eq!(grades.len(), 2);

        let g7 = &grades[0];
        assert_eq!(g7.grade, 7);
        assert_eq!(g7.total, 3);
        // (50 + 25 + 100) / 3 = 58.3
        assert_eq!(g7.avg_load, 58);
        assert_eq!(g7.max_load, 100);
        assert_eq!(g7.overloaded_count, 1);
        let ids: Vec<&str> = g7.classes.iter().map(|c| c.class_id.as_str()).collect();
        assert_eq!(ids, ["7A", "7B", "7C"]);

        let g8 = &grades[1];
        assert_eq!(g8.avg_load, 50);
        assert_eq!(g8.overloaded_count, 1);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let statuses = vec![status("9A", 9, 1, 2), status("9B", 9, 0, 1)];
        let first = aggregate_by_grade(&statuses);
        let second = aggregate_by_grade(&statuses);
        assert_eq!(first, second);

        let mut reversed = statuses.clone();
        reversed.reverse();
        assert_eq!(aggregate_by_grade(&reversed), first);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_grade(&[]).is_empty());
        let overview = summarize(&[empty_grade(7)]);
        assert_eq!(overview.total_classes, 0);
        assert_eq!(overview.avg_load, 0);
    }

    #[test]
    fn test_summarize() {
        let grades = aggregate_by_grade(&[
            status("7A", 7, 2, 2),
            status("8A", 8, 1, 0),
        ]);
        let overview = summarize(&grades);
        assert_eq!(overview.total_classes, 2);
        assert_eq!(overview.overloaded_classes, 1);
        // (100 + 25) / 2 = 62.5
        assert_eq!(overview.avg_load, 63);
        assert_eq!(overview.tasks_used, 3);
        assert_eq!(overview.exams_used, 2);
    }
}
