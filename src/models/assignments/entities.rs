use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 任务类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum AssignmentKind {
    Task, // 作业 / 任务
    Exam, // 考试
}

string_enum!(AssignmentKind, "任务类型", {
    Task => "TASK",
    Exam => "EXAM",
});

// 任务状态（持久化）
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum AssignmentStatus {
    Draft,     // 草稿
    Published, // 已发布，占用周配额
    Graded,    // 已评价
    Closed,    // 已关闭（终态）
}

impl AssignmentStatus {
    /// 只有已发布的任务占用周配额
    pub fn occupies_quota(&self) -> bool {
        *self == AssignmentStatus::Published
    }
}

string_enum!(AssignmentStatus, "任务状态", {
    Draft => "draft",
    Published => "published",
    Graded => "graded",
    Closed => "closed",
});

// 展示状态：在持久化状态基础上叠加"周已过未评价"
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum DisplayStatus {
    Draft,
    Published,
    NotEvaluated,
    Graded,
    Closed,
}

// 任务实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub kind: AssignmentKind,
    pub week_number: i32,
    pub year: i32,
    pub status: AssignmentStatus,
    // 创建教师 ID
    pub created_by: i64,
    // 目标班级
    pub class_ids: Vec<String>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&AssignmentKind::Exam).unwrap(), r#""EXAM""#);
        let kind: AssignmentKind = serde_json::from_str(r#""task""#).unwrap();
        assert_eq!(kind, AssignmentKind::Task);
        assert!(serde_json::from_str::<AssignmentKind>(r#""QUIZ""#).is_err());
    }

    #[test]
    fn test_only_published_occupies_quota() {
        assert!(AssignmentStatus::Published.occupies_quota());
        assert!(!AssignmentStatus::Draft.occupies_quota());
        assert!(!AssignmentStatus::Graded.occupies_quota());
        assert!(!AssignmentStatus::Closed.occupies_quota());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("graded".parse(), Ok(AssignmentStatus::Graded));
        assert!("archived".parse::<AssignmentStatus>().is_err());
    }
}
