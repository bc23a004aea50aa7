//! 任务状态流转与展示状态推导

use crate::errors::{LoadBoardError, Result};
use crate::models::assignments::entities::{AssignmentStatus, DisplayStatus};

use super::WeekInfo;

/// 状态变更的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    // 目标状态与当前相同，直接返回
    Unchanged,
    // 普通写入
    Apply,
    // 进入 published，需在事务内重新校验配额
    Publish,
}

/// 校验 from -> to 是否允许
///
/// - draft -> published
/// - published -> graded
/// - 非 closed -> closed（仅管理员）
pub fn plan_transition(
    from: AssignmentStatus,
    to: AssignmentStatus,
    is_admin: bool,
) -> Result<Transition> {
    use AssignmentStatus::*;

    if from == to {
        return Ok(Transition::Unchanged);
    }

    match (from, to) {
        (Draft, Published) => Ok(Transition::Publish),
        (Published, Graded) => Ok(Transition::Apply),
        (Closed, _) => Err(LoadBoardError::validation("已关闭的任务不能再变更状态")),
        (_, Closed) if is_admin => Ok(Transition::Apply),
        (_, Closed) => Err(LoadBoardError::authorization("仅管理员可以关闭任务")),
        _ => Err(LoadBoardError::validation(format!(
            "不允许的状态变更: {from} -> {to}"
        ))),
    }
}

/// 读取时推导展示状态，不写回存储
pub fn display_status(
    stored: AssignmentStatus,
    assignment_week: WeekInfo,
    current_week: WeekInfo,
) -> DisplayStatus {
    match stored {
        AssignmentStatus::Published if assignment_week.is_before(&current_week) => {
            DisplayStatus::NotEvaluated
        }
        AssignmentStatus::Draft => DisplayStatus::Draft,
        AssignmentStatus::Published => DisplayStatus::Published,
        AssignmentStatus::Graded => DisplayStatus::Graded,
        AssignmentStatus::Closed => DisplayStatus::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssignmentStatus::*;

    fn week(week_number: i32, year: i32) -> WeekInfo {
        WeekInfo { week_number, year }
    }

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(plan_transition(Draft, Published, false).unwrap(), Transition::Publish);
        assert_eq!(plan_transition(Published, Graded, false).unwrap(), Transition::Apply);
        assert_eq!(plan_transition(Graded, Closed, true).unwrap(), Transition::Apply);
        assert_eq!(plan_transition(Draft, Closed, true).unwrap(), Transition::Apply);
        assert_eq!(plan_transition(Graded, Graded, false).unwrap(), Transition::Unchanged);
    }

    #[test]
    fn test_rejected_transitions() {
        let err = plan_transition(Graded, Published, true).unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(plan_transition(Draft, Graded, false).is_err());
        assert!(plan_transition(Published, Draft, true).is_err());
        assert!(plan_transition(Closed, Published, true).is_err());
        assert!(plan_transition(Closed, Draft, true).is_err());
    }

    #[test]
    fn test_close_requires_admin() {
        let err = plan_transition(Published, Closed, false).unwrap_err();
        assert_eq!(err.code(), "E012");
    }

    #[test]
    fn test_published_in_past_week_is_not_evaluated() {
        let current = week(10, 2025);
        assert_eq!(
            display_status(Published, week(9, 2025), current),
            DisplayStatus::NotEvaluated
        );
        assert_eq!(
            display_status(Published, week(52, 2024), current),
            DisplayStatus::NotEvaluated
        );
        assert_eq!(display_status(Published, current, current), DisplayStatus::Published);
        assert_eq!(
            display_status(Published, week(11, 2025), current),
            DisplayStatus::Published
        );
    }

    #[test]
    fn test_other_statuses_unaffected_by_week() {
        let past = week(1, 2024);
        let current = week(10, 2025);
        assert_eq!(display_status(Draft, past, current), DisplayStatus::Draft);
        assert_eq!(display_status(Graded, past, current), DisplayStatus::Graded);
        assert_eq!(display_status(Closed, past, current), DisplayStatus::Closed);
    }
}
