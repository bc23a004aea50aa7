pub mod create;
pub mod delete;
pub mod detail;
pub mod list;
pub mod status;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::assignments::{
    entities::Assignment,
    requests::{AssignmentListParams, CreateAssignmentRequest, UpdateAssignmentStatusRequest},
    responses::AssignmentResponse,
};
use crate::workload::{WeekInfo, display_status};

request_scoped_service!(AssignmentService);

impl AssignmentService {
    // 任务列表
    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request, query).await
    }

    // 布置任务 / 考试
    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(self, request, req).await
    }

    // 任务详情
    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_assignment(self, request, assignment_id).await
    }

    // 状态变更
    pub async fn update_status(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: UpdateAssignmentStatusRequest,
    ) -> ActixResult<HttpResponse> {
        status::update_status(self, request, assignment_id, req).await
    }

    // 删除任务
    pub async fn delete_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_assignment(self, request, assignment_id).await
    }
}

/// 附加展示状态
pub(crate) fn with_display_status(
    assignment: Assignment,
    current_week: WeekInfo,
) -> AssignmentResponse {
    let assignment_week = WeekInfo {
        week_number: assignment.week_number,
        year: assignment.year,
    };
    AssignmentResponse {
        display_status: display_status(assignment.status, assignment_week, current_week),
        assignment,
    }
}

/// 教师只能操作自己布置的任务，管理员不受限
pub(crate) fn can_manage(assignment: &Assignment, user_id: i64, is_admin: bool) -> bool {
    is_admin || assignment.created_by == user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::{AssignmentKind, AssignmentStatus, DisplayStatus};

    fn assignment(status: AssignmentStatus, week_number: i32) -> Assignment {
        let now = chrono::Utc::now();
        Assignment {
            id: 1,
            title: "Ulangan harian".into(),
            subject: "IPA".into(),
            description: None,
            kind: AssignmentKind::Exam,
            week_number,
            year: 2025,
            status,
            created_by: 5,
            class_ids: vec!["8A".into()],
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_display_status_attached() {
        let current = WeekInfo {
            week_number: 20,
            year: 2025,
        };
        let past = with_display_status(assignment(AssignmentStatus::Published, 19), current);
        assert_eq!(past.display_status, DisplayStatus::NotEvaluated);
        assert_eq!(past.assignment.status, AssignmentStatus::Published);

        let this_week = with_display_status(assignment(AssignmentStatus::Published, 20), current);
        assert_eq!(this_week.display_status, DisplayStatus::Published);
    }

    #[test]
    fn test_can_manage() {
        let a = assignment(AssignmentStatus::Draft, 20);
        assert!(can_manage(&a, 5, false));
        assert!(!can_manage(&a, 6, false));
        assert!(can_manage(&a, 6, true));
    }
}
