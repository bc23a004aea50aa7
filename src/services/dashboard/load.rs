use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use super::DashboardService;
use crate::config::AppConfig;
use crate::models::dashboard::{requests::DashboardQuery, responses::DashboardResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::workload::{
    ClassStatus, GradeSummary, QuotaLedger, QuotaLimits, WeekInfo, aggregate_by_grade,
    empty_grade, summarize,
};

/// 汇总并补齐没有班级的年级，保证看板上每个年级都有一栏
pub(crate) fn build_grades(statuses: &[ClassStatus], grades: &[i32]) -> Vec<GradeSummary> {
    let mut summaries = aggregate_by_grade(statuses);
    for grade in grades {
        if !summaries.iter().any(|s| s.grade == *grade) {
            summaries.push(empty_grade(*grade));
        }
    }
    summaries.sort_by_key(|s| s.grade);
    summaries
}

pub async fn get_load(
    service: &DashboardService,
    request: &HttpRequest,
    query: DashboardQuery,
) -> ActixResult<HttpResponse> {
    let week = match WeekInfo::resolve(query.week_number, query.year, chrono::Utc::now()) {
        Ok(week) => week,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::InvalidWeek, e.message())));
        }
    };

    let supported = &AppConfig::get().quota.supported_grades;
    let grades: Vec<i32> = match query.grade {
        Some(grade) if supported.contains(&grade) => vec![grade],
        Some(grade) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ValidationFailed,
                format!("Unsupported grade: {grade}"),
            )));
        }
        None => supported.clone(),
    };

    let ledger = QuotaLedger::new(service.get_storage(request), QuotaLimits::resolve().await);
    let (statuses, degraded) = match ledger.class_statuses(week, query.grade).await {
        Ok(statuses) => (statuses, false),
        Err(e) => {
            warn!(
                "Dashboard degraded for {}-W{:02}: {}",
                week.year, week.week_number, e
            );
            (Vec::new(), true)
        }
    };

    let grades = build_grades(&statuses, &grades);
    let response = DashboardResponse {
        week,
        overview: summarize(&grades),
        grades,
        degraded,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Dashboard load retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_grades_fills_missing_grades() {
        let statuses = vec![
            ClassStatus::new("8B", "8B", 8, (2, 2), (2, 2)),
            ClassStatus::new("8A", "8A", 8, (1, 0), (2, 2)),
        ];
        let grades = build_grades(&statuses, &[7, 8, 9]);

        assert_eq!(grades.iter().map(|g| g.grade).collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(grades[0], empty_grade(7));
        assert_eq!(grades[1].total, 2);
        assert_eq!(grades[1].overloaded_count, 1);
        assert_eq!(grades[1].classes[0].class_id, "8A");
        assert_eq!(grades[2].total, 0);
    }

    #[test]
    fn test_degraded_dashboard_is_all_zero() {
        let grades = build_grades(&[], &[7, 8, 9]);
        let overview = summarize(&grades);
        assert_eq!(grades.len(), 3);
        assert_eq!(overview.total_classes, 0);
        assert_eq!(overview.avg_load, 0);
    }
}
