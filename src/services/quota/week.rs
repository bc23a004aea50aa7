use actix_web::{HttpResponse, Result as ActixResult};

use crate::models::quota::responses::WeekInfoResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::workload::{WeekInfo, current_week_info};

pub(crate) fn week_range(week: WeekInfo) -> Option<WeekInfoResponse> {
    Some(WeekInfoResponse {
        week,
        start_date: week.monday()?,
        end_date: week.sunday()?,
    })
}

pub async fn current_week() -> ActixResult<HttpResponse> {
    let week = current_week_info(chrono::Utc::now());
    match week_range(week) {
        Some(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Current week retrieved successfully",
        ))),
        None => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InvalidWeek,
                format!("Week {}-W{} has no date range", week.year, week.week_number),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_week_range_across_year_boundary() {
        let range = week_range(WeekInfo {
            week_number: 1,
            year: 2025,
        })
        .unwrap();
        assert_eq!(range.start_date, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(range.end_date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
    }
}
