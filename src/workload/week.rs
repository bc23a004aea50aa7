//! ISO 周计算
//!
//! 周一为每周第一天，包含当年第一个周四的那一周为第 1 周。
//! 跨年时 ISO 年份可能与日历年份不同（如 2021-01-01 属于 2020 年第 53 周）。

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{LoadBoardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quota.ts")]
pub struct WeekInfo {
    pub week_number: i32,
    pub year: i32,
}

/// 计算给定时刻所在的 ISO 周
pub fn current_week_info(now: DateTime<Utc>) -> WeekInfo {
    WeekInfo::from_date(now.date_naive())
}

impl WeekInfo {
    pub fn from_date(date: NaiveDate) -> Self {
        // 移动到本周周四，周四所在年份即 ISO 年份
        let weekday = date.weekday().number_from_monday() as i64;
        let thursday = date + Duration::days(4 - weekday);

        // ceil((距 1 月 1 日天数 + 1) / 7)
        let week_number = (thursday.ordinal0() as i32 + 7) / 7;

        WeekInfo {
            week_number,
            year: thursday.year(),
        }
    }

    /// 校验 (周, 年) 是否存在于 ISO 日历中
    pub fn validate(week_number: i32, year: i32) -> Result<Self> {
        if week_number < 1
            || NaiveDate::from_isoywd_opt(year, week_number as u32, Weekday::Mon).is_none()
        {
            return Err(LoadBoardError::validation(format!(
                "无效的周: {year} 年第 {week_number} 周"
            )));
        }
        Ok(WeekInfo { week_number, year })
    }

    /// 请求中的可选周参数：两者都缺省时取当前周，只给一个视为错误
    pub fn resolve(
        week_number: Option<i32>,
        year: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        match (week_number, year) {
            (None, None) => Ok(current_week_info(now)),
            (Some(week), Some(year)) => Self::validate(week, year),
            _ => Err(LoadBoardError::validation(
                "week_number 与 year 必须同时提供",
            )),
        }
    }

    pub fn is_before(&self, other: &WeekInfo) -> bool {
        (self.year, self.week_number) < (other.year, other.week_number)
    }

    pub fn monday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week_number as u32, Weekday::Mon)
    }

    pub fn sunday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week_number as u32, Weekday::Sun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_matches_chrono_iso_week() {
        let mut date = ymd(2015, 12, 1);
        let end = ymd(2031, 2, 1);
        while date < end {
            let info = WeekInfo::from_date(date);
            let iso = date.iso_week();
            assert_eq!(
                (info.week_number, info.year),
                (iso.week() as i32, iso.year()),
                "{date}"
            );
            date += Duration::days(1);
        }
    }

    #[test]
    fn test_same_week_for_monday_to_sunday() {
        let monday = ymd(2025, 3, 10);
        let expected = WeekInfo::from_date(monday);
        for offset in 1..7 {
            assert_eq!(WeekInfo::from_date(monday + Duration::days(offset)), expected);
        }
        assert_ne!(WeekInfo::from_date(monday + Duration::days(7)), expected);
    }

    #[test]
    fn test_year_boundaries() {
        assert_eq!(
            WeekInfo::from_date(ymd(2021, 1, 1)),
            WeekInfo { week_number: 53, year: 2020 }
        );
        assert_eq!(
            WeekInfo::from_date(ymd(2024, 12, 30)),
            WeekInfo { week_number: 1, year: 2025 }
        );
        assert_eq!(
            WeekInfo::from_date(ymd(2026, 1, 1)),
            WeekInfo { week_number: 1, year: 2026 }
        );
        assert_eq!(
            WeekInfo::from_date(ymd(2027, 1, 3)),
            WeekInfo { week_number: 53, year: 2026 }
        );
    }

    #[test]
    fn test_current_week_uses_utc_date() {
        // 周日 23:30 UTC 仍属于上一周
        let now = Utc.with_ymd_and_hms(2025, 3, 16, 23, 30, 0).unwrap();
        assert_eq!(current_week_info(now), WeekInfo { week_number: 11, year: 2025 });
    }

    #[test]
    fn test_validate() {
        assert!(WeekInfo::validate(53, 2020).is_ok());
        assert!(WeekInfo::validate(53, 2021).is_err());
        assert!(WeekInfo::validate(0, 2025).is_err());
        assert!(WeekInfo::validate(54, 2026).is_err());
        assert!(WeekInfo::validate(1, 2025).is_ok());
    }

    #[test]
    fn test_resolve_requires_both_or_neither() {
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 8, 0, 0).unwrap();
        assert_eq!(
            WeekInfo::resolve(None, None, now).unwrap(),
            WeekInfo { week_number: 23, year: 2025 }
        );
        assert!(WeekInfo::resolve(Some(10), None, now).is_err());
        assert_eq!(
            WeekInfo::resolve(Some(10), Some(2024), now).unwrap(),
            WeekInfo { week_number: 10, year: 2024 }
        );
    }

    #[test]
    fn test_ordering_and_range() {
        let a = WeekInfo { week_number: 52, year: 2024 };
        let b = WeekInfo { week_number: 1, year: 2025 };
        assert!(a.is_before(&b));
        assert!(!b.is_before(&a));
        assert!(!a.is_before(&a));

        assert_eq!(b.monday(), Some(ymd(2024, 12, 30)));
        assert_eq!(b.sunday(), Some(ymd(2025, 1, 5)));
    }
}
