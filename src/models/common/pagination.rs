use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&size=`，查询串里的数字以字符串到达，两种形式都接受
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(default, deserialize_with = "lenient_i64")]
    #[ts(type = "number | null")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    #[ts(type = "number | null")]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginatedResponse<T: TS> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

/// 规整后的页码与每页条数：page >= 1，1 <= size <= 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub size: u64,
}

impl PageWindow {
    pub fn resolve(page: Option<i64>, size: Option<i64>, default_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1) as u64,
            size: size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE) as u64,
        }
    }

    /// sea-orm 分页器的页号从 0 开始
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    pub fn offset(&self) -> u64 {
        self.index() * self.size
    }

    pub fn info(&self, total: u64) -> PaginationInfo {
        PaginationInfo::new(self.page as i64, self.size as i64, total as i64)
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{s}'"))),
    }
}

impl PaginationInfo {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_strings_and_numbers() {
        let query: PaginationQuery = serde_json::from_str(r#"{"page": "3", "size": 20}"#).unwrap();
        assert_eq!((query.page, query.size), (Some(3), Some(20)));

        let empty: PaginationQuery = serde_json::from_str(r#"{"page": ""}"#).unwrap();
        assert_eq!((empty.page, empty.size), (None, None));

        assert!(serde_json::from_str::<PaginationQuery>(r#"{"page": "two"}"#).is_err());
    }

    #[test]
    fn test_window_clamps() {
        let window = PageWindow::resolve(Some(0), Some(500), 10);
        assert_eq!(window, PageWindow { page: 1, size: 100 });
        assert_eq!(window.offset(), 0);

        let third = PageWindow::resolve(Some(3), None, 20);
        assert_eq!((third.index(), third.offset()), (2, 40));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(PaginationInfo::new(1, 10, 0).total_pages, 0);
        assert_eq!(PaginationInfo::new(1, 10, 10).total_pages, 1);
        assert_eq!(PaginationInfo::new(2, 10, 11).total_pages, 2);
    }
}
