//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_loadboard_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum LoadBoardError {
            $($variant(String),)*
        }

        impl LoadBoardError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(LoadBoardError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(LoadBoardError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(LoadBoardError::$variant(msg) => msg,)*
                }
            }

            fn map_message(self, f: impl FnOnce(String) -> String) -> Self {
                match self {
                    $(LoadBoardError::$variant(msg) => LoadBoardError::$variant(f(msg)),)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl LoadBoardError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        LoadBoardError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_loadboard_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Authentication("E011", "Authentication Error"),
    Authorization("E012", "Authorization Error"),
    WriteConflict("E013", "Write Conflict Error"),
}

impl LoadBoardError {
    /// 存储层不可达
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LoadBoardError::DatabaseConnection(_))
    }

    /// 并发写冲突，可整体重试事务
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, LoadBoardError::WriteConflict(_))
    }

    /// 唯一约束冲突（用户名、邮箱、班级编号重复）
    pub fn is_unique_violation(&self) -> bool {
        const MARKERS: [&str; 3] = [
            "UNIQUE constraint failed",
            "duplicate key value",
            "Duplicate entry",
        ];
        matches!(self, LoadBoardError::DatabaseOperation(_))
            && MARKERS.iter().any(|m| self.message().contains(m))
    }

    /// 保留错误分类，在详情前追加上下文
    pub fn context(self, ctx: &str) -> Self {
        self.map_message(|msg| format!("{ctx}: {msg}"))
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LoadBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LoadBoardError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LoadBoardError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
                LoadBoardError::DatabaseConnection(err.to_string())
            }
            _ => {
                let msg = err.to_string();
                if is_conflict_message(&msg) {
                    LoadBoardError::WriteConflict(msg)
                } else {
                    LoadBoardError::DatabaseOperation(msg)
                }
            }
        }
    }
}

/// 识别各数据库的序列化失败 / 锁冲突报错
fn is_conflict_message(msg: &str) -> bool {
    const MARKERS: [&str; 5] = [
        "could not serialize access",
        "40001",
        "database is locked",
        "SQLITE_BUSY",
        "Deadlock found",
    ];
    MARKERS.iter().any(|m| msg.contains(m))
}

pub type Result<T> = std::result::Result<T, LoadBoardError>;

/// 存储层统一的 DbErr 转换，附带操作说明
pub(crate) fn db_err(ctx: &'static str) -> impl FnOnce(sea_orm::DbErr) -> LoadBoardError {
    move |e| LoadBoardError::from(e).context(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LoadBoardError::cache_connection("test").code(), "E001");
        assert_eq!(LoadBoardError::database_config("test").code(), "E003");
        assert_eq!(LoadBoardError::validation("test").code(), "E007");
        assert_eq!(LoadBoardError::authentication("test").code(), "E011");
        assert_eq!(LoadBoardError::write_conflict("test").code(), "E013");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            LoadBoardError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            LoadBoardError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = LoadBoardError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_unavailable_and_conflict_flags() {
        assert!(LoadBoardError::database_connection("pool timed out").is_unavailable());
        assert!(!LoadBoardError::database_operation("syntax error").is_unavailable());
        assert!(LoadBoardError::write_conflict("busy").is_write_conflict());
    }

    #[test]
    fn test_db_conflict_message_maps_to_write_conflict() {
        let err: LoadBoardError = sea_orm::DbErr::Custom(
            "error returned from database: could not serialize access due to concurrent update"
                .to_string(),
        )
        .into();
        assert!(err.is_write_conflict());

        let err: LoadBoardError = sea_orm::DbErr::Custom("no such table: classes".into()).into();
        assert_eq!(err.code(), "E005");
    }

    #[test]
    fn test_unique_violation_detection() {
        let err = db_err("创建班级失败")(sea_orm::DbErr::Custom(
            "UNIQUE constraint failed: classes.id".into(),
        ));
        assert!(err.is_unique_violation());
        assert!(!LoadBoardError::validation("UNIQUE constraint failed").is_unique_violation());
    }

    #[test]
    fn test_context_keeps_variant() {
        let err = db_err("统计周配额失败")(sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "refused".into(),
        )));
        assert!(err.is_unavailable());
        assert!(err.message().starts_with("统计周配额失败: "));
    }

    #[test]
    fn test_format_simple() {
        let err = LoadBoardError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}
