use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 配置值类型
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub enum SettingValueType {
    String,
    Integer,
    Boolean,
    JsonArray,
}

string_enum!(SettingValueType, "配置值类型", {
    String => "string",
    Integer => "integer",
    Boolean => "boolean",
    JsonArray => "json_array",
});

/// 已知配置键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSettingKey {
    SystemName,
    AccessTokenExpiry,
    RefreshTokenExpiry,
    QuotaTaskMax,
    QuotaExamMax,
    CorsAllowedOrigins,
    CorsMaxAge,
}

impl KnownSettingKey {
    pub fn value_type(&self) -> SettingValueType {
        match self {
            KnownSettingKey::SystemName => SettingValueType::String,
            KnownSettingKey::AccessTokenExpiry => SettingValueType::Integer,
            KnownSettingKey::RefreshTokenExpiry => SettingValueType::Integer,
            KnownSettingKey::QuotaTaskMax => SettingValueType::Integer,
            KnownSettingKey::QuotaExamMax => SettingValueType::Integer,
            KnownSettingKey::CorsAllowedOrigins => SettingValueType::JsonArray,
            KnownSettingKey::CorsMaxAge => SettingValueType::Integer,
        }
    }

    /// 整数配置的下限，配额允许为 0（表示本周禁止布置）
    pub fn min_integer(&self) -> i64 {
        match self {
            KnownSettingKey::QuotaTaskMax | KnownSettingKey::QuotaExamMax => 0,
            _ => 1,
        }
    }

    /// 校验管理员提交的值，返回规范化后的字符串
    pub fn validate_value(&self, value: &str) -> Result<String, String> {
        let value = value.trim();
        match self.value_type() {
            SettingValueType::String => {
                if value.is_empty() {
                    return Err(format!("{} must not be empty", self.as_str()));
                }
                Ok(value.to_string())
            }
            SettingValueType::Integer => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| format!("{} must be an integer", self.as_str()))?;
                if parsed < self.min_integer() {
                    return Err(format!(
                        "{} must be at least {}",
                        self.as_str(),
                        self.min_integer()
                    ));
                }
                Ok(parsed.to_string())
            }
            SettingValueType::Boolean => match value {
                "true" | "false" => Ok(value.to_string()),
                _ => Err(format!("{} must be true or false", self.as_str())),
            },
            SettingValueType::JsonArray => {
                let items = serde_json::from_str::<Vec<String>>(value)
                    .map_err(|_| format!("{} must be a JSON array of strings", self.as_str()))?;
                serde_json::to_string(&items).map_err(|e| e.to_string())
            }
        }
    }
}

string_enum!(KnownSettingKey, "配置项", {
    SystemName => "app.system_name",
    AccessTokenExpiry => "jwt.access_token_expiry",
    RefreshTokenExpiry => "jwt.refresh_token_expiry",
    QuotaTaskMax => "quota.task_max",
    QuotaExamMax => "quota.exam_max",
    CorsAllowedOrigins => "cors.allowed_origins",
    CorsMaxAge => "cors.max_age",
});

/// 系统设置实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<i64>,
}

/// 设置审计日志实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SettingAudit {
    pub id: i64,
    pub setting_key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: i64,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_round_trip() {
        for &key in KnownSettingKey::VARIANTS {
            assert_eq!(key.as_str().parse::<KnownSettingKey>(), Ok(key));
        }
        assert!("upload.max_size".parse::<KnownSettingKey>().is_err());
    }

    #[test]
    fn test_quota_values_allow_zero_but_not_negative() {
        let key = KnownSettingKey::QuotaTaskMax;
        assert_eq!(key.validate_value(" 3 "), Ok("3".to_string()));
        assert_eq!(key.validate_value("0"), Ok("0".to_string()));
        assert!(key.validate_value("-1").is_err());
        assert!(key.validate_value("two").is_err());

        assert!(KnownSettingKey::AccessTokenExpiry.validate_value("0").is_err());
    }

    #[test]
    fn test_string_and_array_values() {
        assert!(KnownSettingKey::SystemName.validate_value("  ").is_err());
        assert_eq!(
            KnownSettingKey::CorsAllowedOrigins.validate_value(r#"[ "http://a.test" ]"#),
            Ok(r#"["http://a.test"]"#.to_string())
        );
        assert!(
            KnownSettingKey::CorsAllowedOrigins
                .validate_value("http://a.test")
                .is_err()
        );
    }
}
