use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 不带前缀的常用环境变量 -> 配置键
const ENV_OVERRIDES: [(&str, &str); 13] = [
    ("APP_ENV", "app.environment"),
    ("RUST_LOG", "app.log_level"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("UNIX_SOCKET", "server.unix_socket_path"),
    ("CPU_COUNT", "server.workers"),
    ("JWT_SECRET", "jwt.secret"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "cache.redis.url"),
    ("REDIS_KEY_PREFIX", "cache.redis.key_prefix"),
    ("CACHE_TTL", "cache.default_ttl"),
    ("QUOTA_TASK_MAX", "quota.task_max"),
    ("QUOTA_EXAM_MAX", "quota.exam_max"),
];

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{env_name}")).required(false))
            .add_source(
                Environment::with_prefix("LOADBOARD")
                    .separator("__")
                    .try_parsing(true),
            );
        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.resolve_workers();
        app_config.validate()?;
        Ok(app_config)
    }

    fn resolve_workers(&mut self) {
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers.max(1));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.quota.task_max < 0 || self.quota.exam_max < 0 {
            Some("quota.task_max / quota.exam_max must not be negative")
        } else if self.quota.supported_grades.is_empty() {
            Some("quota.supported_grades must list at least one grade")
        } else if self.database.url.trim().is_empty() {
            Some("database.url must not be empty")
        } else {
            None
        };
        match problem {
            Some(msg) => Err(ConfigError::Message(msg.to_string())),
            None => Ok(()),
        }
    }

    /// 全局配置；未调用 init 时按需加载，失败直接退出进程
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    pub fn init() -> Result<(), ConfigError> {
        APP_CONFIG
            .set(Self::load()?)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuotaConfig;

    #[test]
    fn test_quota_defaults() {
        let quota = QuotaConfig::default();
        assert_eq!((quota.task_max, quota.exam_max), (2, 2));
        assert_eq!(quota.supported_grades, vec![7, 8, 9]);
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "[quota]\ntask_max = 3\n[server]\nport = 9090\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.quota.task_max, 3);
        assert_eq!(config.quota.exam_max, 2);
        assert_eq!(config.server_bind_address(), "127.0.0.1:9090");
        assert_eq!(config.cache.cache_type, "moka");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_quota_rejected() {
        let mut config = AppConfig::default();
        config.quota.exam_max = -1;
        assert!(config.validate().is_err());

        config.quota.exam_max = 2;
        config.server.max_workers = 0;
        config.resolve_workers();
        assert_eq!(config.server.workers, 1);
    }
}
