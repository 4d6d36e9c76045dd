use std::time::Duration;

/** \brief 默认的 OpenAI API 入口。 */
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com";

/** \brief 默认的 NHTSA vPIC API 入口。 */
pub const DEFAULT_VPIC_API_BASE: &str = "https://vpic.nhtsa.dot.gov";

/** \brief 出站 HTTP 请求的默认超时（秒）。 */
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/** \brief 设置缓存的默认有效期（秒）。 */
pub const DEFAULT_SETTINGS_TTL_SECS: u64 = 300;

/**
 * \brief 网关运行配置。
 * \details 所有字段都可以通过 `ASSETLENS_*` 环境变量覆盖，方便部署与测试。
 */
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub db_path: String,
    pub openai_api_base: String,
    pub vpic_api_base: String,
    pub http_timeout: Duration,
    pub settings_ttl: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            db_path: crate::db::DEFAULT_DB_FILE.to_string(),
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            vpic_api_base: DEFAULT_VPIC_API_BASE.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            settings_ttl: Duration::from_secs(DEFAULT_SETTINGS_TTL_SECS),
        }
    }
}

impl GatewayConfig {
    /**
     * \brief 从环境变量读取配置，未设置的项使用默认值。
     */
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: std::env::var("ASSETLENS_DB").unwrap_or(defaults.db_path),
            openai_api_base: std::env::var("ASSETLENS_OPENAI_API_BASE")
                .unwrap_or(defaults.openai_api_base),
            vpic_api_base: std::env::var("ASSETLENS_VPIC_API_BASE")
                .unwrap_or(defaults.vpic_api_base),
            http_timeout: Duration::from_secs(env_u64(
                "ASSETLENS_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            settings_ttl: Duration::from_secs(env_u64(
                "ASSETLENS_SETTINGS_TTL_SECS",
                DEFAULT_SETTINGS_TTL_SECS,
            )),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.db_path, "assetlens.db");
        assert_eq!(config.openai_api_base, "https://api.openai.com");
        assert_eq!(config.vpic_api_base, "https://vpic.nhtsa.dot.gov");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.settings_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_env_u64_parses_and_falls_back() {
        std::env::set_var("ASSETLENS_TEST_TIMEOUT_OK", "12");
        std::env::set_var("ASSETLENS_TEST_TIMEOUT_BAD", "not-a-number");
        assert_eq!(env_u64("ASSETLENS_TEST_TIMEOUT_OK", 30), 12);
        assert_eq!(env_u64("ASSETLENS_TEST_TIMEOUT_BAD", 30), 30);
        assert_eq!(env_u64("ASSETLENS_TEST_TIMEOUT_UNSET", 30), 30);
    }
}
