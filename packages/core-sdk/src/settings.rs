use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::db;
use crate::error::GatewayError;

/** \brief OpenAI API 密钥在设置表中的键名。 */
pub const OPENAI_API_KEY_SETTING: &str = "openai_api_key";

struct CachedEntry {
    value: String,
    fetched_at: Instant,
}

/**
 * \brief 设置表的进程级读缓存。
 * \details 每个键按 TTL 缓存最近一次读到的值，过期后下次访问时重新查库；
 *          只缓存命中的键，查不到的键不会被负缓存。写路径（CLI `init`）
 *          直接落库，服务端在 TTL 内继续读旧值属预期行为。
 */
pub struct SettingsCache {
    db_path: PathBuf,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedEntry>>,
}

impl SettingsCache {
    pub fn new(db_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /**
     * \brief 读取单个设置项；TTL 内直接命中缓存，否则回源查库。
     */
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.lookup_fresh(key) {
            return Ok(Some(value));
        }
        let conn = db::open_db(&self.db_path)?;
        let value = db::get_setting(&conn, key)?;
        if let Some(ref value) = value {
            self.store(key, value.clone());
        }
        Ok(value)
    }

    /**
     * \brief 批量读取设置项；只对过期/未缓存的键回源，缺失的键不出现在结果里。
     */
    pub fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let mut found = HashMap::new();
        let mut stale: Vec<&str> = Vec::new();
        for &key in keys {
            match self.lookup_fresh(key) {
                Some(value) => {
                    found.insert(key.to_string(), value);
                }
                None => stale.push(key),
            }
        }
        if !stale.is_empty() {
            let conn = db::open_db(&self.db_path)?;
            let fetched = db::get_settings(&conn, &stale)?;
            for (key, value) in fetched {
                self.store(&key, value.clone());
                found.insert(key, value);
            }
        }
        Ok(found)
    }

    /**
     * \brief 丢弃单个键的缓存值，下次访问强制回源。
     */
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut guard) = self.entries.write() {
            guard.remove(key);
        }
    }

    /**
     * \brief 清空整个缓存。
     */
    pub fn invalidate_all(&self) {
        if let Ok(mut guard) = self.entries.write() {
            guard.clear();
        }
    }

    fn lookup_fresh(&self, key: &str) -> Option<String> {
        let guard = self.entries.read().ok()?;
        let entry = guard.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn store(&self, key: &str, value: String) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(
                key.to_string(),
                CachedEntry {
                    value,
                    fetched_at: Instant::now(),
                },
            );
        }
    }
}

/**
 * \brief 解析 OpenAI API 密钥。
 * \details 读不到、值为空或存储出错统一归为配置错误；具体原因不回传给调用方，
 *          避免把存储细节暴露到响应里。
 */
pub fn resolve_openai_api_key(cache: &SettingsCache) -> Result<String, GatewayError> {
    match cache.get(OPENAI_API_KEY_SETTING) {
        Ok(Some(key)) if !key.is_empty() => Ok(key),
        _ => Err(GatewayError::Configuration(
            "Failed to retrieve OpenAI API key from settings.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("settings-test.db");
        let conn = db::open_db(&path).expect("open db");
        db::migrate(&conn).expect("migrate");
        (dir, path)
    }

    fn write_setting(path: &PathBuf, key: &str, value: &str) {
        let conn = db::open_db(path).expect("open db");
        db::set_setting(&conn, key, value).expect("set setting");
    }

    #[test]
    fn test_fresh_value_served_from_cache() {
        let (_dir, path) = temp_db();
        write_setting(&path, "openai_api_key", "sk-old");

        let cache = SettingsCache::new(&path, Duration::from_secs(3600));
        assert_eq!(
            cache.get("openai_api_key").expect("get").as_deref(),
            Some("sk-old")
        );

        // TTL 内改库不影响已缓存的值
        write_setting(&path, "openai_api_key", "sk-new");
        assert_eq!(
            cache.get("openai_api_key").expect("get").as_deref(),
            Some("sk-old")
        );
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let (_dir, path) = temp_db();
        write_setting(&path, "openai_api_key", "sk-old");

        let cache = SettingsCache::new(&path, Duration::from_secs(3600));
        assert_eq!(
            cache.get("openai_api_key").expect("get").as_deref(),
            Some("sk-old")
        );

        write_setting(&path, "openai_api_key", "sk-new");
        cache.invalidate("openai_api_key");
        assert_eq!(
            cache.get("openai_api_key").expect("get").as_deref(),
            Some("sk-new")
        );
    }

    #[test]
    fn test_invalidate_all_flushes_every_key() {
        let (_dir, path) = temp_db();
        write_setting(&path, "email_smtp_server", "smtp.old.example.com");
        write_setting(&path, "email_username", "old@example.com");

        let cache = SettingsCache::new(&path, Duration::from_secs(3600));
        let values = cache
            .get_many(&["email_smtp_server", "email_username"])
            .expect("get_many");
        assert_eq!(values.len(), 2);

        write_setting(&path, "email_smtp_server", "smtp.new.example.com");
        write_setting(&path, "email_username", "new@example.com");
        cache.invalidate_all();

        assert_eq!(
            cache.get("email_smtp_server").expect("get").as_deref(),
            Some("smtp.new.example.com")
        );
        assert_eq!(
            cache.get("email_username").expect("get").as_deref(),
            Some("new@example.com")
        );
    }

    #[test]
    fn test_zero_ttl_always_rereads() {
        let (_dir, path) = temp_db();
        write_setting(&path, "email_port", "587");

        let cache = SettingsCache::new(&path, Duration::ZERO);
        assert_eq!(cache.get("email_port").expect("get").as_deref(), Some("587"));

        write_setting(&path, "email_port", "465");
        assert_eq!(cache.get("email_port").expect("get").as_deref(), Some("465"));
    }

    #[test]
    fn test_missing_key_is_not_cached() {
        let (_dir, path) = temp_db();

        let cache = SettingsCache::new(&path, Duration::from_secs(3600));
        assert!(cache.get("email_password").expect("get").is_none());

        // 未命中不会被缓存成"不存在"，写入后立即可见
        write_setting(&path, "email_password", "hunter2");
        assert_eq!(
            cache.get("email_password").expect("get").as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn test_get_many_mixes_cache_and_db() {
        let (_dir, path) = temp_db();
        write_setting(&path, "email_smtp_server", "smtp.example.com");
        write_setting(&path, "email_username", "robot@example.com");

        let cache = SettingsCache::new(&path, Duration::from_secs(3600));
        // 先单独读一个键进缓存
        assert!(cache.get("email_smtp_server").expect("get").is_some());

        let values = cache
            .get_many(&["email_smtp_server", "email_username", "email_password"])
            .expect("get_many");
        assert_eq!(values.len(), 2);
        assert_eq!(
            values.get("email_username").map(String::as_str),
            Some("robot@example.com")
        );
        assert!(!values.contains_key("email_password"));
    }

    #[test]
    fn test_resolve_api_key_maps_failures_to_configuration() {
        let (_dir, path) = temp_db();
        let cache = SettingsCache::new(&path, Duration::ZERO);

        match resolve_openai_api_key(&cache) {
            Err(GatewayError::Configuration(message)) => {
                assert_eq!(message, "Failed to retrieve OpenAI API key from settings.");
            }
            other => panic!("expected configuration error, got {:?}", other),
        }

        write_setting(&path, OPENAI_API_KEY_SETTING, "");
        assert!(matches!(
            resolve_openai_api_key(&cache),
            Err(GatewayError::Configuration(_))
        ));

        write_setting(&path, OPENAI_API_KEY_SETTING, "sk-live-123");
        assert_eq!(resolve_openai_api_key(&cache).expect("resolve"), "sk-live-123");
    }
}
