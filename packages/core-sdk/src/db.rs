use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::{thread, time::Duration};

use crate::models::{MaintenanceRequest, StoredMaintenanceRequest};

/** \brief 默认数据库文件名（当前目录下）。 */
pub const DEFAULT_DB_FILE: &str = "assetlens.db";

/**
 * \brief 打开指定路径的数据库。
 */
pub fn open_db(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

/**
 * \brief 打开默认数据库文件（本地目录下的 assetlens.db）。
 */
pub fn open_default_db() -> Result<Connection> {
    open_db(DEFAULT_DB_FILE)
}

/**
 * \brief 运行数据库迁移，创建必要表结构。
 */
pub fn migrate(conn: &Connection) -> Result<()> {
    retry_on_locked(|| {
        conn.execute_batch(
            r#"
        PRAGMA journal_mode=WAL;
        CREATE TABLE IF NOT EXISTS settings (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS maintenance_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asset_id        TEXT NOT NULL,
            asset_name      TEXT NOT NULL,
            priority        TEXT NOT NULL,
            issues          TEXT NOT NULL,
            recommendations TEXT NOT NULL,
            requested_by    TEXT NOT NULL,
            requested_at    TEXT NOT NULL,
            status          TEXT NOT NULL,
            email_to        TEXT NOT NULL,
            email_subject   TEXT NOT NULL
        );
        "#,
        )
    })?;
    Ok(())
}

/**
 * \brief 读取单个设置项；不存在时返回 None。
 */
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

/**
 * \brief 写入（或覆盖）单个设置项。
 */
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    retry_on_locked(|| {
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )
    })?;
    Ok(())
}

/**
 * \brief 批量读取设置项，返回 key→value 映射；缺失的键不出现在结果里。
 */
pub fn get_settings(conn: &Connection, keys: &[&str]) -> Result<HashMap<String, String>> {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders = vec!["?"; keys.len()].join(", ");
    let sql = format!("SELECT key, value FROM settings WHERE key IN ({})", placeholders);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(keys.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().collect())
}

fn set_bool_setting(conn: &Connection, key: &str, value: bool) -> Result<()> {
    set_setting(conn, key, if value { "1" } else { "0" })
}

fn get_bool_setting(conn: &Connection, key: &str, default: bool) -> Result<bool> {
    Ok(get_setting(conn, key)?.map(|s| s == "1").unwrap_or(default))
}

/**
 * \brief 读取遥测开关。
 */
pub fn get_telemetry_enabled(conn: &Connection) -> Result<bool> {
    get_bool_setting(conn, "telemetry_enabled", false)
}

/**
 * \brief 更新遥测开关。
 */
pub fn set_telemetry_enabled(conn: &Connection, enabled: bool) -> Result<()> {
    set_bool_setting(conn, "telemetry_enabled", enabled)
}

/**
 * \brief 写入一条维修请求审计记录。
 */
pub fn insert_maintenance_request(conn: &Connection, record: &MaintenanceRequest) -> Result<i64> {
    retry_on_locked(|| {
        conn.execute(
            "INSERT INTO maintenance_requests
             (asset_id, asset_name, priority, issues, recommendations,
              requested_by, requested_at, status, email_to, email_subject)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.asset_id,
                record.asset_name,
                record.priority,
                record.issues,
                record.recommendations,
                record.requested_by,
                record.requested_at,
                record.status,
                record.email_to,
                record.email_subject,
            ],
        )
    })?;
    Ok(conn.last_insert_rowid())
}

/**
 * \brief 按时间倒序列出审计记录。
 */
pub fn list_maintenance_requests(conn: &Connection) -> Result<Vec<StoredMaintenanceRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, asset_id, asset_name, priority, issues, recommendations,
                requested_by, requested_at, status, email_to, email_subject
         FROM maintenance_requests ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredMaintenanceRequest {
                id: row.get(0)?,
                asset_id: row.get(1)?,
                asset_name: row.get(2)?,
                priority: row.get(3)?,
                issues: row.get(4)?,
                recommendations: row.get(5)?,
                requested_by: row.get(6)?,
                requested_at: row.get(7)?,
                status: row.get(8)?,
                email_to: row.get(9)?,
                email_subject: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/**
 * \brief 针对 SQLite 锁冲突的重试助手。
 * \details 捕获 `database is locked`/`database table is locked` 等错误并进行退避重试，
 *          最大尝试 6 次。
 */
fn retry_on_locked<T, F>(mut action: F) -> Result<T>
where
    F: FnMut() -> rusqlite::Result<T>,
{
    const MAX_RETRIES: usize = 5;
    for attempt in 0..=MAX_RETRIES {
        match action() {
            Ok(value) => return Ok(value),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if matches!(
                    err.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) && attempt < MAX_RETRIES =>
            {
                let backoff = Duration::from_millis(200 * (attempt as u64 + 1));
                thread::sleep(backoff);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    unreachable!("retry_on_locked should have returned within the loop");
}
