// ==========================================
// 码头堆存费用 KPI 系统 - 事业部更新时间仓储
// ==========================================
// 表: division_update_log (division 主键, updated_at 文本)
// 写入发生在批量重载事务内，由导入层传入事务连接
// ==========================================

use crate::db::table_exists;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub const UPDATE_LOG_TABLE: &str = "division_update_log";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct DivisionUpdateLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DivisionUpdateLogRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS division_update_log (
                division TEXT PRIMARY KEY,
                updated_at TEXT NOT NULL
            );
            "#,
        )
    }

    /// 记录事业部最近一次重载时间（UPSERT）
    pub fn record_update(
        conn: &Connection,
        division: &str,
        updated_at: NaiveDateTime,
    ) -> rusqlite::Result<()> {
        Self::ensure_schema(conn)?;
        conn.execute(
            "INSERT INTO division_update_log (division, updated_at) VALUES (?1, ?2)
             ON CONFLICT(division) DO UPDATE SET updated_at = excluded.updated_at",
            params![division, updated_at.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        Ok(())
    }

    /// 最近一次重载时间
    ///
    /// # 返回
    /// - Ok(None): 从未重载，或表不存在
    pub fn last_update_time(&self, division: &str) -> RepositoryResult<Option<NaiveDateTime>> {
        let conn = self.get_conn()?;
        if !table_exists(&conn, UPDATE_LOG_TABLE)? {
            return Ok(None);
        }

        let raw: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM division_update_log WHERE division = ?1",
                params![division],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|s| match NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!(division, value = %s, error = %e, "更新时间格式非法，忽略");
                None
            }
        }))
    }
}
