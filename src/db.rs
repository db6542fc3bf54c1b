// ==========================================
// 码头堆存费用 KPI 系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有连接的 busy_timeout
// - 读路径只读打开，连接失败按固定间隔重试，耗尽后报告数据源不可用
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, OpenFlags};
use std::thread;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 20_000;

/// 连接重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(2_000),
        }
    }
}

/// 配置 SQLite 连接的统一参数
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开读写连接（导入、配置写入使用）
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开只读连接，失败时按策略重试
///
/// # 返回
/// - Ok(Connection): 已探测可读的连接
/// - Err(DataUnavailable): 重试耗尽
pub fn open_read_only_with_retry(
    db_path: &str,
    policy: RetryPolicy,
) -> RepositoryResult<Connection> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match try_open_read_only(db_path) {
            Ok(conn) => {
                if attempt > 1 {
                    tracing::info!(db_path, attempt, "数据库连接重试成功");
                }
                return Ok(conn);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < max_attempts {
                    tracing::warn!(
                        db_path,
                        attempt,
                        max_attempts,
                        error = %last_error,
                        "数据库连接失败，等待后重试"
                    );
                    thread::sleep(policy.backoff);
                }
            }
        }
    }

    tracing::error!(db_path, max_attempts, error = %last_error, "数据库连接重试耗尽");
    Err(RepositoryError::DataUnavailable {
        attempts: max_attempts,
        message: last_error,
    })
}

fn try_open_read_only(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    configure_sqlite_connection(&conn)?;
    // 只读打开是惰性的，探测一次 schema 才能发现文件不可读
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(conn)
}

/// 事业部表名校验（表名无法参数化，只允许字母数字下划线）
pub fn validate_table_name(name: &str) -> RepositoryResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidDivision(name.to_string()))
    }
}

/// 标识符加双引号
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 表是否存在
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
