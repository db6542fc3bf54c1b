// ==========================================
// 码头堆存费用 KPI 系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value)，与事业部数据同库
// 规则: 表或键缺失 → 默认值；值格式非法 → 默认值 + warn
// ==========================================

use crate::config::division_registry::DivisionRegistry;
use crate::db::{configure_sqlite_connection, open_sqlite_connection, table_exists, RetryPolicy};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "TERMINAL_KPI_DB_PATH";

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const DIVISION_REGISTRY: &str = "division_registry"; // JSON
    pub const DB_RETRY_MAX_ATTEMPTS: &str = "db_retry_max_attempts";
    pub const DB_RETRY_BACKOFF_MS: &str = "db_retry_backoff_ms";
    pub const ESTIMATE_SINCE_YEAR: &str = "estimate_since_year";
}

/// 预估堆存明细默认起始年份
pub const DEFAULT_ESTIMATE_SINCE_YEAR: i32 = 2024;

/// 看板运行所需的全部配置
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub registry: DivisionRegistry,
    pub retry_policy: RetryPolicy,
    pub estimate_since_year: i32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            registry: DivisionRegistry::default(),
            retry_policy: RetryPolicy::default(),
            estimate_since_year: DEFAULT_ESTIMATE_SINCE_YEAR,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（读写连接）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
        )?;
        Ok(())
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置表或键不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        if !table_exists(&conn, "config_kv")? {
            return Ok(None);
        }
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        self.ensure_schema()?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        tracing::info!(key, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置，缺失或非法时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(key, value = %raw, default = %default, "配置值非法，使用默认值");
                Ok(default)
            }
        }
    }

    // ===== 事业部 =====

    pub fn division_registry(&self) -> RepositoryResult<DivisionRegistry> {
        let Some(raw) = self.get_config_value(config_keys::DIVISION_REGISTRY)? else {
            return Ok(DivisionRegistry::default());
        };
        match DivisionRegistry::from_json(&raw) {
            Ok(registry) if !registry.entries().is_empty() => Ok(registry),
            Ok(_) => {
                tracing::warn!("事业部注册表为空，使用默认注册表");
                Ok(DivisionRegistry::default())
            }
            Err(e) => {
                tracing::warn!(error = %e, "事业部注册表解析失败，使用默认注册表");
                Ok(DivisionRegistry::default())
            }
        }
    }

    // ===== 连接重试 =====

    pub fn retry_policy(&self) -> RepositoryResult<RetryPolicy> {
        let defaults = RetryPolicy::default();
        let max_attempts =
            self.get_parsed_or_default(config_keys::DB_RETRY_MAX_ATTEMPTS, defaults.max_attempts)?;
        let backoff_ms = self.get_parsed_or_default(
            config_keys::DB_RETRY_BACKOFF_MS,
            defaults.backoff.as_millis() as u64,
        )?;
        Ok(RetryPolicy {
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_millis(backoff_ms),
        })
    }

    // ===== 下钻 =====

    pub fn estimate_since_year(&self) -> RepositoryResult<i32> {
        self.get_parsed_or_default(config_keys::ESTIMATE_SINCE_YEAR, DEFAULT_ESTIMATE_SINCE_YEAR)
    }

    /// 一次性读取看板配置
    pub fn load_dashboard_config(&self) -> RepositoryResult<DashboardConfig> {
        Ok(DashboardConfig {
            registry: self.division_registry()?,
            retry_policy: self.retry_policy()?,
            estimate_since_year: self.estimate_since_year()?,
        })
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 TERMINAL_KPI_DB_PATH（非空时）
/// - 否则: 用户数据目录/terminal-storage-kpi/master_database.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let path = match dirs::data_dir() {
        Some(data_dir) => data_dir.join("terminal-storage-kpi").join("master_database.db"),
        None => PathBuf::from("./master_database.db"),
    };
    path.to_string_lossy().to_string()
}
