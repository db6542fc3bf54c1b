// ==========================================
// 码头堆存费用 KPI 系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 打开失败、锁冲突、查询失败统一归为 DataUnavailable
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据源不可用 =====
    #[error("数据源不可用 (尝试 {attempts} 次): {message}")]
    DataUnavailable { attempts: u32, message: String },

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== 参数错误 =====
    #[error("非法的事业部表名: {0}")]
    InvalidDivision(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::SqliteFailure(e, msg) => RepositoryError::DataUnavailable {
                attempts: 1,
                message: msg.unwrap_or_else(|| e.to_string()),
            },
            other => RepositoryError::DataUnavailable {
                attempts: 1,
                message: other.to_string(),
            },
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
