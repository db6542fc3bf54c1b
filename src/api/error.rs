// ==========================================
// 码头堆存费用 KPI 系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储/引擎/导入错误转换为面向界面的错误消息
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据源不可用: {0}")]
    DataUnavailable(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DataUnavailable { attempts, message } => {
                ApiError::DataUnavailable(format!("重试 {} 次后失败: {}", attempts, message))
            }
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::InvalidDivision(name) => {
                ApiError::InvalidInput(format!("非法的事业部: {}", name))
            }
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidMonthRange { .. } => ApiError::InvalidInput(err.to_string()),
            EngineError::Repository(e) => e.into(),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => e.into(),
            ImportError::MissingDivision | ImportError::UnknownDivision(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            ImportError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::YearMonth;

    #[test]
    fn test_data_unavailable_mapping() {
        let err: ApiError = RepositoryError::DataUnavailable {
            attempts: 3,
            message: "unable to open".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::DataUnavailable(_)));
    }

    #[test]
    fn test_engine_range_is_invalid_input() {
        let err: ApiError = EngineError::InvalidMonthRange {
            start: YearMonth::new(2024, 5).unwrap(),
            end: YearMonth::new(2024, 1).unwrap(),
        }
        .into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_import_missing_division_is_invalid_input() {
        let err: ApiError = ImportError::MissingDivision.into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
