// ==========================================
// 码头堆存费用 KPI 系统 - 引擎层错误类型
// ==========================================

use crate::domain::types::YearMonth;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("月份区间非法: {start} > {end}")]
    InvalidMonthRange { start: YearMonth, end: YearMonth },

    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),
}

pub type EngineResult<T> = Result<T, EngineError>;
