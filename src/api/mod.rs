// ==========================================
// 码头堆存费用 KPI 系统 - API 层
// ==========================================
// 职责: 面向界面层的查询与导入入口
// ==========================================

pub mod dashboard_api;
pub mod error;

pub use dashboard_api::{import_into, DashboardApi};
pub use error::{ApiError, ApiResult};
