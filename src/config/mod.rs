// ==========================================
// 码头堆存费用 KPI 系统 - 配置层
// ==========================================
// 职责: 事业部注册表、连接重试、下钻参数
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod division_registry;

// 重导出核心配置管理器
pub use config_manager::{config_keys, get_default_db_path, ConfigManager, DashboardConfig};
pub use division_registry::{DivisionEntry, DivisionRegistry};
