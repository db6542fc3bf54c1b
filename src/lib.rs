// ==========================================
// 码头堆存费用 KPI 系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 堆存费用计算与事业部 KPI 评分（看板只读展示）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 费用与评分规则
pub mod engine;

// 导入层 - 外部数据批量重载
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/只读重试）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 看板接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Grade, PortPolicy, YearMonth};

// 领域实体
pub use domain::{
    AverageKpiResult, ContainerCostLine, ContainerRecord, KpiResult, KpiTableRow,
    LeadTimeAnalysis, LeadTimeFilter, MonthlyAggregate, MonthlyStorageSummary,
};

// 引擎
pub use engine::{
    DivisionAggregator, KpiScorer, LeadTimeAnalyzer, PeriodAverager, StorageCostCalculator,
    TrendAnalyzer,
};

// 数据源
pub use repository::{ContainerDataSource, InMemoryDataSource, SqliteContainerRepository};

// API
pub use api::{ApiError, DashboardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "码头堆存费用 KPI 系统";
