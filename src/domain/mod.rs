// ==========================================
// 码头堆存费用 KPI 系统 - 领域模型层
// ==========================================
// 职责: 定义记录、汇总、KPI 结果等实体与值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod container;
pub mod kpi;
pub mod lead_time;
pub mod logistics;
pub mod storage;
pub mod types;

// 重导出核心类型
pub use container::{ContainerCostLine, ContainerRecord, DD_MARKER, FIXED_MARKER};
pub use kpi::{AverageKpiResult, KpiResult, KpiTableRow};
pub use lead_time::{LeadTimeAnalysis, LeadTimeFilter};
pub use logistics::{
    DelayBucket, DelayPivotRow, DelayReasonPivot, ModalityPortStatus, VesselDelaySummary,
};
pub use storage::{
    ContainerCountRow, CostStatistics, DdRatioRow, MetricComparison, MonthComparison,
    MonthlyAggregate, MonthlyStorageSummary,
};
pub use types::{Grade, PortPolicy, YearMonth};
