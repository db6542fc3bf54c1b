// ==========================================
// 码头堆存费用 KPI 系统 - 引擎层
// ==========================================
// 职责: 费用计算、汇总、排名与评分
// 红线: Engine 不拼 SQL，数据只通过 ContainerDataSource 读取
// 数据流: 原始记录 → 单箱费用 → 月度汇总 → 跨事业部排名 → 综合得分 → 区间平均
// ==========================================

pub mod division_aggregator;
pub mod error;
pub mod kpi_scorer;
pub mod lead_time;
pub mod logistics;
pub mod name_mapping;
pub mod period_averager;
pub mod ranking;
pub mod storage_cost;
pub mod trend;

// 重导出核心引擎
pub use division_aggregator::{DivisionAggregator, DivisionSeries, KpiSnapshot};
pub use error::{EngineError, EngineResult};
pub use kpi_scorer::{volume_bonus, KpiScorer};
pub use lead_time::LeadTimeAnalyzer;
pub use logistics::LogisticsAnalyzer;
pub use name_mapping::{standardize_origin, standardize_shipping_line};
pub use period_averager::PeriodAverager;
pub use storage_cost::StorageCostCalculator;
pub use trend::TrendAnalyzer;
