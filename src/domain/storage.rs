// ==========================================
// 码头堆存费用 KPI 系统 - 月度汇总领域模型
// ==========================================

use crate::domain::types::YearMonth;
use serde::{Deserialize, Serialize};

// ==========================================
// MonthlyAggregate - 事业部月度堆存汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month: YearMonth,
    pub total_storage_cost: f64,
    pub container_count: u64,
}

impl MonthlyAggregate {
    /// 单箱堆存费用（箱量为 0 时返回 0）
    pub fn cost_per_container(&self) -> f64 {
        if self.container_count > 0 {
            self.total_storage_cost / self.container_count as f64
        } else {
            0.0
        }
    }
}

/// 月度箱量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCountRow {
    pub month: YearMonth,
    pub container_count: u64,
}

/// 月度 DD 比例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdRatioRow {
    pub month: YearMonth,
    pub dd_count: u64,
    pub container_count: u64,
    pub dd_ratio: f64, // 百分比，箱量为 0 时为 0
}

// ==========================================
// MonthlyStorageSummary - 月度明细表一行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStorageSummary {
    pub month: YearMonth,
    pub total_storage_cost: f64,
    pub container_count: u64,
    pub cost_per_container: f64,
    pub dd_count: u64,
    pub dd_ratio: f64,
}

/// 两月对比中的单项指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub first: f64,
    pub second: f64,
    pub change_pct: Option<f64>, // first 为 0 时不可比
}

impl MetricComparison {
    pub fn new(first: f64, second: f64) -> Self {
        let change_pct = if first != 0.0 {
            Some((second - first) / first * 100.0)
        } else {
            None
        };
        Self {
            first,
            second,
            change_pct,
        }
    }
}

/// 两月对比（first < second）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub first_month: YearMonth,
    pub second_month: YearMonth,
    pub storage_cost: MetricComparison,
    pub container_count: MetricComparison,
    pub cost_per_container: MetricComparison,
}

/// 区间内单箱费用统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStatistics {
    pub months: usize,
    pub mean_cost_per_container: f64,
    pub std_cost_per_container: f64, // 样本标准差 (n-1)
    pub coefficient_of_variation: f64, // 百分比
}
