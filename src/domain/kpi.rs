// ==========================================
// 码头堆存费用 KPI 系统 - KPI 结果模型
// ==========================================
// 生命周期: 按需计算，不持久化
// ==========================================

use crate::domain::types::{Grade, YearMonth};
use serde::{Deserialize, Serialize};

// ==========================================
// KpiResult - 事业部月度 KPI
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub division: String,
    pub month: YearMonth,

    // ===== 汇总 =====
    pub total_score: f64,
    pub grade: Grade,

    // ===== 环比 (35) =====
    pub mom_change: f64,
    pub mom_score: f64,

    // ===== 同比 (25) =====
    pub yoy_change: f64,
    pub yoy_score: f64,

    // ===== 单箱费用排名 (25) =====
    pub cost_per_container: f64,
    pub cost_per_container_rank: usize, // 0 = 未参与排名
    pub cost_per_container_score: f64,

    // ===== 趋势 (15) =====
    pub trend_score: f64,

    // ===== 箱量加分 (15) =====
    pub container_count: u64,
    pub container_bonus: f64,

    pub current_cost: f64,
}

// ==========================================
// AverageKpiResult - 区间平均 KPI
// ==========================================
// 仅对有结果的月份取平均
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageKpiResult {
    pub division: String,
    pub start_month: YearMonth,
    pub end_month: YearMonth,
    pub months_scored: usize,
    pub total_score: f64,
    pub mom_score: f64,
    pub yoy_score: f64,
    pub cost_per_container_score: f64,
    pub trend_score: f64,
    pub container_bonus: f64,
}

/// KPI 看板一行（无数据的事业部也保留一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiTableRow {
    pub division: String,
    pub display_name: String,
    pub kpi: Option<KpiResult>,
}
