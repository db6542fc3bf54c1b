// ==========================================
// 码头堆存费用 KPI 系统 - 趋势分析引擎
// ==========================================
// 职责: 近 12 个自然月堆存费用 → 趋势得分 (满分 15)
// 规则: 统计相邻已有月份之间的严格上升次数，上升越多得分越低
// 缺失月份只减少可比较的相邻对，不按 0 费用处理
// ==========================================

use crate::domain::types::YearMonth;
use std::collections::BTreeMap;

/// 数据点不足时的中性得分
pub const NEUTRAL_TREND_SCORE: f64 = 5.0;

/// 趋势窗口（月，含目标月）
pub const TREND_WINDOW_MONTHS: i32 = 12;

pub struct TrendAnalyzer {}

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算趋势得分
    ///
    /// # 参数
    /// - costs: 月份 → 堆存费用（可含窗口外月份）
    /// - target: 目标月
    pub fn score(&self, costs: &BTreeMap<YearMonth, f64>, target: YearMonth) -> f64 {
        let start = target.add_months(-(TREND_WINDOW_MONTHS - 1));
        let window: Vec<f64> = costs.range(start..=target).map(|(_, c)| *c).collect();

        if window.len() < 2 {
            return NEUTRAL_TREND_SCORE;
        }

        let increases = window.windows(2).filter(|w| w[1] > w[0]).count();
        Self::score_for_increases(increases)
    }

    /// 上升次数 → 得分
    pub fn score_for_increases(increases: usize) -> f64 {
        match increases {
            0..=3 => 15.0,
            4..=10 => (18 - increases) as f64,
            _ => 7.0,
        }
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_single_point_is_neutral() {
        let mut costs = BTreeMap::new();
        costs.insert(ym(2024, 6), 100.0);
        assert_eq!(TrendAnalyzer::new().score(&costs, ym(2024, 6)), 5.0);
    }

    #[test]
    fn test_decreasing_series_scores_full() {
        let costs: BTreeMap<_, _> = (0..12)
            .map(|i| (ym(2024, 1).add_months(i), 1000.0 - i as f64 * 10.0))
            .collect();
        assert_eq!(TrendAnalyzer::new().score(&costs, ym(2024, 12)), 15.0);
    }

    #[test]
    fn test_strictly_increasing_series_scores_minimum() {
        let costs: BTreeMap<_, _> = (0..12)
            .map(|i| (ym(2024, 1).add_months(i), 100.0 + i as f64))
            .collect();
        assert_eq!(TrendAnalyzer::new().score(&costs, ym(2024, 12)), 7.0);
    }

    #[test]
    fn test_window_excludes_older_months_and_gaps() {
        let mut costs = BTreeMap::new();
        costs.insert(ym(2023, 1), 1.0); // 窗口外
        costs.insert(ym(2024, 3), 10.0);
        costs.insert(ym(2024, 7), 20.0);
        assert_eq!(TrendAnalyzer::new().score(&costs, ym(2024, 8)), 15.0);
    }

    #[test]
    fn test_score_mapping() {
        assert_eq!(TrendAnalyzer::score_for_increases(3), 15.0);
        assert_eq!(TrendAnalyzer::score_for_increases(4), 14.0);
        assert_eq!(TrendAnalyzer::score_for_increases(10), 8.0);
        assert_eq!(TrendAnalyzer::score_for_increases(11), 7.0);
    }
}
