// ==========================================
// 码头堆存费用 KPI 系统 - 事业部 KPI 评分引擎
// ==========================================
// 职责: 事业部 × 目标月 → 综合得分 + 等级
// 构成: 环比 35 + 同比 25 + 单箱费用排名 25 + 趋势 15 + 箱量加分 15
// 红线: 中间数据缺失时退化为中性默认值，不报错
// ==========================================

use crate::domain::kpi::KpiResult;
use crate::domain::types::{Grade, YearMonth};
use crate::engine::division_aggregator::{DivisionAggregator, DivisionSeries, KpiSnapshot};
use crate::engine::ranking::{competition_rank, cost_rank_score, linear_rank_score};
use crate::engine::trend::TrendAnalyzer;
use crate::repository::error::RepositoryResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// 环比满分
pub const MOM_MAX_SCORE: f64 = 35.0;
/// 同比满分
pub const YOY_MAX_SCORE: f64 = 25.0;

/// 箱量加分档位（箱量下限, 加分），自高到低
const VOLUME_BONUS_TIERS: [(u64, f64); 5] =
    [(300, 15.0), (200, 10.0), (150, 8.0), (100, 5.0), (50, 2.0)];

/// 箱量加分
pub fn volume_bonus(container_count: u64) -> f64 {
    VOLUME_BONUS_TIERS
        .iter()
        .find(|(min, _)| container_count >= *min)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

/// 相对基期的变化率 %
///
/// 基期缺失或为 0 时: 当期为 0 → 0，否则 → 100
/// 当期无数据返回 None
pub fn period_change(series: &DivisionSeries, target: YearMonth, base: YearMonth) -> Option<f64> {
    let current = series.get(target)?.total_storage_cost;
    let change = match series.get(base).map(|a| a.total_storage_cost) {
        Some(prev) if prev != 0.0 => (current - prev) / prev * 100.0,
        _ => {
            if current == 0.0 {
                0.0
            } else {
                100.0
            }
        }
    };
    Some(change)
}

/// 变化率池内排名得分（自身不在池中时先加入）
fn pooled_change_score(own: f64, mut pool: Vec<f64>, best: f64) -> f64 {
    if pool.is_empty() {
        return best / 2.0;
    }
    if !pool.iter().any(|v| *v == own) {
        pool.push(own);
    }
    let rank = competition_rank(&pool, own).unwrap_or(pool.len());
    linear_rank_score(rank, pool.len(), best)
}

// ==========================================
// KpiScorer
// ==========================================
pub struct KpiScorer {
    aggregator: Arc<DivisionAggregator>,
    divisions: Vec<String>, // 参与排名的事业部
    trend: TrendAnalyzer,
}

impl KpiScorer {
    pub fn new(aggregator: Arc<DivisionAggregator>, divisions: Vec<String>) -> Self {
        Self {
            aggregator,
            divisions,
            trend: TrendAnalyzer::new(),
        }
    }

    pub fn divisions(&self) -> &[String] {
        &self.divisions
    }

    /// 载入排名池快照（被评分事业部不在池中时一并载入）
    pub fn load_snapshot(&self, extra_division: Option<&str>) -> RepositoryResult<KpiSnapshot> {
        let mut divisions = self.divisions.clone();
        if let Some(extra) = extra_division {
            if !divisions.iter().any(|d| d == extra) {
                divisions.push(extra.to_string());
            }
        }
        self.aggregator.load_snapshot(&divisions)
    }

    // ==========================================
    // 对外入口
    // ==========================================

    /// 单事业部单月 KPI
    ///
    /// # 返回
    /// - Ok(None): 该事业部目标月无费用/箱量数据
    #[instrument(skip(self))]
    pub fn calculate_division_kpi(
        &self,
        division: &str,
        target: YearMonth,
    ) -> RepositoryResult<Option<KpiResult>> {
        let snapshot = self.load_snapshot(Some(division))?;
        Ok(self.score_division(&snapshot, division, target))
    }

    /// 排名池内所有事业部的单月 KPI
    #[instrument(skip(self))]
    pub fn calculate_all(
        &self,
        target: YearMonth,
    ) -> RepositoryResult<BTreeMap<String, Option<KpiResult>>> {
        let snapshot = self.load_snapshot(None)?;
        Ok(self
            .divisions
            .iter()
            .map(|d| (d.clone(), self.score_division(&snapshot, d, target)))
            .collect())
    }

    // ==========================================
    // 纯计算（基于快照）
    // ==========================================

    /// 基于快照评分
    pub fn score_division(
        &self,
        snapshot: &KpiSnapshot,
        division: &str,
        target: YearMonth,
    ) -> Option<KpiResult> {
        let series = snapshot.division(division)?;
        let current = series.get(target)?;

        // ===== 环比 / 同比 =====
        let mom_change = period_change(series, target, target.prev_month())?;
        let yoy_change = period_change(series, target, target.prev_year())?;

        let mom_pool: Vec<f64> = snapshot
            .series
            .values()
            .filter_map(|s| period_change(s, target, target.prev_month()))
            .collect();
        let yoy_pool: Vec<f64> = snapshot
            .series
            .values()
            .filter_map(|s| period_change(s, target, target.prev_year()))
            .collect();

        let mom_score = pooled_change_score(mom_change, mom_pool, MOM_MAX_SCORE);
        let yoy_score = pooled_change_score(yoy_change, yoy_pool, YOY_MAX_SCORE);

        // ===== 单箱费用排名 =====
        let (cost_per_container, cost_rank) = self.cost_per_container_rank(snapshot, division, target);
        let cost_per_container_score = cost_rank_score(cost_rank);

        // ===== 趋势 / 箱量 =====
        let trend_score = self.trend.score(&series.costs(), target);
        let container_count = current.container_count;
        let container_bonus = volume_bonus(container_count);

        let total_score =
            mom_score + yoy_score + cost_per_container_score + trend_score + container_bonus;

        tracing::debug!(
            division,
            month = %target,
            mom_score,
            yoy_score,
            cost_per_container_score,
            trend_score,
            container_bonus,
            total_score,
            "KPI 评分完成"
        );

        Some(KpiResult {
            division: division.to_string(),
            month: target,
            total_score,
            grade: Grade::from_score(total_score),
            mom_change,
            mom_score,
            yoy_change,
            yoy_score,
            cost_per_container,
            cost_per_container_rank: cost_rank,
            cost_per_container_score,
            trend_score,
            container_count,
            container_bonus,
            current_cost: current.total_storage_cost,
        })
    }

    /// 单箱费用及名次（箱量为 0 或无数据时名次为 0）
    fn cost_per_container_rank(
        &self,
        snapshot: &KpiSnapshot,
        division: &str,
        target: YearMonth,
    ) -> (f64, usize) {
        let pool: Vec<(&str, f64)> = snapshot
            .series
            .iter()
            .filter_map(|(name, s)| {
                let a = s.get(target)?;
                (a.container_count > 0).then(|| (name.as_str(), a.cost_per_container()))
            })
            .collect();

        let Some(own) = pool.iter().find(|(name, _)| *name == division).map(|(_, c)| *c) else {
            return (0.0, 0);
        };
        let values: Vec<f64> = pool.iter().map(|(_, c)| *c).collect();
        (own, competition_rank(&values, own).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_bonus_tiers() {
        assert_eq!(volume_bonus(300), 15.0);
        assert_eq!(volume_bonus(299), 10.0);
        assert_eq!(volume_bonus(150), 8.0);
        assert_eq!(volume_bonus(100), 5.0);
        assert_eq!(volume_bonus(50), 2.0);
        assert_eq!(volume_bonus(49), 0.0);
    }

    #[test]
    fn test_pooled_change_score_defaults() {
        assert_eq!(pooled_change_score(10.0, vec![], 35.0), 17.5);
        assert_eq!(pooled_change_score(10.0, vec![10.0], 35.0), 35.0);
        // 自身不在池中时加入后排名
        assert_eq!(pooled_change_score(50.0, vec![10.0], 25.0), 12.5);
    }
}
