// ==========================================
// 码头堆存费用 KPI 系统 - 区间平均 KPI
// ==========================================
// 职责: 对 [start, end] 每个月计算 KPI，跳过无结果的月份后取算术平均
// 红线: 无任何有效月份的事业部不出现在结果中
// ==========================================

use crate::domain::kpi::{AverageKpiResult, KpiResult};
use crate::domain::types::YearMonth;
use crate::engine::division_aggregator::KpiSnapshot;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::kpi_scorer::KpiScorer;
use std::sync::Arc;
use tracing::instrument;

pub struct PeriodAverager {
    scorer: Arc<KpiScorer>,
}

impl PeriodAverager {
    pub fn new(scorer: Arc<KpiScorer>) -> Self {
        Self { scorer }
    }

    fn check_range(start: YearMonth, end: YearMonth) -> EngineResult<()> {
        if start > end {
            return Err(EngineError::InvalidMonthRange { start, end });
        }
        Ok(())
    }

    /// 单事业部区间平均
    ///
    /// # 返回
    /// - Ok(None): 区间内没有任何月份有 KPI
    /// - Err(InvalidMonthRange): start > end
    #[instrument(skip(self))]
    pub fn average_kpi(
        &self,
        division: &str,
        start: YearMonth,
        end: YearMonth,
    ) -> EngineResult<Option<AverageKpiResult>> {
        Self::check_range(start, end)?;
        let snapshot = self.scorer.load_snapshot(Some(division))?;
        Ok(self.average_from_snapshot(&snapshot, division, start, end))
    }

    /// 排名池内所有事业部的区间平均（无有效月份的事业部省略）
    #[instrument(skip(self))]
    pub fn average_all(
        &self,
        start: YearMonth,
        end: YearMonth,
    ) -> EngineResult<Vec<AverageKpiResult>> {
        Self::check_range(start, end)?;
        let snapshot = self.scorer.load_snapshot(None)?;
        Ok(self
            .scorer
            .divisions()
            .iter()
            .filter_map(|d| self.average_from_snapshot(&snapshot, d, start, end))
            .collect())
    }

    fn average_from_snapshot(
        &self,
        snapshot: &KpiSnapshot,
        division: &str,
        start: YearMonth,
        end: YearMonth,
    ) -> Option<AverageKpiResult> {
        let results: Vec<KpiResult> = YearMonth::range_inclusive(start, end)
            .into_iter()
            .filter_map(|m| self.scorer.score_division(snapshot, division, m))
            .collect();
        average_results(division, start, end, &results)
    }
}

/// 对已有 KPI 结果取平均（空集返回 None）
pub fn average_results(
    division: &str,
    start: YearMonth,
    end: YearMonth,
    results: &[KpiResult],
) -> Option<AverageKpiResult> {
    if results.is_empty() {
        return None;
    }
    let n = results.len() as f64;
    let mean = |f: fn(&KpiResult) -> f64| results.iter().map(f).sum::<f64>() / n;

    Some(AverageKpiResult {
        division: division.to_string(),
        start_month: start,
        end_month: end,
        months_scored: results.len(),
        total_score: mean(|r| r.total_score),
        mom_score: mean(|r| r.mom_score),
        yoy_score: mean(|r| r.yoy_score),
        cost_per_container_score: mean(|r| r.cost_per_container_score),
        trend_score: mean(|r| r.trend_score),
        container_bonus: mean(|r| r.container_bonus),
    })
}
