// ==========================================
// 码头堆存费用 KPI 系统 - 事业部汇总引擎
// ==========================================
// 职责: 按事业部、按月汇总费用/箱量/DD 比例，提供下钻与对比
// 输入: ContainerDataSource
// 输出: MonthlyAggregate / MonthlyStorageSummary / KpiSnapshot
// 红线: 只读，不写数据源；无数据返回空集合
// ==========================================

use crate::domain::container::ContainerCostLine;
use crate::domain::storage::{
    ContainerCountRow, CostStatistics, DdRatioRow, MetricComparison, MonthComparison,
    MonthlyAggregate, MonthlyStorageSummary,
};
use crate::domain::types::YearMonth;
use crate::engine::storage_cost::StorageCostCalculator;
use crate::repository::data_source::{ContainerDataSource, ContainerQuery};
use crate::repository::error::RepositoryResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// DivisionSeries / KpiSnapshot - 评分用内存快照
// ==========================================

/// 单个事业部的月度序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DivisionSeries {
    pub monthly: BTreeMap<YearMonth, MonthlyAggregate>,
}

impl DivisionSeries {
    pub fn from_aggregates(aggregates: Vec<MonthlyAggregate>) -> Self {
        Self {
            monthly: aggregates.into_iter().map(|a| (a.month, a)).collect(),
        }
    }

    pub fn get(&self, month: YearMonth) -> Option<&MonthlyAggregate> {
        self.monthly.get(&month)
    }

    /// 月份 → 堆存费用
    pub fn costs(&self) -> BTreeMap<YearMonth, f64> {
        self.monthly
            .iter()
            .map(|(m, a)| (*m, a.total_storage_cost))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }
}

/// 全部事业部的序列（每个事业部只读取一次）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiSnapshot {
    pub series: BTreeMap<String, DivisionSeries>,
}

impl KpiSnapshot {
    pub fn insert(&mut self, division: &str, series: DivisionSeries) {
        self.series.insert(division.to_string(), series);
    }

    pub fn division(&self, division: &str) -> Option<&DivisionSeries> {
        self.series.get(division)
    }
}

// ==========================================
// DivisionAggregator
// ==========================================
pub struct DivisionAggregator {
    source: Arc<dyn ContainerDataSource>,
    calculator: StorageCostCalculator,
}

impl DivisionAggregator {
    pub fn new(source: Arc<dyn ContainerDataSource>) -> Self {
        Self {
            source,
            calculator: StorageCostCalculator::new(),
        }
    }

    pub fn source(&self) -> &Arc<dyn ContainerDataSource> {
        &self.source
    }

    // ==========================================
    // 单事业部
    // ==========================================

    /// 单箱费用明细（下钻）
    pub fn individual_storage_data(&self, division: &str) -> RepositoryResult<Vec<ContainerCostLine>> {
        let records = self.source.query_rows(division, &ContainerQuery::billable())?;
        Ok(self.calculator.cost_lines(&records))
    }

    /// 月度费用汇总
    #[instrument(skip(self))]
    pub fn monthly_storage_data(&self, division: &str) -> RepositoryResult<Vec<MonthlyAggregate>> {
        let lines = self.individual_storage_data(division)?;
        let monthly = self.calculator.monthly_aggregates(&lines);
        tracing::debug!(division, months = monthly.len(), "月度汇总完成");
        Ok(monthly)
    }

    /// 月度箱量
    pub fn container_count(&self, division: &str) -> RepositoryResult<Vec<ContainerCountRow>> {
        Ok(self
            .monthly_storage_data(division)?
            .into_iter()
            .map(|a| ContainerCountRow {
                month: a.month,
                container_count: a.container_count,
            })
            .collect())
    }

    /// 月度 DD 比例
    pub fn dd_ratio(&self, division: &str) -> RepositoryResult<Vec<DdRatioRow>> {
        let lines = self.individual_storage_data(division)?;
        Ok(dd_ratio_rows(&lines))
    }

    /// 月度明细表（费用 + 箱量 + 单箱费用 + DD）
    pub fn monthly_summary(&self, division: &str) -> RepositoryResult<Vec<MonthlyStorageSummary>> {
        let lines = self.individual_storage_data(division)?;
        let monthly = self.calculator.monthly_aggregates(&lines);
        Ok(merge_summary(&monthly, &dd_ratio_rows(&lines)))
    }

    // ==========================================
    // 多事业部合并
    // ==========================================

    /// 合并月度汇总（先按事业部计费，再按月相加）
    pub fn combined_monthly_storage_data(
        &self,
        divisions: &[String],
    ) -> RepositoryResult<Vec<MonthlyAggregate>> {
        let mut per_division = Vec::with_capacity(divisions.len());
        for division in divisions {
            per_division.push(self.monthly_storage_data(division)?);
        }
        Ok(StorageCostCalculator::combine_monthly(&per_division))
    }

    /// 合并月度明细表
    pub fn combined_monthly_summary(
        &self,
        divisions: &[String],
    ) -> RepositoryResult<Vec<MonthlyStorageSummary>> {
        let mut per_division = Vec::with_capacity(divisions.len());
        let mut dd_by_month: BTreeMap<YearMonth, (u64, u64)> = BTreeMap::new();

        for division in divisions {
            let lines = self.individual_storage_data(division)?;
            per_division.push(self.calculator.monthly_aggregates(&lines));
            for row in dd_ratio_rows(&lines) {
                let entry = dd_by_month.entry(row.month).or_insert((0, 0));
                entry.0 += row.dd_count;
                entry.1 += row.container_count;
            }
        }

        let combined = StorageCostCalculator::combine_monthly(&per_division);
        let dd_rows: Vec<DdRatioRow> = dd_by_month
            .into_iter()
            .map(|(month, (dd, count))| DdRatioRow {
                month,
                dd_count: dd,
                container_count: count,
                dd_ratio: ratio_pct(dd, count),
            })
            .collect();
        Ok(merge_summary(&combined, &dd_rows))
    }

    // ==========================================
    // 分析
    // ==========================================

    /// 两月对比
    ///
    /// # 返回
    /// - Ok(None): 两个月份相同，或任一月份无数据
    pub fn compare_months(
        &self,
        division: &str,
        first: YearMonth,
        second: YearMonth,
    ) -> RepositoryResult<Option<MonthComparison>> {
        let series = self.load_series(division)?;
        Ok(compare_in_series(&series, first, second))
    }

    /// 区间内单箱费用统计
    pub fn cost_statistics(
        &self,
        division: &str,
        from: YearMonth,
        to: YearMonth,
    ) -> RepositoryResult<Option<CostStatistics>> {
        let monthly = self.monthly_storage_data(division)?;
        let values: Vec<f64> = monthly
            .iter()
            .filter(|a| a.month >= from && a.month <= to)
            .map(|a| a.cost_per_container())
            .collect();
        Ok(cost_statistics_of(&values))
    }

    /// 预估堆存费用明细（费用 > 0 且预约年份 ≥ since_year），按月分组
    pub fn estimated_storage(
        &self,
        division: &str,
        since_year: i32,
    ) -> RepositoryResult<BTreeMap<YearMonth, Vec<ContainerCostLine>>> {
        let mut grouped: BTreeMap<YearMonth, Vec<ContainerCostLine>> = BTreeMap::new();
        for line in self.individual_storage_data(division)? {
            let Some(month) = line.month else { continue };
            if month.year() >= since_year && line.storage_cost > 0.0 {
                grouped.entry(month).or_default().push(line);
            }
        }
        Ok(grouped)
    }

    // ==========================================
    // KPI 快照
    // ==========================================

    pub fn load_series(&self, division: &str) -> RepositoryResult<DivisionSeries> {
        Ok(DivisionSeries::from_aggregates(
            self.monthly_storage_data(division)?,
        ))
    }

    /// 一次性载入所有事业部序列
    #[instrument(skip(self, divisions), fields(divisions = divisions.len()))]
    pub fn load_snapshot(&self, divisions: &[String]) -> RepositoryResult<KpiSnapshot> {
        let mut snapshot = KpiSnapshot::default();
        for division in divisions {
            snapshot.insert(division, self.load_series(division)?);
        }
        Ok(snapshot)
    }
}

// ==========================================
// 纯函数
// ==========================================

fn ratio_pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// 按计费月份统计 DD 箱量与比例
pub fn dd_ratio_rows(lines: &[ContainerCostLine]) -> Vec<DdRatioRow> {
    let mut by_month: BTreeMap<YearMonth, (u64, u64)> = BTreeMap::new();
    for line in lines {
        let Some(month) = line.month else { continue };
        let entry = by_month.entry(month).or_insert((0, 0));
        if line.record.is_dd() {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
    by_month
        .into_iter()
        .map(|(month, (dd, count))| DdRatioRow {
            month,
            dd_count: dd,
            container_count: count,
            dd_ratio: ratio_pct(dd, count),
        })
        .collect()
}

fn merge_summary(monthly: &[MonthlyAggregate], dd_rows: &[DdRatioRow]) -> Vec<MonthlyStorageSummary> {
    let dd_by_month: BTreeMap<YearMonth, u64> =
        dd_rows.iter().map(|r| (r.month, r.dd_count)).collect();
    monthly
        .iter()
        .map(|a| {
            let dd_count = dd_by_month.get(&a.month).copied().unwrap_or(0);
            MonthlyStorageSummary {
                month: a.month,
                total_storage_cost: a.total_storage_cost,
                container_count: a.container_count,
                cost_per_container: a.cost_per_container(),
                dd_count,
                dd_ratio: ratio_pct(dd_count, a.container_count),
            }
        })
        .collect()
}

/// 在月度序列中对比两个月份（自动按时间先后排列）
pub fn compare_in_series(
    series: &DivisionSeries,
    first: YearMonth,
    second: YearMonth,
) -> Option<MonthComparison> {
    if first == second {
        return None;
    }
    let (early, late) = if first < second { (first, second) } else { (second, first) };
    let a = series.get(early)?;
    let b = series.get(late)?;
    Some(MonthComparison {
        first_month: early,
        second_month: late,
        storage_cost: MetricComparison::new(a.total_storage_cost, b.total_storage_cost),
        container_count: MetricComparison::new(a.container_count as f64, b.container_count as f64),
        cost_per_container: MetricComparison::new(a.cost_per_container(), b.cost_per_container()),
    })
}

/// 均值、样本标准差 (n−1)、变异系数 %
pub fn cost_statistics_of(values: &[f64]) -> Option<CostStatistics> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let cv = if mean != 0.0 { std / mean * 100.0 } else { 0.0 };
    Some(CostStatistics {
        months: values.len(),
        mean_cost_per_container: mean,
        std_cost_per_container: std,
        coefficient_of_variation: cv,
    })
}
