// ==========================================
// 码头堆存费用 KPI 系统 - 堆存费用计算引擎
// ==========================================
// 职责: 原始集装箱记录 → 单箱费用行 → 月度汇总
// 输入: ContainerRecord（日期为原始文本）
// 输出: ContainerCostLine / MonthlyAggregate
// 红线: 计费月份只取预约提箱日期，不取卸船日期
// ==========================================

use crate::domain::container::{ContainerCostLine, ContainerRecord};
use crate::domain::storage::MonthlyAggregate;
use crate::domain::types::{PortPolicy, YearMonth};
use chrono::NaiveDate;
use std::collections::BTreeMap;

// ==========================================
// 计费常量 (MXN)
// ==========================================

/// 标准港口免堆期（天）
pub const STANDARD_FREE_DAYS: f64 = 7.0;
/// 标准港口第 8 天固定费
pub const STANDARD_FIRST_DAY_COST: f64 = 4356.42;
/// 标准港口第 9 天起每日费率
pub const STANDARD_DAILY_RATE: f64 = 2194.43;

/// Lazaro Cardenas 免堆期（天）
pub const LAZARO_FREE_DAYS: f64 = 10.0;
/// Lazaro Cardenas 每日费率，无首日固定费
pub const LAZARO_DAILY_RATE: f64 = 2027.0;

// ==========================================
// 日期标准化
// ==========================================

/// 解析 ISO 日期（YYYY-MM-DD，可带时间部分）
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// 卸船入场日期标准化
///
/// 含 '/' 时按 DD/MM/YYYY 拆分重组（年份后可跟时间），否则按 ISO 解析
pub fn normalize_unloading_date(text: &str) -> Option<NaiveDate> {
    if !text.contains('/') {
        return parse_iso_date(text);
    }

    let mut parts = text.trim().splitn(3, '/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.split_whitespace().next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// ==========================================
// StorageCostCalculator
// ==========================================
pub struct StorageCostCalculator {}

impl StorageCostCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 免堆期（天）
    pub fn free_days(policy: PortPolicy) -> f64 {
        match policy {
            PortPolicy::Standard => STANDARD_FREE_DAYS,
            PortPolicy::LazaroCardenas => LAZARO_FREE_DAYS,
        }
    }

    /// 按停留天数计费
    ///
    /// # 返回
    /// (days_over, storage_cost)
    pub fn charge(policy: PortPolicy, total_stay_days: f64) -> (f64, f64) {
        let free_days = Self::free_days(policy);
        let days_over = (total_stay_days - free_days).max(0.0);
        if total_stay_days <= free_days {
            return (days_over, 0.0);
        }

        let cost = match policy {
            PortPolicy::LazaroCardenas => days_over * LAZARO_DAILY_RATE,
            PortPolicy::Standard => {
                STANDARD_FIRST_DAY_COST
                    + (total_stay_days - STANDARD_FREE_DAYS - 1.0) * STANDARD_DAILY_RATE
            }
        };
        (days_over, cost)
    }

    /// 单箱费用行
    ///
    /// 卸船日期无法解析时停留天数为空、费用为 0，该行仍计入箱量；
    /// 预约日期无法解析时 month 为空，由月度汇总剔除
    pub fn cost_line(&self, record: &ContainerRecord) -> ContainerCostLine {
        let unloading_date = record
            .unloading_terminal
            .as_deref()
            .and_then(normalize_unloading_date);
        let appointment_date = record
            .terminal_appointment
            .as_deref()
            .and_then(parse_iso_date);

        let total_stay_days = match (unloading_date, appointment_date) {
            (Some(u), Some(a)) => Some((a - u).num_days() as f64 + 1.0),
            _ => None,
        };

        let policy = PortPolicy::for_port(record.destination_port.as_deref());
        let (days_over, storage_cost) = total_stay_days
            .map(|stay| Self::charge(policy, stay))
            .unwrap_or((0.0, 0.0));

        ContainerCostLine {
            record: record.clone(),
            unloading_date,
            appointment_date,
            total_stay_days,
            days_over,
            storage_cost,
            month: appointment_date.map(YearMonth::from_date),
        }
    }

    /// 批量计算费用行（无箱号的记录整体剔除）
    pub fn cost_lines(&self, records: &[ContainerRecord]) -> Vec<ContainerCostLine> {
        records
            .iter()
            .filter(|r| r.has_container())
            .map(|r| self.cost_line(r))
            .collect()
    }

    /// 按计费月份汇总（月份升序）
    pub fn monthly_aggregates(&self, lines: &[ContainerCostLine]) -> Vec<MonthlyAggregate> {
        let mut by_month: BTreeMap<YearMonth, (f64, u64)> = BTreeMap::new();
        let mut skipped = 0usize;

        for line in lines {
            let Some(month) = line.month else {
                skipped += 1;
                continue;
            };
            let entry = by_month.entry(month).or_insert((0.0, 0));
            entry.0 += line.storage_cost;
            entry.1 += 1;
        }

        if skipped > 0 {
            tracing::warn!(skipped, "预约日期无法解析，记录未计入月度汇总");
        }

        by_month
            .into_iter()
            .map(|(month, (total, count))| MonthlyAggregate {
                month,
                total_storage_cost: total,
                container_count: count,
            })
            .collect()
    }

    /// 多事业部月度汇总合并（先各自计费，再按月相加）
    pub fn combine_monthly(per_division: &[Vec<MonthlyAggregate>]) -> Vec<MonthlyAggregate> {
        let mut by_month: BTreeMap<YearMonth, (f64, u64)> = BTreeMap::new();
        for aggregate in per_division.iter().flatten() {
            let entry = by_month.entry(aggregate.month).or_insert((0.0, 0));
            entry.0 += aggregate.total_storage_cost;
            entry.1 += aggregate.container_count;
        }
        by_month
            .into_iter()
            .map(|(month, (total, count))| MonthlyAggregate {
                month,
                total_storage_cost: total,
                container_count: count,
            })
            .collect()
    }
}

impl Default for StorageCostCalculator {
    fn default() -> Self {
        Self::new()
    }
}
