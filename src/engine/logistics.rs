// ==========================================
// 码头堆存费用 KPI 系统 - 船期延误与运输方式分析
// ==========================================
// 职责:
// - 船期延误概况: etaport 与 initialeta 不同日的记录数与平均延误天数
// - 延误原因透视: 指定 ETA 港口月份，按延误天数分档 × 延误原因计数
// - 运输方式出运状态: 指定运输方式与目的港，按当日统计入港前/当日出运/剩余
// 说明: 日期按天比较（只取前 10 位 ISO 日期）；"今天"由调用方传入
// ==========================================

use crate::domain::container::ContainerRecord;
use crate::domain::logistics::{
    DelayBucket, DelayPivotRow, DelayReasonPivot, ModalityPortStatus, VesselDelaySummary,
    OTHER_DELAY_REASON,
};
use crate::domain::types::YearMonth;
use crate::engine::storage_cost::parse_iso_date;
use crate::repository::data_source::{ContainerDataSource, ContainerQuery};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::instrument;

/// 运输方式（界面上固定展示的两类）
pub const MODALITIES: [&str; 2] = ["TRUCK", "RAIL"];

fn iso(value: &Option<String>) -> Option<NaiveDate> {
    value.as_deref().and_then(parse_iso_date)
}

/// (initialeta, etaport)，任一缺失或无法解析时为 None
fn eta_pair(record: &ContainerRecord) -> Option<(NaiveDate, NaiveDate)> {
    Some((iso(&record.initial_eta)?, iso(&record.eta_port)?))
}

fn same_text(value: Option<&str>, expected: &str) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case(expected.trim()))
        .unwrap_or(false)
}

/// 延误原因，空白归入 Others
fn delay_reason(record: &ContainerRecord) -> String {
    match record.vessel_delay_reason.as_deref().map(str::trim) {
        Some(reason) if !reason.is_empty() => reason.to_string(),
        _ => OTHER_DELAY_REASON.to_string(),
    }
}

// ==========================================
// 纯函数
// ==========================================

/// 船期延误概况（提前到港同样计入，平均值可能为负）
pub fn summarize_vessel_delay(records: &[ContainerRecord]) -> VesselDelaySummary {
    let delays: Vec<i64> = records
        .iter()
        .filter_map(eta_pair)
        .filter(|(initial, port)| initial != port)
        .map(|(initial, port)| (port - initial).num_days())
        .collect();

    let average_delay_days = if delays.is_empty() {
        0.0
    } else {
        delays.iter().sum::<i64>() as f64 / delays.len() as f64
    };
    VesselDelaySummary {
        delayed_count: delays.len(),
        average_delay_days,
    }
}

/// 出现过船期变动的 ETA 港口月份（升序）
pub fn delay_months(records: &[ContainerRecord]) -> Vec<YearMonth> {
    records
        .iter()
        .filter_map(eta_pair)
        .filter(|(initial, port)| initial != port)
        .map(|(_, port)| YearMonth::from_date(port))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 延误原因透视表（该月无延误记录时返回 None）
pub fn build_delay_pivot(records: &[ContainerRecord], month: YearMonth) -> Option<DelayReasonPivot> {
    let mut cells: BTreeMap<(DelayBucket, String), u64> = BTreeMap::new();
    let mut reasons = BTreeSet::new();

    for record in records {
        let Some((initial, port)) = eta_pair(record) else {
            continue;
        };
        if YearMonth::from_date(port) != month {
            continue;
        }
        let Some(bucket) = DelayBucket::for_days((port - initial).num_days()) else {
            continue;
        };
        let reason = delay_reason(record);
        reasons.insert(reason.clone());
        *cells.entry((bucket, reason)).or_insert(0) += 1;
    }

    if cells.is_empty() {
        return None;
    }

    let reasons: Vec<String> = reasons.into_iter().collect();
    let rows: Vec<DelayPivotRow> = DelayBucket::ALL
        .iter()
        .map(|&bucket| {
            let counts: BTreeMap<String, u64> = reasons
                .iter()
                .map(|r| {
                    let n = cells.get(&(bucket, r.clone())).copied().unwrap_or(0);
                    (r.clone(), n)
                })
                .collect();
            let total = counts.values().sum();
            DelayPivotRow { bucket, counts, total }
        })
        .collect();

    let reason_totals: BTreeMap<String, u64> = reasons
        .iter()
        .map(|r| (r.clone(), rows.iter().map(|row| row.counts[r]).sum()))
        .collect();
    let total = rows.iter().map(|r| r.total).sum();

    Some(DelayReasonPivot {
        month,
        reasons,
        rows,
        reason_totals,
        total,
    })
}

/// 运输方式 + 目的港的出运状态（无匹配记录时返回 None）
pub fn count_modality_status(
    records: &[ContainerRecord],
    modality: &str,
    destination_port: &str,
    today: NaiveDate,
) -> Option<ModalityPortStatus> {
    let mut status = ModalityPortStatus {
        modality: modality.trim().to_string(),
        destination_port: destination_port.trim().to_string(),
        as_of: today,
        total: 0,
        pre_arrival: 0,
        today_export: 0,
        remaining: 0,
    };

    for record in records {
        if !same_text(record.modality.as_deref(), modality)
            || !same_text(record.destination_port.as_deref(), destination_port)
        {
            continue;
        }
        status.total += 1;
        if iso(&record.eta_port).is_some_and(|d| d > today) {
            status.pre_arrival += 1;
        }
        match iso(&record.terminal_appointment) {
            Some(d) if d == today => status.today_export += 1,
            Some(d) if d > today => status.remaining += 1,
            _ => {}
        }
    }

    (status.total > 0).then_some(status)
}

// ==========================================
// LogisticsAnalyzer
// ==========================================
pub struct LogisticsAnalyzer {
    source: Arc<dyn ContainerDataSource>,
}

impl LogisticsAnalyzer {
    pub fn new(source: Arc<dyn ContainerDataSource>) -> Self {
        Self { source }
    }

    fn rows(&self, division: &str) -> RepositoryResult<Vec<ContainerRecord>> {
        self.source.query_rows(division, &ContainerQuery::all())
    }

    #[instrument(skip(self))]
    pub fn vessel_delay_summary(&self, division: &str) -> RepositoryResult<VesselDelaySummary> {
        Ok(summarize_vessel_delay(&self.rows(division)?))
    }

    pub fn delay_months(&self, division: &str) -> RepositoryResult<Vec<YearMonth>> {
        Ok(delay_months(&self.rows(division)?))
    }

    #[instrument(skip(self))]
    pub fn delay_reason_pivot(
        &self,
        division: &str,
        month: YearMonth,
    ) -> RepositoryResult<Option<DelayReasonPivot>> {
        let pivot = build_delay_pivot(&self.rows(division)?, month);
        if pivot.is_none() {
            tracing::debug!(division, %month, "该月无延误记录");
        }
        Ok(pivot)
    }

    /// 非空目的港（去首尾空白、去重、排序）
    pub fn destination_ports(&self, division: &str) -> RepositoryResult<Vec<String>> {
        let ports: BTreeSet<String> = self
            .rows(division)?
            .iter()
            .filter_map(|r| r.destination_port.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ports.into_iter().collect())
    }

    #[instrument(skip(self))]
    pub fn modality_port_status(
        &self,
        division: &str,
        modality: &str,
        destination_port: &str,
        today: NaiveDate,
    ) -> RepositoryResult<Option<ModalityPortStatus>> {
        Ok(count_modality_status(
            &self.rows(division)?,
            modality,
            destination_port,
            today,
        ))
    }

    /// 全部目的港 × TRUCK/RAIL 的出运状态（仅返回有记录的组合）
    pub fn modality_overview(
        &self,
        division: &str,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<ModalityPortStatus>> {
        let records = self.rows(division)?;
        let ports: BTreeSet<String> = records
            .iter()
            .filter_map(|r| r.destination_port.as_deref())
            .map(|p| p.trim().to_uppercase())
            .filter(|p| !p.is_empty())
            .collect();

        let mut overview = Vec::new();
        for port in &ports {
            for modality in MODALITIES {
                if let Some(status) = count_modality_status(&records, modality, port, today) {
                    overview.push(status);
                }
            }
        }
        Ok(overview)
    }
}
