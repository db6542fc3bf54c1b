// ==========================================
// 码头堆存费用 KPI 系统 - 起运港前置时间分析
// ==========================================
// 职责: 按起运港 / 船公司 / 目的港 / ETA 港口日期筛选，统计各环节平均天数
// 说明: 起运港与船公司先标准化再比较；目的港与日期区间下推到数据源
// ==========================================

use crate::domain::container::ContainerRecord;
use crate::domain::lead_time::{LeadTimeAnalysis, LeadTimeFilter};
use crate::engine::name_mapping::{standardize_origin, standardize_shipping_line};
use crate::engine::storage_cost::{normalize_unloading_date, parse_iso_date};
use crate::repository::data_source::{ContainerDataSource, ContainerQuery};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 单条记录的五个日期（任一缺失则记录不参与统计）
struct Milestones {
    shipping: NaiveDate,
    initial_eta: NaiveDate,
    eta_port: NaiveDate,
    unloading: NaiveDate,
    eta: NaiveDate,
}

impl Milestones {
    fn from_record(record: &ContainerRecord) -> Option<Self> {
        let iso = |v: &Option<String>| v.as_deref().and_then(parse_iso_date);
        Some(Self {
            shipping: iso(&record.shipping_date)?,
            initial_eta: iso(&record.initial_eta)?,
            eta_port: iso(&record.eta_port)?,
            unloading: record
                .unloading_terminal
                .as_deref()
                .and_then(normalize_unloading_date)?,
            eta: iso(&record.eta)?,
        })
    }
}

fn days(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

pub struct LeadTimeAnalyzer {
    source: Arc<dyn ContainerDataSource>,
}

impl LeadTimeAnalyzer {
    pub fn new(source: Arc<dyn ContainerDataSource>) -> Self {
        Self { source }
    }

    /// 所有事业部的标准化起运港（去重、排序）
    pub fn unique_origins(&self, divisions: &[String]) -> RepositoryResult<Vec<String>> {
        let mut origins = BTreeSet::new();
        for division in divisions {
            for record in self.source.query_rows(division, &ContainerQuery::all())? {
                if let Some(origin) = record.origin.as_deref() {
                    let origin = standardize_origin(origin);
                    if !origin.is_empty() {
                        origins.insert(origin);
                    }
                }
            }
        }
        Ok(origins.into_iter().collect())
    }

    /// 指定起运港出现过的标准化船公司
    pub fn shipping_lines_for_origin(
        &self,
        divisions: &[String],
        origin: &str,
    ) -> RepositoryResult<Vec<String>> {
        let origin = standardize_origin(origin);
        let mut lines = BTreeSet::new();
        for division in divisions {
            for record in self.source.query_rows(division, &ContainerQuery::all())? {
                let matches_origin = record
                    .origin
                    .as_deref()
                    .map(|o| standardize_origin(o) == origin)
                    .unwrap_or(false);
                if !matches_origin {
                    continue;
                }
                if let Some(line) = record.shipping_line.as_deref() {
                    let line = standardize_shipping_line(line);
                    if !line.is_empty() {
                        lines.insert(line);
                    }
                }
            }
        }
        Ok(lines.into_iter().collect())
    }

    /// 前置时间分析
    ///
    /// # 返回
    /// - Ok(None): 无满足条件且五个日期齐全的记录
    pub fn analyze(
        &self,
        divisions: &[String],
        filter: &LeadTimeFilter,
    ) -> RepositoryResult<Option<LeadTimeAnalysis>> {
        let origin = standardize_origin(&filter.origin);
        let lines: BTreeSet<String> = filter
            .shipping_lines
            .iter()
            .map(|l| standardize_shipping_line(l))
            .collect();
        let query = ContainerQuery {
            destination_ports: Some(filter.destination_ports.clone()),
            eta_port_range: Some((filter.eta_port_from, filter.eta_port_to)),
            ..Default::default()
        };

        let mut milestones = Vec::new();
        for division in divisions {
            for record in self.source.query_rows(division, &query)? {
                let origin_ok = record
                    .origin
                    .as_deref()
                    .map(|o| standardize_origin(o) == origin)
                    .unwrap_or(false);
                let line_ok = record
                    .shipping_line
                    .as_deref()
                    .map(|l| lines.contains(&standardize_shipping_line(l)))
                    .unwrap_or(false);
                if !(origin_ok && line_ok) {
                    continue;
                }
                match Milestones::from_record(&record) {
                    Some(m) => milestones.push(m),
                    None => tracing::debug!(division, "前置时间日期不完整，跳过"),
                }
            }
        }

        Ok(summarize(&milestones))
    }
}

fn summarize(milestones: &[Milestones]) -> Option<LeadTimeAnalysis> {
    if milestones.is_empty() {
        return None;
    }
    let n = milestones.len() as f64;
    let avg = |f: fn(&Milestones) -> f64| milestones.iter().map(f).sum::<f64>() / n;

    Some(LeadTimeAnalysis {
        sample_size: milestones.len(),
        avg_vessel_delay_days: avg(|m| days(m.initial_eta, m.eta_port)),
        avg_shipping_to_eta_port_days: avg(|m| days(m.shipping, m.eta_port)),
        avg_eta_port_to_unloading_days: avg(|m| days(m.eta_port, m.unloading)),
        avg_unloading_to_eta_days: avg(|m| days(m.unloading, m.eta)),
        avg_shipping_to_eta_days: avg(|m| days(m.shipping, m.eta)),
    })
}
