// ==========================================
// 码头堆存费用 KPI 系统 - 船期延误与运输方式模型
// ==========================================

use crate::domain::types::YearMonth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 延误原因为空时的归类名
pub const OTHER_DELAY_REASON: &str = "Others";

/// 船期延误概况（etaport 与 initialeta 不在同一天的记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselDelaySummary {
    pub delayed_count: usize,
    pub average_delay_days: f64, // 无延误记录时为 0
}

// ==========================================
// DelayBucket - 延误天数分档
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DelayBucket {
    UpToThree,     // 1..=3
    FourToSeven,   // 4..=7
    MoreThanSeven, // > 7
}

impl DelayBucket {
    /// 展示顺序
    pub const ALL: [DelayBucket; 3] = [
        DelayBucket::UpToThree,
        DelayBucket::FourToSeven,
        DelayBucket::MoreThanSeven,
    ];

    /// 延误天数 → 分档（未延误返回 None）
    pub fn for_days(days: i64) -> Option<Self> {
        match days {
            d if d <= 0 => None,
            1..=3 => Some(DelayBucket::UpToThree),
            4..=7 => Some(DelayBucket::FourToSeven),
            _ => Some(DelayBucket::MoreThanSeven),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DelayBucket::UpToThree => "3 days or less",
            DelayBucket::FourToSeven => "4 to 7 days",
            DelayBucket::MoreThanSeven => "7 days or more",
        }
    }
}

impl fmt::Display for DelayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 透视表中的一档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayPivotRow {
    pub bucket: DelayBucket,
    pub counts: BTreeMap<String, u64>, // 延误原因 → 箱量（含 0）
    pub total: u64,
}

/// 某 ETA 港口月份的延误原因透视表
///
/// 行固定三档（按 `DelayBucket::ALL` 顺序），`reason_totals` 即 Total 行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayReasonPivot {
    pub month: YearMonth,
    pub reasons: Vec<String>,
    pub rows: Vec<DelayPivotRow>,
    pub reason_totals: BTreeMap<String, u64>,
    pub total: u64,
}

impl DelayReasonPivot {
    pub fn row(&self, bucket: DelayBucket) -> Option<&DelayPivotRow> {
        self.rows.iter().find(|r| r.bucket == bucket)
    }
}

/// 运输方式 + 目的港的当日出运状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityPortStatus {
    pub modality: String,
    pub destination_port: String,
    pub as_of: NaiveDate,
    pub total: u64,        // 该运输方式与目的港的全部记录
    pub pre_arrival: u64,  // etaport 晚于当日
    pub today_export: u64, // 预约提箱日为当日
    pub remaining: u64,    // 预约提箱日晚于当日
}
