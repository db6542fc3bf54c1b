// ==========================================
// 码头堆存费用 KPI 系统 - 集装箱领域模型
// ==========================================
// 职责: 集装箱移动记录 + 单箱堆存费用行
// 说明: 日期字段保留原始文本，由计算层负责标准化
// ==========================================

use crate::domain::types::YearMonth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// DD 标记值（f.dest 字段）
pub const DD_MARKER: &str = "DD";

/// 人工固定行标记（Fixed 字段），批量重载时保留
pub const FIXED_MARKER: &str = "F";

// ==========================================
// ContainerRecord - 集装箱移动记录
// ==========================================
// 一行对应一次实体集装箱移动，一个事业部一张表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    // ===== 归属 =====
    pub division: String,                   // 事业部（表名）

    // ===== 计费字段 =====
    pub container: Option<String>,          // 箱号，为空则不参与计费
    pub destination_port: Option<String>,   // 目的港，决定计费策略
    pub unloading_terminal: Option<String>, // 卸船入场日期（ISO 或 DD/MM/YYYY）
    pub terminal_appointment: Option<String>, // 码头预约提箱日期，决定计费月份
    pub dest_flag: Option<String>,          // f.dest 目的地标记（DD 比例）

    // ===== 过滤字段 =====
    pub origin: Option<String>,
    pub shipping_line: Option<String>,
    pub terminal: Option<String>,
    pub modality: Option<String>,
    pub shipping_date: Option<String>,
    pub initial_eta: Option<String>,
    pub eta_port: Option<String>,
    pub eta: Option<String>,

    // ===== 延误说明 =====
    pub vessel_delay_reason: Option<String>, // 空白归入 Others
    pub remark: Option<String>,
    pub delays_fee: Option<String>,         // delays/fee 列原样保留

    // ===== 维护字段 =====
    pub fixed: Option<String>,              // 'F' = 人工固定，重载不删除

    // 源表中标准列以外的列（列名 → 文本），重载时原样写回
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ContainerRecord {
    /// 是否有箱号（参与计费的前提，仅 NULL 剔除，空串仍计入）
    pub fn has_container(&self) -> bool {
        self.container.is_some()
    }

    /// 是否为 DD 目的地
    pub fn is_dd(&self) -> bool {
        self.dest_flag.as_deref() == Some(DD_MARKER)
    }
}

// ==========================================
// ContainerCostLine - 单箱堆存费用行
// ==========================================
// 用于明细下钻，不参与 KPI 评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerCostLine {
    pub record: ContainerRecord,
    pub unloading_date: Option<NaiveDate>,
    pub appointment_date: Option<NaiveDate>,
    pub total_stay_days: Option<f64>,   // 含首尾两天；任一日期无法解析时为空
    pub days_over: f64,                 // 超出免堆期天数
    pub storage_cost: f64,              // MXN
    pub month: Option<YearMonth>,       // 计费月份（预约日期所在月）
}
