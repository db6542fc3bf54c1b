// ==========================================
// 码头堆存费用 KPI 系统 - 起运港前置时间模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 前置时间分析条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeFilter {
    pub origin: String,
    pub shipping_lines: Vec<String>,
    pub destination_ports: Vec<String>,
    pub eta_port_from: NaiveDate,
    pub eta_port_to: NaiveDate,
}

/// 各环节平均天数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeAnalysis {
    pub sample_size: usize,
    pub avg_vessel_delay_days: f64,          // etaport − initialeta
    pub avg_shipping_to_eta_port_days: f64,  // shippingdate → etaport
    pub avg_eta_port_to_unloading_days: f64, // etaport → unloadingterminal
    pub avg_unloading_to_eta_days: f64,      // unloadingterminal → eta
    pub avg_shipping_to_eta_days: f64,       // shippingdate → eta
}
