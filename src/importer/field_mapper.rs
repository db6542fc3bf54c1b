// ==========================================
// 码头堆存费用 KPI 系统 - 字段映射器实现
// ==========================================
// 职责: 源表头 → 标准列 → ContainerRecord
// 表头规范化: 去首尾空白、转小写、去除非字母数字字符
// 未识别的列以规范化表头为键放入 extra，重载时原样写回
// ==========================================

use crate::domain::container::ContainerRecord;
use std::collections::{BTreeMap, HashMap};

/// 规范化表头（"Destination Port " → "destinationport"，"f.dest" → "fdest"）
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// 规范化表头 → 标准列名
fn canonical_column(normalized: &str) -> Option<&'static str> {
    let column = match normalized {
        "container" | "containerno" | "containernumber" | "cntr" | "contenedor" => "container",
        "destinationport" | "destport" | "pod" => "destinationport",
        "unloadingterminal" | "unloadingdate" | "unloading" => "unloadingterminal",
        "terminalappointment" | "appointment" | "appointmentdate" => "terminalappointment",
        "fdest" | "finaldestination" => "f.dest",
        "origin" | "pol" => "origin",
        "shippingline" | "carrier" | "naviera" => "shippingline",
        "modality" => "modality",
        "terminal" => "terminal",
        "shippingdate" | "etd" => "shippingdate",
        "initialeta" => "initialeta",
        "etaport" => "etaport",
        "eta" => "eta",
        "vesseldelayreason" | "delayreason" => "vesseldelayreason",
        "remark" | "remarks" => "remark",
        "delaysfee" | "delayfee" => "delays/fee",
        "fixed" => "Fixed",
        _ => return None,
    };
    Some(column)
}

pub struct FieldMapper;

impl FieldMapper {
    /// 原始表头 → 标准列名（未识别返回 None）
    pub fn map_header(&self, header: &str) -> Option<&'static str> {
        canonical_column(&normalize_header(header))
    }

    /// 原始行 → 集装箱记录
    pub fn map_row(&self, row: &HashMap<String, String>, division: &str) -> ContainerRecord {
        let mut values: HashMap<&'static str, String> = HashMap::new();
        let mut extra = BTreeMap::new();
        for (header, value) in row {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            let normalized = normalize_header(header);
            match canonical_column(&normalized) {
                // 同一标准列出现多次时只保留一个非空值
                Some(column) => {
                    values.entry(column).or_insert_with(|| trimmed.to_string());
                }
                None if !normalized.is_empty() => {
                    extra.entry(normalized).or_insert_with(|| trimmed.to_string());
                }
                None => {}
            }
        }

        let mut take = |column: &str| values.remove(column);
        ContainerRecord {
            division: division.to_string(),
            container: take("container"),
            destination_port: take("destinationport"),
            unloading_terminal: take("unloadingterminal"),
            terminal_appointment: take("terminalappointment"),
            dest_flag: take("f.dest"),
            origin: take("origin"),
            shipping_line: take("shippingline"),
            modality: take("modality"),
            terminal: take("terminal"),
            shipping_date: take("shippingdate"),
            initial_eta: take("initialeta"),
            eta_port: take("etaport"),
            eta: take("eta"),
            vessel_delay_reason: take("vesseldelayreason"),
            remark: take("remark"),
            delays_fee: take("delays/fee"),
            fixed: take("Fixed"),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Destination Port "), "destinationport");
        assert_eq!(normalize_header("f.dest"), "fdest");
        assert_eq!(normalize_header("ETA_PORT"), "etaport");
    }

    #[test]
    fn test_map_row_trims_and_keeps_unknown() {
        let mut row = HashMap::new();
        row.insert("CONTAINER".to_string(), "MSCU1".to_string());
        row.insert("Destination Port".to_string(), "  LZO  ".to_string());
        row.insert("F.DEST".to_string(), "DD".to_string());
        row.insert("Remarks".to_string(), " hold ".to_string());
        row.insert("Delays/Fee".to_string(), "1200".to_string());
        row.insert("Sales Rep".to_string(), "ANA".to_string());
        row.insert("Notes".to_string(), "  ".to_string());
        row.insert("Fixed".to_string(), "".to_string());

        let record = FieldMapper.map_row(&row, "table4");
        assert_eq!(record.division, "table4");
        assert_eq!(record.container.as_deref(), Some("MSCU1"));
        assert_eq!(record.destination_port.as_deref(), Some("LZO"));
        assert_eq!(record.dest_flag.as_deref(), Some("DD"));
        assert!(record.fixed.is_none());
        assert_eq!(record.remark.as_deref(), Some("hold"));
        assert_eq!(record.delays_fee.as_deref(), Some("1200"));
        assert_eq!(record.extra.len(), 1);
        assert_eq!(record.extra.get("salesrep").map(String::as_str), Some("ANA"));
    }
}
