// ==========================================
// 码头堆存费用 KPI 系统 - 事业部注册表
// ==========================================
// 显示名 ↔ 表名 映射；决定 KPI 排名池与看板行顺序
// 存储: config_kv.division_registry (JSON 对象: 显示名 → 表名)
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 默认注册表（显示名, 表名）
const DEFAULT_DIVISIONS: [(&str, &str); 11] = [
    ("WM", "table1"),
    ("AC", "table2"),
    ("AV_AO", "table3"),
    ("REF", "table4"),
    ("MWO", "table5"),
    ("DW", "table6"),
    ("MN", "table7"),
    ("TV", "table8"),
    ("RB", "table9"),
    ("JEM", "table10"),
    ("FCL", "table11"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionEntry {
    pub display_name: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionRegistry {
    entries: Vec<DivisionEntry>,
}

/// 排序键: tableN 按数字，其余按名称排在后面
fn table_sort_key(table: &str) -> (u32, String) {
    let n = table
        .strip_prefix("table")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(u32::MAX);
    (n, table.to_string())
}

impl DivisionRegistry {
    pub fn new(mut entries: Vec<DivisionEntry>) -> Self {
        entries.sort_by_key(|e| table_sort_key(&e.table));
        Self { entries }
    }

    /// 解析 JSON 对象 {"WM": "table1", ...}
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let map: BTreeMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self::new(
            map.into_iter()
                .map(|(display_name, table)| DivisionEntry { display_name, table })
                .collect(),
        ))
    }

    pub fn to_json(&self) -> String {
        let map: BTreeMap<&str, &str> = self
            .entries
            .iter()
            .map(|e| (e.display_name.as_str(), e.table.as_str()))
            .collect();
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn entries(&self) -> &[DivisionEntry] {
        &self.entries
    }

    /// 所有表名（按表号排序）
    pub fn tables(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.table.clone()).collect()
    }

    /// 表名 → 显示名（未登记时返回表名本身）
    pub fn display_name(&self, table: &str) -> String {
        self.entries
            .iter()
            .find(|e| e.table == table)
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| table.to_string())
    }

    /// 显示名（工作表名）→ 表名，忽略首尾空白与大小写
    pub fn table_for(&self, display_name: &str) -> Option<&str> {
        let key = display_name.trim();
        self.entries
            .iter()
            .find(|e| e.display_name.eq_ignore_ascii_case(key))
            .map(|e| e.table.as_str())
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.entries.iter().any(|e| e.table == table)
    }
}

impl Default for DivisionRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_DIVISIONS
                .iter()
                .map(|(display_name, table)| DivisionEntry {
                    display_name: display_name.to_string(),
                    table: table.to_string(),
                })
                .collect(),
        )
    }
}
