// ==========================================
// 码头堆存费用 KPI 系统 - 数据源接口
// ==========================================
// 职责: 定义计算引擎对外部表格数据源的只读访问契约
// 实现者: SqliteContainerRepository / InMemoryDataSource
// ==========================================

use crate::domain::container::ContainerRecord;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::collections::BTreeMap;

// ==========================================
// ContainerQuery - 查询谓词
// ==========================================
// 所有条件为 AND 关系；None 表示不过滤
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerQuery {
    pub require_container: bool,
    pub destination_ports: Option<Vec<String>>,
    pub origins: Option<Vec<String>>,
    pub shipping_lines: Option<Vec<String>>,
    pub eta_port_range: Option<(NaiveDate, NaiveDate)>,
}

impl ContainerQuery {
    /// 计费口径：仅有箱号的记录
    pub fn billable() -> Self {
        Self {
            require_container: true,
            ..Default::default()
        }
    }

    /// 全部记录
    pub fn all() -> Self {
        Self::default()
    }

    /// 内存过滤（与 SQL 实现语义一致：字符串比较前去除首尾空白）
    pub fn matches(&self, record: &ContainerRecord) -> bool {
        if self.require_container && !record.has_container() {
            return false;
        }
        if !matches_set(&self.destination_ports, record.destination_port.as_deref()) {
            return false;
        }
        if !matches_set(&self.origins, record.origin.as_deref()) {
            return false;
        }
        if !matches_set(&self.shipping_lines, record.shipping_line.as_deref()) {
            return false;
        }
        if let Some((from, to)) = self.eta_port_range {
            let eta_port = record
                .eta_port
                .as_deref()
                .and_then(crate::engine::storage_cost::parse_iso_date);
            match eta_port {
                Some(d) if d >= from && d <= to => {}
                _ => return false,
            }
        }
        true
    }
}

fn matches_set(allowed: &Option<Vec<String>>, value: Option<&str>) -> bool {
    match allowed {
        None => true,
        Some(set) => match value {
            Some(v) => {
                let v = v.trim();
                set.iter().any(|s| s.trim() == v)
            }
            None => false,
        },
    }
}

// ==========================================
// ContainerDataSource Trait
// ==========================================
pub trait ContainerDataSource: Send + Sync {
    /// 列出参与排名的事业部
    fn list_divisions(&self) -> RepositoryResult<Vec<String>>;

    /// 按谓词读取事业部记录
    fn query_rows(
        &self,
        division: &str,
        query: &ContainerQuery,
    ) -> RepositoryResult<Vec<ContainerRecord>>;
}

// ==========================================
// InMemoryDataSource - 内存数据源
// ==========================================
// 用于界面层已持有记录集时直接计算，或测试
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    tables: BTreeMap<String, Vec<ContainerRecord>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换某事业部的数据（对应批量重载）
    pub fn replace_division(&mut self, division: &str, mut records: Vec<ContainerRecord>) {
        for record in records.iter_mut() {
            record.division = division.to_string();
        }
        self.tables.insert(division.to_string(), records);
    }

    pub fn with_division(mut self, division: &str, records: Vec<ContainerRecord>) -> Self {
        self.replace_division(division, records);
        self
    }
}

impl ContainerDataSource for InMemoryDataSource {
    fn list_divisions(&self) -> RepositoryResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn query_rows(
        &self,
        division: &str,
        query: &ContainerQuery,
    ) -> RepositoryResult<Vec<ContainerRecord>> {
        Ok(self
            .tables
            .get(division)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(container: Option<&str>, port: &str, eta_port: &str) -> ContainerRecord {
        ContainerRecord {
            container: container.map(str::to_string),
            destination_port: Some(port.to_string()),
            eta_port: Some(eta_port.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_billable_query_skips_null_container() {
        let source = InMemoryDataSource::new().with_division(
            "table1",
            vec![
                record(Some("MSCU1234567"), "MANZANILLO", "2024-01-05"),
                record(None, "MANZANILLO", "2024-01-05"),
                record(Some(""), "MANZANILLO", "2024-01-05"),
            ],
        );
        let rows = source.query_rows("table1", &ContainerQuery::billable()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].division, "table1");
        assert_eq!(rows[1].container.as_deref(), Some(""));
    }

    #[test]
    fn test_port_and_eta_filters() {
        let source = InMemoryDataSource::new().with_division(
            "table1",
            vec![
                record(Some("A"), "MANZANILLO ", "2024-01-05"),
                record(Some("B"), "LZO", "2024-01-06"),
                record(Some("C"), "MANZANILLO", "2024-03-01"),
            ],
        );
        let query = ContainerQuery {
            destination_ports: Some(vec!["MANZANILLO".to_string()]),
            eta_port_range: Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )),
            ..Default::default()
        };
        let rows = source.query_rows("table1", &query).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].container.as_deref(), Some("A"));
    }

    #[test]
    fn test_unknown_division_is_empty() {
        let source = InMemoryDataSource::new();
        assert!(source.query_rows("table9", &ContainerQuery::all()).unwrap().is_empty());
    }
}
