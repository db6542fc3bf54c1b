// ==========================================
// 码头堆存费用 KPI 系统 - 事业部集装箱数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责读取与谓词下推
// 表结构: 每个事业部一张表 (table1..tableN)，列可能缺失
// ==========================================

use crate::db::{open_read_only_with_retry, quote_identifier, table_exists, validate_table_name, RetryPolicy};
use crate::domain::container::ContainerRecord;
use crate::repository::data_source::{ContainerDataSource, ContainerQuery};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// 事业部表的标准列（顺序与 ContainerRecord 映射一致）
///
/// 标准列以外的列读取到 `ContainerRecord::extra`
pub const DIVISION_COLUMNS: [&str; 17] = [
    "container",
    "destinationport",
    "unloadingterminal",
    "terminalappointment",
    "f.dest",
    "origin",
    "shippingline",
    "modality",
    "terminal",
    "shippingdate",
    "initialeta",
    "etaport",
    "eta",
    "vesseldelayreason",
    "remark",
    "delays/fee",
    "Fixed",
];

const COL_CONTAINER: usize = 0;
const COL_DESTINATION_PORT: usize = 1;
const COL_ORIGIN: usize = 5;
const COL_SHIPPING_LINE: usize = 6;
const COL_ETA_PORT: usize = 11;

/// 事业部表名前缀
pub const DIVISION_TABLE_PREFIX: &str = "table";

// ==========================================
// SqliteContainerRepository
// ==========================================
pub struct SqliteContainerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContainerRepository {
    /// 只读打开数据库（带重试）
    pub fn open_read_only(db_path: &str, policy: RetryPolicy) -> RepositoryResult<Self> {
        let conn = open_read_only_with_retry(db_path, policy)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取表的现有列（保留原始大小写）
    fn existing_columns(conn: &Connection, table: &str) -> RepositoryResult<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(table));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    /// 构造 SELECT 语句及绑定参数
    ///
    /// 缺失列以 NULL 代替，谓词对 NULL 自然不成立；
    /// 非标准列追加在标准列之后，随第三项返回
    fn build_select(
        table: &str,
        existing: &[String],
        query: &ContainerQuery,
    ) -> (String, Vec<String>, Vec<String>) {
        let columns: HashSet<String> = existing.iter().map(|c| c.to_lowercase()).collect();
        let canonical: HashSet<String> = DIVISION_COLUMNS.iter().map(|c| c.to_lowercase()).collect();
        let extras: Vec<String> = existing
            .iter()
            .filter(|c| !canonical.contains(&c.to_lowercase()))
            .cloned()
            .collect();

        let mut exprs: Vec<String> = DIVISION_COLUMNS
            .iter()
            .map(|c| {
                if columns.contains(&c.to_lowercase()) {
                    quote_identifier(c)
                } else {
                    "NULL".to_string()
                }
            })
            .collect();

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if query.require_container {
            let c = &exprs[COL_CONTAINER];
            conditions.push(format!("{c} IS NOT NULL"));
        }

        let set_filters = [
            (COL_DESTINATION_PORT, &query.destination_ports),
            (COL_ORIGIN, &query.origins),
            (COL_SHIPPING_LINE, &query.shipping_lines),
        ];
        for (idx, values) in set_filters {
            let Some(values) = values else { continue };
            if values.is_empty() {
                conditions.push("0".to_string());
                continue;
            }
            let placeholders = values
                .iter()
                .map(|v| {
                    params.push(v.trim().to_string());
                    format!("?{}", params.len())
                })
                .collect::<Vec<_>>()
                .join(", ");
            conditions.push(format!("TRIM({}) IN ({})", exprs[idx], placeholders));
        }

        if let Some((from, to)) = query.eta_port_range {
            params.push(from.format("%Y-%m-%d").to_string());
            let from_idx = params.len();
            params.push(to.format("%Y-%m-%d").to_string());
            let to_idx = params.len();
            conditions.push(format!(
                "DATE(SUBSTR({}, 1, 10)) BETWEEN ?{} AND ?{}",
                exprs[COL_ETA_PORT], from_idx, to_idx
            ));
        }

        exprs.extend(extras.iter().map(|c| quote_identifier(c)));
        let mut sql = format!("SELECT {} FROM {}", exprs.join(", "), quote_identifier(table));
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        (sql, params, extras)
    }
}

/// SQLite 动态值 → 文本（日期列可能以 TEXT/REAL/INTEGER 任一形式存储）
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// 表名数字后缀（用于自然排序，table2 排在 table10 之前）
fn table_suffix(name: &str) -> Option<u32> {
    name.strip_prefix(DIVISION_TABLE_PREFIX)?.parse().ok()
}

impl ContainerDataSource for SqliteContainerRepository {
    fn list_divisions(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'table%'",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tables: Vec<(u32, String)> = Vec::new();
        for row in rows {
            let name = row?;
            if let Some(n) = table_suffix(&name) {
                tables.push((n, name));
            }
        }
        tables.sort();
        Ok(tables.into_iter().map(|(_, name)| name).collect())
    }

    fn query_rows(
        &self,
        division: &str,
        query: &ContainerQuery,
    ) -> RepositoryResult<Vec<ContainerRecord>> {
        validate_table_name(division)?;
        let conn = self.get_conn()?;

        if !table_exists(&conn, division)? {
            tracing::warn!(division, "事业部表不存在，视为无数据");
            return Ok(Vec::new());
        }

        let columns = Self::existing_columns(&conn, division)?;
        let (sql, params, extras) = Self::build_select(division, &columns, query);
        let width = DIVISION_COLUMNS.len() + extras.len();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let mut values: Vec<Option<String>> = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(value_to_text(row.get::<_, Value>(idx)?));
            }
            Ok(values)
        })?;

        let mut records = Vec::new();
        for row in rows {
            let mut v = row?.into_iter();
            let mut next = || v.next().flatten();
            let mut record = ContainerRecord {
                division: division.to_string(),
                container: next(),
                destination_port: next(),
                unloading_terminal: next(),
                terminal_appointment: next(),
                dest_flag: next(),
                origin: next(),
                shipping_line: next(),
                modality: next(),
                terminal: next(),
                shipping_date: next(),
                initial_eta: next(),
                eta_port: next(),
                eta: next(),
                vessel_delay_reason: next(),
                remark: next(),
                delays_fee: next(),
                fixed: next(),
                extra: BTreeMap::new(),
            };
            for name in &extras {
                if let Some(value) = next() {
                    record.extra.insert(name.clone(), value);
                }
            }
            records.push(record);
        }

        tracing::debug!(division, rows = records.len(), "事业部记录读取完成");
        Ok(records)
    }
}
