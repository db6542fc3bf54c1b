// ==========================================
// 码头堆存费用 KPI 系统 - 事业部批量重载
// ==========================================
// 流程: 解析文件 → 工作表解析为事业部 → 字段映射 → 单事业部事务重载
// 事务内: 建表(若缺) → 补列（含源表附加列）→ 删除非 'F' 行 → 插入新行 → 记录更新时间
// 红线: Fixed = 'F' 的人工固定行在重载中保留
// ==========================================

use crate::config::division_registry::DivisionRegistry;
use crate::db::{quote_identifier, validate_table_name};
use crate::domain::container::{ContainerRecord, FIXED_MARKER};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawSheet, UniversalFileParser};
use crate::repository::container_repo::DIVISION_COLUMNS;
use crate::repository::error::RepositoryError;
use crate::repository::update_log_repo::DivisionUpdateLogRepository;
use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 导入结果
// ==========================================

/// 单个事业部的重载统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionReloadStats {
    pub division: String,     // 表名
    pub display_name: String, // 工作表名 / 显示名
    pub deleted: usize,       // 删除的非固定行
    pub preserved: usize,     // 保留的固定行
    pub inserted: usize,      // 新插入行
}

/// 一次导入的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub file_name: String,
    pub updated_at: NaiveDateTime,
    pub divisions: Vec<DivisionReloadStats>,
    pub skipped_sheets: Vec<String>,
}

impl ImportReport {
    pub fn total_inserted(&self) -> usize {
        self.divisions.iter().map(|d| d.inserted).sum()
    }
}

// ==========================================
// DivisionImporter
// ==========================================
pub struct DivisionImporter {
    conn: Arc<Mutex<Connection>>,
    registry: DivisionRegistry,
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl DivisionImporter {
    pub fn new(conn: Arc<Mutex<Connection>>, registry: DivisionRegistry) -> Self {
        Self {
            conn,
            registry,
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    fn get_conn(&self) -> ImportResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::Repository(RepositoryError::LockError(e.to_string())))
    }

    /// 显式指定的事业部 → 表名（显示名或已登记表名均可）
    fn resolve_division(&self, division: &str) -> ImportResult<String> {
        let key = division.trim();
        if let Some(table) = self.registry.table_for(key) {
            return Ok(table.to_string());
        }
        if self.registry.contains_table(key) {
            return Ok(key.to_string());
        }
        Err(ImportError::UnknownDivision(key.to_string()))
    }

    /// 导入文件
    ///
    /// # 参数
    /// - file_path: .xlsx/.xls（工作表名按注册表解析）或 .csv
    /// - division: CSV 必填；工作簿时只导入该事业部对应的工作表
    ///
    /// # 返回
    /// - Ok(ImportReport): 每个事业部的删除/保留/插入统计
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub fn import_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        division: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file = %path.display(), "开始批量重载");

        let explicit_table = division.map(|d| self.resolve_division(d)).transpose()?;
        let is_workbook = UniversalFileParser::is_workbook(path);
        if !is_workbook && explicit_table.is_none() {
            return Err(ImportError::MissingDivision);
        }

        let sheets = self.parser.parse(path)?;
        debug!(sheets = sheets.len(), "文件解析完成");

        // 更新时间按秒存储
        let now = Local::now().naive_local();
        let updated_at = now.with_nanosecond(0).unwrap_or(now);
        let mut report = ImportReport {
            batch_id: batch_id.clone(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            updated_at,
            divisions: Vec::new(),
            skipped_sheets: Vec::new(),
        };

        for sheet in sheets {
            let table = if is_workbook {
                match self.registry.table_for(&sheet.name) {
                    Some(t) => t.to_string(),
                    None => {
                        warn!(sheet = %sheet.name, "工作表未在事业部注册表中登记，跳过");
                        report.skipped_sheets.push(sheet.name);
                        continue;
                    }
                }
            } else {
                explicit_table.clone().unwrap_or_default()
            };

            if let Some(only) = &explicit_table {
                if is_workbook && *only != table {
                    debug!(sheet = %sheet.name, "非指定事业部，跳过");
                    report.skipped_sheets.push(sheet.name);
                    continue;
                }
            }

            let stats = self.reload_sheet(&table, &sheet, updated_at)?;
            report.divisions.push(stats);
        }

        info!(
            batch_id = %batch_id,
            divisions = report.divisions.len(),
            inserted = report.total_inserted(),
            skipped = report.skipped_sheets.len(),
            "批量重载完成"
        );
        Ok(report)
    }

    fn reload_sheet(
        &self,
        table: &str,
        sheet: &RawSheet,
        updated_at: NaiveDateTime,
    ) -> ImportResult<DivisionReloadStats> {
        let records: Vec<ContainerRecord> = sheet
            .rows
            .iter()
            .map(|row| self.mapper.map_row(row, table))
            .collect();
        let (deleted, preserved) = self.reload_division(table, &records, updated_at)?;

        Ok(DivisionReloadStats {
            division: table.to_string(),
            display_name: self.registry.display_name(table),
            deleted,
            preserved,
            inserted: records.len(),
        })
    }

    /// 单事业部事务重载
    ///
    /// # 返回
    /// (deleted, preserved)
    pub fn reload_division(
        &self,
        table: &str,
        records: &[ContainerRecord],
        updated_at: NaiveDateTime,
    ) -> ImportResult<(usize, usize)> {
        validate_table_name(table)?;
        let quoted = quote_identifier(table);
        let fixed_col = quote_identifier("Fixed");

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        // 建表 + 补齐缺失列
        let column_defs = DIVISION_COLUMNS
            .iter()
            .map(|c| format!("{} TEXT", quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!("CREATE TABLE IF NOT EXISTS {quoted} ({column_defs});"))?;
        let extra_columns: Vec<&str> = records
            .iter()
            .flat_map(|r| r.extra.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        ensure_columns(&tx, table, &extra_columns)?;

        // 删除非固定行
        let deleted = tx.execute(
            &format!("DELETE FROM {quoted} WHERE {fixed_col} IS NULL OR {fixed_col} != ?1"),
            [FIXED_MARKER],
        )?;
        let preserved: i64 =
            tx.query_row(&format!("SELECT COUNT(*) FROM {quoted}"), [], |row| row.get(0))?;

        // 插入新行
        {
            let columns = DIVISION_COLUMNS
                .iter()
                .chain(extra_columns.iter())
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=DIVISION_COLUMNS.len() + extra_columns.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {quoted} ({columns}) VALUES ({placeholders})"
            ))?;
            for record in records {
                let values = record_values(record)
                    .into_iter()
                    .chain(extra_columns.iter().map(|c| record.extra.get(*c).map(String::as_str)));
                stmt.execute(params_from_iter(values))?;
            }
        }

        DivisionUpdateLogRepository::record_update(&tx, table, updated_at)?;

        tx.commit()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        debug!(table, deleted, preserved, inserted = records.len(), "事业部重载完成");
        Ok((deleted, preserved as usize))
    }
}

/// 已有表缺少标准列或附加列时补列
fn ensure_columns(conn: &Connection, table: &str, extra_columns: &[&str]) -> ImportResult<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let existing: HashSet<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect();

    for column in DIVISION_COLUMNS.iter().chain(extra_columns.iter()) {
        if !existing.contains(&column.to_lowercase()) {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} TEXT;",
                quote_identifier(table),
                quote_identifier(column)
            ))?;
            info!(table, column, "补充缺失列");
        }
    }
    Ok(())
}

/// 记录 → 插入参数（顺序与 DIVISION_COLUMNS 一致）
fn record_values(record: &ContainerRecord) -> [Option<&str>; 17] {
    [
        record.container.as_deref(),
        record.destination_port.as_deref().map(str::trim),
        record.unloading_terminal.as_deref(),
        record.terminal_appointment.as_deref(),
        record.dest_flag.as_deref(),
        record.origin.as_deref(),
        record.shipping_line.as_deref(),
        record.modality.as_deref(),
        record.terminal.as_deref(),
        record.shipping_date.as_deref(),
        record.initial_eta.as_deref(),
        record.eta_port.as_deref(),
        record.eta.as_deref(),
        record.vessel_delay_reason.as_deref(),
        record.remark.as_deref(),
        record.delays_fee.as_deref(),
        record.fixed.as_deref(),
    ]
}
