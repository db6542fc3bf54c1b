// ==========================================
// 码头堆存费用 KPI 系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls，每个工作表一个事业部) / CSV (.csv，单事业部)
// 输出: 原始行（表头 → 单元格文本），不做字段映射
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 一个工作表（CSV 视为单个工作表，名称取文件名）
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<HashMap<String, String>>,
}

/// 文件解析器接口
pub trait FileParser {
    fn parse_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>>;
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>> {
        check_exists(file_path)?;
        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(row_map);
        }

        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(vec![RawSheet { name, rows }])
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// 单元格 → 文本（日期统一输出 YYYY-MM-DD HH:MM:SS）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        _ => cell.to_string().trim().to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>> {
        check_exists(file_path)?;
        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;

            let mut rows_iter = range.rows();
            let Some(header_row) = rows_iter.next() else {
                tracing::warn!(sheet = %sheet_name, "工作表为空，跳过");
                continue;
            };
            let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

            let mut rows = Vec::new();
            for data_row in rows_iter {
                let mut row_map = HashMap::new();
                for (col_idx, cell) in data_row.iter().enumerate() {
                    if let Some(header) = headers.get(col_idx) {
                        row_map.insert(header.clone(), cell_to_string(cell));
                    }
                }
                if row_map.values().all(|v| v.is_empty()) {
                    continue;
                }
                rows.push(row_map);
            }

            sheets.push(RawSheet {
                name: sheet_name,
                rows,
            });
        }

        Ok(sheets)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn is_workbook(file_path: &Path) -> bool {
        matches!(extension_of(file_path).as_str(), "xlsx" | "xls")
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawSheet>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_sheets(path),
            "xlsx" | "xls" => ExcelParser.parse_sheets(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_parser_skips_blank_rows() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "Container,Destination Port,Terminal Appointment").unwrap();
        writeln!(temp_file, "MSCU1, MANZANILLO ,2024-01-08").unwrap();
        writeln!(temp_file, ",,").unwrap();
        writeln!(temp_file, "MSCU2,LZO,2024-01-09").unwrap();
        temp_file.flush().unwrap();

        let sheets = UniversalFileParser.parse(temp_file.path()).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].rows.len(), 2);
        assert_eq!(sheets[0].rows[0].get("Destination Port").unwrap(), "MANZANILLO");
    }

    #[test]
    fn test_unsupported_and_missing() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            UniversalFileParser.parse(temp_file.path()),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            CsvParser.parse_sheets(Path::new("/nonexistent/file.csv")),
            Err(ImportError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(12.0)), "12");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String(" LZO ".to_string())), "LZO");
    }
}
