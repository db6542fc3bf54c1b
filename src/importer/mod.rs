// ==========================================
// 码头堆存费用 KPI 系统 - 导入层
// ==========================================
// 职责: 外部文件 → 事业部表批量重载
// 支持: Excel（多工作表）, CSV（单事业部）
// ==========================================

// 模块声明
pub mod division_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use division_importer::{DivisionImporter, DivisionReloadStats, ImportReport};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{normalize_header, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawSheet, UniversalFileParser};
