// ==========================================
// POSM 成本计算 - 导入层
// ==========================================
// 职责: 外部表格 → 类型化输入记录
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod input_loader;
pub mod table_importer_trait;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use input_loader::{InputLoader, InputSources, TableSource, POSM_SHEET, PRICE_SHEET};

// 重导出 Trait 接口
pub use table_importer_trait::{FieldMapper, FileParser, RawTable};
