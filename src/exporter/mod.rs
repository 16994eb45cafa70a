// ==========================================
// POSM 成本计算 - 导出层
// ==========================================
// 职责: 将 PosmReport 写为 CSV 表 + 诊断 JSON
// ==========================================

pub mod error;
pub mod report_writer;

pub use error::{ExportError, ExportResult};
pub use report_writer::{CsvTable, ExportedFiles, ReportWriter, REPORT_PREFIX};
