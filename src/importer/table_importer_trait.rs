// ==========================================
// POSM 成本计算 - 表格导入 Trait
// ==========================================
// 职责: 定义文件解析 / 字段映射接口（不包含实现）
// ==========================================

use crate::domain::records::{DisplayRecord, ModelInfo, ModelPosmMap, PriceEntry, StoreInfo};
use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// RawTable - 文件解析产物
// ==========================================
// headers 单独保留: 空表也能做必填列校验
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - sheet: 工作表名（None = 第一个工作表; CSV 忽略）
    fn parse_table(&self, file_path: &Path, sheet: Option<&str>) -> ImportResult<RawTable>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 原始表 → 类型化记录（含必填列校验）
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    fn map_displays(&self, table: &RawTable) -> ImportResult<Vec<DisplayRecord>>;

    fn map_stores(&self, table: &RawTable) -> ImportResult<Vec<StoreInfo>>;

    fn map_models(&self, table: &RawTable) -> ImportResult<Vec<ModelInfo>>;

    fn map_posm(&self, table: &RawTable) -> ImportResult<Vec<ModelPosmMap>>;

    fn map_prices(&self, table: &RawTable) -> ImportResult<Vec<PriceEntry>>;
}
