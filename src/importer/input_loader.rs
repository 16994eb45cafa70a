// ==========================================
// POSM 成本计算 - 输入表加载器
// ==========================================
// 导入流程:
// 1. 文件读取与解析（FileParser）
// 2. 字段映射与必填列校验（FieldMapper）
// 3. 汇总为 InputTables
// 任一阶段失败即整体失败
// ==========================================

use crate::domain::records::InputTables;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::table_importer_trait::{FieldMapper, FileParser, RawTable};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// POSM 工作簿中的映射表工作表名
pub const POSM_SHEET: &str = "posm";
/// POSM 工作簿中的价格表工作表名
pub const PRICE_SHEET: &str = "price";

// ==========================================
// TableSource - 单张输入表的来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub path: PathBuf,
    pub sheet: Option<String>,
}

impl TableSource {
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            sheet: None,
        }
    }

    pub fn sheet<P: Into<PathBuf>>(path: P, sheet: &str) -> Self {
        Self {
            path: path.into(),
            sheet: Some(sheet.to_string()),
        }
    }
}

// ==========================================
// InputSources - 五张输入表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSources {
    pub fact_display: TableSource,
    pub store_list: TableSource,
    pub model: TableSource,
    pub posm_map: TableSource,
    pub price: TableSource,
}

impl InputSources {
    /// 标准上传组合: dim_posm 工作簿含 posm / price 两个工作表
    pub fn from_workbooks<P: AsRef<Path>>(
        fact_display: P,
        store_list: P,
        model: P,
        posm_book: P,
    ) -> Self {
        let posm_book = posm_book.as_ref().to_path_buf();
        Self {
            fact_display: TableSource::file(fact_display.as_ref()),
            store_list: TableSource::file(store_list.as_ref()),
            model: TableSource::file(model.as_ref()),
            posm_map: TableSource::sheet(posm_book.clone(), POSM_SHEET),
            price: TableSource::sheet(posm_book, PRICE_SHEET),
        }
    }
}

// ==========================================
// InputLoader
// ==========================================
pub struct InputLoader {
    parser: Box<dyn FileParser>,
    mapper: Box<dyn FieldMapper>,
}

impl Default for InputLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl InputLoader {
    pub fn new() -> Self {
        Self::with_components(Box::new(UniversalFileParser), Box::new(FieldMapperImpl))
    }

    pub fn with_components(parser: Box<dyn FileParser>, mapper: Box<dyn FieldMapper>) -> Self {
        Self { parser, mapper }
    }

    fn parse(&self, source: &TableSource) -> ImportResult<RawTable> {
        self.parser
            .parse_table(&source.path, source.sheet.as_deref())
    }

    /// 加载全部输入表
    #[instrument(skip(self, sources), fields(fact_display = %sources.fact_display.path.display()))]
    pub fn load(&self, sources: &InputSources) -> ImportResult<InputTables> {
        let displays = self.mapper.map_displays(&self.parse(&sources.fact_display)?)?;
        let stores = self.mapper.map_stores(&self.parse(&sources.store_list)?)?;
        let models = self.mapper.map_models(&self.parse(&sources.model)?)?;
        let posm_map = self.mapper.map_posm(&self.parse(&sources.posm_map)?)?;
        let prices = self.mapper.map_prices(&self.parse(&sources.price)?)?;

        info!(
            displays = displays.len(),
            stores = stores.len(),
            models = models.len(),
            posm_mappings = posm_map.len(),
            price_entries = prices.len(),
            "输入表加载完成"
        );

        Ok(InputTables {
            displays,
            stores,
            models,
            posm_map,
            prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_workbooks_uses_posm_and_price_sheets() {
        let sources = InputSources::from_workbooks(
            "fact_display.xlsx",
            "dim_storelist.xlsx",
            "dim_model.xlsx",
            "dim_posm.xlsx",
        );

        assert_eq!(sources.posm_map.path, PathBuf::from("dim_posm.xlsx"));
        assert_eq!(sources.posm_map.sheet.as_deref(), Some(POSM_SHEET));
        assert_eq!(sources.price.sheet.as_deref(), Some(PRICE_SHEET));
        assert_eq!(sources.fact_display.sheet, None);
    }
}
