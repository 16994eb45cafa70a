// ==========================================
// POSM 成本计算 - 字段映射器实现
// ==========================================
// 职责: 源列 → 标准字段映射 + 类型转换 + 必填列校验
// 列名为外部契约, 别名兼容历史表头（如 "Store name" → shop）
// ==========================================

use crate::domain::records::{DisplayRecord, ModelInfo, ModelPosmMap, PriceEntry, StoreInfo};
use crate::domain::types::PriceBand;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table_importer_trait::{FieldMapper as FieldMapperTrait, RawTable};
use std::collections::HashMap;
use tracing::warn;

// 表名（用于错误信息）
pub const TABLE_FACT_DISPLAY: &str = "fact_display";
pub const TABLE_STORE_LIST: &str = "dim_storelist";
pub const TABLE_MODEL: &str = "dim_model";
pub const TABLE_POSM: &str = "dim_posm.posm";
pub const TABLE_PRICE: &str = "dim_posm.price";

// 列别名（第一个为标准列名）
const COL_SHOP: &[&str] = &["shop", "Store name"];
const COL_MODEL: &[&str] = &["model"];
const COL_QUANTITY: &[&str] = &["quantity"];
const COL_ADDRESS: &[&str] = &["Address", "address"];
const COL_REGION: &[&str] = &["Province", "region", "Region"];
const COL_PRIORITY: &[&str] = &["priority"];
const COL_CATEGORY: &[&str] = &["subcategory", "category"];
const COL_POSM: &[&str] = &["posm"];
const COL_NAME: &[&str] = &["name"];
const COL_RANGE: &[&str] = &["range"];
const COL_PRICE: &[&str] = &["price"];

/// 数据行在源文件中的行号（表头为第 1 行）
fn source_row(idx: usize) -> usize {
    idx + 2
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn map_displays(&self, table: &RawTable) -> ImportResult<Vec<DisplayRecord>> {
        let shop = self.require_column(table, TABLE_FACT_DISPLAY, COL_SHOP)?;
        let model = self.require_column(table, TABLE_FACT_DISPLAY, COL_MODEL)?;
        let quantity = self.require_column(table, TABLE_FACT_DISPLAY, COL_QUANTITY)?;

        table
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                // 键为空的事实行保留, 在连接阶段计为未匹配
                Ok(DisplayRecord {
                    store: self.get_string(row, &shop).unwrap_or_default(),
                    model: self.get_string(row, &model).unwrap_or_default(),
                    quantity: self.parse_quantity(row, &quantity, TABLE_FACT_DISPLAY, idx)?,
                })
            })
            .collect()
    }

    fn map_stores(&self, table: &RawTable) -> ImportResult<Vec<StoreInfo>> {
        let shop = self.require_column(table, TABLE_STORE_LIST, COL_SHOP)?;
        let region = self.require_column(table, TABLE_STORE_LIST, COL_REGION)?;
        let address = self.resolve_column(table, COL_ADDRESS);

        let mut stores = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            let Some(store) = self.get_string(row, &shop) else {
                warn!(table = TABLE_STORE_LIST, row = source_row(idx), "门店为空, 跳过");
                continue;
            };
            stores.push(StoreInfo {
                store,
                address: address.as_ref().and_then(|c| self.get_string(row, c)),
                region: self.get_string(row, &region),
            });
        }
        Ok(stores)
    }

    fn map_models(&self, table: &RawTable) -> ImportResult<Vec<ModelInfo>> {
        let model = self.require_column(table, TABLE_MODEL, COL_MODEL)?;
        let priority = self.require_column(table, TABLE_MODEL, COL_PRIORITY)?;
        let category = self.resolve_column(table, COL_CATEGORY);

        let mut models = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            let Some(model_id) = self.get_string(row, &model) else {
                warn!(table = TABLE_MODEL, row = source_row(idx), "型号为空, 跳过");
                continue;
            };
            models.push(ModelInfo {
                model: model_id,
                priority: self.parse_integer(row, &priority, TABLE_MODEL, idx)?,
                category: category.as_ref().and_then(|c| self.get_string(row, c)),
            });
        }
        Ok(models)
    }

    fn map_posm(&self, table: &RawTable) -> ImportResult<Vec<ModelPosmMap>> {
        let model = self.require_column(table, TABLE_POSM, COL_MODEL)?;
        let posm = self.require_column(table, TABLE_POSM, COL_POSM)?;

        let mut mappings = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            match (self.get_string(row, &model), self.get_string(row, &posm)) {
                (Some(model), Some(posm_type)) => mappings.push(ModelPosmMap { model, posm_type }),
                _ => warn!(table = TABLE_POSM, row = source_row(idx), "型号或 POSM 为空, 跳过"),
            }
        }
        Ok(mappings)
    }

    fn map_prices(&self, table: &RawTable) -> ImportResult<Vec<PriceEntry>> {
        let posm = self.require_column(table, TABLE_PRICE, COL_POSM)?;
        let name = self.require_column(table, TABLE_PRICE, COL_NAME)?;
        let range = self.require_column(table, TABLE_PRICE, COL_RANGE)?;
        let price = self.require_column(table, TABLE_PRICE, COL_PRICE)?;

        let mut entries = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            let Some(posm_type) = self.get_string(row, &posm) else {
                warn!(table = TABLE_PRICE, row = source_row(idx), "POSM 为空, 跳过");
                continue;
            };

            let label = self.get_string(row, &range).unwrap_or_default();
            let band = PriceBand::from_label(&label).ok_or_else(|| {
                ImportError::TypeConversionError {
                    table: TABLE_PRICE.to_string(),
                    row: source_row(idx),
                    field: range.clone(),
                    message: format!("未知价格区间: {}", label),
                }
            })?;

            entries.push(PriceEntry {
                posm_type,
                name: self.get_string(row, &name).unwrap_or_default(),
                band,
                unit_price: self.parse_price(row, &price, TABLE_PRICE, idx)?,
            });
        }
        Ok(entries)
    }
}

impl FieldMapper {
    /// 按别名查找实际列名（先精确匹配, 再忽略大小写）
    fn resolve_column(&self, table: &RawTable, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .find(|alias| table.has_column(alias))
            .map(|alias| alias.to_string())
            .or_else(|| {
                table
                    .headers
                    .iter()
                    .find(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
                    .cloned()
            })
    }

    /// 必填列缺失 → MissingRequiredColumn（整次计算中止）
    fn require_column(
        &self,
        table: &RawTable,
        table_name: &str,
        aliases: &[&str],
    ) -> ImportResult<String> {
        self.resolve_column(table, aliases)
            .ok_or_else(|| ImportError::MissingRequiredColumn {
                table: table_name.to_string(),
                column: aliases.join(" | "),
            })
    }

    /// 提取字符串字段（空白视为 None）
    fn get_string(&self, row: &HashMap<String, String>, column: &str) -> Option<String> {
        row.get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 解析整数, 兼容 Excel 浮点形式（"2.0"）
    fn parse_integer(
        &self,
        row: &HashMap<String, String>,
        column: &str,
        table_name: &str,
        idx: usize,
    ) -> ImportResult<Option<i64>> {
        let Some(value) = self.get_string(row, column) else {
            return Ok(None);
        };

        if let Ok(v) = value.parse::<i64>() {
            return Ok(Some(v));
        }

        match value.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(Some(v as i64)),
            _ => Err(ImportError::TypeConversionError {
                table: table_name.to_string(),
                row: source_row(idx),
                field: column.to_string(),
                message: format!("无法解析为整数: {}", value),
            }),
        }
    }

    /// 解析陈列数量（空值按 0 计; 负数报错）
    fn parse_quantity(
        &self,
        row: &HashMap<String, String>,
        column: &str,
        table_name: &str,
        idx: usize,
    ) -> ImportResult<u64> {
        match self.parse_integer(row, column, table_name, idx)? {
            None => Ok(0),
            Some(v) => u64::try_from(v).map_err(|_| ImportError::TypeConversionError {
                table: table_name.to_string(),
                row: source_row(idx),
                field: column.to_string(),
                message: format!("数量为负数: {}", v),
            }),
        }
    }

    /// 解析单价
    fn parse_price(
        &self,
        row: &HashMap<String, String>,
        column: &str,
        table_name: &str,
        idx: usize,
    ) -> ImportResult<f64> {
        let value = self.get_string(row, column).unwrap_or_default();
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(ImportError::TypeConversionError {
                table: table_name.to_string(),
                row: source_row(idx),
                field: column.to_string(),
                message: format!("无法解析为单价: {}", value),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|cells| {
                    headers
                        .iter()
                        .zip(cells.iter())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn test_map_displays_basic() {
        let raw = table(&["shop", "model", "quantity"], &[&["S01", "M1", "100"], &["S02", "M1", "50.0"]]);

        let records = FieldMapper.map_displays(&raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].store, "S01");
        assert_eq!(records[1].quantity, 50);
    }

    #[test]
    fn test_map_displays_empty_quantity_is_zero() {
        let raw = table(&["shop", "model", "quantity"], &[&["S01", "M1", ""]]);

        let records = FieldMapper.map_displays(&raw).unwrap();

        assert_eq!(records[0].quantity, 0);
    }

    #[test]
    fn test_map_displays_negative_quantity_rejected() {
        let raw = table(&["shop", "model", "quantity"], &[&["S01", "M1", "-3"]]);

        let result = FieldMapper.map_displays(&raw);

        assert!(matches!(
            result,
            Err(ImportError::TypeConversionError { row: 2, .. })
        ));
    }

    #[test]
    fn test_map_displays_missing_quantity_column() {
        let raw = table(&["shop", "model"], &[&["S01", "M1"]]);

        let result = FieldMapper.map_displays(&raw);

        assert!(matches!(
            result,
            Err(ImportError::MissingRequiredColumn { ref table, .. }) if table == TABLE_FACT_DISPLAY
        ));
    }

    #[test]
    fn test_map_stores_store_name_alias() {
        let raw = table(
            &["Store name", "Address", "Province"],
            &[&["S01", "12 Le Loi", "HCM"], &["", "x", "y"]],
        );

        let stores = FieldMapper.map_stores(&raw).unwrap();

        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].store, "S01");
        assert_eq!(stores[0].address.as_deref(), Some("12 Le Loi"));
        assert_eq!(stores[0].region.as_deref(), Some("HCM"));
    }

    #[test]
    fn test_map_stores_requires_region() {
        let raw = table(&["shop", "Address"], &[&["S01", "12 Le Loi"]]);

        let result = FieldMapper.map_stores(&raw);

        assert!(matches!(result, Err(ImportError::MissingRequiredColumn { .. })));
    }

    #[test]
    fn test_map_models_priority_and_optional_category() {
        let raw = table(&["model", "priority"], &[&["M1", "1"], &["M2", "2.0"], &["M3", ""]]);

        let models = FieldMapper.map_models(&raw).unwrap();

        assert_eq!(models[0].priority, Some(1));
        assert_eq!(models[1].priority, Some(2));
        assert_eq!(models[2].priority, None);
        assert!(models.iter().all(|m| m.category.is_none()));
    }

    #[test]
    fn test_map_models_out_of_range_priority_kept_raw() {
        let raw = table(&["model", "priority", "subcategory"], &[&["M1", "3", "Care"]]);

        let models = FieldMapper.map_models(&raw).unwrap();

        assert_eq!(models[0].priority, Some(3));
        assert_eq!(models[0].category.as_deref(), Some("Care"));
    }

    #[test]
    fn test_map_prices_band_labels() {
        let raw = table(
            &["posm", "name", "range", "price"],
            &[&["P1", "Wobbler", "201-500", "5.0"], &["P1", "Wobbler", "1001-2000", "4"]],
        );

        let prices = FieldMapper.map_prices(&raw).unwrap();

        assert_eq!(prices[0].band, PriceBand::From201To500);
        assert_eq!(prices[0].unit_price, 5.0);
        assert_eq!(prices[1].band, PriceBand::From1001To2000);
    }

    #[test]
    fn test_map_prices_unknown_band_rejected() {
        let raw = table(&["posm", "name", "range", "price"], &[&["P1", "Wobbler", "1-99", "5.0"]]);

        let result = FieldMapper.map_prices(&raw);

        assert!(matches!(result, Err(ImportError::TypeConversionError { .. })));
    }
}
