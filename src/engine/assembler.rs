// ==========================================
// POSM 成本计算 - 结果组装
// ==========================================
// 纯字段组合, 不含业务规则
// 定价失败的 POSM 仍输出（零成本行）
// ==========================================

use crate::domain::report::{PosmDemand, PriorityDetailRow, ResultRow};
use crate::engine::allocation::SendSplit;
use crate::engine::pricing::{PriceBook, PricedPosm};

pub struct ResultAssembler;

impl ResultAssembler {
    /// POSM 汇总行
    pub fn posm_row(&self, priced: &PricedPosm, name: &str, split: SendSplit) -> ResultRow {
        ResultRow {
            posm_type: priced.total.posm_type.clone(),
            name: name.to_string(),
            raw_quantity: priced.total.raw_quantity,
            adjusted_quantity: priced.total.adjusted_quantity,
            send_quantity: split.send,
            backup_quantity: split.backup,
            unit_price_raw: priced.raw_quote.unit_price,
            unit_price_adjusted: priced.adjusted_quote.unit_price,
            cost_raw: priced.raw_quote.total_cost,
            cost_adjusted: priced.adjusted_quote.total_cost,
        }
    }

    /// 按优先级的明细行（按各自数量查价）
    pub fn priority_rows(&self, demand: &[PosmDemand], book: &PriceBook) -> Vec<PriorityDetailRow> {
        demand
            .iter()
            .map(|row| {
                let raw_quote = book.lookup(&row.posm_type, row.raw_quantity);
                let adjusted_quote = book.lookup(&row.posm_type, row.adjusted_quantity);
                PriorityDetailRow {
                    posm_type: row.posm_type.clone(),
                    priority: row.priority,
                    raw_quantity: row.raw_quantity,
                    adjusted_quantity: row.adjusted_quantity,
                    unit_price_raw: raw_quote.unit_price,
                    cost_raw: raw_quote.total_cost,
                    unit_price_adjusted: adjusted_quote.unit_price,
                    cost_adjusted: adjusted_quote.total_cost,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::PriceEntry;
    use crate::domain::report::PosmTotal;
    use crate::domain::types::{PriceBand, Priority};

    #[test]
    fn test_posm_row_composition() {
        let book = PriceBook::new(&[PriceEntry {
            posm_type: "P1".to_string(),
            name: "Wobbler".to_string(),
            band: PriceBand::From201To500,
            unit_price: 5.0,
        }]);
        let total = PosmTotal {
            posm_type: "P1".to_string(),
            raw_quantity: 150,
            adjusted_quantity: 210,
        };
        let priced = PricedPosm {
            raw_quote: book.lookup("P1", 150),
            adjusted_quote: book.lookup("P1", 210),
            total,
        };

        let row = ResultAssembler.posm_row(&priced, "Wobbler", SendSplit { send: 210, backup: 0 });

        assert_eq!(row.name, "Wobbler");
        assert_eq!(row.unit_price_raw, 0.0);
        assert_eq!(row.cost_raw, 0.0);
        assert_eq!(row.unit_price_adjusted, 5.0);
        assert_eq!(row.cost_adjusted, 1050.0);
        assert_eq!(row.send_quantity + row.backup_quantity, row.adjusted_quantity);
    }

    #[test]
    fn test_priority_rows_priced_individually() {
        let book = PriceBook::new(&[PriceEntry {
            posm_type: "P1".to_string(),
            name: "Wobbler".to_string(),
            band: PriceBand::UpTo200,
            unit_price: 2.0,
        }]);
        let demand = vec![PosmDemand {
            posm_type: "P1".to_string(),
            priority: Priority::Plain,
            raw_quantity: 12,
            adjusted_quantity: 15,
        }];

        let rows = ResultAssembler.priority_rows(&demand, &book);

        assert_eq!(rows[0].cost_raw, 24.0);
        assert_eq!(rows[0].cost_adjusted, 30.0);
    }
}
