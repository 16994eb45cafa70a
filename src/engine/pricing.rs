// ==========================================
// POSM 成本计算 - 阶梯价格
// ==========================================
// 数量 → 价格区间 → (posm, 区间) 查价
// 缺失价格档是数据质量问题, 不是致命错误:
// 单价 = 0, 成本 = 0, 记入诊断, 其他 POSM 不受影响
// ==========================================

use crate::domain::records::PriceEntry;
use crate::domain::report::{MissingPriceTier, PosmTotal};
use crate::domain::types::PriceBand;
use std::collections::HashMap;
use tracing::{instrument, warn};

/// 数量对应的价格区间
pub fn price_range(quantity: u64) -> PriceBand {
    PriceBand::from_quantity(quantity)
}

// ==========================================
// PriceQuote - 单次查价结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub band: PriceBand,
    pub unit_price: f64,
    pub total_cost: f64,
    pub found: bool,
}

// ==========================================
// PriceBook - 价格表索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    tiers: HashMap<String, HashMap<PriceBand, f64>>,
    names: HashMap<String, String>,
    duplicate_entries: usize,
}

impl PriceBook {
    /// 建索引: 同一 (posm, 区间) 多行时第一行生效
    pub fn new(entries: &[PriceEntry]) -> Self {
        let mut book = PriceBook::default();
        for entry in entries {
            book.names
                .entry(entry.posm_type.clone())
                .or_insert_with(|| entry.name.clone());

            let bands = book.tiers.entry(entry.posm_type.clone()).or_default();
            if bands.contains_key(&entry.band) {
                book.duplicate_entries += 1;
                continue;
            }
            bands.insert(entry.band, entry.unit_price);
        }

        if book.duplicate_entries > 0 {
            warn!(
                duplicate_entries = book.duplicate_entries,
                "价格表存在重复的 (posm, range), 使用第一行"
            );
        }
        book
    }

    /// 查价（不记录日志）
    pub fn lookup(&self, posm_type: &str, quantity: u64) -> PriceQuote {
        let band = price_range(quantity);
        match self.tiers.get(posm_type).and_then(|bands| bands.get(&band)) {
            Some(&unit_price) => PriceQuote {
                band,
                unit_price,
                total_cost: unit_price * quantity as f64,
                found: true,
            },
            None => PriceQuote {
                band,
                unit_price: 0.0,
                total_cost: 0.0,
                found: false,
            },
        }
    }

    /// 查价; 缺失时记录警告并返回零成本
    pub fn price(&self, posm_type: &str, quantity: u64) -> PriceQuote {
        let quote = self.lookup(posm_type, quantity);
        if !quote.found {
            warn!(
                posm = posm_type,
                quantity,
                range = quote.band.label(),
                "未找到价格档, 按 0 计价"
            );
        }
        quote
    }

    /// POSM 名称（价格表第一次出现的 name）; 无价格行时为空
    pub fn name_of(&self, posm_type: &str) -> &str {
        self.names.get(posm_type).map(String::as_str).unwrap_or("")
    }

    pub fn duplicate_entries(&self) -> usize {
        self.duplicate_entries
    }
}

// ==========================================
// 定价阶段
// ==========================================

/// POSM 级定价结果: 原始数量与调整后数量各查一次
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPosm {
    pub total: PosmTotal,
    pub raw_quote: PriceQuote,
    pub adjusted_quote: PriceQuote,
}

/// 为每个 POSM 定价, 收集缺失价格档
#[instrument(skip(book, totals), fields(posm_types = totals.len()))]
pub fn price_totals(
    book: &PriceBook,
    totals: &[PosmTotal],
) -> (Vec<PricedPosm>, Vec<MissingPriceTier>) {
    let mut missing = Vec::new();
    let priced = totals
        .iter()
        .map(|total| {
            let raw_quote = book.price(&total.posm_type, total.raw_quantity);
            let adjusted_quote = book.price(&total.posm_type, total.adjusted_quantity);

            for (quote, quantity) in [
                (raw_quote, total.raw_quantity),
                (adjusted_quote, total.adjusted_quantity),
            ] {
                let tier = MissingPriceTier {
                    posm_type: total.posm_type.clone(),
                    quantity,
                    band: quote.band,
                };
                if !quote.found && !missing.contains(&tier) {
                    missing.push(tier);
                }
            }

            PricedPosm {
                total: total.clone(),
                raw_quote,
                adjusted_quote,
            }
        })
        .collect();

    (priced, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(posm: &str, band: PriceBand, price: f64) -> PriceEntry {
        PriceEntry {
            posm_type: posm.to_string(),
            name: format!("{} name", posm),
            band,
            unit_price: price,
        }
    }

    #[test]
    fn test_lookup_by_band() {
        let book = PriceBook::new(&[
            entry("P1", PriceBand::UpTo200, 6.0),
            entry("P1", PriceBand::From201To500, 5.0),
        ]);

        let quote = book.price("P1", 210);

        assert!(quote.found);
        assert_eq!(quote.band, PriceBand::From201To500);
        assert_eq!(quote.unit_price, 5.0);
        assert_eq!(quote.total_cost, 1050.0);
        assert_eq!(book.price("P1", 150).unit_price, 6.0);
    }

    #[test]
    fn test_missing_tier_is_zero_cost() {
        let book = PriceBook::new(&[entry("P1", PriceBand::UpTo200, 6.0)]);

        let quote = book.price("P1", 210);

        assert!(!quote.found);
        assert_eq!(quote.unit_price, 0.0);
        assert_eq!(quote.total_cost, 0.0);
        assert_eq!(book.price("P9", 10).total_cost, 0.0);
    }

    #[test]
    fn test_duplicate_entry_first_wins() {
        let book = PriceBook::new(&[
            entry("P1", PriceBand::UpTo200, 6.0),
            entry("P1", PriceBand::UpTo200, 9.0),
        ]);

        assert_eq!(book.lookup("P1", 1).unit_price, 6.0);
        assert_eq!(book.duplicate_entries(), 1);
        assert_eq!(book.name_of("P1"), "P1 name");
        assert_eq!(book.name_of("P2"), "");
    }

    #[test]
    fn test_price_totals_collects_missing_tiers() {
        let book = PriceBook::new(&[entry("P1", PriceBand::From201To500, 5.0)]);
        let totals = vec![
            PosmTotal {
                posm_type: "P1".to_string(),
                raw_quantity: 150,
                adjusted_quantity: 210,
            },
            PosmTotal {
                posm_type: "P2".to_string(),
                raw_quantity: 300,
                adjusted_quantity: 300,
            },
        ];

        let (priced, missing) = price_totals(&book, &totals);

        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].adjusted_quote.total_cost, 1050.0);
        assert!(!priced[0].raw_quote.found);
        // P1 raw(150) + P2 (300, raw 与 adjusted 相同只记一次)
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().any(|m| m.posm_type == "P2" && m.quantity == 300));
    }
}
