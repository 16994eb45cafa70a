// ==========================================
// POSM 成本计算 - 区域分配
// ==========================================
// 区域占比 = 区域原始需求 / 该 POSM 各区域原始需求之和 × 100（分母为 0 时为 0）
// 区域分配 = 区域自身按规则调整后的需求（占比仅用于展示, 不参与分配）
// 发货 = clamp(各区域分配之和, 下限 = POSM 原始数量, 上限 = POSM 调整后数量)
// 无区域数据: 发货 = clamp(ceil10(调整后 × 70%), 原始, 调整后)
// 备货 = 调整后 - 发货
// ==========================================

use crate::config::CalcConfig;
use crate::domain::report::{PosmTotal, RegionAllocationRow, RegionDemand};
use crate::engine::error::{add_quantity, EngineResult};
use crate::engine::pricing::PriceBook;
use crate::engine::quantity_rule::ceil_to_multiple;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// SendSplit - 发货 / 备货 拆分
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendSplit {
    pub send: u64,
    pub backup: u64,
}

// ==========================================
// RegionAllocator
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionAllocator {
    fallback_send_percent: u64,
    fallback_send_step: u64,
}

impl RegionAllocator {
    pub fn new(config: &CalcConfig) -> Self {
        Self {
            fallback_send_percent: config.fallback_send_percent,
            fallback_send_step: config.fallback_send_step,
        }
    }

    /// 区域分配行（顺序与 region_demand 一致: posm, region）
    #[instrument(skip(self, region_demand, book), fields(rows = region_demand.len()))]
    pub fn allocate(
        &self,
        region_demand: &[RegionDemand],
        book: &PriceBook,
    ) -> EngineResult<Vec<RegionAllocationRow>> {
        let mut raw_totals: BTreeMap<&str, u64> = BTreeMap::new();
        for row in region_demand {
            let total = raw_totals.entry(row.posm_type.as_str()).or_default();
            add_quantity(total, row.raw_quantity, &row.posm_type, "区域原始需求合计")?;
        }

        Ok(region_demand
            .iter()
            .map(|row| {
                let total = raw_totals.get(row.posm_type.as_str()).copied().unwrap_or(0);
                let percent_of_total = if total > 0 {
                    row.raw_quantity as f64 / total as f64 * 100.0
                } else {
                    0.0
                };

                RegionAllocationRow {
                    region: row.region.clone(),
                    posm_type: row.posm_type.clone(),
                    name: book.name_of(&row.posm_type).to_string(),
                    needed_quantity: row.raw_quantity,
                    percent_of_total,
                    allocated_quantity: row.adjusted_quantity,
                }
            })
            .collect())
    }

    /// 每个 POSM 的区域分配合计
    pub fn allocated_totals(rows: &[RegionAllocationRow]) -> EngineResult<BTreeMap<String, u64>> {
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();
        for row in rows {
            let total = totals.entry(row.posm_type.clone()).or_default();
            add_quantity(total, row.allocated_quantity, &row.posm_type, "区域分配合计")?;
        }
        Ok(totals)
    }

    /// 发货 / 备货 拆分; region_allocated 为 None 表示该 POSM 无区域数据
    pub fn split_send(&self, total: &PosmTotal, region_allocated: Option<u64>) -> SendSplit {
        let lower = total.raw_quantity;
        let upper = total.adjusted_quantity.max(lower);

        let candidate = match region_allocated {
            Some(allocated) => allocated,
            None => {
                let share = u128::from(total.adjusted_quantity)
                    * u128::from(self.fallback_send_percent);
                // 取整越界时取上限, 随后的 clamp 保证结果在区间内
                let rounded = u64::try_from(share.div_ceil(100))
                    .ok()
                    .and_then(|share| ceil_to_multiple(share, self.fallback_send_step))
                    .unwrap_or(upper);
                debug!(
                    posm = %total.posm_type,
                    candidate = rounded,
                    "无区域数据, 使用比例发货规则"
                );
                rounded
            }
        };

        let send = candidate.clamp(lower, upper);
        SendSplit {
            send,
            backup: upper - send,
        }
    }
}
