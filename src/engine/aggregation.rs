// ==========================================
// POSM 成本计算 - 分组聚合（规则阶段）
// ==========================================
// POSM 级: GROUP BY (posm, priority) → 逐组应用规则 → 跨优先级求和
// 区域级: GROUP BY (region, posm, priority) → 逐组应用规则 → 按 (region, posm) 求和
// 无 POSM / 无优先级 的行不进入聚合; 无区域的行只进入 POSM 级
// 聚合结果为不可变派生表, 中间映射不离开本阶段
// ==========================================

use crate::domain::records::JoinedRecord;
use crate::domain::report::{AddressSummaryRow, PosmDemand, PosmTotal, RegionDemand};
use crate::domain::types::Priority;
use crate::engine::error::{add_quantity, EngineError, EngineResult};
use crate::engine::quantity_rule::QuantityRule;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// 聚合排除统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusionCounts {
    pub missing_priority_rows: usize,
    pub missing_region_rows: usize,
}

/// 统计被排除的行（仅对有 POSM 的行）
pub fn exclusion_counts(records: &[JoinedRecord]) -> ExclusionCounts {
    records
        .iter()
        .filter(|r| r.posm_type.is_some())
        .fold(ExclusionCounts::default(), |mut acc, r| {
            if r.priority.is_none() {
                acc.missing_priority_rows += 1;
            } else if r.region.is_none() {
                acc.missing_region_rows += 1;
            }
            acc
        })
}

/// 参与 POSM 聚合的行: 返回 (posm, priority); 优先级非法即报错
fn posm_key(record: &JoinedRecord) -> EngineResult<Option<(&str, Priority)>> {
    let (Some(posm_type), Some(code)) = (record.posm_type.as_deref(), record.priority) else {
        return Ok(None);
    };
    let priority = Priority::from_code(code).ok_or_else(|| EngineError::InvalidPriority {
        value: code,
        context: format!("model={}, store={}", record.model, record.store),
    })?;
    Ok(Some((posm_type, priority)))
}

// ==========================================
// DemandAggregator
// ==========================================
pub struct DemandAggregator<'a> {
    rule: &'a QuantityRule,
}

impl<'a> DemandAggregator<'a> {
    pub fn new(rule: &'a QuantityRule) -> Self {
        Self { rule }
    }

    /// (POSM, 优先级) 分组需求
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn posm_demand(&self, records: &[JoinedRecord]) -> EngineResult<Vec<PosmDemand>> {
        let mut groups: BTreeMap<(&str, Priority), u64> = BTreeMap::new();
        for record in records {
            if let Some(key) = posm_key(record)? {
                let total = groups.entry(key).or_default();
                add_quantity(total, record.quantity, key.0, "POSM 原始数量")?;
            }
        }

        let mut demand = Vec::with_capacity(groups.len());
        for ((posm_type, priority), raw_quantity) in groups {
            demand.push(PosmDemand {
                posm_type: posm_type.to_string(),
                priority,
                raw_quantity,
                adjusted_quantity: self.adjusted(posm_type, raw_quantity, priority)?,
            });
        }

        debug!(groups = demand.len(), "POSM 分组完成");
        Ok(demand)
    }

    /// (区域, POSM) 需求, 区域内仍按优先级分组应用规则
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn region_demand(&self, records: &[JoinedRecord]) -> EngineResult<Vec<RegionDemand>> {
        let mut groups: BTreeMap<(&str, &str, Priority), u64> = BTreeMap::new();
        for record in records {
            let Some((posm_type, priority)) = posm_key(record)? else {
                continue;
            };
            let Some(region) = record.region.as_deref() else {
                continue;
            };
            let total = groups.entry((posm_type, region, priority)).or_default();
            add_quantity(total, record.quantity, posm_type, "区域原始数量")?;
        }

        // (posm, region) → (raw, adjusted)
        let mut per_region: BTreeMap<(&str, &str), (u64, u64)> = BTreeMap::new();
        for ((posm_type, region, priority), raw_quantity) in groups {
            let adjusted = self.adjusted(posm_type, raw_quantity, priority)?;
            let entry = per_region.entry((posm_type, region)).or_default();
            add_quantity(&mut entry.0, raw_quantity, posm_type, "区域原始数量")?;
            add_quantity(&mut entry.1, adjusted, posm_type, "区域调整后数量")?;
        }

        let demand: Vec<RegionDemand> = per_region
            .into_iter()
            .map(|((posm_type, region), (raw_quantity, adjusted_quantity))| RegionDemand {
                region: region.to_string(),
                posm_type: posm_type.to_string(),
                raw_quantity,
                adjusted_quantity,
            })
            .collect();

        debug!(groups = demand.len(), "区域分组完成");
        Ok(demand)
    }

    fn adjusted(&self, posm_type: &str, quantity: u64, priority: Priority) -> EngineResult<u64> {
        self.rule.apply(quantity, priority).ok_or_else(|| {
            EngineError::overflow(
                posm_type,
                format!("规则调整 quantity={}, priority={}", quantity, priority),
            )
        })
    }
}

/// 跨优先级汇总到 POSM 级（输入按 posm 排序）
pub fn posm_totals(demand: &[PosmDemand]) -> EngineResult<Vec<PosmTotal>> {
    let mut totals: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for row in demand {
        let entry = totals.entry(row.posm_type.as_str()).or_default();
        add_quantity(&mut entry.0, row.raw_quantity, &row.posm_type, "POSM 原始合计")?;
        add_quantity(&mut entry.1, row.adjusted_quantity, &row.posm_type, "POSM 调整后合计")?;
    }

    Ok(totals
        .into_iter()
        .map(|(posm_type, (raw_quantity, adjusted_quantity))| PosmTotal {
            posm_type: posm_type.to_string(),
            raw_quantity,
            adjusted_quantity,
        })
        .collect())
}

/// 按 (地址, POSM) 汇总原始数量
pub fn address_summary(records: &[JoinedRecord]) -> EngineResult<Vec<AddressSummaryRow>> {
    let mut totals: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for record in records {
        if let (Some(address), Some(posm_type)) =
            (record.address.as_deref(), record.posm_type.as_deref())
        {
            let total = totals.entry((address, posm_type)).or_default();
            add_quantity(total, record.quantity, posm_type, "地址合计")?;
        }
    }

    Ok(totals
        .into_iter()
        .map(|((address, posm_type), total_quantity)| AddressSummaryRow {
            address: address.to_string(),
            posm_type: posm_type.to_string(),
            total_quantity,
        })
        .collect())
}
