// ==========================================
// POSM 成本计算 - 派生表与结果
// ==========================================
// 红线: 派生表只在单次计算内产生和消费, 不持久化
// 输出列名为下游契约, 字段顺序即列顺序
// ==========================================

use crate::domain::types::{PriceBand, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PosmDemand - (POSM 类型, 优先级) 分组需求
// ==========================================
// 不变量: 每个 (posm_type, priority) 恰好一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosmDemand {
    pub posm_type: String,
    pub priority: Priority,
    pub raw_quantity: u64,
    pub adjusted_quantity: u64,
}

// ==========================================
// PosmTotal - 跨优先级汇总后的 POSM 级需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosmTotal {
    pub posm_type: String,
    pub raw_quantity: u64,
    pub adjusted_quantity: u64,
}

// ==========================================
// RegionDemand - (区域, POSM 类型) 需求
// ==========================================
// adjusted_quantity 为按优先级分组取整后的合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDemand {
    pub region: String,
    pub posm_type: String,
    pub raw_quantity: u64,
    pub adjusted_quantity: u64,
}

// ==========================================
// ResultRow - POSM 汇总输出行
// ==========================================
// 不变量:
// - send_quantity + backup_quantity == adjusted_quantity
// - raw_quantity <= send_quantity <= adjusted_quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub posm_type: String,
    pub name: String,
    pub raw_quantity: u64,
    pub adjusted_quantity: u64,
    pub send_quantity: u64,
    pub backup_quantity: u64,
    pub unit_price_raw: f64,
    pub unit_price_adjusted: f64,
    pub cost_raw: f64,
    pub cost_adjusted: f64,
}

// ==========================================
// PriorityDetailRow - 按优先级的明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityDetailRow {
    pub posm_type: String,
    pub priority: Priority,
    pub raw_quantity: u64,
    pub adjusted_quantity: u64,
    pub unit_price_raw: f64,
    pub cost_raw: f64,
    pub unit_price_adjusted: f64,
    pub cost_adjusted: f64,
}

// ==========================================
// RegionAllocationRow - 区域分配输出行
// ==========================================
// 不变量: 同一 posm_type 下 allocated_quantity 之和 == 各区域 adjusted 之和
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAllocationRow {
    pub region: String,
    pub posm_type: String,
    pub name: String,
    pub needed_quantity: u64,
    pub percent_of_total: f64,
    pub allocated_quantity: u64,
}

// ==========================================
// AddressSummaryRow - 按地址汇总的原始数量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummaryRow {
    pub address: String,
    pub posm_type: String,
    pub total_quantity: u64,
}

// ==========================================
// CategoryAllocation - 按品类过滤后的区域分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub label: String,
    pub rows: Vec<RegionAllocationRow>,
}

// ==========================================
// 诊断信息
// ==========================================

/// 缺失价格档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPriceTier {
    pub posm_type: String,
    pub quantity: u64,
    pub band: PriceBand,
}

/// 非致命问题汇总, 供人工核对合计偏低的原因
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub display_rows: usize,
    pub joined_rows: usize,
    pub unmatched_store_rows: usize,
    pub unmatched_model_rows: usize,
    pub unmapped_posm_rows: usize,
    pub missing_priority_rows: usize,
    pub missing_region_rows: usize,
    pub fanout_rows: usize,
    pub duplicate_store_keys: usize,
    pub duplicate_model_keys: usize,
    pub duplicate_posm_mappings: usize,
    pub duplicate_price_entries: usize,
    pub missing_price_tiers: Vec<MissingPriceTier>,
}

impl Diagnostics {
    /// 被排除在 POSM 聚合之外的行数
    pub fn excluded_from_posm(&self) -> usize {
        self.unmapped_posm_rows + self.missing_priority_rows
    }

    pub fn has_warnings(&self) -> bool {
        self.excluded_from_posm() > 0
            || self.missing_region_rows > 0
            || self.duplicate_store_keys > 0
            || self.duplicate_model_keys > 0
            || self.duplicate_posm_mappings > 0
            || self.duplicate_price_entries > 0
            || !self.missing_price_tiers.is_empty()
    }
}

// ==========================================
// PosmReport - 一次计算的完整输出
// ==========================================
// 致命错误时整体不产生, 不存在半成品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosmReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub posm_summary: Vec<ResultRow>,
    pub priority_detail: Vec<PriorityDetailRow>,
    pub region_summary: Vec<RegionAllocationRow>,
    pub address_summary: Vec<AddressSummaryRow>,
    pub category_allocations: Vec<CategoryAllocation>,
    pub diagnostics: Diagnostics,
}

impl PosmReport {
    pub fn total_cost_raw(&self) -> f64 {
        self.posm_summary.iter().map(|r| r.cost_raw).sum()
    }

    pub fn total_cost_adjusted(&self) -> f64 {
        self.posm_summary.iter().map(|r| r.cost_adjusted).sum()
    }
}
