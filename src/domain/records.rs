// ==========================================
// POSM 成本计算 - 输入记录
// ==========================================
// 用途: 导入层写入, 引擎层只读
// 生命周期: 单次计算内
// ==========================================

use crate::domain::types::PriceBand;
use serde::{Deserialize, Serialize};

// ==========================================
// DisplayRecord - 门店陈列事实
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub store: String,  // 门店（shop）
    pub model: String,  // 产品型号
    pub quantity: u64,  // 陈列数量
}

// ==========================================
// StoreInfo - 门店维度
// ==========================================
// 主键: store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub store: String,
    pub address: Option<String>,
    pub region: Option<String>, // 省份/区域
}

// ==========================================
// ModelInfo - 型号维度
// ==========================================
// 主键: model
// priority 保留原始值（空值为 None）, 由规则阶段校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub priority: Option<i64>,
    pub category: Option<String>, // subcategory, 如 "Care"
}

// ==========================================
// ModelPosmMap - 型号 → POSM 类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPosmMap {
    pub model: String,
    pub posm_type: String,
}

// ==========================================
// PriceEntry - 阶梯价格
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub posm_type: String,
    pub name: String,
    pub band: PriceBand,
    pub unit_price: f64,
}

// ==========================================
// InputTables - 一次计算的全部输入
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub displays: Vec<DisplayRecord>,
    pub stores: Vec<StoreInfo>,
    pub models: Vec<ModelInfo>,
    pub posm_map: Vec<ModelPosmMap>,
    pub prices: Vec<PriceEntry>,
}

// ==========================================
// JoinedRecord - 连接阶段产物（左连接, 未匹配字段为 None）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub store: String,
    pub model: String,
    pub quantity: u64,
    pub address: Option<String>,
    pub region: Option<String>,
    pub priority: Option<i64>,
    pub category: Option<String>,
    pub posm_type: Option<String>,
}
