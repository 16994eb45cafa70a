// ==========================================
// POSM 成本计算 - 领域模型层
// ==========================================
// 职责: 定义输入记录、派生表、结果与诊断类型
// 红线: 不含文件读取逻辑, 不含引擎逻辑
// ==========================================

pub mod records;
pub mod report;
pub mod types;

// 重导出核心类型
pub use records::{
    DisplayRecord, InputTables, JoinedRecord, ModelInfo, ModelPosmMap, PriceEntry, StoreInfo,
};
pub use report::{
    AddressSummaryRow, CategoryAllocation, Diagnostics, MissingPriceTier, PosmDemand, PosmReport,
    PosmTotal, PriorityDetailRow, RegionAllocationRow, RegionDemand, ResultRow,
};
pub use types::{PriceBand, Priority};
