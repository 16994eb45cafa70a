// ==========================================
// POSM 成本计算 - 引擎层
// ==========================================
// 职责: 连接 → 规则 → 定价 → 分配
// 红线: 引擎不做 I/O, 所有结果由输入表唯一确定（run_id / 时间戳除外）
// ==========================================

pub mod aggregation;
pub mod allocation;
pub mod assembler;
pub mod calculator;
pub mod error;
pub mod joiner;
pub mod pricing;
pub mod quantity_rule;

// 重导出核心引擎
pub use aggregation::{address_summary, posm_totals, DemandAggregator, ExclusionCounts};
pub use allocation::{RegionAllocator, SendSplit};
pub use assembler::ResultAssembler;
pub use calculator::{CategoryScope, PosmCostCalculator};
pub use error::{EngineError, EngineResult};
pub use joiner::{JoinOutput, JoinStats, Joiner};
pub use pricing::{price_range, price_totals, PriceBook, PriceQuote, PricedPosm};
pub use quantity_rule::{apply_quantity_rule, ceil_to_multiple, QuantityRule};
