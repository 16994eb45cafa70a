// ==========================================
// POSM 成本计算 - 核心库
// ==========================================
// 输入: 门店陈列事实 + 门店/型号/POSM/价格 维度表
// 输出: POSM 成本汇总 + 区域分配汇总 + 诊断
// 系统定位: 无状态单次批处理
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与结果表
pub mod domain;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 规则参数
pub mod config;

// 导出层 - 报表文件
pub mod exporter;

// 日志系统
pub mod logging;

// API 层 - 批处理入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{PriceBand, Priority};

// 领域实体
pub use domain::{
    DisplayRecord, InputTables, ModelInfo, ModelPosmMap, PosmReport, PriceEntry, RegionAllocationRow,
    ResultRow, StoreInfo,
};

// 引擎
pub use engine::{apply_quantity_rule, price_range, PosmCostCalculator};

// 配置
pub use config::CalcConfig;

// API
pub use api::{ApiError, ApiResult, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "POSM 成本计算";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
