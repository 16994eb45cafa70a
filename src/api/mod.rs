// ==========================================
// POSM 成本计算 - API 层
// ==========================================
// 职责: 提供一次性批处理入口, 供命令行调用
// ==========================================

pub mod error;
pub mod report_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use report_api::{ReportApi, RunOutcome};
