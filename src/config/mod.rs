// ==========================================
// POSM 成本计算 - 配置层
// ==========================================
// 职责: 计算参数加载与校验
// 存储: 无持久化, 默认值 + 可选 JSON 文件
// ==========================================

pub mod calc_config;

pub use calc_config::{CalcConfig, ConfigError, ConfigResult};
