// ==========================================
// POSM 成本计算 - 引擎错误类型
// ==========================================
// 引擎错误均为致命错误: 两张结果表都不产生
// 非致命问题（缺价格档/未匹配键）进入 Diagnostics, 不在此处
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 优先级不在 {1, 2} 内, 默认处理会污染成本合计
    #[error("无效优先级: {value} ({context})")]
    InvalidPriority { value: i64, context: String },

    /// 数量合计或规则结果超出 u64 范围
    #[error("数量溢出: posm={posm_type} ({context})")]
    QuantityOverflow { posm_type: String, context: String },
}

impl EngineError {
    pub(crate) fn overflow(posm_type: &str, context: impl Into<String>) -> Self {
        EngineError::QuantityOverflow {
            posm_type: posm_type.to_string(),
            context: context.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// 累加数量, 溢出时返回 QuantityOverflow
pub(crate) fn add_quantity(
    total: &mut u64,
    quantity: u64,
    posm_type: &str,
    context: &str,
) -> EngineResult<()> {
    *total = total
        .checked_add(quantity)
        .ok_or_else(|| EngineError::overflow(posm_type, context))?;
    Ok(())
}
