// ==========================================
// POSM 成本计算 - 数量规则引擎
// ==========================================
// 优先级 1: max(ceil(q × 1.3 / 10) × 10, 210)  缓冲 + 包装取整 + 最小起订量
// 优先级 2: ceil(q / 5) × 5                    仅取整
// 红线: 必须按 (POSM, 优先级) 分组后逐组应用, 再跨优先级求和
// ==========================================

use crate::config::CalcConfig;
use crate::domain::types::Priority;
use crate::engine::error::{EngineError, EngineResult};

/// 向上取整到 step 的倍数; 结果超出 u64 时为 None
pub fn ceil_to_multiple(value: u64, step: u64) -> Option<u64> {
    value.div_ceil(step).checked_mul(step)
}

/// 按默认参数应用数量规则（priority 为原始代码）
pub fn apply_quantity_rule(quantity: u64, priority: i64) -> EngineResult<u64> {
    QuantityRule::new(&CalcConfig::default()).apply_code(quantity, priority)
}

// ==========================================
// QuantityRule
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityRule {
    buffer_percent: u64,
    buffered_step: u64,
    minimum_order_quantity: u64,
    plain_step: u64,
}

impl QuantityRule {
    pub fn new(config: &CalcConfig) -> Self {
        Self {
            buffer_percent: config.buffer_percent,
            buffered_step: config.buffered_step,
            minimum_order_quantity: config.minimum_order_quantity,
            plain_step: config.plain_step,
        }
    }

    /// 调整后数量; 结果超出 u64 时为 None
    pub fn apply(&self, quantity: u64, priority: Priority) -> Option<u64> {
        match priority {
            Priority::Buffered => self
                .buffered_quantity(quantity)
                .map(|q| q.max(self.minimum_order_quantity)),
            Priority::Plain => ceil_to_multiple(quantity, self.plain_step),
        }
    }

    /// 原始优先级代码版本; 代码不在 {1, 2} 内返回 InvalidPriority
    pub fn apply_code(&self, quantity: u64, priority: i64) -> EngineResult<u64> {
        let priority =
            Priority::from_code(priority).ok_or_else(|| EngineError::InvalidPriority {
                value: priority,
                context: format!("quantity={}", quantity),
            })?;
        self.apply(quantity, priority).ok_or_else(|| {
            EngineError::overflow("", format!("quantity={}, priority={}", quantity, priority))
        })
    }

    // ceil(q × (100 + b) / (100 × step)) × step, 整数运算
    fn buffered_quantity(&self, quantity: u64) -> Option<u64> {
        let numerator = u128::from(quantity) * (100 + u128::from(self.buffer_percent));
        let denominator = 100 * u128::from(self.buffered_step);
        let units = numerator.div_ceil(denominator);
        u64::try_from(units * u128::from(self.buffered_step)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> QuantityRule {
        QuantityRule::new(&CalcConfig::default())
    }

    #[test]
    fn test_buffered_minimum_applies() {
        // 150 × 1.3 = 195 → 200 < 210
        assert_eq!(rule().apply(150, Priority::Buffered), Some(210));
        assert_eq!(rule().apply(0, Priority::Buffered), Some(210));
    }

    #[test]
    fn test_buffered_rounds_up_to_ten() {
        // 200 × 1.3 = 260
        assert_eq!(rule().apply(200, Priority::Buffered), Some(260));
        // 201 × 1.3 = 261.3 → 270
        assert_eq!(rule().apply(201, Priority::Buffered), Some(270));
        // 1000 × 1.3 = 1300 (整数运算无浮点抖动)
        assert_eq!(rule().apply(1000, Priority::Buffered), Some(1300));
    }

    #[test]
    fn test_plain_rounds_up_to_five() {
        assert_eq!(rule().apply(0, Priority::Plain), Some(0));
        assert_eq!(rule().apply(1, Priority::Plain), Some(5));
        assert_eq!(rule().apply(10, Priority::Plain), Some(10));
        assert_eq!(rule().apply(11, Priority::Plain), Some(15));
    }

    #[test]
    fn test_invalid_priority_code() {
        let result = apply_quantity_rule(10, 3);
        assert!(matches!(result, Err(EngineError::InvalidPriority { value: 3, .. })));
        assert_eq!(apply_quantity_rule(10, 2), Ok(10));
    }

    #[test]
    fn test_overflow_is_reported_not_saturated() {
        assert_eq!(rule().apply(u64::MAX, Priority::Buffered), None);
        assert_eq!(rule().apply(u64::MAX, Priority::Plain), None);
        // 最大的 5 的倍数仍可表示
        let largest = u64::MAX - u64::MAX % 5;
        assert_eq!(rule().apply(largest, Priority::Plain), Some(largest));

        let result = apply_quantity_rule(u64::MAX, 1);
        assert!(matches!(result, Err(EngineError::QuantityOverflow { .. })));
    }

    #[test]
    fn test_custom_minimum() {
        let config = CalcConfig {
            minimum_order_quantity: 500,
            ..CalcConfig::default()
        };
        assert_eq!(QuantityRule::new(&config).apply(100, Priority::Buffered), Some(500));
    }
}
