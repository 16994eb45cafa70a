// ==========================================
// POSM 成本计算 - 计算参数
// ==========================================
// 职责: 数量规则 / 发货拆分 / 品类拆分 参数
// 默认值即业务常量, 可由 JSON 文件覆写
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误 ({path}): {message}")]
    ParseError { path: String, message: String },

    #[error("配置值无效 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// CalcConfig - 计算参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcConfig {
    /// 优先级 1 的安全缓冲（百分比, 整数运算避免浮点误差）
    #[serde(default = "default_buffer_percent")]
    pub buffer_percent: u64,

    /// 优先级 1 取整倍数（包装规格）
    #[serde(default = "default_buffered_step")]
    pub buffered_step: u64,

    /// 优先级 1 最小起订量
    #[serde(default = "default_minimum_order_quantity")]
    pub minimum_order_quantity: u64,

    /// 优先级 2 取整倍数
    #[serde(default = "default_plain_step")]
    pub plain_step: u64,

    /// 无区域数据时的发货比例（百分比）
    #[serde(default = "default_fallback_send_percent")]
    pub fallback_send_percent: u64,

    /// 无区域数据时发货数量的取整倍数
    #[serde(default = "default_fallback_send_step")]
    pub fallback_send_step: u64,

    /// 需要单独输出区域分配的品类（如 "Care"）
    #[serde(default = "default_category_splits")]
    pub category_splits: Vec<String>,
}

fn default_buffer_percent() -> u64 {
    30
}

fn default_buffered_step() -> u64 {
    10
}

fn default_minimum_order_quantity() -> u64 {
    210
}

fn default_plain_step() -> u64 {
    5
}

fn default_fallback_send_percent() -> u64 {
    70
}

fn default_fallback_send_step() -> u64 {
    10
}

fn default_category_splits() -> Vec<String> {
    vec!["Care".to_string()]
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            buffer_percent: default_buffer_percent(),
            buffered_step: default_buffered_step(),
            minimum_order_quantity: default_minimum_order_quantity(),
            plain_step: default_plain_step(),
            fallback_send_percent: default_fallback_send_percent(),
            fallback_send_step: default_fallback_send_step(),
            category_splits: default_category_splits(),
        }
    }
}

impl CalcConfig {
    /// 从 JSON 文件加载（缺省字段取默认值）并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: CalcConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "计算参数已加载");
        Ok(config)
    }

    /// 校验参数取值
    pub fn validate(&self) -> ConfigResult<()> {
        let steps = [
            ("buffered_step", self.buffered_step),
            ("plain_step", self.plain_step),
            ("fallback_send_step", self.fallback_send_step),
        ];
        for (key, value) in steps {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "取整倍数必须大于 0".to_string(),
                });
            }
        }

        if self.fallback_send_percent > 100 {
            return Err(ConfigError::InvalidValue {
                key: "fallback_send_percent".to_string(),
                message: format!("发货比例超出范围: {}", self.fallback_send_percent),
            });
        }

        if self.category_splits.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "category_splits".to_string(),
                message: "品类名称不能为空".to_string(),
            });
        }

        // 品类匹配忽略大小写与首尾空白; 每个品类还产生一个 Non-<品类> 输出
        let mut labels = BTreeSet::new();
        for category in &self.category_splits {
            let key = category.trim().to_lowercase();
            for label in [key.clone(), format!("non-{}", key)] {
                if !labels.insert(label) {
                    return Err(ConfigError::InvalidValue {
                        key: "category_splits".to_string(),
                        message: format!("品类名称重复: {}", category.trim()),
                    });
                }
            }
        }

        Ok(())
    }
}
