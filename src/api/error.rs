// ==========================================
// POSM 成本计算 - API层错误类型
// ==========================================
// 职责: 汇总导入 / 配置 / 引擎 / 导出 各层错误
// 任一错误均为致命: 本次运行不产生任何结果表
// ==========================================

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::exporter::ExportError;
use crate::importer::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("输入导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("配置无效: {0}")]
    Config(#[from] ConfigError),

    #[error("计算失败: {0}")]
    Engine(#[from] EngineError),

    #[error("报表导出失败: {0}")]
    Export(#[from] ExportError),
}

impl ApiError {
    /// 错误所属阶段（用于日志字段）
    pub fn stage(&self) -> &'static str {
        match self {
            ApiError::Import(_) => "import",
            ApiError::Config(_) => "config",
            ApiError::Engine(_) => "engine",
            ApiError::Export(_) => "export",
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_conversion() {
        let err: ApiError = ImportError::MissingRequiredColumn {
            table: "dim_model".to_string(),
            column: "priority".to_string(),
        }
        .into();

        assert_eq!(err.stage(), "import");
        let message = err.to_string();
        assert!(message.contains("dim_model"));
        assert!(message.contains("priority"));
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: ApiError = EngineError::InvalidPriority {
            value: 3,
            context: "model=M1".to_string(),
        }
        .into();

        assert_eq!(err.stage(), "engine");
        assert!(matches!(
            err,
            ApiError::Engine(EngineError::InvalidPriority { value: 3, .. })
        ));
    }
}
