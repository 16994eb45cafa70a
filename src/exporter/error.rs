// ==========================================
// POSM 成本计算 - 导出模块错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("输出目录不可用: {path}: {message}")]
    OutputDirError { path: String, message: String },

    #[error("CSV 写入失败 ({table}): {message}")]
    CsvWriteError { table: String, message: String },

    #[error("JSON 序列化失败: {0}")]
    JsonError(String),

    #[error("文件写入失败: {0}")]
    FileWriteError(String),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::FileWriteError(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::JsonError(err.to_string())
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
