// ==========================================
// POSM 成本计算 - 报表 API
// ==========================================
// 职责: 加载输入 → 计算 → 导出
// 红线: 任一阶段失败即返回错误, 不写出任何文件
// ==========================================

use std::path::Path;
use tracing::{error, info, instrument};

use crate::api::error::ApiResult;
use crate::config::CalcConfig;
use crate::domain::records::InputTables;
use crate::domain::report::PosmReport;
use crate::engine::PosmCostCalculator;
use crate::exporter::{ExportedFiles, ReportWriter};
use crate::importer::{InputLoader, InputSources};

/// 一次完整运行的结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: PosmReport,
    pub files: ExportedFiles,
}

// ==========================================
// ReportApi
// ==========================================
pub struct ReportApi {
    loader: InputLoader,
    calculator: PosmCostCalculator,
    writer: ReportWriter,
}

impl ReportApi {
    /// 使用默认导入器创建
    pub fn new(config: CalcConfig) -> ApiResult<Self> {
        Self::with_loader(config, InputLoader::new())
    }

    pub fn with_loader(config: CalcConfig, loader: InputLoader) -> ApiResult<Self> {
        Ok(Self {
            loader,
            calculator: PosmCostCalculator::new(config)?,
            writer: ReportWriter,
        })
    }

    pub fn config(&self) -> &CalcConfig {
        self.calculator.config()
    }

    /// 从文件加载并计算（不导出）
    pub fn calculate(&self, sources: &InputSources) -> ApiResult<PosmReport> {
        let tables = self.loader.load(sources)?;
        self.calculate_tables(&tables)
    }

    /// 对已加载的输入表计算
    pub fn calculate_tables(&self, tables: &InputTables) -> ApiResult<PosmReport> {
        Ok(self.calculator.calculate(tables)?)
    }

    /// 完整运行: 加载 → 计算 → 导出
    #[instrument(skip(self, sources), fields(out_dir = %out_dir.display()))]
    pub fn run_and_export(&self, sources: &InputSources, out_dir: &Path) -> ApiResult<RunOutcome> {
        let result = self
            .calculate(sources)
            .and_then(|report| {
                let files = self.writer.write(&report, out_dir)?;
                Ok(RunOutcome { report, files })
            });

        match &result {
            Ok(outcome) => info!(
                run_id = %outcome.report.run_id,
                posm_types = outcome.report.posm_summary.len(),
                "运行完成"
            ),
            Err(e) => error!(stage = e.stage(), error = %e, "运行失败, 未生成结果"),
        }
        result
    }
}
