// ==========================================
// POSM 成本计算 - 报表导出
// ==========================================
// 输出: <out_dir>/posm_cost_report_<YYYYmmdd_HHMMSS>_<table>.csv + _diagnostics.json
// 先在内存中渲染全部表, 全部成功后才落盘（致命错误不产生部分文件）
// 落盘中途失败: 删除本次已写出的文件
// 空表仍写出表头行
// ==========================================

use crate::domain::report::{
    AddressSummaryRow, PosmReport, PriorityDetailRow, RegionAllocationRow, ResultRow,
};
use crate::exporter::error::{ExportError, ExportResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const REPORT_PREFIX: &str = "posm_cost_report";

/// 已写出的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub posm_summary: PathBuf,
    pub priority_detail: PathBuf,
    pub region_summary: PathBuf,
    pub address_summary: PathBuf,
    pub category_allocations: Vec<PathBuf>,
    pub diagnostics: PathBuf,
}

impl ExportedFiles {
    pub fn all(&self) -> Vec<&Path> {
        let mut files = vec![
            self.posm_summary.as_path(),
            self.priority_detail.as_path(),
            self.region_summary.as_path(),
            self.address_summary.as_path(),
        ];
        files.extend(self.category_allocations.iter().map(PathBuf::as_path));
        files.push(self.diagnostics.as_path());
        files
    }
}

// ==========================================
// CsvTable - 输出表的列头
// ==========================================
// 与 serde 字段名（camelCase）及顺序一致; 仅用于空表
pub trait CsvTable {
    const HEADERS: &'static [&'static str];
}

impl CsvTable for ResultRow {
    const HEADERS: &'static [&'static str] = &[
        "posmType",
        "name",
        "rawQuantity",
        "adjustedQuantity",
        "sendQuantity",
        "backupQuantity",
        "unitPriceRaw",
        "unitPriceAdjusted",
        "costRaw",
        "costAdjusted",
    ];
}

impl CsvTable for PriorityDetailRow {
    const HEADERS: &'static [&'static str] = &[
        "posmType",
        "priority",
        "rawQuantity",
        "adjustedQuantity",
        "unitPriceRaw",
        "costRaw",
        "unitPriceAdjusted",
        "costAdjusted",
    ];
}

impl CsvTable for RegionAllocationRow {
    const HEADERS: &'static [&'static str] = &[
        "region",
        "posmType",
        "name",
        "neededQuantity",
        "percentOfTotal",
        "allocatedQuantity",
    ];
}

impl CsvTable for AddressSummaryRow {
    const HEADERS: &'static [&'static str] = &["address", "posmType", "totalQuantity"];
}

/// 渲染后的单个文件
struct RenderedFile {
    suffix: String,
    bytes: Vec<u8>,
}

/// 序列化为 CSV 字节（表头取 serde 字段名, 空表取 HEADERS）
fn render_csv<T: Serialize + CsvTable>(table: &str, rows: &[T]) -> ExportResult<Vec<u8>> {
    let csv_err = |message: String| ExportError::CsvWriteError {
        table: table.to_string(),
        message,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer
            .write_record(T::HEADERS)
            .map_err(|e| csv_err(e.to_string()))?;
    }
    for row in rows {
        writer.serialize(row).map_err(|e| csv_err(e.to_string()))?;
    }
    writer.into_inner().map_err(|e| csv_err(e.to_string()))
}

/// 品类标签 → 文件名片段
fn file_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportWriter;

impl ReportWriter {
    /// 文件名前缀: posm_cost_report_<YYYYmmdd_HHMMSS>
    pub fn file_stem(report: &PosmReport) -> String {
        format!(
            "{}_{}",
            REPORT_PREFIX,
            report.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    #[instrument(skip(self, report), fields(run_id = %report.run_id))]
    pub fn write(&self, report: &PosmReport, out_dir: &Path) -> ExportResult<ExportedFiles> {
        let rendered = self.render(report)?;

        let dir_existed = out_dir.exists();
        fs::create_dir_all(out_dir).map_err(|e| ExportError::OutputDirError {
            path: out_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let stem = Self::file_stem(report);
        let mut paths = Vec::with_capacity(rendered.len());
        for file in &rendered {
            let path = out_dir.join(format!("{}_{}", stem, file.suffix));
            if let Err(e) = fs::write(&path, &file.bytes) {
                Self::remove_partial(&paths, out_dir, dir_existed);
                return Err(ExportError::FileWriteError(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
            paths.push(path);
        }

        // 顺序与 render 一致: 4 张主表, 品类分配, 诊断
        let mut paths = paths.into_iter();
        let mut next = || paths.next().unwrap_or_default();
        let posm_summary = next();
        let priority_detail = next();
        let region_summary = next();
        let address_summary = next();
        let category_allocations = (0..report.category_allocations.len())
            .map(|_| next())
            .collect();
        let diagnostics = next();

        let exported = ExportedFiles {
            posm_summary,
            priority_detail,
            region_summary,
            address_summary,
            category_allocations,
            diagnostics,
        };

        info!(
            out_dir = %out_dir.display(),
            files = exported.all().len(),
            "报表导出完成"
        );
        Ok(exported)
    }

    // 回滚本次已写出的文件; 目录为本次新建时一并删除（仅当已空）
    fn remove_partial(written: &[PathBuf], out_dir: &Path, dir_existed: bool) {
        for path in written {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "清理部分输出失败");
            }
        }
        if !dir_existed {
            let _ = fs::remove_dir(out_dir);
        }
    }

    fn render(&self, report: &PosmReport) -> ExportResult<Vec<RenderedFile>> {
        let mut files = vec![
            RenderedFile {
                suffix: "posm_summary.csv".to_string(),
                bytes: render_csv("posm_summary", &report.posm_summary)?,
            },
            RenderedFile {
                suffix: "priority_detail.csv".to_string(),
                bytes: render_csv("priority_detail", &report.priority_detail)?,
            },
            RenderedFile {
                suffix: "region_summary.csv".to_string(),
                bytes: render_csv("region_summary", &report.region_summary)?,
            },
            RenderedFile {
                suffix: "address_summary.csv".to_string(),
                bytes: render_csv("address_summary", &report.address_summary)?,
            },
        ];

        for allocation in &report.category_allocations {
            let label = file_label(&allocation.label);
            let suffix = format!("region_{}.csv", label);
            if files.iter().any(|f| f.suffix == suffix) {
                return Err(ExportError::CsvWriteError {
                    table: format!("region_{}", label),
                    message: format!("品类标签 '{}' 与已有输出文件名冲突", allocation.label),
                });
            }
            files.push(RenderedFile {
                bytes: render_csv(&format!("region_{}", label), &allocation.rows)?,
                suffix,
            });
        }

        let diagnostics = serde_json::json!({
            "runId": report.run_id,
            "generatedAt": report.generated_at.to_rfc3339(),
            "totalCostRaw": report.total_cost_raw(),
            "totalCostAdjusted": report.total_cost_adjusted(),
            "diagnostics": report.diagnostics,
        });
        files.push(RenderedFile {
            suffix: "diagnostics.json".to_string(),
            bytes: serde_json::to_vec_pretty(&diagnostics)?,
        });

        Ok(files)
    }
}
