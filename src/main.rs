// ==========================================
// POSM 成本计算 - 命令行入口
// ==========================================
// 用法:
//   posm-cost-calc <fact_display> <dim_storelist> <dim_model> <dim_posm> [price]
//                  [--out DIR] [--config FILE] [--json-log]
// dim_posm 为工作簿时读取其 posm / price 两个工作表;
// 给出 price 时 dim_posm 与 price 各自按单表读取
// ==========================================

use anyhow::{bail, Context};
use posm_cost_calc::importer::{InputSources, TableSource};
use posm_cost_calc::{logging, CalcConfig, ReportApi};
use std::path::PathBuf;

const USAGE: &str = "用法: posm-cost-calc <fact_display> <dim_storelist> <dim_model> <dim_posm> [price] [--out DIR] [--config FILE] [--json-log]";

#[derive(Debug)]
struct CliArgs {
    inputs: Vec<PathBuf>,
    out_dir: PathBuf,
    config: Option<PathBuf>,
    json_log: bool,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        inputs: Vec::new(),
        out_dir: PathBuf::from("output"),
        config: None,
        json_log: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                parsed.out_dir = args.next().map(PathBuf::from).context("--out 缺少目录参数")?;
            }
            "--config" => {
                parsed.config = Some(args.next().map(PathBuf::from).context("--config 缺少文件参数")?);
            }
            "--json-log" => parsed.json_log = true,
            "-h" | "--help" => bail!("{}", USAGE),
            flag if flag.starts_with("--") => bail!("未知参数: {}\n{}", flag, USAGE),
            _ => parsed.inputs.push(PathBuf::from(arg)),
        }
    }

    if !(4..=5).contains(&parsed.inputs.len()) {
        bail!("需要 4 或 5 个输入文件, 实际 {}\n{}", parsed.inputs.len(), USAGE);
    }
    Ok(parsed)
}

fn sources(inputs: &[PathBuf]) -> InputSources {
    match inputs {
        [fact, store, model, posm, price] => InputSources {
            fact_display: TableSource::file(fact),
            store_list: TableSource::file(store),
            model: TableSource::file(model),
            posm_map: TableSource::file(posm),
            price: TableSource::file(price),
        },
        _ => InputSources::from_workbooks(&inputs[0], &inputs[1], &inputs[2], &inputs[3]),
    }
}

fn run(args: &CliArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => CalcConfig::from_json_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => CalcConfig::default(),
    };

    let api = ReportApi::new(config).context("初始化计算器失败")?;
    let outcome = api
        .run_and_export(&sources(&args.inputs), &args.out_dir)
        .context("POSM 计算未完成, 未生成任何结果")?;

    let report = &outcome.report;
    println!("run_id: {}", report.run_id);
    println!("POSM 类型数: {}", report.posm_summary.len());
    println!("区域分配行数: {}", report.region_summary.len());
    println!("原始成本合计: {:.2}", report.total_cost_raw());
    println!("调整后成本合计: {:.2}", report.total_cost_adjusted());
    if report.diagnostics.has_warnings() {
        println!(
            "警告: {} 行未进入 POSM 汇总, {} 个价格档缺失 (详见诊断文件)",
            report.diagnostics.excluded_from_posm(),
            report.diagnostics.missing_price_tiers.len()
        );
    }
    for path in outcome.files.all() {
        println!("已写出: {}", path.display());
    }
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if args.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", posm_cost_calc::APP_NAME, posm_cost_calc::VERSION);

    if let Err(e) = run(&args) {
        tracing::error!(error = %format!("{:#}", e), "运行失败");
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}
