// ==========================================
// 自营交易合规后台 - 命令行入口
// ==========================================
// 子命令: analyze / summary / export / reports / config
// 输出: stdout 为 JSON 或 CSV，日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use prop_compliance::app::{get_default_db_path, AppState};
use prop_compliance::engine::{ReportSort, ReportSortKey, SortDirection};
use std::path::PathBuf;

/// 交割单违规判定与审核报告汇总
#[derive(Parser, Debug)]
#[command(name = "prop-compliance")]
#[command(version, about = "Prop-trading compliance: statement analysis and report summaries")]
struct Cli {
    /// SQLite 数据库路径（默认取 PROP_COMPLIANCE_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// 日志输出为 JSON 行
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 分析交割单 HTML，输出成交记录与违规标记
    Analyze {
        /// 交割单文件 (.htm/.html)
        file: Option<PathBuf>,
    },

    /// 月度汇总（JSON）
    Summary {
        /// 月份，格式 YYYY-MM
        #[arg(short, long)]
        month: String,
    },

    /// 导出月度报告 CSV
    Export {
        /// 月份，格式 YYYY-MM
        #[arg(short, long)]
        month: String,

        /// 输出文件（缺省写 stdout）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 报告列表（JSON）
    Reports {
        /// 排序列（createdAt / login / agent / decision / phase / violations / balance）
        #[arg(short, long)]
        sort: Option<String>,

        /// 升序（默认降序）
        #[arg(long)]
        asc: bool,
    },

    /// 写入规则配置项，例如 rule.under_30_seconds.threshold_secs 45
    SetConfig { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    prop_compliance::logging::init(cli.json_logs);

    tracing::info!("{} v{}", prop_compliance::APP_NAME, prop_compliance::VERSION);

    let db_path = cli
        .db_path
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Analyze { file } => {
            let analysis = state.statement_api.analyze_file(file.as_deref()).await?;
            if let Some(diagnostic) = analysis.diagnostic {
                tracing::warn!("{}", diagnostic.message());
            }
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Summary { month } => {
            let (year, month) = parse_month(&month)?;
            let summary = state.report_api.monthly_summary(year, month)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Export { month, output } => {
            let (year, month) = parse_month(&month)?;
            let csv = state.report_api.export_month_csv(year, month)?;
            match output {
                Some(path) => std::fs::write(&path, csv)
                    .with_context(|| format!("写入 {} 失败", path.display()))?,
                None => print!("{}", csv),
            }
        }
        Commands::Reports { sort, asc } => {
            let sort = match sort {
                Some(column) => {
                    let key = ReportSortKey::from_column(&column)
                        .ok_or_else(|| anyhow!("未知排序列: {}", column))?;
                    let direction = if asc { SortDirection::Asc } else { SortDirection::Desc };
                    Some(ReportSort::new(key, direction))
                }
                None => None,
            };
            let reports = state.report_api.list_reports(sort)?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::SetConfig { key, value } => {
            if !key.starts_with("rule.") {
                bail!("仅支持 rule.* 配置项: {}", key);
            }
            state
                .config_manager
                .upsert(&key, &value)
                .map_err(|e| anyhow!("写入配置失败: {}", e))?;
        }
    }

    Ok(())
}

/// 解析 YYYY-MM
fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow!("月份格式应为 YYYY-MM: {}", raw))?;
    let year: i32 = year.parse().with_context(|| format!("年份无效: {}", raw))?;
    let month: u32 = month.parse().with_context(|| format!("月份无效: {}", raw))?;
    if !(1..=12).contains(&month) {
        bail!("月份超出范围: {}", raw);
    }
    Ok((year, month))
}
