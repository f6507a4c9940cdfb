// ==========================================
// 自营交易合规后台 - 报告 CSV 导出
// ==========================================
// 列顺序: login, agent, decision, phase, violations, version, date, note
// 违规标记以 " | " 拼接
// ==========================================

use crate::domain::report::Report;
use anyhow::Context;
use std::io::Write;

pub const CSV_HEADER: [&str; 8] = [
    "login",
    "agent",
    "decision",
    "phase",
    "violations",
    "version",
    "date",
    "note",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ReportCsvExporter;

impl ReportCsvExporter {
    /// 单条报告的扁平行
    pub fn row(report: &Report) -> [String; 8] {
        [
            report.login.clone(),
            report.agent.clone(),
            report.decision.label().to_string(),
            report.phase.to_db_str().to_string(),
            report.violations_label(),
            report.version.clone().unwrap_or_default(),
            report.created_at.format(DATE_FORMAT).to_string(),
            report.note.clone().unwrap_or_default(),
        ]
    }

    /// 写出到任意 Writer
    pub fn write<W: Write>(reports: &[Report], writer: W) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER).context("写入 CSV 表头失败")?;

        for report in reports {
            csv_writer
                .write_record(Self::row(report))
                .with_context(|| format!("写入报告 {} 失败", report.id))?;
        }

        csv_writer.flush().context("刷新 CSV 输出失败")?;
        Ok(())
    }

    /// 导出为字符串
    pub fn to_csv_string(reports: &[Report]) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        Self::write(reports, &mut buffer)?;
        String::from_utf8(buffer).context("CSV 输出不是合法 UTF-8")
    }
}
