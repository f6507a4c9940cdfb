// ==========================================
// 自营交易合规后台 - 交割单解析器
// ==========================================
// 输入: 券商导出的 HTML 交割单
// 输出: 按行序排列的 TradeRecord 序列
// 容错: 单行解析失败只跳过该行，不中断整次解析
// ==========================================

use crate::domain::trade::TradeRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_parser::{normalize_cell_text, parse_amount, parse_broker_time};
use crate::importer::statement_layout::{ColumnRole, StatementLayout};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

// ==========================================
// 跳过原因 (Skip Reason)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    TooFewColumns { found: usize, required: usize },
    InvalidAmount { raw: String },
    NonPositiveAmount { amount: Decimal },
    InvalidOpenTime { raw: String },
    InvalidCloseTime { raw: String },
    NegativeDuration,
}

/// 被跳过的行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: SkipReason,
}

/// 一次完整抽取的结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedRow>,
}

// ==========================================
// StatementParser - 交割单解析器
// ==========================================
pub struct StatementParser {
    layout: StatementLayout,
}

impl StatementParser {
    pub fn new(layout: StatementLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StatementLayout {
        &self.layout
    }

    /// 解析 HTML 文本，切分出所有表格行
    pub fn parse(&self, html: &str) -> ImportResult<ParsedStatement> {
        let row_selector =
            Selector::parse("tr").map_err(|e| ImportError::SelectorError(e.to_string()))?;

        let document = Html::parse_document(html);
        let rows: Vec<Vec<String>> = document
            .select(&row_selector)
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| cell.value().name() == "td")
                    .map(|cell| normalize_cell_text(cell.text()))
                    .collect()
            })
            .collect();

        debug!(layout = %self.layout, rows = rows.len(), "交割单表格行切分完成");

        Ok(ParsedStatement {
            layout: self.layout.clone(),
            rows,
        })
    }

    /// 读取文件并解析
    pub fn parse_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedStatement> {
        let path = file_path.as_ref();

        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "htm" && ext != "html" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let bytes = fs::read(path)?;
        let html = String::from_utf8_lossy(&bytes);
        info!(file_path = %path.display(), bytes = bytes.len(), "读取交割单文件");
        self.parse(&html)
    }
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new(StatementLayout::default())
    }
}

// ==========================================
// ParsedStatement - 已切分的交割单
// ==========================================
// trades() 每次调用都从第一行重新开始，惰性逐行转换
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    layout: StatementLayout,
    rows: Vec<Vec<String>>,
}

impl ParsedStatement {
    /// 表格行总数（含表头/汇总行）
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn layout(&self) -> &StatementLayout {
        &self.layout
    }

    /// 有效成交记录（惰性、可重启）
    pub fn trades(&self) -> impl Iterator<Item = TradeRecord> + '_ {
        self.rows
            .iter()
            .filter_map(move |cells| extract_row(&self.layout, cells).ok())
    }

    /// 完整抽取（含跳过明细）
    pub fn extract(&self) -> Extraction {
        let mut extraction = Extraction::default();

        for (row_index, cells) in self.rows.iter().enumerate() {
            match extract_row(&self.layout, cells) {
                Ok(trade) => extraction.trades.push(trade),
                Err(reason) => {
                    debug!(row_index, reason = ?reason, "跳过交割单行");
                    extraction.skipped.push(SkippedRow { row_index, reason });
                }
            }
        }

        debug!(
            trades = extraction.trades.len(),
            skipped = extraction.skipped.len(),
            "交割单抽取完成"
        );
        extraction
    }
}

/// 单行转换
///
/// # 跳过规则
/// - 单元格数不足
/// - 金额无法解析或 <= 0
/// - 开仓/平仓时间无法解析
/// - 平仓早于开仓
fn extract_row(layout: &StatementLayout, cells: &[String]) -> Result<TradeRecord, SkipReason> {
    if cells.len() < layout.min_columns() {
        return Err(SkipReason::TooFewColumns {
            found: cells.len(),
            required: layout.min_columns(),
        });
    }

    let raw_amount = layout.cell(cells, ColumnRole::Amount).unwrap_or("");
    let amount = parse_amount(raw_amount).ok_or_else(|| SkipReason::InvalidAmount {
        raw: raw_amount.to_string(),
    })?;
    if amount <= Decimal::ZERO {
        return Err(SkipReason::NonPositiveAmount { amount });
    }

    let raw_open = layout.cell(cells, ColumnRole::OpenTime).unwrap_or("");
    let open_time = parse_broker_time(raw_open).ok_or_else(|| SkipReason::InvalidOpenTime {
        raw: raw_open.to_string(),
    })?;

    let raw_close = layout.cell(cells, ColumnRole::CloseTime).unwrap_or("");
    let close_time = parse_broker_time(raw_close).ok_or_else(|| SkipReason::InvalidCloseTime {
        raw: raw_close.to_string(),
    })?;

    let ticket = layout.cell(cells, ColumnRole::Ticket).unwrap_or("");
    TradeRecord::new(ticket, open_time, close_time, amount)
        .ok_or(SkipReason::NegativeDuration)
}
