// ==========================================
// 自营交易合规后台 - 交割单分析 API
// ==========================================
// 流程: 读取 HTML -> 抽取成交记录 -> 读取规则配置 -> 违规判定
// 无输入（未提供文件 / 无有效行）返回空结果 + 诊断信息，不报错
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::rule_config_trait::RuleConfigReader;
use crate::domain::trade::TradeRecord;
use crate::domain::types::ViolationFlag;
use crate::engine::classifier::ViolationClassifier;
use crate::engine::rules::{ClassificationContext, ViolationRule};
use crate::importer::statement_parser::{ParsedStatement, SkippedRow, StatementParser};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// StatementDiagnostic - 无输入诊断
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementDiagnostic {
    NoFileProvided, // 未提供文件
    NoRowsFound,    // 没有可识别的成交行
}

impl StatementDiagnostic {
    pub fn message(&self) -> &'static str {
        match self {
            StatementDiagnostic::NoFileProvided => "未提供交割单文件",
            StatementDiagnostic::NoRowsFound => "交割单中没有可识别的成交记录",
        }
    }
}

// ==========================================
// StatementAnalysis - 分析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementAnalysis {
    pub trades: Vec<TradeRecord>,
    pub flagged_trades: Vec<TradeRecord>,
    pub flags: BTreeSet<ViolationFlag>,
    pub total_amount: Decimal,
    pub flagged_amount: Decimal,
    pub skipped_rows: Vec<SkippedRow>,
    pub diagnostic: Option<StatementDiagnostic>,
}

impl StatementAnalysis {
    /// 空结果（序列为空，合计为 0）
    pub fn empty(diagnostic: StatementDiagnostic) -> Self {
        Self {
            trades: Vec::new(),
            flagged_trades: Vec::new(),
            flags: BTreeSet::new(),
            total_amount: Decimal::ZERO,
            flagged_amount: Decimal::ZERO,
            skipped_rows: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }
}

// ==========================================
// StatementApi - 交割单分析 API
// ==========================================
pub struct StatementApi {
    parser: StatementParser,
    config_reader: Arc<dyn RuleConfigReader>,
    custom_rules: Vec<Arc<dyn ViolationRule>>,
}

impl StatementApi {
    pub fn new(config_reader: Arc<dyn RuleConfigReader>) -> Self {
        Self {
            parser: StatementParser::default(),
            config_reader,
            custom_rules: Vec::new(),
        }
    }

    /// 指定交割单解析器（版式）
    pub fn with_parser(mut self, parser: StatementParser) -> Self {
        self.parser = parser;
        self
    }

    /// 注册外部判定函数（覆盖同标记的内置谓词）
    pub fn register_rule(&mut self, rule: Arc<dyn ViolationRule>) {
        self.custom_rules.push(rule);
    }

    /// 分析交割单文件
    ///
    /// # 返回
    /// - `None` 路径: 空结果 + NoFileProvided
    /// - 文件不存在/格式不支持/读取失败: ApiError::ImportError
    #[instrument(skip(self, file_path), fields(path = ?file_path))]
    pub async fn analyze_file(&self, file_path: Option<&Path>) -> ApiResult<StatementAnalysis> {
        let Some(path) = file_path else {
            warn!("未提供交割单文件");
            return Ok(StatementAnalysis::empty(StatementDiagnostic::NoFileProvided));
        };

        let parsed = self.parser.parse_file(path)?;
        self.analyze_parsed(&parsed, &ClassificationContext::default())
            .await
    }

    /// 分析 HTML 文本
    pub async fn analyze_html(&self, html: &str) -> ApiResult<StatementAnalysis> {
        self.analyze_html_with_context(html, &ClassificationContext::default())
            .await
    }

    /// 分析 HTML 文本（附带账户/持仓/新闻上下文）
    pub async fn analyze_html_with_context(
        &self,
        html: &str,
        context: &ClassificationContext,
    ) -> ApiResult<StatementAnalysis> {
        let parsed = self.parser.parse(html)?;
        self.analyze_parsed(&parsed, context).await
    }

    /// 按当前配置构建判定引擎
    pub async fn build_classifier(&self) -> ApiResult<ViolationClassifier> {
        let config = self
            .config_reader
            .load_rule_config()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let rules: Vec<Box<dyn ViolationRule>> = self
            .custom_rules
            .iter()
            .map(|rule| Box::new(Arc::clone(rule)) as Box<dyn ViolationRule>)
            .collect();

        Ok(ViolationClassifier::with_rules(config, rules)?)
    }

    async fn analyze_parsed(
        &self,
        parsed: &ParsedStatement,
        context: &ClassificationContext,
    ) -> ApiResult<StatementAnalysis> {
        let extraction = parsed.extract();
        if extraction.trades.is_empty() {
            warn!(
                rows = parsed.row_count(),
                skipped = extraction.skipped.len(),
                "交割单中没有可识别的成交记录"
            );
            let mut analysis = StatementAnalysis::empty(StatementDiagnostic::NoRowsFound);
            analysis.skipped_rows = extraction.skipped;
            return Ok(analysis);
        }

        let classifier = self.build_classifier().await?;
        let classification = classifier.classify_statement(&extraction.trades, context);

        info!(
            trades = extraction.trades.len(),
            skipped = extraction.skipped.len(),
            flagged = classification.flagged_trades.len(),
            total_amount = %classification.total_amount,
            "交割单分析完成"
        );

        Ok(StatementAnalysis {
            trades: extraction.trades,
            flagged_trades: classification.flagged_trades,
            flags: classification.flags,
            total_amount: classification.total_amount,
            flagged_amount: classification.flagged_amount,
            skipped_rows: extraction.skipped,
            diagnostic: None,
        })
    }
}
