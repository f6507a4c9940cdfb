// ==========================================
// 自营交易合规后台 - 引擎层
// ==========================================
// 职责: 违规判定、报告汇总、排序与导出
// 红线: Engine 不拼 SQL, 不持有跨调用的可变状态
// ==========================================

pub mod aggregator;
pub mod classifier;
pub mod report_export;
pub mod report_sort;
pub mod rules;

// 重导出核心引擎
pub use aggregator::{
    percent, restrict_to_month, AccountBucket, AccountBucketKey, AgentBreakdown, DailyCount,
    FunnelCounts, MonthlySummary, RatioCount, ReportAggregator,
};
pub use classifier::{StatementClassification, ViolationClassifier};
pub use report_export::ReportCsvExporter;
pub use report_sort::{sort_reports, ReportSort, ReportSortKey, SortDirection};
pub use rules::{
    AccountMetrics, ClassificationContext, NewsEvent, PositionSide, RuleConfig, RuleConfigError,
    RuleSetting, TradeDirection, ViolationRule,
};
