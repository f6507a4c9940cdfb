// ==========================================
// 自营交易合规后台 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 交割单违规判定 + 审核报告汇总
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 违规判定与报告汇总
pub mod engine;

// 导入层 - 交割单解析
pub mod importer;

// 配置层 - 规则配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AccountPhase, Decision, ViolationFlag};

// 领域实体
pub use domain::{NewReport, PayoutRecord, Report, TradeRecord};

// 引擎
pub use engine::{
    ReportAggregator, ReportCsvExporter, RuleConfig, ViolationClassifier, ViolationRule,
};

// 导入
pub use importer::{StatementLayout, StatementParser};

// API
pub use api::{ReportApi, StatementAnalysis, StatementApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "自营交易合规后台";
