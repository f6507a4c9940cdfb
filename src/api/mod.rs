// ==========================================
// 自营交易合规后台 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行入口调用
// ==========================================

pub mod error;
pub mod report_api;
pub mod statement_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use report_api::ReportApi;
pub use statement_api::{StatementAnalysis, StatementApi, StatementDiagnostic};
