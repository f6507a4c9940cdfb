// ==========================================
// 自营交易合规后台 - 导入层
// ==========================================
// 职责: 券商交割单 -> 成交记录
// 支持: MetaTrader HTML 交割单
// ==========================================

pub mod error;
pub mod field_parser;
pub mod statement_layout;
pub mod statement_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use statement_layout::{ColumnRole, StatementLayout};
pub use statement_parser::{Extraction, ParsedStatement, SkipReason, SkippedRow, StatementParser};
