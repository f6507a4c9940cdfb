// ==========================================
// 自营交易合规后台 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod payout;
pub mod report;
pub mod trade;
pub mod types;

// 重导出核心类型
pub use payout::PayoutRecord;
pub use report::{NewReport, Report};
pub use trade::{total_amount, TradeRecord};
pub use types::{AccountPhase, Decision, ViolationFlag};
