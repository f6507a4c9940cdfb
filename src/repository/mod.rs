// ==========================================
// 自营交易合规后台 - 仓储层
// ==========================================
// 红线: Repository 不含业务逻辑, 全部使用参数化查询
// ==========================================

pub mod error;
pub mod payout_repo;
pub mod report_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use payout_repo::PayoutRepository;
pub use report_repo::ReportRepository;
