// ==========================================
// 自营交易合规后台 - 应用层
// ==========================================
// 职责: 装配数据库、配置、API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
