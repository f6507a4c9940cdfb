// ==========================================
// 自营交易合规后台 - 配置层
// ==========================================
// 职责: 违规规则开关与阈值
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod rule_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use rule_config_trait::RuleConfigReader;
