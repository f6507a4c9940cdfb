// ==========================================
// 自营交易合规后台 - 应用状态
// ==========================================
// 职责: 打开数据库、初始化 schema、装配仓储与 API
// 所有仓储共享同一个 SQLite 连接
// ==========================================

use crate::api::{ReportApi, StatementApi};
use crate::config::{ConfigManager, RuleConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{PayoutRepository, ReportRepository};
use std::sync::{Arc, Mutex};

// ==========================================
// AppState - 应用状态
// ==========================================
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 规则配置
    pub config_manager: Arc<ConfigManager>,

    /// 交割单分析 API
    pub statement_api: Arc<StatementApi>,

    /// 审核报告 API
    pub report_api: Arc<ReportApi>,
}

impl AppState {
    /// 创建新的 AppState
    ///
    /// # 返回
    /// - Ok(AppState): 初始化成功
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository 层
        // ==========================================
        let report_repo = Arc::new(ReportRepository::from_connection(conn.clone()));
        let payout_repo = Arc::new(PayoutRepository::from_connection(conn.clone()));

        // ==========================================
        // 配置层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn RuleConfigReader> = config_manager.clone();

        // ==========================================
        // API 层
        // ==========================================
        let statement_api = Arc::new(StatementApi::new(config_reader));
        let report_api = Arc::new(ReportApi::new(report_repo, payout_repo));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            config_manager,
            statement_api,
            report_api,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径
// ==========================================

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 PROP_COMPLIANCE_DB_PATH
/// 2. 用户数据目录/prop-compliance/prop_compliance.db
/// 3. ./prop_compliance.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PROP_COMPLIANCE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./prop_compliance.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("prop-compliance");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("prop_compliance.db");
        }
    }

    path.to_string_lossy().to_string()
}
