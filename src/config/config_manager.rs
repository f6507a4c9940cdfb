// ==========================================
// 自营交易合规后台 - 配置管理器
// ==========================================
// 职责: 规则开关与阈值的加载、查询、写入
// 存储: config_kv 表 (scope_id + key-value)
// ==========================================

use crate::config::rule_config_trait::RuleConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::ViolationFlag;
use crate::engine::rules::{RuleSetting, DEFAULT_MIN_HOLD_SECONDS};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn upsert(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 删除 global scope 的配置值（不存在时无操作）
    pub fn remove(&self, key: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let removed = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        if removed > 0 {
            tracing::info!(config_key = key, "配置已删除");
        }
        Ok(())
    }

    /// 批量写入单条规则（开关 + 阈值；阈值为空时删除旧阈值）
    pub fn upsert_rule_setting(
        &self,
        flag: ViolationFlag,
        setting: RuleSetting,
    ) -> Result<(), Box<dyn Error>> {
        let keys = config_keys::for_flag(flag);
        self.upsert(keys.enabled, if setting.enabled { "true" } else { "false" })?;
        match setting.threshold {
            Some(threshold) => self.upsert(keys.threshold, &threshold.to_string())?,
            None => self.remove(keys.threshold)?,
        }
        Ok(())
    }

    fn read_enabled(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        let value = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %value,
                    "规则开关格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    fn read_threshold(&self, key: &str) -> Result<Option<f64>, Box<dyn Error>> {
        let value = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(None),
        };
        match value.trim().parse::<f64>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %value,
                    "规则阈值格式错误，视为未配置"
                );
                Ok(None)
            }
        }
    }
}

// ==========================================
// RuleConfigReader Trait 实现
// ==========================================
#[async_trait]
impl RuleConfigReader for ConfigManager {
    async fn get_rule_setting(&self, flag: ViolationFlag) -> Result<RuleSetting, Box<dyn Error>> {
        let keys = config_keys::for_flag(flag);
        let is_short_hold = flag == ViolationFlag::UnderThirtySeconds;

        let enabled = self.read_enabled(keys.enabled, is_short_hold)?;
        let mut threshold = self.read_threshold(keys.threshold)?;
        if is_short_hold && threshold.is_none() {
            threshold = Some(DEFAULT_MIN_HOLD_SECONDS);
        }

        Ok(RuleSetting { enabled, threshold })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::ViolationFlag;

    // 30 秒规则
    pub const UNDER_30_SECONDS_ENABLED: &str = "rule.under_30_seconds.enabled";
    pub const UNDER_30_SECONDS_THRESHOLD_SECS: &str = "rule.under_30_seconds.threshold_secs";

    // 80% 盈利目标
    pub const PROFIT_TARGET_ENABLED: &str = "rule.profit_target.enabled";
    pub const PROFIT_TARGET_THRESHOLD_PCT: &str = "rule.profit_target.threshold_pct";

    // 50% 保证金
    pub const MARGIN_USAGE_ENABLED: &str = "rule.margin_usage.enabled";
    pub const MARGIN_USAGE_THRESHOLD_PCT: &str = "rule.margin_usage.threshold_pct";

    // 新闻对冲
    pub const NEWS_HEDGE_ENABLED: &str = "rule.news_hedge.enabled";
    pub const NEWS_HEDGE_WINDOW_SECS: &str = "rule.news_hedge.window_secs";

    // 稳定性（判定函数由调用方注册）
    pub const STABILITY_ENABLED: &str = "rule.stability.enabled";
    pub const STABILITY_THRESHOLD: &str = "rule.stability.threshold";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RuleKeys {
        pub enabled: &'static str,
        pub threshold: &'static str,
    }

    pub fn for_flag(flag: ViolationFlag) -> RuleKeys {
        let (enabled, threshold) = match flag {
            ViolationFlag::UnderThirtySeconds => {
                (UNDER_30_SECONDS_ENABLED, UNDER_30_SECONDS_THRESHOLD_SECS)
            }
            ViolationFlag::EightyPercentProfitTarget => {
                (PROFIT_TARGET_ENABLED, PROFIT_TARGET_THRESHOLD_PCT)
            }
            ViolationFlag::FiftyPercentMargin => (MARGIN_USAGE_ENABLED, MARGIN_USAGE_THRESHOLD_PCT),
            ViolationFlag::HedgeTradeViolation => (NEWS_HEDGE_ENABLED, NEWS_HEDGE_WINDOW_SECS),
            ViolationFlag::StabilityRule => (STABILITY_ENABLED, STABILITY_THRESHOLD),
        };
        RuleKeys { enabled, threshold }
    }
}
