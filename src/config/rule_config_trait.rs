// ==========================================
// 自营交易合规后台 - 规则配置读取 Trait
// ==========================================
// 职责: 定义违规判定所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::ViolationFlag;
use crate::engine::rules::{RuleConfig, RuleSetting};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// RuleConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait RuleConfigReader: Send + Sync {
    /// 读取单条规则的开关与阈值
    ///
    /// # 默认值
    /// - UnderThirtySeconds: 启用, 30 秒
    /// - 其余规则: 关闭, 无阈值
    async fn get_rule_setting(&self, flag: ViolationFlag) -> Result<RuleSetting, Box<dyn Error>>;

    /// 读取完整规则配置（未做阈值校验，校验由判定器构造时完成）
    async fn load_rule_config(&self) -> Result<RuleConfig, Box<dyn Error>> {
        let mut config = RuleConfig::empty();
        for flag in ViolationFlag::ALL {
            let setting = self.get_rule_setting(flag).await?;
            config.set(flag, setting);
        }
        Ok(config)
    }
}
