// ==========================================
// 自营交易合规后台 - 违规规则定义
// ==========================================
// 职责: 规则配置 + 规则谓词接口 + 内置谓词
// 红线: 除 30 秒规则外，阈值一律来自外部配置，不写死
// ==========================================

use crate::domain::trade::TradeRecord;
use crate::domain::types::ViolationFlag;
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// 30 秒规则默认阈值（秒）
pub const DEFAULT_MIN_HOLD_SECONDS: f64 = 30.0;

// ==========================================
// 规则配置错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleConfigError {
    #[error("规则 {flag} 已启用但未配置阈值")]
    MissingThreshold { flag: ViolationFlag },

    #[error("规则 {flag} 阈值非法: {value} ({message})")]
    InvalidThreshold {
        flag: ViolationFlag,
        value: f64,
        message: String,
    },

    #[error("规则 {flag} 已启用但没有注册判定函数")]
    MissingPredicate { flag: ViolationFlag },
}

// ==========================================
// RuleSetting / RuleConfig - 规则配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleSetting {
    pub enabled: bool,
    pub threshold: Option<f64>,
}

impl RuleSetting {
    pub fn enabled(threshold: Option<f64>) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            threshold: None,
        }
    }
}

/// 规则配置
///
/// 阈值单位:
/// - UnderThirtySeconds: 秒
/// - EightyPercentProfitTarget / FiftyPercentMargin: 百分比 (0, 100]
/// - HedgeTradeViolation: 新闻窗口秒数
/// - StabilityRule: 原样传给调用方注册的判定函数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    settings: BTreeMap<ViolationFlag, RuleSetting>,
}

impl RuleConfig {
    /// 空配置（全部关闭）
    pub fn empty() -> Self {
        Self {
            settings: BTreeMap::new(),
        }
    }

    pub fn with_rule(mut self, flag: ViolationFlag, setting: RuleSetting) -> Self {
        self.set(flag, setting);
        self
    }

    pub fn set(&mut self, flag: ViolationFlag, setting: RuleSetting) {
        self.settings.insert(flag, setting);
    }

    pub fn setting(&self, flag: ViolationFlag) -> RuleSetting {
        self.settings
            .get(&flag)
            .copied()
            .unwrap_or_else(RuleSetting::disabled)
    }

    pub fn is_enabled(&self, flag: ViolationFlag) -> bool {
        self.setting(flag).enabled
    }

    pub fn threshold(&self, flag: ViolationFlag) -> Option<f64> {
        self.setting(flag).threshold
    }

    /// 已启用的规则（展示顺序）
    pub fn enabled_flags(&self) -> Vec<ViolationFlag> {
        ViolationFlag::ALL
            .into_iter()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }

    /// 30 秒规则阈值（未配置时取默认 30 秒）
    pub fn min_hold_seconds(&self) -> f64 {
        self.threshold(ViolationFlag::UnderThirtySeconds)
            .unwrap_or(DEFAULT_MIN_HOLD_SECONDS)
    }

    /// 校验已启用规则的阈值
    pub fn validate(&self) -> Result<(), RuleConfigError> {
        for flag in self.enabled_flags() {
            let threshold = self.threshold(flag);
            match flag {
                ViolationFlag::UnderThirtySeconds => {
                    let value = self.min_hold_seconds();
                    if !(value.is_finite() && value > 0.0) {
                        return Err(RuleConfigError::InvalidThreshold {
                            flag,
                            value,
                            message: "持仓秒数必须为正数".to_string(),
                        });
                    }
                }
                ViolationFlag::EightyPercentProfitTarget | ViolationFlag::FiftyPercentMargin => {
                    let value = threshold.ok_or(RuleConfigError::MissingThreshold { flag })?;
                    if !(value.is_finite() && value > 0.0 && value <= 100.0) {
                        return Err(RuleConfigError::InvalidThreshold {
                            flag,
                            value,
                            message: "百分比必须在 (0, 100] 区间".to_string(),
                        });
                    }
                }
                ViolationFlag::HedgeTradeViolation => {
                    let value = threshold.ok_or(RuleConfigError::MissingThreshold { flag })?;
                    if !(value.is_finite() && value > 0.0) {
                        return Err(RuleConfigError::InvalidThreshold {
                            flag,
                            value,
                            message: "新闻窗口秒数必须为正数".to_string(),
                        });
                    }
                }
                ViolationFlag::StabilityRule => {}
            }
        }
        Ok(())
    }
}

impl Default for RuleConfig {
    /// 默认只启用 30 秒规则
    fn default() -> Self {
        Self::empty().with_rule(
            ViolationFlag::UnderThirtySeconds,
            RuleSetting::enabled(Some(DEFAULT_MIN_HOLD_SECONDS)),
        )
    }
}

// ==========================================
// 判定上下文（外部账户/新闻数据）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// 持仓方向信息（交割单行本身不含方向）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSide {
    pub ticket: String,
    pub symbol: String,
    pub direction: TradeDirection,
    pub open_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub title: String,
    pub time: NaiveDateTime,
}

/// 账户指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetrics {
    pub balance: Decimal,
    pub profit_target: Decimal,
    pub peak_margin_used: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationContext {
    pub account: Option<AccountMetrics>,
    pub positions: Vec<PositionSide>,
    pub news_events: Vec<NewsEvent>,
}

// ==========================================
// ViolationRule - 规则谓词接口
// ==========================================
// 约束: 纯函数，不持有可变状态
pub trait ViolationRule: Send + Sync {
    /// 命中时产生的违规标记
    fn flag(&self) -> ViolationFlag;

    /// 判定成交集合在上下文下是否违规
    fn evaluate(&self, trades: &[TradeRecord], context: &ClassificationContext) -> bool;
}

// 共享谓词（同一判定函数注册到多个判定引擎）
impl<R: ViolationRule + ?Sized> ViolationRule for Arc<R> {
    fn flag(&self) -> ViolationFlag {
        (**self).flag()
    }

    fn evaluate(&self, trades: &[TradeRecord], context: &ClassificationContext) -> bool {
        (**self).evaluate(trades, context)
    }
}

/// 百分比（分母 <= 0 或溢出时返回 None）
fn percent_of(numerator: Decimal, denominator: Decimal) -> Option<f64> {
    if denominator <= Decimal::ZERO {
        return None;
    }
    numerator
        .checked_div(denominator)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_f64()
}

// ==========================================
// 内置谓词: 最短持仓时间（30 秒规则）
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct MinHoldTimeRule {
    pub min_seconds: f64,
}

impl MinHoldTimeRule {
    /// 单笔判定: 盈利且持仓时长低于阈值
    pub fn is_violation(&self, trade: &TradeRecord) -> bool {
        trade.net_amount() > Decimal::ZERO && (trade.duration_seconds() as f64) < self.min_seconds
    }
}

impl ViolationRule for MinHoldTimeRule {
    fn flag(&self) -> ViolationFlag {
        ViolationFlag::UnderThirtySeconds
    }

    fn evaluate(&self, trades: &[TradeRecord], _context: &ClassificationContext) -> bool {
        trades.iter().any(|t| self.is_violation(t))
    }
}

// ==========================================
// 内置谓词: 单笔利润占盈利目标比例
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ProfitTargetShareRule {
    pub threshold_pct: f64,
}

impl ViolationRule for ProfitTargetShareRule {
    fn flag(&self) -> ViolationFlag {
        ViolationFlag::EightyPercentProfitTarget
    }

    fn evaluate(&self, trades: &[TradeRecord], context: &ClassificationContext) -> bool {
        let Some(account) = &context.account else {
            return false;
        };
        trades.iter().any(|t| {
            percent_of(t.net_amount(), account.profit_target)
                .map(|pct| pct >= self.threshold_pct)
                .unwrap_or(false)
        })
    }
}

// ==========================================
// 内置谓词: 保证金占用比例
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct MarginUsageRule {
    pub threshold_pct: f64,
}

impl ViolationRule for MarginUsageRule {
    fn flag(&self) -> ViolationFlag {
        ViolationFlag::FiftyPercentMargin
    }

    fn evaluate(&self, _trades: &[TradeRecord], context: &ClassificationContext) -> bool {
        context
            .account
            .as_ref()
            .and_then(|a| percent_of(a.peak_margin_used, a.balance))
            .map(|pct| pct >= self.threshold_pct)
            .unwrap_or(false)
    }
}

// ==========================================
// 内置谓词: 新闻窗口内反向对冲
// ==========================================
// 同品种、方向相反的两笔持仓，开仓时间都落在同一新闻事件的 ±window 内
#[derive(Debug, Clone, Copy)]
pub struct NewsHedgeRule {
    pub window_seconds: f64,
}

impl NewsHedgeRule {
    fn within_window(&self, open_time: NaiveDateTime, news_time: NaiveDateTime) -> bool {
        ((open_time - news_time).num_seconds().abs() as f64) <= self.window_seconds
    }
}

impl ViolationRule for NewsHedgeRule {
    fn flag(&self) -> ViolationFlag {
        ViolationFlag::HedgeTradeViolation
    }

    fn evaluate(&self, _trades: &[TradeRecord], context: &ClassificationContext) -> bool {
        context.news_events.iter().any(|news| {
            let in_window: Vec<&PositionSide> = context
                .positions
                .iter()
                .filter(|p| self.within_window(p.open_time, news.time))
                .collect();

            in_window.iter().enumerate().any(|(i, a)| {
                in_window[i + 1..]
                    .iter()
                    .any(|b| a.symbol == b.symbol && a.direction != b.direction)
            })
        })
    }
}
