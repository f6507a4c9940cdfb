// ==========================================
// 自营交易合规后台 - 违规判定引擎
// ==========================================
// 输入: 成交记录集合 + 规则配置 + 外部上下文
// 输出: 违规标记集合（各规则结果取并集）
// 红线: 纯函数，相同输入重复判定结果一致
// ==========================================

use crate::domain::trade::{total_amount, TradeRecord};
use crate::domain::types::ViolationFlag;
use crate::engine::rules::{
    ClassificationContext, MarginUsageRule, MinHoldTimeRule, NewsHedgeRule,
    ProfitTargetShareRule, RuleConfig, RuleConfigError, ViolationRule,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::slice;
use tracing::debug;

/// 整张交割单的判定结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementClassification {
    pub flags: BTreeSet<ViolationFlag>,
    pub flagged_trades: Vec<TradeRecord>,
    pub total_amount: Decimal,
    pub flagged_amount: Decimal,
}

// ==========================================
// ViolationClassifier - 违规判定引擎
// ==========================================
pub struct ViolationClassifier {
    config: RuleConfig,
    rules: Vec<Box<dyn ViolationRule>>,
}

impl ViolationClassifier {
    /// 按配置构建判定引擎（仅内置谓词）
    pub fn new(config: RuleConfig) -> Result<Self, RuleConfigError> {
        Self::with_rules(config, Vec::new())
    }

    /// 按配置构建判定引擎，并注册外部谓词
    ///
    /// # 说明
    /// - 外部谓词覆盖同一标记的内置谓词
    /// - 未启用的标记即使注册了谓词也不参与判定
    /// - 已启用但没有任何谓词的标记视为配置错误
    pub fn with_rules(
        config: RuleConfig,
        custom_rules: Vec<Box<dyn ViolationRule>>,
    ) -> Result<Self, RuleConfigError> {
        config.validate()?;

        let mut rules: Vec<Box<dyn ViolationRule>> = Vec::new();
        let mut custom_rules: Vec<Option<Box<dyn ViolationRule>>> =
            custom_rules.into_iter().map(Some).collect();

        for flag in config.enabled_flags() {
            let custom = custom_rules
                .iter_mut()
                .find(|r| r.as_ref().map(|r| r.flag()) == Some(flag))
                .and_then(Option::take);

            let rule = match custom {
                Some(rule) => rule,
                None => builtin_rule(&config, flag)
                    .ok_or(RuleConfigError::MissingPredicate { flag })?,
            };
            rules.push(rule);
        }

        debug!(enabled = ?config.enabled_flags(), "违规判定引擎初始化完成");
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// 单笔成交判定（无外部上下文）
    pub fn classify_trade(&self, trade: &TradeRecord) -> BTreeSet<ViolationFlag> {
        self.classify(slice::from_ref(trade), &ClassificationContext::default())
    }

    /// 成交集合判定
    pub fn classify(
        &self,
        trades: &[TradeRecord],
        context: &ClassificationContext,
    ) -> BTreeSet<ViolationFlag> {
        self.rules
            .iter()
            .filter(|rule| rule.evaluate(trades, context))
            .map(|rule| rule.flag())
            .collect()
    }

    /// 单笔是否属于短持仓（30 秒规则，无外部上下文）
    pub fn is_short_hold(&self, trade: &TradeRecord) -> bool {
        self.is_short_hold_in(trade, &ClassificationContext::default())
    }

    /// 单笔短持仓判定，使用当前生效的 UnderThirtySeconds 谓词（含外部覆盖）
    fn is_short_hold_in(&self, trade: &TradeRecord, context: &ClassificationContext) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.flag() == ViolationFlag::UnderThirtySeconds)
            .map(|rule| rule.evaluate(slice::from_ref(trade), context))
            .unwrap_or(false)
    }

    /// 整张交割单判定
    pub fn classify_statement(
        &self,
        trades: &[TradeRecord],
        context: &ClassificationContext,
    ) -> StatementClassification {
        let flags = self.classify(trades, context);
        let flagged_trades: Vec<TradeRecord> = trades
            .iter()
            .filter(|t| self.is_short_hold_in(t, context))
            .cloned()
            .collect();

        let classification = StatementClassification {
            total_amount: total_amount(trades),
            flagged_amount: total_amount(&flagged_trades),
            flags,
            flagged_trades,
        };

        debug!(
            trades = trades.len(),
            flagged = classification.flagged_trades.len(),
            flags = ?classification.flags,
            "交割单判定完成"
        );
        classification
    }
}

/// 内置谓词（StabilityRule 无内置实现）
fn builtin_rule(config: &RuleConfig, flag: ViolationFlag) -> Option<Box<dyn ViolationRule>> {
    match flag {
        ViolationFlag::UnderThirtySeconds => Some(Box::new(MinHoldTimeRule {
            min_seconds: config.min_hold_seconds(),
        }) as Box<dyn ViolationRule>),
        ViolationFlag::EightyPercentProfitTarget => config.threshold(flag).map(|threshold_pct| {
            Box::new(ProfitTargetShareRule { threshold_pct }) as Box<dyn ViolationRule>
        }),
        ViolationFlag::FiftyPercentMargin => config.threshold(flag).map(|threshold_pct| {
            Box::new(MarginUsageRule { threshold_pct }) as Box<dyn ViolationRule>
        }),
        ViolationFlag::HedgeTradeViolation => config.threshold(flag).map(|window_seconds| {
            Box::new(NewsHedgeRule { window_seconds }) as Box<dyn ViolationRule>
        }),
        ViolationFlag::StabilityRule => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::{AccountMetrics, RuleSetting};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn open_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn trade(ticket: &str, secs: i64, amount: i64) -> TradeRecord {
        let close = open_at() + Duration::seconds(secs);
        TradeRecord::new(ticket, open_at(), close, Decimal::from(amount)).unwrap()
    }

    struct AlwaysStable(bool);

    impl ViolationRule for AlwaysStable {
        fn flag(&self) -> ViolationFlag {
            ViolationFlag::StabilityRule
        }

        fn evaluate(&self, _trades: &[TradeRecord], _context: &ClassificationContext) -> bool {
            self.0
        }
    }

    #[test]
    fn test_classify_trade_under_thirty_seconds() {
        let classifier = ViolationClassifier::new(RuleConfig::default()).unwrap();

        assert!(classifier
            .classify_trade(&trade("1", 15, 100))
            .contains(&ViolationFlag::UnderThirtySeconds));
        assert!(classifier.classify_trade(&trade("2", 30, 100)).is_empty());
        assert!(classifier.classify_trade(&trade("3", 45, 100)).is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = ViolationClassifier::new(RuleConfig::default()).unwrap();
        let trades = vec![trade("1", 10, 5), trade("2", 100, 5)];
        let context = ClassificationContext::default();

        let first = classifier.classify_statement(&trades, &context);
        let second = classifier.classify_statement(&trades, &context);
        assert_eq!(first, second);
        assert_eq!(first.flagged_trades.len(), 1);
        assert_eq!(first.total_amount, Decimal::from(10));
        assert_eq!(first.flagged_amount, Decimal::from(5));
    }

    #[test]
    fn test_disabled_min_hold_rule_flags_nothing() {
        let config = RuleConfig::empty();
        let classifier = ViolationClassifier::new(config).unwrap();
        assert!(classifier.classify_trade(&trade("1", 1, 100)).is_empty());
        assert!(!classifier.is_short_hold(&trade("1", 1, 100)));
    }

    #[test]
    fn test_flags_are_unioned() {
        let config = RuleConfig::default()
            .with_rule(ViolationFlag::FiftyPercentMargin, RuleSetting::enabled(Some(50.0)));
        let classifier = ViolationClassifier::new(config).unwrap();

        let context = ClassificationContext {
            account: Some(AccountMetrics {
                balance: Decimal::from(100_000),
                profit_target: Decimal::from(10_000),
                peak_margin_used: Decimal::from(60_000),
            }),
            ..Default::default()
        };
        let flags = classifier.classify(&[trade("1", 5, 10)], &context);
        assert_eq!(
            flags.into_iter().collect::<Vec<_>>(),
            vec![ViolationFlag::UnderThirtySeconds, ViolationFlag::FiftyPercentMargin]
        );
    }

    #[test]
    fn test_stability_rule_requires_registered_predicate() {
        let config = RuleConfig::empty()
            .with_rule(ViolationFlag::StabilityRule, RuleSetting::enabled(None));

        assert!(matches!(
            ViolationClassifier::new(config.clone()),
            Err(RuleConfigError::MissingPredicate {
                flag: ViolationFlag::StabilityRule
            })
        ));

        let custom: Vec<Box<dyn ViolationRule>> = vec![Box::new(AlwaysStable(true))];
        let classifier = ViolationClassifier::with_rules(config, custom).unwrap();
        assert!(classifier
            .classify_trade(&trade("1", 100, 1))
            .contains(&ViolationFlag::StabilityRule));
    }

    #[test]
    fn test_custom_rule_for_disabled_flag_is_ignored() {
        let custom: Vec<Box<dyn ViolationRule>> = vec![Box::new(AlwaysStable(true))];
        let classifier = ViolationClassifier::with_rules(RuleConfig::default(), custom).unwrap();
        assert!(classifier.classify_trade(&trade("1", 100, 1)).is_empty());
    }

    // 覆盖 30 秒规则的外部谓词同样决定 flagged_trades
    struct LossCountsAsShortHold;

    impl ViolationRule for LossCountsAsShortHold {
        fn flag(&self) -> ViolationFlag {
            ViolationFlag::UnderThirtySeconds
        }

        fn evaluate(&self, trades: &[TradeRecord], _context: &ClassificationContext) -> bool {
            trades.iter().any(|t| t.net_amount() < Decimal::ZERO)
        }
    }

    #[test]
    fn test_overriding_min_hold_rule_drives_flagged_trades() {
        let custom: Vec<Box<dyn ViolationRule>> = vec![Box::new(LossCountsAsShortHold)];
        let classifier = ViolationClassifier::with_rules(RuleConfig::default(), custom).unwrap();
        let trades = vec![trade("1", 5, 100), trade("2", 600, -40)];

        let result = classifier.classify_statement(&trades, &ClassificationContext::default());
        assert!(result.flags.contains(&ViolationFlag::UnderThirtySeconds));
        assert_eq!(result.flagged_trades, vec![trade("2", 600, -40)]);
        assert_eq!(result.flagged_amount, Decimal::from(-40));
        assert!(!classifier.is_short_hold(&trade("1", 5, 100)));
    }
}
