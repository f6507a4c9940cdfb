// ==========================================
// 自营交易合规后台 - 领域类型定义
// ==========================================
// 违规标记 / 审核结论 / 账户阶段
// 存储格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 违规标记 (Violation Flag)
// ==========================================
// 固定枚举集合，顺序即展示顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationFlag {
    UnderThirtySeconds,        // 30 秒内平仓
    EightyPercentProfitTarget, // 单笔利润占目标 80%
    FiftyPercentMargin,        // 保证金占用 50%
    HedgeTradeViolation,       // 新闻窗口对冲
    StabilityRule,             // 稳定性规则
}

impl ViolationFlag {
    /// 全部违规标记（展示顺序）
    pub const ALL: [ViolationFlag; 5] = [
        ViolationFlag::UnderThirtySeconds,
        ViolationFlag::EightyPercentProfitTarget,
        ViolationFlag::FiftyPercentMargin,
        ViolationFlag::HedgeTradeViolation,
        ViolationFlag::StabilityRule,
    ];

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ViolationFlag::UnderThirtySeconds => "UNDER_30_SECONDS",
            ViolationFlag::EightyPercentProfitTarget => "EIGHTY_PERCENT_PROFIT_TARGET",
            ViolationFlag::FiftyPercentMargin => "FIFTY_PERCENT_MARGIN",
            ViolationFlag::HedgeTradeViolation => "HEDGE_TRADE_VIOLATION",
            ViolationFlag::StabilityRule => "STABILITY_RULE",
        }
    }

    /// 从数据库字符串解析（未知值返回 None）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UNDER_30_SECONDS" | "UNDER_THIRTY_SECONDS" => Some(ViolationFlag::UnderThirtySeconds),
            "EIGHTY_PERCENT_PROFIT_TARGET" => Some(ViolationFlag::EightyPercentProfitTarget),
            "FIFTY_PERCENT_MARGIN" => Some(ViolationFlag::FiftyPercentMargin),
            "HEDGE_TRADE_VIOLATION" => Some(ViolationFlag::HedgeTradeViolation),
            "STABILITY_RULE" => Some(ViolationFlag::StabilityRule),
            _ => None,
        }
    }

    /// 报表/导出使用的展示名称
    pub fn label(&self) -> &'static str {
        match self {
            ViolationFlag::UnderThirtySeconds => "Under 30 Seconds",
            ViolationFlag::EightyPercentProfitTarget => "80% Profit Target",
            ViolationFlag::FiftyPercentMargin => "50% Margin",
            ViolationFlag::HedgeTradeViolation => "Hedge Trade Violation",
            ViolationFlag::StabilityRule => "Stability Rule",
        }
    }
}

impl fmt::Display for ViolationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 审核结论 (Decision)
// ==========================================
// 创建时由审核员给定，之后不再流转
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved, // 通过
    Rejected, // 拒绝
    Review,   // 待复核
}

impl Decision {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::Rejected => "REJECTED",
            Decision::Review => "REVIEW",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "APPROVED" => Some(Decision::Approved),
            "REJECTED" => Some(Decision::Rejected),
            "REVIEW" => Some(Decision::Review),
            _ => None,
        }
    }

    /// 报表/导出使用的展示名称
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
            Decision::Review => "Review",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 账户阶段 (Account Phase)
// ==========================================
// 考核流程: phase1 -> phase2 -> funded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountPhase {
    Phase1,
    Phase2,
    Funded,
}

impl AccountPhase {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AccountPhase::Phase1 => "phase1",
            AccountPhase::Phase2 => "phase2",
            AccountPhase::Funded => "funded",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '_'], "").as_str() {
            "phase1" => Some(AccountPhase::Phase1),
            "phase2" => Some(AccountPhase::Phase2),
            "funded" => Some(AccountPhase::Funded),
            _ => None,
        }
    }
}

impl fmt::Display for AccountPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
