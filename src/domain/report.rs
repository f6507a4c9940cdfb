// ==========================================
// 自营交易合规后台 - 审核报告领域模型
// ==========================================
// 用途: 审核员对账户做出的合规结论
// 生命周期: 创建后只读，只允许整体删除
// ==========================================

use crate::domain::types::{AccountPhase, Decision, ViolationFlag};
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ==========================================
// Report - 审核报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,                          // 报告ID
    pub login: String,                       // 交易账户
    pub agent: String,                       // 审核员
    pub decision: Decision,                  // 审核结论
    pub phase: AccountPhase,                 // 账户阶段
    pub account_type: Option<String>,        // 账户类型
    pub risk_type: Option<String>,           // 风险类型
    pub account_balance: Option<Decimal>,    // 账户规模
    pub violations: BTreeSet<ViolationFlag>, // 违规标记集合
    pub version: Option<String>,             // 规则版本
    pub note: Option<String>,                // 备注
    pub created_at: NaiveDateTime,           // 创建时间
}

impl Report {
    /// 违规标记数量
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// 是否为多项违规（汇总口径，不影响存储的标记集合）
    pub fn has_multiple_violations(&self) -> bool {
        self.violations.len() > 1
    }

    /// 单项违规时返回该标记
    pub fn single_violation(&self) -> Option<ViolationFlag> {
        if self.violations.len() == 1 {
            self.violations.iter().next().copied()
        } else {
            None
        }
    }

    /// 违规标记展示串（" | " 分隔）
    pub fn violations_label(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.label())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

// ==========================================
// NewReport - 创建报告请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewReport {
    pub login: String,
    pub agent: String,
    pub decision: Option<Decision>,
    pub phase: Option<AccountPhase>,
    pub account_type: Option<String>,
    pub risk_type: Option<String>,
    pub account_balance: Option<Decimal>,
    #[serde(default)]
    pub violations: Vec<ViolationFlag>,
    pub version: Option<String>,
    pub note: Option<String>,
}

impl NewReport {
    /// 生成报告实体（调用方已完成必填校验）
    pub fn into_report(self, decision: Decision, phase: AccountPhase) -> Report {
        Report {
            id: Uuid::new_v4().to_string(),
            login: self.login.trim().to_string(),
            agent: self.agent.trim().to_string(),
            decision,
            phase,
            account_type: normalize_text(self.account_type),
            risk_type: normalize_text(self.risk_type),
            account_balance: self.account_balance,
            violations: self.violations.into_iter().collect(),
            version: normalize_text(self.version),
            note: normalize_text(self.note),
            created_at: Utc::now().naive_utc(),
        }
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
