// ==========================================
// 自营交易合规后台 - 报告列表排序
// ==========================================
// 默认: 创建时间倒序
// 指定列: 稳定排序，相同键保持原有顺序
// ==========================================

use crate::domain::report::Report;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSortKey {
    CreatedAt,
    Login,
    Agent,
    Decision,
    Phase,
    ViolationCount,
    AccountBalance,
}

impl ReportSortKey {
    /// 从前端列名解析（兼容 camelCase / snake_case）
    pub fn from_column(column: &str) -> Option<Self> {
        match column.trim().to_lowercase().replace('_', "").as_str() {
            "createdat" | "date" => Some(ReportSortKey::CreatedAt),
            "login" => Some(ReportSortKey::Login),
            "agent" => Some(ReportSortKey::Agent),
            "decision" => Some(ReportSortKey::Decision),
            "phase" | "accountphase" => Some(ReportSortKey::Phase),
            "violations" | "violationcount" => Some(ReportSortKey::ViolationCount),
            "balance" | "accountbalance" => Some(ReportSortKey::AccountBalance),
            _ => None,
        }
    }

    fn compare(&self, a: &Report, b: &Report) -> Ordering {
        match self {
            ReportSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            ReportSortKey::Login => a.login.cmp(&b.login),
            ReportSortKey::Agent => a.agent.cmp(&b.agent),
            ReportSortKey::Decision => a.decision.cmp(&b.decision),
            ReportSortKey::Phase => a.phase.cmp(&b.phase),
            ReportSortKey::ViolationCount => a.violation_count().cmp(&b.violation_count()),
            ReportSortKey::AccountBalance => a.account_balance.cmp(&b.account_balance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSort {
    pub key: ReportSortKey,
    pub direction: SortDirection,
}

impl ReportSort {
    pub fn new(key: ReportSortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

/// 排序报告列表
pub fn sort_reports(reports: &mut [Report], sort: Option<ReportSort>) {
    let sort = sort.unwrap_or(ReportSort::new(ReportSortKey::CreatedAt, SortDirection::Desc));
    reports.sort_by(|a, b| match sort.direction {
        SortDirection::Asc => sort.key.compare(a, b),
        SortDirection::Desc => sort.key.compare(b, a),
    });
}
