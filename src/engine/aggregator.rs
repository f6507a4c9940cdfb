// ==========================================
// 自营交易合规后台 - 审核报告汇总引擎
// ==========================================
// 输入: 审核报告 + 出金记录（限定自然月）
// 输出: MonthlySummary（总量/占比/审核员/账户桶/漏斗/趋势）
// 红线: 分母为 0 时占比一律为 0
// 说明: 所有展示视图共用这一份违规计数口径
// ==========================================

use crate::domain::payout::PayoutRecord;
use crate::domain::report::Report;
use crate::domain::types::{AccountPhase, Decision, ViolationFlag};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// 计数 + 占比（整数百分比）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatioCount {
    pub count: u32,
    pub percent: u32,
}

impl RatioCount {
    pub fn of(count: u32, total: u32) -> Self {
        Self {
            count,
            percent: percent(count, total),
        }
    }
}

/// 审核员维度
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentBreakdown {
    pub agent: String,
    pub total: u32,
    pub approved: u32,
    pub rejected: u32,
    /// 单项违规按原因计数
    pub by_reason: BTreeMap<ViolationFlag, u32>,
    /// 多项违规（>1 个标记）单独计数
    pub multiple_violations: u32,
}

/// 账户桶键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountBucketKey {
    pub account_type: Option<String>,
    pub risk_type: Option<String>,
    pub account_balance: Option<Decimal>,
    pub phase: AccountPhase,
}

/// 账户桶统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBucket {
    #[serde(flatten)]
    pub key: AccountBucketKey,
    pub total: u32,
    pub approved: u32,
    pub rejected: u32,
    /// approved / total，四舍五入到整数百分比
    pub acceptance_ratio: u32,
}

/// 漏斗: phase1 -> phase2 -> funded -> payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunnelCounts {
    pub phase1: RatioCount,
    pub phase2: RatioCount,
    pub funded: RatioCount,
    pub payout: RatioCount,
}

/// 按日计数（趋势图）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub total: u32,
    pub approved: u32,
    pub rejected: u32,
}

/// 月度汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub total: u32,
    pub approved: RatioCount,
    pub rejected: RatioCount,
    pub review: RatioCount,
    pub agents: Vec<AgentBreakdown>,
    pub buckets: Vec<AccountBucket>,
    pub funnel: FunnelCounts,
    /// 全月单项违规按原因计数
    pub violation_totals: BTreeMap<ViolationFlag, u32>,
    pub multiple_violations: u32,
    pub daily_counts: Vec<DailyCount>,
}

/// 整数百分比，四舍五入（分母为 0 时为 0）
pub fn percent(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let n = numerator as u64;
    let d = denominator as u64;
    ((200 * n + d) / (2 * d)) as u32
}

/// 是否属于指定自然月
pub fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// 过滤出指定自然月的报告
pub fn restrict_to_month(reports: &[Report], year: i32, month: u32) -> Vec<&Report> {
    reports
        .iter()
        .filter(|r| in_month(r.created_at.date(), year, month))
        .collect()
}

// ==========================================
// ReportAggregator - 汇总引擎
// ==========================================
pub struct ReportAggregator {
    // 无状态引擎，每次查询重新计算
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成月度汇总
    ///
    /// # 参数
    /// - `year` / `month`: 自然月
    /// - `reports`: 报告（可含其他月份，内部过滤）
    /// - `payouts`: 出金记录（可含其他月份，内部过滤）
    pub fn summarize(
        &self,
        year: i32,
        month: u32,
        reports: &[Report],
        payouts: &[PayoutRecord],
    ) -> MonthlySummary {
        let month_reports = restrict_to_month(reports, year, month);
        let payout_count = payouts
            .iter()
            .filter(|p| in_month(p.created_at.date(), year, month))
            .count() as u32;

        let total = month_reports.len() as u32;
        let approved = count_decision(&month_reports, Decision::Approved);
        let rejected = count_decision(&month_reports, Decision::Rejected);
        let review = count_decision(&month_reports, Decision::Review);

        let (violation_totals, multiple_violations) = self.violation_totals(&month_reports);

        let summary = MonthlySummary {
            year,
            month,
            total,
            approved: RatioCount::of(approved, total),
            rejected: RatioCount::of(rejected, total),
            review: RatioCount::of(review, total),
            agents: self.agent_breakdown(&month_reports),
            buckets: self.account_buckets(&month_reports),
            funnel: self.funnel(&month_reports, payout_count),
            violation_totals,
            multiple_violations,
            daily_counts: self.daily_counts(&month_reports),
        };

        debug!(
            year,
            month,
            total,
            approved,
            rejected,
            agents = summary.agents.len(),
            buckets = summary.buckets.len(),
            "月度汇总完成"
        );
        summary
    }

    /// 审核员维度统计（按审核员名称排序）
    pub fn agent_breakdown(&self, reports: &[&Report]) -> Vec<AgentBreakdown> {
        let mut agents: BTreeMap<&str, AgentBreakdown> = BTreeMap::new();

        for report in reports {
            let entry = agents
                .entry(report.agent.as_str())
                .or_insert_with(|| AgentBreakdown {
                    agent: report.agent.clone(),
                    ..Default::default()
                });

            entry.total += 1;
            match report.decision {
                Decision::Approved => entry.approved += 1,
                Decision::Rejected => entry.rejected += 1,
                Decision::Review => {}
            }

            if report.has_multiple_violations() {
                entry.multiple_violations += 1;
            } else if let Some(flag) = report.single_violation() {
                *entry.by_reason.entry(flag).or_insert(0) += 1;
            }
        }

        agents.into_values().collect()
    }

    /// 账户桶统计（按键排序）
    pub fn account_buckets(&self, reports: &[&Report]) -> Vec<AccountBucket> {
        let mut buckets: BTreeMap<AccountBucketKey, (u32, u32, u32)> = BTreeMap::new();

        for report in reports {
            let key = AccountBucketKey {
                account_type: report.account_type.clone(),
                risk_type: report.risk_type.clone(),
                account_balance: report.account_balance.map(|b| b.normalize()),
                phase: report.phase,
            };
            let counts = buckets.entry(key).or_insert((0, 0, 0));
            counts.0 += 1;
            match report.decision {
                Decision::Approved => counts.1 += 1,
                Decision::Rejected => counts.2 += 1,
                Decision::Review => {}
            }
        }

        buckets
            .into_iter()
            .map(|(key, (total, approved, rejected))| AccountBucket {
                key,
                total,
                approved,
                rejected,
                acceptance_ratio: percent(approved, total),
            })
            .collect()
    }

    /// 漏斗统计（占比以当月报告总数为分母）
    pub fn funnel(&self, reports: &[&Report], payout_count: u32) -> FunnelCounts {
        let total = reports.len() as u32;
        let phase_count = |phase: AccountPhase| {
            reports.iter().filter(|r| r.phase == phase).count() as u32
        };

        FunnelCounts {
            phase1: RatioCount::of(phase_count(AccountPhase::Phase1), total),
            phase2: RatioCount::of(phase_count(AccountPhase::Phase2), total),
            funded: RatioCount::of(phase_count(AccountPhase::Funded), total),
            payout: RatioCount::of(payout_count, total),
        }
    }

    /// 全月违规原因统计
    ///
    /// # 返回
    /// (单项违规按原因计数, 多项违规报告数)
    pub fn violation_totals(&self, reports: &[&Report]) -> (BTreeMap<ViolationFlag, u32>, u32) {
        let mut totals = BTreeMap::new();
        let mut multiple = 0;

        for report in reports {
            if report.has_multiple_violations() {
                multiple += 1;
            } else if let Some(flag) = report.single_violation() {
                *totals.entry(flag).or_insert(0) += 1;
            }
        }

        (totals, multiple)
    }

    /// 按日计数
    pub fn daily_counts(&self, reports: &[&Report]) -> Vec<DailyCount> {
        let mut days: BTreeMap<NaiveDate, DailyCount> = BTreeMap::new();

        for report in reports {
            let date = report.created_at.date();
            let day = days.entry(date).or_insert(DailyCount {
                date,
                total: 0,
                approved: 0,
                rejected: 0,
            });
            day.total += 1;
            match report.decision {
                Decision::Approved => day.approved += 1,
                Decision::Rejected => day.rejected += 1,
                Decision::Review => {}
            }
        }

        days.into_values().collect()
    }
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn count_decision(reports: &[&Report], decision: Decision) -> u32 {
    reports.iter().filter(|r| r.decision == decision).count() as u32
}
