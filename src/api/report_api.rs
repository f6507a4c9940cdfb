// ==========================================
// 自营交易合规后台 - 审核报告 API
// ==========================================
// 职责: 报告创建/删除/列表、月度汇总、CSV 导出、出金登记
// 报告创建后只读，只允许整体删除
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::payout::PayoutRecord;
use crate::domain::report::{NewReport, Report};
use crate::engine::aggregator::{MonthlySummary, ReportAggregator};
use crate::engine::report_export::ReportCsvExporter;
use crate::engine::report_sort::{sort_reports, ReportSort};
use crate::repository::payout_repo::PayoutRepository;
use crate::repository::report_repo::ReportRepository;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ==========================================
// ReportApi - 审核报告 API
// ==========================================
pub struct ReportApi {
    report_repo: Arc<ReportRepository>,
    payout_repo: Arc<PayoutRepository>,
    aggregator: ReportAggregator,
}

impl ReportApi {
    pub fn new(report_repo: Arc<ReportRepository>, payout_repo: Arc<PayoutRepository>) -> Self {
        Self {
            report_repo,
            payout_repo,
            aggregator: ReportAggregator::new(),
        }
    }

    /// 创建报告
    ///
    /// # 校验
    /// - login / agent 不能为空
    /// - decision / phase 必填
    pub fn create_report(&self, request: NewReport) -> ApiResult<Report> {
        if request.login.trim().is_empty() {
            return Err(ApiError::InvalidInput("login 不能为空".to_string()));
        }
        if request.agent.trim().is_empty() {
            return Err(ApiError::InvalidInput("agent 不能为空".to_string()));
        }
        let decision = request
            .decision
            .ok_or_else(|| ApiError::InvalidInput("decision 不能为空".to_string()))?;
        let phase = request
            .phase
            .ok_or_else(|| ApiError::InvalidInput("phase 不能为空".to_string()))?;
        if let Some(balance) = request.account_balance {
            if balance < Decimal::ZERO {
                return Err(ApiError::InvalidInput(format!(
                    "account_balance 不能为负数: {}",
                    balance
                )));
            }
        }

        let report = request.into_report(decision, phase);
        self.report_repo.insert(&report)?;

        info!(
            report_id = %report.id,
            login = %report.login,
            agent = %report.agent,
            decision = %report.decision,
            violations = report.violation_count(),
            "报告已创建"
        );
        Ok(report)
    }

    /// 按 ID 查询报告
    pub fn get_report(&self, id: &str) -> ApiResult<Report> {
        self.report_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Report(id={})不存在", id)))
    }

    /// 删除报告
    pub fn delete_report(&self, id: &str) -> ApiResult<()> {
        self.report_repo.delete(id)?;
        info!(report_id = id, "报告已删除");
        Ok(())
    }

    /// 报告列表（未指定排序时按创建时间倒序）
    pub fn list_reports(&self, sort: Option<ReportSort>) -> ApiResult<Vec<Report>> {
        let mut reports = self.report_repo.list_all()?;
        sort_reports(&mut reports, sort);
        Ok(reports)
    }

    /// 月度汇总
    pub fn monthly_summary(&self, year: i32, month: u32) -> ApiResult<MonthlySummary> {
        let reports = self.report_repo.list_by_month(year, month)?;
        let payouts = self.payout_repo.list_by_month(year, month)?;
        Ok(self.aggregator.summarize(year, month, &reports, &payouts))
    }

    /// 导出指定月份报告为 CSV（创建时间倒序）
    pub fn export_month_csv(&self, year: i32, month: u32) -> ApiResult<String> {
        let mut reports = self.report_repo.list_by_month(year, month)?;
        sort_reports(&mut reports, None);
        let csv = ReportCsvExporter::to_csv_string(&reports)?;
        info!(year, month, rows = reports.len(), "报告 CSV 导出完成");
        Ok(csv)
    }

    /// 登记出金（漏斗统计最后一级）
    pub fn record_payout(&self, login: &str, amount: Decimal) -> ApiResult<PayoutRecord> {
        if login.trim().is_empty() {
            return Err(ApiError::InvalidInput("login 不能为空".to_string()));
        }
        if amount <= Decimal::ZERO {
            return Err(ApiError::InvalidInput(format!("出金金额必须为正数: {}", amount)));
        }

        let payout = PayoutRecord {
            id: Uuid::new_v4().to_string(),
            login: login.trim().to_string(),
            amount,
            created_at: Utc::now().naive_utc(),
        };
        self.payout_repo.insert(&payout)?;
        info!(
            payout_id = %payout.id,
            login = %payout.login,
            amount = %payout.amount,
            "出金已登记"
        );
        Ok(payout)
    }
}
