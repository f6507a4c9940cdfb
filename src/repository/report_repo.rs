// ==========================================
// 自营交易合规后台 - 审核报告仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储约定: 违规标记以逗号拼接 db 字符串, 金额以 TEXT 保存
// ==========================================

use crate::db::DB_DATETIME_FORMAT;
use crate::domain::report::Report;
use crate::domain::types::{AccountPhase, Decision, ViolationFlag};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const REPORT_COLUMNS: &str = r#"
    id, login, agent, decision, phase,
    account_type, risk_type, account_balance,
    violations, version, note, created_at
"#;

// ==========================================
// ReportRepository - 审核报告仓储
// ==========================================
/// 职责: 管理 report 表的写入、查询与删除
pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    /// 创建新的 ReportRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入报告
    pub fn insert(&self, report: &Report) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO report (
                id, login, agent, decision, phase,
                account_type, risk_type, account_balance,
                violations, version, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                report.id,
                report.login,
                report.agent,
                report.decision.to_db_str(),
                report.phase.to_db_str(),
                report.account_type,
                report.risk_type,
                report.account_balance.map(|b| b.to_string()),
                encode_violations(&report.violations),
                report.version,
                report.note,
                report.created_at.format(DB_DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询
    ///
    /// # 返回
    /// - Ok(Some(Report)): 找到报告
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Report>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM report WHERE id = ?1", REPORT_COLUMNS);
        let result = conn.query_row(&sql, params![id], map_report_row);

        match result {
            Ok(report) => Ok(Some(report)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部报告（创建时间倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Report>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM report ORDER BY created_at DESC, id ASC",
            REPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let reports = stmt
            .query_map([], map_report_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// 查询指定月份的报告
    pub fn list_by_month(&self, year: i32, month: u32) -> RepositoryResult<Vec<Report>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM report \
             WHERE created_at >= ?1 AND created_at < ?2 \
             ORDER BY created_at DESC, id ASC",
            REPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![start, end], map_report_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// 删除报告（不存在时返回 NotFound）
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM report WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Report".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 报告总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM report", [], |row| row.get(0))?;
        Ok(count)
    }
}

// ==========================================
// 行映射与编码
// ==========================================

fn map_report_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    let decision_raw: String = row.get(3)?;
    let decision = Decision::from_db_str(&decision_raw)
        .ok_or_else(|| conversion_error(3, "decision", &decision_raw))?;

    let phase_raw: String = row.get(4)?;
    let phase = AccountPhase::from_db_str(&phase_raw)
        .ok_or_else(|| conversion_error(4, "phase", &phase_raw))?;

    let account_balance = match row.get::<_, Option<String>>(7)? {
        Some(raw) => Some(
            Decimal::from_str(&raw).map_err(|_| conversion_error(7, "account_balance", &raw))?,
        ),
        None => None,
    };

    let violations_raw: String = row.get(8)?;
    let violations = decode_violations(&violations_raw)
        .ok_or_else(|| conversion_error(8, "violations", &violations_raw))?;

    let created_raw: String = row.get(11)?;
    let created_at = parse_db_datetime(&created_raw)
        .ok_or_else(|| conversion_error(11, "created_at", &created_raw))?;

    Ok(Report {
        id: row.get(0)?,
        login: row.get(1)?,
        agent: row.get(2)?,
        decision,
        phase,
        account_type: row.get(5)?,
        risk_type: row.get(6)?,
        account_balance,
        violations,
        version: row.get(9)?,
        note: row.get(10)?,
        created_at,
    })
}

pub(crate) fn conversion_error(index: usize, field: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        Box::new(RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("无法识别的值: {}", raw),
        }),
    )
}

pub(crate) fn parse_db_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DB_DATETIME_FORMAT).ok()
}

fn encode_violations(flags: &BTreeSet<ViolationFlag>) -> String {
    flags
        .iter()
        .map(|f| f.to_db_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_violations(raw: &str) -> Option<BTreeSet<ViolationFlag>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ViolationFlag::from_db_str)
        .collect()
}

/// 月份区间 [start, end)，以存储格式返回
pub(crate) fn month_bounds(year: i32, month: u32) -> RepositoryResult<(String, String)> {
    let invalid = || RepositoryError::FieldValueError {
        field: "month".to_string(),
        message: format!("非法月份: {}-{}", year, month),
    };

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((
        format!("{} 00:00:00", start.format("%Y-%m-%d")),
        format!("{} 00:00:00", end.format("%Y-%m-%d")),
    ))
}
