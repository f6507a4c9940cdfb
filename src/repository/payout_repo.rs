// ==========================================
// 自营交易合规后台 - 出金记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::DB_DATETIME_FORMAT;
use crate::domain::payout::PayoutRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::report_repo::{conversion_error, month_bounds, parse_db_datetime};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub struct PayoutRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PayoutRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入出金记录
    pub fn insert(&self, payout: &PayoutRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO payout (id, login, amount, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                payout.id,
                payout.login,
                payout.amount.to_string(),
                payout.created_at.format(DB_DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 查询指定月份的出金记录
    pub fn list_by_month(&self, year: i32, month: u32) -> RepositoryResult<Vec<PayoutRecord>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, login, amount, created_at
            FROM payout
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at ASC, id ASC
            "#,
        )?;
        let payouts = stmt
            .query_map(params![start, end], map_payout_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(payouts)
    }

    /// 指定月份出金笔数
    pub fn count_by_month(&self, year: i32, month: u32) -> RepositoryResult<u32> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM payout WHERE created_at >= ?1 AND created_at < ?2",
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}

fn map_payout_row(row: &Row<'_>) -> rusqlite::Result<PayoutRecord> {
    let amount_raw: String = row.get(2)?;
    let amount = Decimal::from_str(&amount_raw)
        .map_err(|_| conversion_error(2, "amount", &amount_raw))?;

    let created_raw: String = row.get(3)?;
    let created_at = parse_db_datetime(&created_raw)
        .ok_or_else(|| conversion_error(3, "created_at", &created_raw))?;

    Ok(PayoutRecord {
        id: row.get(0)?,
        login: row.get(1)?,
        amount,
        created_at,
    })
}
