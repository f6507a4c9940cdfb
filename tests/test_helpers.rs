// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、交割单 HTML 构造、报告构造
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use prop_compliance::domain::types::{AccountPhase, Decision, ViolationFlag};
use prop_compliance::domain::Report;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_test_connection(&db_path)?;
    prop_compliance::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(prop_compliance::db::open_sqlite_connection(db_path)?)
}

/// 写入 global 配置项
pub fn insert_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

// ==========================================
// 交割单 HTML
// ==========================================

/// 14 列成交行: 0=开仓时间, 1=单号, 9=平仓时间, 13=金额
pub fn trade_row(open_time: &str, ticket: &str, close_time: &str, amount: &str) -> String {
    let mut cells = vec![String::new(); 14];
    cells[0] = open_time.to_string();
    cells[1] = ticket.to_string();
    cells[2] = "buy".to_string();
    cells[3] = "1.00".to_string();
    cells[4] = "EURUSD".to_string();
    cells[9] = close_time.to_string();
    cells[13] = amount.to_string();

    let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
    format!("<tr>{}</tr>", tds)
}

/// 包装为完整交割单页面（含表头行与汇总行）
pub fn statement_html(rows: &[String]) -> String {
    format!(
        r#"<html><head><title>Statement</title></head><body>
<table>
<tr><td colspan="14"><b>Closed Transactions:</b></td></tr>
<tr><td>Open Time</td><td>Ticket</td><td>Type</td><td>Size</td><td>Item</td><td>Price</td><td>S / L</td><td>T / P</td><td>Close Time</td><td>Close Time</td><td>Price</td><td>Commission</td><td>Swap</td><td>Profit</td></tr>
{}
<tr><td colspan="13">Closed P/L:</td><td>0.00</td></tr>
</table>
</body></html>"#,
        rows.join("\n")
    )
}

/// 三行场景: A 持仓 12 秒 500.50, B 持仓 2 分钟 800.00, C 亏损 -50.00
pub fn three_row_statement() -> String {
    statement_html(&[
        trade_row("2024.03.04 10:00:00", "A", "2024.03.04 10:00:12", "500.50"),
        trade_row("2024.03.04 11:00:00", "B", "2024.03.04 11:02:00", "800.00"),
        trade_row("2024.03.04 12:00:00", "C", "2024.03.04 12:00:05", "-50.00"),
    ])
}

// ==========================================
// 报告构造
// ==========================================

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("测试日期非法")
}

pub fn report(
    id: &str,
    agent: &str,
    decision: Decision,
    phase: AccountPhase,
    violations: &[ViolationFlag],
    created_at: NaiveDateTime,
) -> Report {
    Report {
        id: id.to_string(),
        login: format!("L-{}", id),
        agent: agent.to_string(),
        decision,
        phase,
        account_type: Some("standard".to_string()),
        risk_type: Some("normal".to_string()),
        account_balance: Some(Decimal::new(100_000, 0)),
        violations: violations.iter().copied().collect::<BTreeSet<_>>(),
        version: Some("v1".to_string()),
        note: None,
        created_at,
    }
}
