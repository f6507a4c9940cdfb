// ==========================================
// 交割单分析集成测试
// ==========================================
// 测试目标: HTML 抽取 -> 规则配置 -> 违规判定 全链路
// ==========================================

mod test_helpers;

use prop_compliance::api::{ApiError, StatementApi, StatementDiagnostic};
use prop_compliance::config::{config_keys, ConfigManager, RuleConfigReader};
use prop_compliance::domain::types::ViolationFlag;
use prop_compliance::domain::TradeRecord;
use prop_compliance::engine::rules::RuleConfigError;
use prop_compliance::engine::{ClassificationContext, ViolationRule};
use prop_compliance::importer::{SkipReason, StatementParser};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use test_helpers::{
    create_test_db, insert_config, open_test_connection, statement_html, three_row_statement,
    trade_row,
};

fn statement_api(db_path: &str) -> StatementApi {
    let config_manager = ConfigManager::new(db_path).expect("Failed to create ConfigManager");
    let reader: Arc<dyn RuleConfigReader> = Arc::new(config_manager);
    StatementApi::new(reader)
}

fn tickets(trades: &[TradeRecord]) -> Vec<&str> {
    trades.iter().map(|t| t.ticket()).collect()
}

#[test]
fn test_parser_extracts_valid_rows_only() {
    let parser = StatementParser::default();
    let parsed = parser.parse(&three_row_statement()).unwrap();

    let extraction = parsed.extract();
    assert_eq!(tickets(&extraction.trades), vec!["A", "B"]);
    assert_eq!(
        prop_compliance::domain::total_amount(&extraction.trades),
        Decimal::from_str("1300.50").unwrap()
    );

    // 表头行/标题行/汇总行/亏损行都被跳过
    assert!(extraction
        .skipped
        .iter()
        .any(|s| matches!(s.reason, SkipReason::NonPositiveAmount { .. })));
    assert!(extraction
        .skipped
        .iter()
        .any(|s| matches!(s.reason, SkipReason::InvalidAmount { .. })));
    assert_eq!(extraction.trades.len() + extraction.skipped.len(), parsed.row_count());

    // 惰性迭代可重复
    assert_eq!(parsed.trades().count(), 2);
    assert_eq!(parsed.trades().count(), 2);
}

#[tokio::test]
async fn test_analyze_html_flags_short_hold_trade() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = statement_api(&db_path);

    let analysis = api.analyze_html(&three_row_statement()).await.unwrap();

    assert_eq!(analysis.diagnostic, None);
    assert_eq!(tickets(&analysis.trades), vec!["A", "B"]);
    assert_eq!(tickets(&analysis.flagged_trades), vec!["A"]);
    assert_eq!(analysis.total_amount, Decimal::from_str("1300.50").unwrap());
    assert_eq!(analysis.flagged_amount, Decimal::from_str("500.50").unwrap());
    assert!(analysis.flags.contains(&ViolationFlag::UnderThirtySeconds));
    assert_eq!(analysis.flags.len(), 1);
}

#[tokio::test]
async fn test_iso_timestamps_and_thousands_separator() {
    let html = statement_html(&[
        trade_row("2024-01-01T10:00:00", "A", "2024-01-01T10:00:15", "100.50"),
        trade_row("2024-01-01T11:00:00", "B", "2024-01-01T11:00:10", "-5.00"),
        trade_row("2024-01-01T12:00:00", "C", "2024-01-01T12:00:45", "1,200.00"),
    ]);

    let parsed = StatementParser::default().parse(&html).unwrap();
    let trades: Vec<TradeRecord> = parsed.trades().collect();
    assert_eq!(tickets(&trades), vec!["A", "C"]);
    assert_eq!(trades[0].duration_seconds(), 15);
    assert_eq!(trades[1].duration_seconds(), 45);
    assert_eq!(trades[1].net_amount(), Decimal::from_str("1200.00").unwrap());

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let analysis = statement_api(&db_path).analyze_html(&html).await.unwrap();

    assert_eq!(tickets(&analysis.trades), vec!["A", "C"]);
    assert_eq!(tickets(&analysis.flagged_trades), vec!["A"]);
    assert_eq!(analysis.total_amount, Decimal::from_str("1300.50").unwrap());
    assert_eq!(analysis.flagged_amount, Decimal::from_str("100.50").unwrap());
}

#[tokio::test]
async fn test_amounts_near_decimal_limit_do_not_overflow() {
    let html = statement_html(&[
        trade_row(
            "2024-01-01T10:00:00",
            "X1",
            "2024-01-01T10:00:05",
            "50000000000000000000000000000",
        ),
        trade_row(
            "2024-01-01T11:00:00",
            "X2",
            "2024-01-01T11:00:05",
            "50000000000000000000000000000",
        ),
    ]);

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let analysis = statement_api(&db_path).analyze_html(&html).await.unwrap();

    assert_eq!(tickets(&analysis.trades), vec!["X1", "X2"]);
    assert_eq!(tickets(&analysis.flagged_trades), vec!["X1", "X2"]);
    assert_eq!(analysis.total_amount, Decimal::MAX);
    assert_eq!(analysis.flagged_amount, Decimal::MAX);
}

#[tokio::test]
async fn test_analyze_html_is_deterministic() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = statement_api(&db_path);
    let html = three_row_statement();

    let first = api.analyze_html(&html).await.unwrap();
    let second = api.analyze_html(&html).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_threshold_from_config() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, config_keys::UNDER_30_SECONDS_THRESHOLD_SECS, "10").unwrap();

    let api = statement_api(&db_path);
    let analysis = api.analyze_html(&three_row_statement()).await.unwrap();

    // A 持仓 12 秒，阈值 10 秒时不再命中
    assert!(analysis.flagged_trades.is_empty());
    assert!(analysis.flags.is_empty());
    assert_eq!(analysis.total_amount, Decimal::from_str("1300.50").unwrap());
}

#[tokio::test]
async fn test_disabled_rule_flags_nothing() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, config_keys::UNDER_30_SECONDS_ENABLED, "false").unwrap();

    let api = statement_api(&db_path);
    let analysis = api.analyze_html(&three_row_statement()).await.unwrap();

    assert!(analysis.flagged_trades.is_empty());
    assert!(analysis.flags.is_empty());
    assert_eq!(analysis.trades.len(), 2);
}

#[tokio::test]
async fn test_enabled_rule_without_threshold_is_config_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, config_keys::MARGIN_USAGE_ENABLED, "true").unwrap();

    let api = statement_api(&db_path);
    let result = api.analyze_html(&three_row_statement()).await;

    assert!(matches!(
        result,
        Err(ApiError::RuleConfigError(RuleConfigError::MissingThreshold {
            flag: ViolationFlag::FiftyPercentMargin
        }))
    ));
}

#[tokio::test]
async fn test_stability_rule_requires_registered_predicate() {
    struct AlwaysUnstable;

    impl ViolationRule for AlwaysUnstable {
        fn flag(&self) -> ViolationFlag {
            ViolationFlag::StabilityRule
        }

        fn evaluate(&self, trades: &[TradeRecord], _context: &ClassificationContext) -> bool {
            !trades.is_empty()
        }
    }

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, config_keys::STABILITY_ENABLED, "true").unwrap();

    let mut api = statement_api(&db_path);
    let result = api.analyze_html(&three_row_statement()).await;
    assert!(matches!(
        result,
        Err(ApiError::RuleConfigError(RuleConfigError::MissingPredicate { .. }))
    ));

    api.register_rule(Arc::new(AlwaysUnstable));
    let analysis = api.analyze_html(&three_row_statement()).await.unwrap();
    assert!(analysis.flags.contains(&ViolationFlag::StabilityRule));
    assert!(analysis.flags.contains(&ViolationFlag::UnderThirtySeconds));
}

#[tokio::test]
async fn test_no_file_provided_is_not_an_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = statement_api(&db_path);

    let analysis = api.analyze_file(None).await.unwrap();
    assert_eq!(analysis.diagnostic, Some(StatementDiagnostic::NoFileProvided));
    assert!(analysis.trades.is_empty());
    assert_eq!(analysis.total_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_no_rows_found_is_not_an_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = statement_api(&db_path);

    let analysis = api
        .analyze_html("<html><body><p>no table here</p></body></html>")
        .await
        .unwrap();
    assert_eq!(analysis.diagnostic, Some(StatementDiagnostic::NoRowsFound));
    assert!(analysis.trades.is_empty());
    assert!(analysis.flagged_trades.is_empty());
    assert_eq!(analysis.total_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_analyze_file_reads_html_statement() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = statement_api(&db_path);

    let mut statement = tempfile::Builder::new()
        .suffix(".htm")
        .tempfile()
        .unwrap();
    statement
        .write_all(three_row_statement().as_bytes())
        .unwrap();

    let analysis = api.analyze_file(Some(statement.path())).await.unwrap();
    assert_eq!(tickets(&analysis.trades), vec!["A", "B"]);
    assert_eq!(tickets(&analysis.flagged_trades), vec!["A"]);
}

#[tokio::test]
async fn test_missing_file_is_import_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = statement_api(&db_path);

    let result = api
        .analyze_file(Some(Path::new("/nonexistent/statement.htm")))
        .await;
    assert!(matches!(result, Err(ApiError::ImportError(_))));
}
