// ==========================================
// 自营交易合规后台 - 单元格字段解析
// ==========================================
// 职责: 金额去千分位解析 / 券商时间格式解析
// 约束: 解析失败返回 None，由调用方决定跳过
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 券商时间格式（与语言区域无关）
pub const BROKER_TIME_FORMATS: [&str; 6] = [
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// 解析金额
///
/// 去掉千分位分隔符（逗号 / 空格 / 不换行空格）后按十进制解析
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// 解析券商时间
pub fn parse_broker_time(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    BROKER_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// 单元格文本标准化（合并空白）
pub fn normalize_cell_text<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined: String = fragments.into_iter().collect();
    joined
        .split(|c: char| c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_amount_strips_thousands_separator() {
        assert_eq!(parse_amount("1,200.00"), Decimal::from_str("1200.00").ok());
        assert_eq!(parse_amount(" 12 345.5 "), Decimal::from_str("12345.5").ok());
        assert_eq!(parse_amount("1\u{a0}000"), Some(Decimal::from(1000)));
        assert_eq!(parse_amount("-5.00"), Decimal::from_str("-5.00").ok());
        assert_eq!(parse_amount("+7"), Some(Decimal::from(7)));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("Profit"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    #[test]
    fn test_parse_broker_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 15)
            .unwrap();
        assert_eq!(parse_broker_time("2024.01.01 10:00:15"), Some(expected));
        assert_eq!(parse_broker_time("2024-01-01T10:00:15"), Some(expected));
        assert_eq!(parse_broker_time("2024-01-01 10:00:15"), Some(expected));
        assert_eq!(
            parse_broker_time("2024.01.01 10:00"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0)
        );
        assert_eq!(parse_broker_time("Open Time"), None);
        assert_eq!(parse_broker_time("01/02/2024"), None);
    }

    #[test]
    fn test_normalize_cell_text() {
        assert_eq!(normalize_cell_text(["  2024.01.01 ", "\n 10:00:00 "]), "2024.01.01 10:00:00");
    }
}
