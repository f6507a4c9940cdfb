// ==========================================
// 自营交易合规后台 - 成交记录领域模型
// ==========================================
// 来源: 交割单 HTML 中的一行已平仓订单
// 约束: 创建后不可变; 平仓时间不早于开仓时间
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// TradeRecord - 成交记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    ticket: String,            // 订单号
    open_time: NaiveDateTime,  // 开仓时间
    close_time: NaiveDateTime, // 平仓时间
    net_amount: Decimal,       // 净盈亏
}

impl TradeRecord {
    /// 创建成交记录
    ///
    /// # 返回
    /// - Some(TradeRecord): 平仓时间 >= 开仓时间
    /// - None: 持仓时长为负（畸形行）
    pub fn new(
        ticket: impl Into<String>,
        open_time: NaiveDateTime,
        close_time: NaiveDateTime,
        net_amount: Decimal,
    ) -> Option<Self> {
        if close_time < open_time {
            return None;
        }
        Some(Self {
            ticket: ticket.into(),
            open_time,
            close_time,
            net_amount,
        })
    }

    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    pub fn open_time(&self) -> NaiveDateTime {
        self.open_time
    }

    pub fn close_time(&self) -> NaiveDateTime {
        self.close_time
    }

    pub fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    /// 持仓时长（秒，恒 >= 0）
    pub fn duration_seconds(&self) -> i64 {
        (self.close_time - self.open_time).num_seconds()
    }
}

/// 成交记录净盈亏合计
///
/// 超出 Decimal 表示范围时饱和到 Decimal::MAX / Decimal::MIN
pub fn total_amount<'a, I>(trades: I) -> Decimal
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    trades
        .into_iter()
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.net_amount))
}
