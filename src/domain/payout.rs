// ==========================================
// 自营交易合规后台 - 出金记录领域模型
// ==========================================
// 用途: 漏斗统计的最后一级 (funded -> payout)
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub id: String,
    pub login: String,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}
