// ==========================================
// 自营交易合规后台 - 交割单版式定义
// ==========================================
// 职责: 以具名列角色描述交割单表格结构
// 约束: 版式是带版本号的契约，格式变化时新增版本而不是改列号
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 列角色 (Column Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    OpenTime,
    Ticket,
    CloseTime,
    Amount,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::OpenTime => write!(f, "open_time"),
            ColumnRole::Ticket => write!(f, "ticket"),
            ColumnRole::CloseTime => write!(f, "close_time"),
            ColumnRole::Amount => write!(f, "amount"),
        }
    }
}

// ==========================================
// StatementLayout - 交割单版式
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLayout {
    pub name: String,
    pub version: u32,
    open_time: usize,
    ticket: usize,
    close_time: usize,
    amount: usize,
    min_columns: usize,
}

impl StatementLayout {
    /// MetaTrader 已平仓订单表（v1）
    ///
    /// 每行 14 列: 0 开仓时间 / 1 订单号 / 9 平仓时间 / 13 净盈亏
    pub fn mt4_closed_orders_v1() -> Self {
        Self {
            name: "MT4_CLOSED_ORDERS".to_string(),
            version: 1,
            open_time: 0,
            ticket: 1,
            close_time: 9,
            amount: 13,
            min_columns: 14,
        }
    }

    /// 自定义版式
    ///
    /// # 校验
    /// - 四个列角色必须指向不同列
    /// - min_columns 至少覆盖最大列号
    pub fn custom(
        name: &str,
        version: u32,
        open_time: usize,
        ticket: usize,
        close_time: usize,
        amount: usize,
        min_columns: usize,
    ) -> ImportResult<Self> {
        let columns = [open_time, ticket, close_time, amount];
        for (i, a) in columns.iter().enumerate() {
            if columns[i + 1..].contains(a) {
                return Err(ImportError::InvalidLayout {
                    layout: name.to_string(),
                    message: format!("列号 {} 被多个角色占用", a),
                });
            }
        }

        let required = columns.iter().max().copied().unwrap_or(0) + 1;
        if min_columns < required {
            return Err(ImportError::InvalidLayout {
                layout: name.to_string(),
                message: format!("min_columns={} 小于所需列数 {}", min_columns, required),
            });
        }

        Ok(Self {
            name: name.to_string(),
            version,
            open_time,
            ticket,
            close_time,
            amount,
            min_columns,
        })
    }

    /// 列角色对应的列号
    pub fn column(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::OpenTime => self.open_time,
            ColumnRole::Ticket => self.ticket,
            ColumnRole::CloseTime => self.close_time,
            ColumnRole::Amount => self.amount,
        }
    }

    /// 成交行最少单元格数
    pub fn min_columns(&self) -> usize {
        self.min_columns
    }

    /// 读取某列角色的单元格文本
    pub fn cell<'a>(&self, cells: &'a [String], role: ColumnRole) -> Option<&'a str> {
        cells.get(self.column(role)).map(|s| s.as_str())
    }
}

impl Default for StatementLayout {
    fn default() -> Self {
        Self::mt4_closed_orders_v1()
    }
}

impl fmt::Display for StatementLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.name, self.version)
    }
}
