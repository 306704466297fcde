//! 採購單模型

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 採購單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 草稿（自動產生、可編輯）
    Draft,
    /// 已下單
    Ordered,
    /// 部分到貨
    Partial,
    /// 全數到貨
    Received,
    /// 已取消
    Cancelled,
}

impl OrderStatus {
    /// 檢查是否為終止狀態
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Cancelled)
    }

    /// 檢查是否可收貨
    pub fn accepts_reception(self) -> bool {
        matches!(self, OrderStatus::Ordered | OrderStatus::Partial)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Ordered => "ORDERED",
            OrderStatus::Partial => "PARTIAL",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// 採購單明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub ingredient_id: String,

    /// 訂購數量
    pub quantity: Decimal,

    pub unit: String,

    pub cost_per_unit: Decimal,

    /// 累計已收數量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_quantity: Option<Decimal>,
}

impl PurchaseOrderItem {
    /// 創建新的明細
    pub fn new(ingredient_id: String, quantity: Decimal, unit: String, cost_per_unit: Decimal) -> Self {
        Self {
            ingredient_id,
            quantity,
            unit,
            cost_per_unit,
            received_quantity: None,
        }
    }

    /// 明細金額
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.cost_per_unit
    }

    /// 已收數量（未收時為 0）
    pub fn received(&self) -> Decimal {
        self.received_quantity.unwrap_or(Decimal::ZERO)
    }

    /// 檢查是否已收齊
    pub fn is_fully_received(&self) -> bool {
        self.received() >= self.quantity
    }

    /// 尚未到貨的數量
    pub fn outstanding(&self) -> Decimal {
        (self.quantity - self.received()).max(Decimal::ZERO)
    }
}

/// 採購單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,

    pub supplier_id: String,

    /// 建立日期
    #[serde(rename = "date")]
    pub created_date: NaiveDate,

    /// 預計到貨日
    pub delivery_date: NaiveDate,

    /// 下單截止日
    pub order_deadline: NaiveDate,

    pub status: OrderStatus,

    pub items: Vec<PurchaseOrderItem>,

    /// 總金額（由明細重算，不可手動編輯）
    pub total_cost: Decimal,

    /// 送出時間
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    /// 創建新的草稿採購單
    pub fn draft(
        supplier_id: String,
        created_date: NaiveDate,
        delivery_date: NaiveDate,
        order_deadline: NaiveDate,
        items: Vec<PurchaseOrderItem>,
    ) -> Self {
        let mut order = Self {
            id: Uuid::new_v4(),
            supplier_id,
            created_date,
            delivery_date,
            order_deadline,
            status: OrderStatus::Draft,
            items,
            total_cost: Decimal::ZERO,
            sent_at: None,
        };
        order.recompute_total();
        order
    }

    /// 重算總金額
    pub fn recompute_total(&mut self) {
        self.total_cost = self.items.iter().map(PurchaseOrderItem::line_total).sum();
    }

    /// 查找指定食材的明細
    pub fn item(&self, ingredient_id: &str) -> Option<&PurchaseOrderItem> {
        self.items.iter().find(|i| i.ingredient_id == ingredient_id)
    }

    /// 檢查所有明細是否已收齊
    pub fn is_fully_received(&self) -> bool {
        self.items.iter().all(PurchaseOrderItem::is_fully_received)
    }

    /// 提前期（天數）
    pub fn lead_time_days(&self) -> i64 {
        (self.delivery_date - self.order_deadline).num_days()
    }
}
