//! 供應商模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 供應商
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// 供應商ID
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// 交貨提前期（天）
    #[serde(default)]
    pub lead_time: u32,

    /// 最低訂購金額
    #[serde(default)]
    pub minimum_order_value: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Supplier {
    /// 創建新的供應商
    pub fn new(id: String, name: String, lead_time: u32) -> Self {
        Self {
            id,
            name,
            lead_time,
            minimum_order_value: Decimal::ZERO,
            contact_name: None,
            email: None,
            phone: None,
        }
    }

    /// 建構器模式：設置最低訂購金額
    pub fn with_minimum_order_value(mut self, value: Decimal) -> Self {
        self.minimum_order_value = value;
        self
    }

    /// 建構器模式：設置聯絡資訊
    pub fn with_contact(mut self, name: String, email: Option<String>, phone: Option<String>) -> Self {
        self.contact_name = Some(name);
        self.email = email;
        self.phone = phone;
        self
    }

    /// 低於最低訂購金額的差額（未低於時為 None）
    pub fn minimum_order_shortfall(&self, total: Decimal) -> Option<Decimal> {
        if total < self.minimum_order_value {
            Some(self.minimum_order_value - total)
        } else {
            None
        }
    }
}
