//! 交期計算（日曆天）

use chrono::NaiveDate;
use kitchen_core::{shift_date, PurchaseOrder};

/// 交期計算器
pub struct LeadTimeCalculator;

impl LeadTimeCalculator {
    /// 計算下單截止日（到貨日向前推算提前期）
    pub fn calculate_order_deadline(
        delivery_date: NaiveDate,
        lead_time_days: u32,
    ) -> kitchen_core::Result<NaiveDate> {
        shift_date(delivery_date, -i64::from(lead_time_days))
    }

    /// 計算到貨日（下單日向後推算提前期）
    pub fn calculate_delivery_date(
        order_date: NaiveDate,
        lead_time_days: u32,
    ) -> kitchen_core::Result<NaiveDate> {
        shift_date(order_date, i64::from(lead_time_days))
    }

    /// 距離下單截止日的天數（負值表示已逾期）
    pub fn days_until_deadline(order: &PurchaseOrder, today: NaiveDate) -> i64 {
        (order.order_deadline - today).num_days()
    }

    /// 檢查是否已逾下單截止日
    pub fn is_past_deadline(order: &PurchaseOrder, today: NaiveDate) -> bool {
        Self::days_until_deadline(order, today) < 0
    }
}
