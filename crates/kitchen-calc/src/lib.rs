//! # Kitchen Calculation Engine
//!
//! 批次帳本、需求彙總與採購草稿引擎

pub mod demand;
pub mod drafting;
pub mod lead_time;
pub mod ledger;
pub mod lifecycle;
pub mod netting;
pub mod price_history;

use std::fmt;

use kitchen_core::PurchaseOrder;
use rust_decimal::Decimal;
use serde::Serialize;

// Re-export 主要類型
pub use demand::{DemandAggregator, DemandMap, DemandSummary};
pub use drafting::DraftOrderGenerator;
pub use lead_time::LeadTimeCalculator;
pub use ledger::{BatchDraw, BatchLedger, Consumption};
pub use lifecycle::{OrderLifecycle, Reception, ReceptionInput};
pub use netting::{Deficit, NettingCalculator};
pub use price_history::PriceHistoryTracker;

/// 採購草稿產生結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResult {
    /// 草稿採購單
    pub orders: Vec<PurchaseOrder>,

    /// 警告（不阻擋下單）
    pub warnings: Vec<ProcurementWarning>,
}

impl DraftResult {
    /// 創建空的結果
    pub fn empty() -> Self {
        Self::default()
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ProcurementWarning) {
        self.warnings.push(warning);
    }

    /// 供外部顯示的警告字串
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// 草稿總金額
    pub fn total_cost(&self) -> Decimal {
        self.orders.iter().map(|o| o.total_cost).sum()
    }
}

/// 採購警告
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementWarning {
    pub supplier_id: String,
    pub kind: WarningKind,
    pub message: String,
}

impl ProcurementWarning {
    /// 低於最低訂購金額
    pub fn below_minimum(supplier_name: &str, supplier_id: &str, total: Decimal, minimum: Decimal) -> Self {
        let shortfall = minimum - total;
        Self {
            supplier_id: supplier_id.to_string(),
            kind: WarningKind::BelowMinimumOrder { shortfall },
            message: format!(
                "供應商 {} 訂單金額 {:.2} 低於最低訂購金額 {:.2}，差額 {:.2}",
                supplier_name, total, minimum, shortfall
            ),
        }
    }

    /// 供應商不在名錄中
    pub fn unknown_supplier(supplier_id: &str, ingredient_id: &str) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            kind: WarningKind::UnknownSupplier,
            message: format!(
                "食材 {} 的供應商 {} 不在供應商名錄中，未產生草稿",
                ingredient_id, supplier_id
            ),
        }
    }

    /// 提前期超出可表示的日期範圍
    pub fn deadline_out_of_range(supplier_id: &str, lead_time: u32) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            kind: WarningKind::DeadlineOutOfRange,
            message: format!(
                "供應商 {} 提前期 {} 天超出日期範圍，未產生草稿",
                supplier_id, lead_time
            ),
        }
    }
}

impl fmt::Display for ProcurementWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    BelowMinimumOrder { shortfall: Decimal },
    UnknownSupplier,
    DeadlineOutOfRange,
}
