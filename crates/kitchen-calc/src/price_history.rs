//! 價格歷史追蹤

use chrono::{DateTime, Utc};
use kitchen_core::{Ingredient, PriceHistoryEntry};

/// 價格歷史追蹤器
pub struct PriceHistoryTracker;

impl PriceHistoryTracker {
    /// 套用食材更新並追加價格記錄
    ///
    /// 比較的是已儲存的 `previous.cost_per_unit`，而非更新內容附帶的歷史；
    /// 更新內容中的 `price_history` 一律以已儲存版本取代，避免過期或空陣列覆蓋歷史。
    /// 不會拒絕更新，也不會改動庫存或批次。
    pub fn track(
        previous: &Ingredient,
        mut updated: Ingredient,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Ingredient {
        let mut history = previous.price_history.clone();

        if updated.cost_per_unit != previous.cost_per_unit {
            tracing::debug!(
                "食材 {} 單價變動 {} → {}",
                previous.id,
                previous.cost_per_unit,
                updated.cost_per_unit
            );
            history.get_or_insert_with(Vec::new).push(PriceHistoryEntry::new(
                now,
                updated.cost_per_unit,
                reason.to_string(),
            ));
        }

        updated.price_history = history;
        updated
    }

    /// 指定時間點的有效單價（該時間之前最後一筆記錄）
    pub fn price_at(ingredient: &Ingredient, at: DateTime<Utc>) -> Option<rust_decimal::Decimal> {
        ingredient
            .price_history()
            .iter()
            .take_while(|entry| entry.date <= at)
            .last()
            .map(|entry| entry.price)
    }
}
