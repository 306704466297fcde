//! 採購單生命週期與收貨對帳

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kitchen_core::{
    shift_timestamp, BatchInput, EngineConfig, Ingredient, KitchenError, OrderStatus,
    PurchaseOrder,
};
use rust_decimal::Decimal;

use crate::ledger::BatchLedger;

/// 收貨輸入（本次到貨數量，累加到已收數量）
#[derive(Debug, Clone, Default)]
pub struct ReceptionInput {
    /// 食材ID → 本次到貨數量
    pub quantities: HashMap<String, Decimal>,

    /// 食材ID → 到期時間（未提供時使用預設保存期限）
    pub expiry_dates: HashMap<String, DateTime<Utc>>,
}

impl ReceptionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置到貨數量
    pub fn with_quantity(mut self, ingredient_id: &str, quantity: Decimal) -> Self {
        self.quantities.insert(ingredient_id.to_string(), quantity);
        self
    }

    /// 建構器模式：設置到期時間
    pub fn with_expiry(mut self, ingredient_id: &str, expiry: DateTime<Utc>) -> Self {
        self.expiry_dates.insert(ingredient_id.to_string(), expiry);
        self
    }
}

/// 收貨結果
#[derive(Debug, Clone)]
pub struct Reception {
    /// 更新後的採購單
    pub order: PurchaseOrder,

    /// 已新增批次的食材（只含本次有到貨的食材）
    pub ingredients: Vec<Ingredient>,
}

/// 採購單生命週期
pub struct OrderLifecycle;

impl OrderLifecycle {
    /// 下單：DRAFT → ORDERED，記錄送出時間
    pub fn mark_ordered(order: &PurchaseOrder, now: DateTime<Utc>) -> kitchen_core::Result<PurchaseOrder> {
        Self::require(order, OrderStatus::Draft, "下單")?;

        let mut next = order.clone();
        next.status = OrderStatus::Ordered;
        next.sent_at = Some(now);
        Ok(next)
    }

    /// 取消：僅限 DRAFT
    pub fn cancel(order: &PurchaseOrder) -> kitchen_core::Result<PurchaseOrder> {
        Self::require(order, OrderStatus::Draft, "取消")?;

        let mut next = order.clone();
        next.status = OrderStatus::Cancelled;
        Ok(next)
    }

    /// 檢查是否可刪除（僅限 DRAFT，避免孤立已入庫的批次）
    pub fn ensure_deletable(order: &PurchaseOrder) -> kitchen_core::Result<()> {
        Self::require(order, OrderStatus::Draft, "刪除")
    }

    /// 編輯草稿明細數量並重算總金額
    pub fn update_item_quantity(
        order: &PurchaseOrder,
        ingredient_id: &str,
        quantity: Decimal,
    ) -> kitchen_core::Result<PurchaseOrder> {
        Self::require(order, OrderStatus::Draft, "編輯")?;
        if quantity <= Decimal::ZERO {
            return Err(KitchenError::InvalidQuantity {
                ingredient_id: ingredient_id.to_string(),
                quantity,
            });
        }

        let mut next = order.clone();
        let item = next
            .items
            .iter_mut()
            .find(|i| i.ingredient_id == ingredient_id)
            .ok_or_else(|| KitchenError::IngredientNotFound(ingredient_id.to_string()))?;
        item.quantity = quantity;
        next.recompute_total();
        Ok(next)
    }

    /// 收貨並對帳回批次帳本
    ///
    /// 本次到貨數量累加到已收數量（不會減少）；每筆正數到貨新增一個批次，
    /// 單位成本取採購明細成本。全部明細收齊時為 RECEIVED，否則為 PARTIAL。
    /// 任何驗證失敗都不會產生部分更新。
    pub fn receive(
        order: &PurchaseOrder,
        ingredients: &[Ingredient],
        input: &ReceptionInput,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> kitchen_core::Result<Reception> {
        if !order.status.accepts_reception() {
            return Err(KitchenError::InvalidTransition {
                order_id: order.id,
                from: order.status,
                action: "收貨",
            });
        }

        for (ingredient_id, quantity) in &input.quantities {
            if *quantity < Decimal::ZERO {
                return Err(KitchenError::InvalidQuantity {
                    ingredient_id: ingredient_id.clone(),
                    quantity: *quantity,
                });
            }
            if order.item(ingredient_id).is_none() {
                tracing::warn!("採購單 {} 不含食材 {}，忽略到貨數量", order.id, ingredient_id);
            }
        }

        let default_expiry = shift_timestamp(now, i64::from(config.reception_shelf_life_days))?;
        let credits = Self::allocate_deliveries(order, input);

        let mut next = order.clone();
        let mut updated: Vec<Ingredient> = Vec::new();

        for (item, credit) in next.items.iter_mut().zip(credits) {
            item.received_quantity = Some(item.received() + credit);

            if credit <= Decimal::ZERO {
                continue;
            }

            // 同一食材若已在本次更新中，從更新後狀態繼續累加
            let current = match updated.iter().position(|i| i.id == item.ingredient_id) {
                Some(index) => updated.remove(index),
                None => ingredients
                    .iter()
                    .find(|i| i.id == item.ingredient_id)
                    .cloned()
                    .ok_or_else(|| KitchenError::IngredientNotFound(item.ingredient_id.clone()))?,
            };

            let expiry = input
                .expiry_dates
                .get(&item.ingredient_id)
                .copied()
                .unwrap_or(default_expiry);
            let batch = BatchInput::new(credit, item.cost_per_unit, now, expiry);
            updated.push(BatchLedger::add_batch(&current, batch, now, config)?);
        }

        next.status = if next.is_fully_received() {
            OrderStatus::Received
        } else {
            OrderStatus::Partial
        };

        tracing::info!(
            "採購單 {} 收貨完成，狀態 {} → {}，新增批次食材 {} 筆",
            order.id,
            order.status,
            next.status,
            updated.len()
        );

        Ok(Reception {
            order: next,
            ingredients: updated,
        })
    }

    /// 將每個食材的到貨數量分配到明細（每筆到貨只入帳一次）
    ///
    /// 同一食材出現在多筆明細時，依明細順序先補足未到數量；超收部分記在第一筆明細。
    fn allocate_deliveries(order: &PurchaseOrder, input: &ReceptionInput) -> Vec<Decimal> {
        let mut remaining: HashMap<&str, Decimal> = input
            .quantities
            .iter()
            .filter(|(_, quantity)| **quantity > Decimal::ZERO)
            .map(|(id, quantity)| (id.as_str(), *quantity))
            .collect();

        let mut credits = vec![Decimal::ZERO; order.items.len()];
        for (credit, item) in credits.iter_mut().zip(&order.items) {
            if let Some(rest) = remaining.get_mut(item.ingredient_id.as_str()) {
                let portion = (*rest).min(item.outstanding());
                *credit += portion;
                *rest -= portion;
            }
        }

        for (credit, item) in credits.iter_mut().zip(&order.items) {
            if let Some(rest) = remaining.get_mut(item.ingredient_id.as_str()) {
                *credit += *rest;
                *rest = Decimal::ZERO;
            }
        }

        credits
    }

    fn require(order: &PurchaseOrder, expected: OrderStatus, action: &'static str) -> kitchen_core::Result<()> {
        if order.status != expected {
            return Err(KitchenError::InvalidTransition {
                order_id: order.id,
                from: order.status,
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use kitchen_core::PurchaseOrderItem;
    use rust_decimal_macros::dec;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 7, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn draft() -> PurchaseOrder {
        PurchaseOrder::draft(
            "SUP-MILL".to_string(),
            date(1),
            date(15),
            date(12),
            vec![
                PurchaseOrderItem::new("FLOUR".to_string(), dec!(10), "kg".to_string(), dec!(1.40)),
                PurchaseOrderItem::new("SUGAR".to_string(), dec!(4), "kg".to_string(), dec!(2.00)),
            ],
        )
    }

    fn pantry() -> Vec<Ingredient> {
        let config = EngineConfig::default();
        ["FLOUR", "SUGAR"]
            .iter()
            .map(|id| {
                let ingredient = Ingredient::new(id.to_string(), id.to_string(), "kg".to_string(), dec!(1));
                BatchLedger::initialize_batches(&ingredient, at(1), &config).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_mark_ordered_sets_sent_at() {
        let ordered = OrderLifecycle::mark_ordered(&draft(), at(2)).unwrap();
        assert_eq!(ordered.status, OrderStatus::Ordered);
        assert_eq!(ordered.sent_at, Some(at(2)));

        assert!(matches!(
            OrderLifecycle::mark_ordered(&ordered, at(3)),
            Err(KitchenError::InvalidTransition { from: OrderStatus::Ordered, .. })
        ));
    }

    #[test]
    fn test_cancel_and_delete_only_from_draft() {
        let order = draft();
        assert_eq!(OrderLifecycle::cancel(&order).unwrap().status, OrderStatus::Cancelled);
        assert!(OrderLifecycle::ensure_deletable(&order).is_ok());

        let ordered = OrderLifecycle::mark_ordered(&order, at(2)).unwrap();
        assert!(OrderLifecycle::cancel(&ordered).is_err());
        assert!(OrderLifecycle::ensure_deletable(&ordered).is_err());
    }

    #[test]
    fn test_reception_is_monotonic() {
        let config = EngineConfig::default();
        let ordered = OrderLifecycle::mark_ordered(&draft(), at(2)).unwrap();
        let ingredients = pantry();

        let first = OrderLifecycle::receive(
            &ordered,
            &ingredients,
            &ReceptionInput::new().with_quantity("FLOUR", dec!(6)).with_quantity("SUGAR", dec!(4)),
            at(10),
            &config,
        )
        .unwrap();

        assert_eq!(first.order.status, OrderStatus::Partial);
        assert_eq!(first.order.item("FLOUR").unwrap().received_quantity, Some(dec!(6)));
        let flour = first.ingredients.iter().find(|i| i.id == "FLOUR").unwrap();
        assert_eq!(flour.stock, dec!(6));
        assert_eq!(flour.batches()[0].unit_cost, dec!(1.40));
        assert_eq!(flour.batches()[0].expiry_date, at(10) + Duration::days(30));

        // 第二次到貨只送 FLOUR 4，SUGAR 保持已收 4
        let second = OrderLifecycle::receive(
            &first.order,
            &first.ingredients,
            &ReceptionInput::new().with_quantity("FLOUR", dec!(4)),
            at(11),
            &config,
        )
        .unwrap();

        assert_eq!(second.order.status, OrderStatus::Received);
        assert_eq!(second.order.item("FLOUR").unwrap().received_quantity, Some(dec!(10)));
        assert_eq!(second.order.item("SUGAR").unwrap().received_quantity, Some(dec!(4)));
        assert_eq!(second.ingredients.len(), 1);
        assert_eq!(second.ingredients[0].stock, dec!(10));
        assert_eq!(second.ingredients[0].batches().len(), 2);
    }

    #[test]
    fn test_empty_reception_marks_partial_with_zero_received() {
        let ordered = OrderLifecycle::mark_ordered(&draft(), at(2)).unwrap();
        let reception = OrderLifecycle::receive(
            &ordered,
            &pantry(),
            &ReceptionInput::new(),
            at(3),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(reception.order.status, OrderStatus::Partial);
        assert!(reception.order.items.iter().all(|i| i.received_quantity == Some(Decimal::ZERO)));
        assert!(reception.ingredients.is_empty());
    }

    #[test]
    fn test_reception_rejections_leave_order_untouched() {
        let config = EngineConfig::default();
        let order = draft();
        let input = ReceptionInput::new().with_quantity("FLOUR", dec!(1));

        // DRAFT 不可收貨
        assert!(matches!(
            OrderLifecycle::receive(&order, &pantry(), &input, at(3), &config),
            Err(KitchenError::InvalidTransition { from: OrderStatus::Draft, .. })
        ));

        let cancelled = OrderLifecycle::cancel(&order).unwrap();
        assert!(OrderLifecycle::receive(&cancelled, &pantry(), &input, at(3), &config).is_err());

        let ordered = OrderLifecycle::mark_ordered(&order, at(2)).unwrap();
        let negative = ReceptionInput::new().with_quantity("FLOUR", dec!(-2));
        assert!(matches!(
            OrderLifecycle::receive(&ordered, &pantry(), &negative, at(3), &config),
            Err(KitchenError::InvalidQuantity { .. })
        ));

        // 找不到食材時整筆中止
        assert!(matches!(
            OrderLifecycle::receive(&ordered, &[], &input, at(3), &config),
            Err(KitchenError::IngredientNotFound(_))
        ));
        assert_eq!(ordered.status, OrderStatus::Ordered);
    }

    #[test]
    fn test_custom_expiry() {
        let ordered = OrderLifecycle::mark_ordered(&draft(), at(2)).unwrap();
        let input = ReceptionInput::new()
            .with_quantity("SUGAR", dec!(4))
            .with_expiry("SUGAR", at(28));

        let reception =
            OrderLifecycle::receive(&ordered, &pantry(), &input, at(3), &EngineConfig::default()).unwrap();
        assert_eq!(reception.ingredients[0].batches()[0].expiry_date, at(28));
    }

    #[test]
    fn test_update_draft_item_quantity() {
        let order = draft();
        let edited = OrderLifecycle::update_item_quantity(&order, "SUGAR", dec!(10)).unwrap();
        // 10 × 1.40 + 10 × 2.00
        assert_eq!(edited.total_cost, dec!(34.00));

        assert!(OrderLifecycle::update_item_quantity(&order, "SALT", dec!(1)).is_err());
        assert!(OrderLifecycle::update_item_quantity(&order, "SUGAR", dec!(0)).is_err());
    }

    #[test]
    fn test_repeated_ingredient_lines_credit_delivery_once() {
        let config = EngineConfig::default();
        let order = PurchaseOrder::draft(
            "SUP-MILL".to_string(),
            date(1),
            date(15),
            date(12),
            vec![
                PurchaseOrderItem::new("FLOUR".to_string(), dec!(10), "kg".to_string(), dec!(1.40)),
                PurchaseOrderItem::new("FLOUR".to_string(), dec!(5), "kg".to_string(), dec!(1.50)),
            ],
        );
        let ordered = OrderLifecycle::mark_ordered(&order, at(2)).unwrap();

        let first = OrderLifecycle::receive(
            &ordered,
            &pantry(),
            &ReceptionInput::new().with_quantity("FLOUR", dec!(12)),
            at(10),
            &config,
        )
        .unwrap();

        assert_eq!(first.order.status, OrderStatus::Partial);
        assert_eq!(first.order.items[0].received_quantity, Some(dec!(10)));
        assert_eq!(first.order.items[1].received_quantity, Some(dec!(2)));
        let flour = &first.ingredients[0];
        assert_eq!(first.ingredients.len(), 1);
        assert_eq!(flour.stock, dec!(12));
        assert_eq!(flour.batches()[0].unit_cost, dec!(1.40));
        assert_eq!(flour.batches()[1].unit_cost, dec!(1.50));

        let second = OrderLifecycle::receive(
            &first.order,
            &first.ingredients,
            &ReceptionInput::new().with_quantity("FLOUR", dec!(3)),
            at(11),
            &config,
        )
        .unwrap();
        assert_eq!(second.order.status, OrderStatus::Received);
        assert_eq!(second.order.items[1].received_quantity, Some(dec!(5)));
        assert_eq!(second.ingredients[0].stock, dec!(15));
    }

    #[test]
    fn test_over_delivery_lands_on_first_line() {
        let ordered = OrderLifecycle::mark_ordered(&draft(), at(2)).unwrap();
        let reception = OrderLifecycle::receive(
            &ordered,
            &pantry(),
            &ReceptionInput::new().with_quantity("SUGAR", dec!(7)),
            at(3),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(reception.order.item("SUGAR").unwrap().received_quantity, Some(dec!(7)));
        assert_eq!(reception.ingredients[0].stock, dec!(7));
    }

    #[test]
    fn test_unrepresentable_default_expiry_is_rejected() {
        let config = EngineConfig::default().with_reception_shelf_life(u32::MAX);
        let ordered = OrderLifecycle::mark_ordered(&draft(), at(2)).unwrap();
        assert!(matches!(
            OrderLifecycle::receive(
                &ordered,
                &pantry(),
                &ReceptionInput::new().with_quantity("FLOUR", dec!(1)),
                at(3),
                &config,
            ),
            Err(KitchenError::InvalidDate(_))
        ));
    }
}
