//! 庫存與採購狀態容器
//!
//! 呼叫端持有並注入 `KitchenStore`。每個食材位於獨立的互斥鎖內並帶有版本號，
//! 同一食材的扣庫/入庫依序執行；跨食材操作一律依食材ID排序加鎖，
//! 並在全部驗證通過後才寫回。

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use kitchen_calc::{
    BatchLedger, Consumption, DemandAggregator, DemandMap, DraftOrderGenerator, DraftResult,
    OrderLifecycle, PriceHistoryTracker, ReceptionInput,
};
use kitchen_core::{
    BatchInput, EngineConfig, Event, Ingredient, IngredientBatch, KitchenError, OrderStatus,
    PurchaseOrder, Recipe, Supplier,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::dirty_tracking::DirtyTracker;

/// 帶版本號的食材記錄
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionedIngredient {
    pub ingredient: Ingredient,
    pub version: u64,
}

type IngredientSlot = Arc<Mutex<VersionedIngredient>>;
type OrderSlot = Arc<Mutex<PurchaseOrder>>;

/// 庫存與採購狀態容器
pub struct KitchenStore {
    config: EngineConfig,
    ingredients: DashMap<String, IngredientSlot>,
    suppliers: DashMap<String, Supplier>,
    orders: DashMap<Uuid, OrderSlot>,
    dirty: DirtyTracker,
}

impl KitchenStore {
    /// 創建新的狀態容器
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ingredients: DashMap::new(),
            suppliers: DashMap::new(),
            orders: DashMap::new(),
            dirty: DirtyTracker::new(),
        }
    }

    /// 獲取配置引用
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // 目錄載入
    // ------------------------------------------------------------------

    /// 載入食材目錄，並在載入時完成批次初始化
    pub fn load_catalogue(&self, catalogue: Vec<Ingredient>, now: DateTime<Utc>) -> kitchen_core::Result<()> {
        tracing::info!("載入食材目錄 {} 筆", catalogue.len());

        for ingredient in catalogue {
            let normalized = BatchLedger::initialize_batches(&ingredient, now, &self.config)?;
            let id = normalized.id.clone();

            let existing = self.ingredients.get(&id).map(|slot| Arc::clone(slot.value()));
            match existing {
                Some(slot) => {
                    let mut guard = Self::lock_ingredient(&slot, &id)?;
                    guard.ingredient = normalized;
                    guard.version += 1;
                }
                None => {
                    self.ingredients.insert(
                        id.clone(),
                        Arc::new(Mutex::new(VersionedIngredient {
                            ingredient: normalized,
                            version: 0,
                        })),
                    );
                }
            }
            self.dirty.mark_dirty(&id);
        }
        Ok(())
    }

    /// 載入供應商名錄
    pub fn load_suppliers(&self, suppliers: Vec<Supplier>) {
        for supplier in suppliers {
            self.suppliers.insert(supplier.id.clone(), supplier);
        }
    }

    /// 供應商名錄（依ID排序）
    pub fn suppliers(&self) -> Vec<Supplier> {
        let mut suppliers: Vec<Supplier> = self.suppliers.iter().map(|s| s.value().clone()).collect();
        suppliers.sort_by(|a, b| a.id.cmp(&b.id));
        suppliers
    }

    // ------------------------------------------------------------------
    // 食材與批次帳本
    // ------------------------------------------------------------------

    /// 讀取單一食材（含版本號）
    pub fn ingredient(&self, ingredient_id: &str) -> kitchen_core::Result<VersionedIngredient> {
        let slot = self.ingredient_slot(ingredient_id)?;
        let guard = Self::lock_ingredient(&slot, ingredient_id)?;
        Ok(guard.clone())
    }

    /// 食材目錄快照（依ID排序）
    pub fn snapshot(&self) -> kitchen_core::Result<Vec<Ingredient>> {
        let slots: Vec<(String, IngredientSlot)> = self
            .ingredients
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut catalogue = Vec::with_capacity(slots.len());
        for (id, slot) in &slots {
            catalogue.push(Self::lock_ingredient(slot, id)?.ingredient.clone());
        }
        catalogue.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(catalogue)
    }

    /// 更新食材資料（單價變動時追加價格歷史）
    ///
    /// 庫存與批次只能經由批次帳本變動，更新內容中的這兩個欄位會被忽略。
    pub fn update_ingredient(
        &self,
        updated: Ingredient,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> kitchen_core::Result<Ingredient> {
        let id = updated.id.clone();
        let slot = self.ingredient_slot(&id)?;
        let mut guard = Self::lock_ingredient(&slot, &id)?;

        let reason = reason.unwrap_or(self.config.default_price_reason.as_str());
        let mut next = PriceHistoryTracker::track(&guard.ingredient, updated, reason, now);
        next.stock = guard.ingredient.stock;
        next.batches = guard.ingredient.batches.clone();

        Self::commit(&mut guard, next.clone());
        self.dirty.mark_dirty(&id);
        tracing::debug!("食材 {} 資料已更新，版本 {}", id, guard.version);
        Ok(next)
    }

    /// 新增批次
    pub fn add_batch(
        &self,
        ingredient_id: &str,
        input: BatchInput,
        now: DateTime<Utc>,
    ) -> kitchen_core::Result<Ingredient> {
        let slot = self.ingredient_slot(ingredient_id)?;
        let mut guard = Self::lock_ingredient(&slot, ingredient_id)?;

        let next = BatchLedger::add_batch(&guard.ingredient, input, now, &self.config)?;
        Self::commit(&mut guard, next.clone());
        self.dirty.mark_dirty(ingredient_id);
        Ok(next)
    }

    /// 先進先出扣庫
    pub fn consume(&self, ingredient_id: &str, quantity: Decimal) -> kitchen_core::Result<Consumption> {
        let slot = self.ingredient_slot(ingredient_id)?;
        let mut guard = Self::lock_ingredient(&slot, ingredient_id)?;

        let consumption = BatchLedger::consume(&guard.ingredient, quantity)?;
        Self::commit(&mut guard, consumption.ingredient.clone());
        self.dirty.mark_dirty(ingredient_id);
        Ok(consumption)
    }

    /// 記錄報廢
    pub fn record_waste(
        &self,
        ingredient_id: &str,
        quantity: Decimal,
        reason: &str,
    ) -> kitchen_core::Result<Consumption> {
        let consumption = self.consume(ingredient_id, quantity)?;
        tracing::info!(
            "食材 {} 報廢 {}（{}），成本 {}",
            ingredient_id,
            quantity,
            reason,
            consumption.cost()
        );
        Ok(consumption)
    }

    /// 記錄生產用料（整份食譜一次扣庫，任一食材不足則全部不扣）
    pub fn record_production(
        &self,
        recipe: &Recipe,
        servings: Decimal,
    ) -> kitchen_core::Result<Vec<Consumption>> {
        if servings <= Decimal::ZERO {
            return Err(KitchenError::InvalidQuantity {
                ingredient_id: recipe.id.clone(),
                quantity: servings,
            });
        }

        let mut requirements = recipe.requirements_for(servings);
        if let Some(line) = requirements.iter().find(|line| line.quantity <= Decimal::ZERO) {
            return Err(KitchenError::InvalidQuantity {
                ingredient_id: line.ingredient_id.clone(),
                quantity: line.quantity,
            });
        }
        requirements.sort_by(|a, b| a.ingredient_id.cmp(&b.ingredient_id));

        let slots = requirements
            .iter()
            .map(|line| self.ingredient_slot(&line.ingredient_id).map(|slot| (line, slot)))
            .collect::<kitchen_core::Result<Vec<_>>>()?;

        // 依ID排序加鎖
        let mut guards = Vec::with_capacity(slots.len());
        for (line, slot) in &slots {
            guards.push((*line, Self::lock_ingredient(slot, &line.ingredient_id)?));
        }

        for (line, guard) in &guards {
            BatchLedger::check_available(&guard.ingredient, line.quantity)?;
        }

        let mut consumptions = Vec::with_capacity(guards.len());
        for (line, guard) in guards.iter_mut() {
            let consumption = BatchLedger::consume(&guard.ingredient, line.quantity)?;
            Self::commit(guard, consumption.ingredient.clone());
            self.dirty.mark_dirty(&line.ingredient_id);
            consumptions.push(consumption);
        }

        tracing::info!(
            "食譜 {} 生產 {} 份，扣庫食材 {} 筆",
            recipe.id,
            servings,
            consumptions.len()
        );
        Ok(consumptions)
    }

    /// 樂觀鎖寫入：版本號相符時才取代，回傳新版本號
    ///
    /// 寫入內容必須已有批次且無負數批次；價格歷史一律沿用既有記錄，
    /// 單價變動時依預設原因追加一筆。
    pub fn compare_and_swap(
        &self,
        expected_version: u64,
        ingredient: Ingredient,
        now: DateTime<Utc>,
    ) -> kitchen_core::Result<u64> {
        let id = ingredient.id.clone();
        let slot = self.ingredient_slot(&id)?;
        let mut guard = Self::lock_ingredient(&slot, &id)?;

        if guard.version != expected_version {
            return Err(KitchenError::VersionConflict {
                ingredient_id: id,
                expected: expected_version,
                actual: guard.version,
            });
        }

        if !ingredient.has_batches() {
            return Err(KitchenError::BatchesNotInitialized(id));
        }
        if let Some(negative) = ingredient.batches().iter().find(|b| b.quantity < Decimal::ZERO) {
            return Err(KitchenError::InvalidQuantity {
                ingredient_id: id,
                quantity: negative.quantity,
            });
        }

        let mut next = PriceHistoryTracker::track(
            &guard.ingredient,
            ingredient,
            &self.config.default_price_reason,
            now,
        );
        next.recompute_stock();
        Self::commit(&mut guard, next);
        self.dirty.mark_dirty(&id);
        Ok(guard.version)
    }

    /// 封存已耗盡的批次
    pub fn archive_drained_batches(&self, ingredient_id: &str) -> kitchen_core::Result<Vec<IngredientBatch>> {
        let slot = self.ingredient_slot(ingredient_id)?;
        let mut guard = Self::lock_ingredient(&slot, ingredient_id)?;

        let (next, archived) = BatchLedger::archive_drained_batches(&guard.ingredient);
        if !archived.is_empty() {
            Self::commit(&mut guard, next);
            tracing::debug!("食材 {} 封存 {} 個耗盡批次", ingredient_id, archived.len());
        }
        Ok(archived)
    }

    // ------------------------------------------------------------------
    // 採購草稿
    // ------------------------------------------------------------------

    /// 依活動需求產生採購草稿並存入
    ///
    /// 草稿依快照計算；之後若庫存變動，`drafts_are_stale` 會回傳 true，重新產生即可。
    /// 重新產生時取代所有仍為 DRAFT 的採購單，已下單的採購單不受影響。
    pub fn generate_drafts(&self, events: &[Event], today: NaiveDate) -> kitchen_core::Result<DraftResult> {
        self.draft_from(DemandAggregator::aggregate(events), today)
    }

    /// 只計入計劃時界內（今天起 `planning_horizon_days` 天）的活動
    pub fn generate_horizon_drafts(
        &self,
        events: &[Event],
        today: NaiveDate,
    ) -> kitchen_core::Result<DraftResult> {
        let demand =
            DemandAggregator::aggregate_horizon(events, today, self.config.planning_horizon_days);
        self.draft_from(demand, today)
    }

    fn draft_from(&self, demand: DemandMap, today: NaiveDate) -> kitchen_core::Result<DraftResult> {
        self.dirty.clear();
        let catalogue = self.snapshot()?;
        let suppliers = self.suppliers();

        let result = DraftOrderGenerator::generate(&catalogue, &demand, &suppliers, today, &self.config);

        let discarded = self.discard_drafts()?;
        if discarded > 0 {
            tracing::debug!("取代舊草稿 {} 張", discarded);
        }
        for order in &result.orders {
            self.insert_order(order.clone());
        }
        Ok(result)
    }

    /// 上次產生草稿後是否有庫存變動
    pub fn drafts_are_stale(&self) -> bool {
        self.dirty.has_changes()
    }

    /// 上次產生草稿後有變動的食材
    pub fn dirty_ingredients(&self) -> Vec<String> {
        self.dirty.get_dirty_ingredients()
    }

    // ------------------------------------------------------------------
    // 採購單生命週期
    // ------------------------------------------------------------------

    /// 存入採購單
    pub fn insert_order(&self, order: PurchaseOrder) {
        self.orders.insert(order.id, Arc::new(Mutex::new(order)));
    }

    /// 讀取採購單
    pub fn order(&self, order_id: Uuid) -> kitchen_core::Result<PurchaseOrder> {
        let slot = self.order_slot(order_id)?;
        let guard = Self::lock_order(&slot, order_id)?;
        Ok(guard.clone())
    }

    /// 所有採購單（依建立日期、供應商排序）
    pub fn orders(&self) -> kitchen_core::Result<Vec<PurchaseOrder>> {
        let slots: Vec<(Uuid, OrderSlot)> = self
            .orders
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut orders = Vec::with_capacity(slots.len());
        for (id, slot) in &slots {
            orders.push(Self::lock_order(slot, *id)?.clone());
        }
        orders.sort_by(|a, b| {
            (a.created_date, &a.supplier_id, a.id).cmp(&(b.created_date, &b.supplier_id, b.id))
        });
        Ok(orders)
    }

    /// 下單
    pub fn mark_ordered(&self, order_id: Uuid, now: DateTime<Utc>) -> kitchen_core::Result<PurchaseOrder> {
        self.transition(order_id, |order| OrderLifecycle::mark_ordered(order, now))
    }

    /// 取消
    pub fn cancel_order(&self, order_id: Uuid) -> kitchen_core::Result<PurchaseOrder> {
        self.transition(order_id, OrderLifecycle::cancel)
    }

    /// 編輯草稿明細數量
    pub fn update_order_item(
        &self,
        order_id: Uuid,
        ingredient_id: &str,
        quantity: Decimal,
    ) -> kitchen_core::Result<PurchaseOrder> {
        self.transition(order_id, |order| {
            OrderLifecycle::update_item_quantity(order, ingredient_id, quantity)
        })
    }

    /// 刪除採購單（僅限 DRAFT）
    pub fn delete_order(&self, order_id: Uuid) -> kitchen_core::Result<PurchaseOrder> {
        let slot = self.order_slot(order_id)?;
        let mut guard = Self::lock_order(&slot, order_id)?;
        OrderLifecycle::ensure_deletable(&guard)?;

        let deleted = guard.clone();
        // 已持有舊引用的並行操作會看到取消狀態而被拒絕
        *guard = OrderLifecycle::cancel(&deleted)?;
        self.orders.remove(&order_id);
        Ok(deleted)
    }

    /// 收貨並將到貨數量入庫為新批次
    pub fn receive(
        &self,
        order_id: Uuid,
        input: &ReceptionInput,
        now: DateTime<Utc>,
    ) -> kitchen_core::Result<PurchaseOrder> {
        let order_slot = self.order_slot(order_id)?;
        let mut order_guard = Self::lock_order(&order_slot, order_id)?;

        let mut touched: Vec<String> = order_guard
            .items
            .iter()
            .filter(|item| {
                input
                    .quantities
                    .get(&item.ingredient_id)
                    .is_some_and(|q| *q > Decimal::ZERO)
            })
            .map(|item| item.ingredient_id.clone())
            .collect();
        touched.sort();
        touched.dedup();

        let slots = touched
            .iter()
            .map(|id| self.ingredient_slot(id).map(|slot| (id.as_str(), slot)))
            .collect::<kitchen_core::Result<Vec<_>>>()?;

        // 依ID排序加鎖
        let mut guards = Vec::with_capacity(slots.len());
        for (id, slot) in &slots {
            guards.push((*id, Self::lock_ingredient(slot, id)?));
        }

        let current: Vec<Ingredient> = guards.iter().map(|(_, g)| g.ingredient.clone()).collect();
        let reception = OrderLifecycle::receive(&*order_guard, &current, input, now, &self.config)?;

        for updated in reception.ingredients {
            if let Some((_, guard)) = guards.iter_mut().find(|(id, _)| *id == updated.id.as_str()) {
                self.dirty.mark_dirty(&updated.id);
                Self::commit(guard, updated);
            }
        }

        *order_guard = reception.order.clone();
        Ok(reception.order)
    }

    // ------------------------------------------------------------------
    // 內部工具
    // ------------------------------------------------------------------

    /// 移除所有 DRAFT 採購單，回傳移除數量
    fn discard_drafts(&self) -> kitchen_core::Result<usize> {
        let slots: Vec<(Uuid, OrderSlot)> = self
            .orders
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut discarded = 0;
        for (id, slot) in &slots {
            let mut guard = Self::lock_order(slot, *id)?;
            if guard.status != OrderStatus::Draft {
                continue;
            }
            // 與 delete_order 相同：先在鎖內改為取消，持有舊引用的操作會被拒絕
            *guard = OrderLifecycle::cancel(&*guard)?;
            self.orders.remove(id);
            discarded += 1;
        }
        Ok(discarded)
    }

    fn transition<F>(&self, order_id: Uuid, apply: F) -> kitchen_core::Result<PurchaseOrder>
    where
        F: FnOnce(&PurchaseOrder) -> kitchen_core::Result<PurchaseOrder>,
    {
        let slot = self.order_slot(order_id)?;
        let mut guard = Self::lock_order(&slot, order_id)?;
        let next = apply(&*guard)?;
        *guard = next.clone();
        Ok(next)
    }

    fn commit(guard: &mut MutexGuard<'_, VersionedIngredient>, ingredient: Ingredient) {
        guard.ingredient = ingredient;
        guard.version += 1;
    }

    fn ingredient_slot(&self, ingredient_id: &str) -> kitchen_core::Result<IngredientSlot> {
        self.ingredients
            .get(ingredient_id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| KitchenError::IngredientNotFound(ingredient_id.to_string()))
    }

    fn order_slot(&self, order_id: Uuid) -> kitchen_core::Result<OrderSlot> {
        self.orders
            .get(&order_id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(KitchenError::OrderNotFound(order_id))
    }

    fn lock_ingredient<'a>(
        slot: &'a IngredientSlot,
        ingredient_id: &str,
    ) -> kitchen_core::Result<MutexGuard<'a, VersionedIngredient>> {
        slot.lock()
            .map_err(|_| KitchenError::LockPoisoned(ingredient_id.to_string()))
    }

    fn lock_order(slot: &OrderSlot, order_id: Uuid) -> kitchen_core::Result<MutexGuard<'_, PurchaseOrder>> {
        slot.lock()
            .map_err(|_| KitchenError::LockPoisoned(order_id.to_string()))
    }
}

impl Default for KitchenStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kitchen_core::Menu;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::thread;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 8, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn seeded() -> KitchenStore {
        let store = KitchenStore::default();
        store
            .load_catalogue(
                vec![
                    Ingredient::new("FLOUR".to_string(), "麵粉".to_string(), "kg".to_string(), dec!(1.50))
                        .with_legacy_stock(dec!(20))
                        .with_min_stock(dec!(10))
                        .with_supplier_id("SUP-MILL".to_string()),
                    Ingredient::new("EGG".to_string(), "雞蛋".to_string(), "pcs".to_string(), dec!(0.20))
                        .with_legacy_stock(dec!(12))
                        .with_supplier_id("SUP-MILL".to_string()),
                ],
                at(1),
            )
            .unwrap();
        store.load_suppliers(vec![Supplier::new("SUP-MILL".to_string(), "磨坊".to_string(), 3)]);
        store
    }

    #[test]
    fn test_load_initializes_batches() {
        let store = seeded();
        let flour = store.ingredient("FLOUR").unwrap();
        assert_eq!(flour.version, 0);
        assert_eq!(flour.ingredient.batches().len(), 1);
        assert_eq!(flour.ingredient.stock, dec!(20));
        assert!(store.drafts_are_stale());
    }

    #[test]
    fn test_consume_bumps_version_and_marks_dirty() {
        let store = seeded();
        store.generate_drafts(&[], date(1)).unwrap();
        assert!(!store.drafts_are_stale());

        let consumption = store.consume("FLOUR", dec!(5)).unwrap();
        assert_eq!(consumption.ingredient.stock, dec!(15));
        assert_eq!(store.ingredient("FLOUR").unwrap().version, 1);
        assert_eq!(store.dirty_ingredients(), vec!["FLOUR".to_string()]);
    }

    #[test]
    fn test_unknown_ingredient() {
        let store = seeded();
        assert!(matches!(
            store.consume("SAFFRON", dec!(1)),
            Err(KitchenError::IngredientNotFound(_))
        ));
    }

    #[test]
    fn test_production_is_all_or_nothing() {
        let store = seeded();
        let omelette = Recipe::new("R-OMELETTE".to_string(), "歐姆蛋".to_string())
            .with_line("EGG", dec!(3))
            .with_line("FLOUR", dec!(0.1));

        // 5 份需要 15 顆蛋，只有 12 顆
        assert!(matches!(
            store.record_production(&omelette, dec!(5)),
            Err(KitchenError::InsufficientStock { .. })
        ));
        assert_eq!(store.ingredient("FLOUR").unwrap().ingredient.stock, dec!(20));
        assert_eq!(store.ingredient("EGG").unwrap().ingredient.stock, dec!(12));

        let consumptions = store.record_production(&omelette, dec!(4)).unwrap();
        assert_eq!(consumptions.len(), 2);
        assert_eq!(store.ingredient("EGG").unwrap().ingredient.stock, dec!(0));
        assert_eq!(store.ingredient("FLOUR").unwrap().ingredient.stock, dec!(19.6));
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    fn test_waste_rejects_non_positive(#[case] quantity: Decimal) {
        let store = seeded();
        assert!(matches!(
            store.record_waste("FLOUR", quantity, "過期"),
            Err(KitchenError::InvalidQuantity { .. })
        ));
        assert_eq!(store.ingredient("FLOUR").unwrap().version, 0);
    }

    #[rstest]
    #[case(dec!(-3), dec!(3))]
    #[case(dec!(0), dec!(3))]
    #[case(dec!(2), dec!(0))]
    #[case(dec!(2), dec!(-1))]
    fn test_production_rejects_non_positive(#[case] servings: Decimal, #[case] per_serving: Decimal) {
        let store = seeded();
        let recipe = Recipe::new("R-OMELETTE".to_string(), "歐姆蛋".to_string())
            .with_line("EGG", per_serving)
            .with_line("FLOUR", dec!(0.1));

        assert!(matches!(
            store.record_production(&recipe, servings),
            Err(KitchenError::InvalidQuantity { .. })
        ));
        assert_eq!(store.ingredient("EGG").unwrap().ingredient.stock, dec!(12));
        assert_eq!(store.ingredient("EGG").unwrap().version, 0);
        assert_eq!(store.ingredient("FLOUR").unwrap().version, 0);
    }

    #[test]
    fn test_compare_and_swap_detects_conflict() {
        let store = seeded();
        let read = store.ingredient("EGG").unwrap();
        store.consume("EGG", dec!(2)).unwrap();

        let result = store.compare_and_swap(read.version, read.ingredient.clone(), at(2));
        assert!(matches!(
            result,
            Err(KitchenError::VersionConflict { expected: 0, actual: 1, .. })
        ));

        let fresh = store.ingredient("EGG").unwrap();
        assert_eq!(store.compare_and_swap(fresh.version, fresh.ingredient, at(2)).unwrap(), 2);
    }

    #[test]
    fn test_compare_and_swap_rejects_broken_batches() {
        let store = seeded();

        let mut negative = store.ingredient("FLOUR").unwrap().ingredient;
        if let Some(batches) = negative.batches.as_mut() {
            batches[0].quantity = dec!(-5);
        }
        assert!(matches!(
            store.compare_and_swap(0, negative, at(2)),
            Err(KitchenError::InvalidQuantity { quantity, .. }) if quantity == dec!(-5)
        ));

        let mut missing = store.ingredient("FLOUR").unwrap().ingredient;
        missing.batches = None;
        assert!(matches!(
            store.compare_and_swap(0, missing, at(2)),
            Err(KitchenError::BatchesNotInitialized(_))
        ));

        let flour = store.ingredient("FLOUR").unwrap();
        assert_eq!(flour.version, 0);
        assert_eq!(flour.ingredient.stock, dec!(20));
    }

    #[test]
    fn test_compare_and_swap_keeps_price_history() {
        let store = seeded();
        let mut edit = store.ingredient("FLOUR").unwrap().ingredient;
        edit.cost_per_unit = dec!(1.75);
        store.update_ingredient(edit, Some("供應商調價"), at(2)).unwrap();

        let read = store.ingredient("FLOUR").unwrap();
        let mut swapped = read.ingredient.clone();
        swapped.cost_per_unit = dec!(9.99);
        swapped.price_history = None;

        assert_eq!(store.compare_and_swap(read.version, swapped, at(3)).unwrap(), 2);

        let flour = store.ingredient("FLOUR").unwrap().ingredient;
        let history = flour.price_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "供應商調價");
        assert_eq!(history[1].price, dec!(9.99));
        assert_eq!(history[1].reason, "手動更新");
    }

    #[test]
    fn test_update_ingredient_keeps_ledger_and_tracks_price() {
        let store = seeded();
        let mut edited = store.ingredient("FLOUR").unwrap().ingredient;
        edited.cost_per_unit = dec!(1.75);
        edited.stock = dec!(999);
        edited.batches = None;

        let updated = store.update_ingredient(edited, None, at(2)).unwrap();
        assert_eq!(updated.stock, dec!(20));
        assert_eq!(updated.batches().len(), 1);
        assert_eq!(updated.price_history().len(), 1);
        assert_eq!(updated.price_history()[0].reason, "手動更新");
    }

    #[test]
    fn test_order_flow_through_store() {
        let store = seeded();
        let recipe = Recipe::new("R-BREAD".to_string(), "麵包".to_string()).with_line("FLOUR", dec!(2));
        let event = Event::new("婚宴".to_string(), date(15), 20)
            .with_menu(Menu::new("M-1".to_string(), "套餐".to_string(), vec![recipe]));

        let drafts = store.generate_drafts(&[event], date(1)).unwrap();
        assert_eq!(drafts.orders.len(), 1);
        let order_id = drafts.orders[0].id;
        // 20 - 40 = -20，門檻 10 → 30
        assert_eq!(drafts.orders[0].item("FLOUR").unwrap().quantity, dec!(30));

        store.mark_ordered(order_id, at(2)).unwrap();
        assert!(store.delete_order(order_id).is_err());

        let partial = store
            .receive(order_id, &ReceptionInput::new().with_quantity("FLOUR", dec!(10)), at(10))
            .unwrap();
        assert_eq!(partial.status, OrderStatus::Partial);
        assert_eq!(store.ingredient("FLOUR").unwrap().ingredient.stock, dec!(30));

        let done = store
            .receive(order_id, &ReceptionInput::new().with_quantity("FLOUR", dec!(20)), at(11))
            .unwrap();
        assert_eq!(done.status, OrderStatus::Received);
        assert_eq!(store.ingredient("FLOUR").unwrap().ingredient.batches().len(), 3);
        assert_eq!(store.order(order_id).unwrap().status, OrderStatus::Received);
    }

    #[test]
    fn test_horizon_drafts_skip_distant_events() {
        let store = KitchenStore::new(EngineConfig::default().with_planning_horizon(30));
        store
            .load_catalogue(
                vec![Ingredient::new("FLOUR".to_string(), "麵粉".to_string(), "kg".to_string(), dec!(1))
                    .with_supplier_id("SUP-MILL".to_string())],
                at(1),
            )
            .unwrap();
        store.load_suppliers(vec![Supplier::new("SUP-MILL".to_string(), "磨坊".to_string(), 3)]);

        let recipe = Recipe::new("R-BREAD".to_string(), "麵包".to_string()).with_line("FLOUR", dec!(1));
        let menu = Menu::new("M-1".to_string(), "套餐".to_string(), vec![recipe]);
        let events = vec![
            Event::new("近期".to_string(), date(10), 5).with_menu(menu.clone()),
            Event::new("年底".to_string(), NaiveDate::from_ymd_opt(2025, 12, 20).unwrap(), 50).with_menu(menu),
        ];

        let horizon = store.generate_horizon_drafts(&events, date(1)).unwrap();
        assert_eq!(horizon.orders[0].items[0].quantity, dec!(5));

        let all = store.generate_drafts(&events, date(1)).unwrap();
        assert_eq!(all.orders[0].items[0].quantity, dec!(55));
    }

    #[test]
    fn test_regenerating_replaces_drafts() {
        let store = seeded();
        store.consume("FLOUR", dec!(15)).unwrap();

        for _ in 0..3 {
            store.generate_drafts(&[], date(1)).unwrap();
        }
        let orders = store.orders().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Draft);

        // 已下單的採購單保留，只取代草稿
        store.mark_ordered(orders[0].id, at(2)).unwrap();
        store.generate_drafts(&[], date(2)).unwrap();
        let orders = store.orders().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders.iter().filter(|o| o.status == OrderStatus::Draft).count(), 1);
    }

    #[test]
    fn test_delete_draft() {
        let store = seeded();
        // 20 - 15 = 5，低於門檻 10
        store.consume("FLOUR", dec!(15)).unwrap();
        let drafts = store.generate_drafts(&[], date(1)).unwrap();
        let order_id = drafts.orders[0].id;

        let deleted = store.delete_order(order_id).unwrap();
        assert_eq!(deleted.status, OrderStatus::Draft);
        assert!(matches!(store.order(order_id), Err(KitchenError::OrderNotFound(_))));
    }

    #[test]
    fn test_concurrent_consumption_never_oversells() {
        let store = Arc::new(KitchenStore::default());
        store
            .load_catalogue(
                vec![Ingredient::new("RICE".to_string(), "米".to_string(), "kg".to_string(), dec!(1))
                    .with_legacy_stock(dec!(100))],
                at(1),
            )
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..20)
                        .filter(|_| store.consume("RICE", dec!(1)).is_ok())
                        .count()
                })
            })
            .collect();

        let succeeded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(succeeded, 100);

        let rice = store.ingredient("RICE").unwrap();
        assert_eq!(rice.ingredient.stock, Decimal::ZERO);
        assert_eq!(rice.version, 100);
    }
}
