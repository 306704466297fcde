//! 批次帳本與先進先出扣庫

use chrono::{DateTime, Utc};
use kitchen_core::{
    shift_timestamp, BatchInput, EngineConfig, Ingredient, IngredientBatch, KitchenError,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// 單一批次的扣除記錄
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// 扣庫結果
#[derive(Debug, Clone)]
pub struct Consumption {
    /// 扣庫後的食材
    pub ingredient: Ingredient,

    /// 各批次扣除明細（依扣除順序）
    pub draws: Vec<BatchDraw>,
}

impl Consumption {
    /// 依批次成本計算的消耗成本
    pub fn cost(&self) -> Decimal {
        self.draws.iter().map(|d| d.quantity * d.unit_cost).sum()
    }

    /// 扣庫後總庫存
    pub fn stock(&self) -> Decimal {
        self.ingredient.stock
    }
}

/// 批次帳本
///
/// 所有操作皆為純函數：輸入目前食材狀態，回傳新狀態，不修改輸入。
pub struct BatchLedger;

impl BatchLedger {
    /// 初始化批次（冪等）
    ///
    /// 舊版純量庫存遷移為單一批次：入庫時間為 `now`，到期日依配置推算。
    /// 已有批次的食材只重算總庫存。
    pub fn initialize_batches(
        ingredient: &Ingredient,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> kitchen_core::Result<Ingredient> {
        let mut next = ingredient.clone();

        if next.has_batches() {
            next.recompute_stock();
            return Ok(next);
        }

        let mut batches = Vec::new();
        if next.stock > Decimal::ZERO {
            let expiry = shift_timestamp(now, i64::from(config.migration_shelf_life_days))?;
            batches.push(IngredientBatch::new(next.stock, next.cost_per_unit, now, expiry));
            tracing::debug!("食材 {} 遷移純量庫存 {} 為批次", next.id, next.stock);
        } else if next.stock < Decimal::ZERO {
            tracing::warn!("食材 {} 舊版庫存為負值 {}，遷移後歸零", next.id, next.stock);
        }

        next.batches = Some(batches);
        next.recompute_stock();
        Ok(next)
    }

    /// 新增批次
    pub fn add_batch(
        ingredient: &Ingredient,
        input: BatchInput,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> kitchen_core::Result<Ingredient> {
        if input.quantity < Decimal::ZERO {
            return Err(KitchenError::InvalidQuantity {
                ingredient_id: ingredient.id.clone(),
                quantity: input.quantity,
            });
        }

        let mut next = Self::initialize_batches(ingredient, now, config)?;
        next.batches
            .get_or_insert_with(Vec::new)
            .push(IngredientBatch::from(input));
        next.recompute_stock();

        tracing::debug!("食材 {} 新增批次，庫存 {} → {}", next.id, ingredient.stock, next.stock);
        Ok(next)
    }

    /// 檢查是否可扣庫（不修改狀態）
    pub fn check_available(ingredient: &Ingredient, quantity: Decimal) -> kitchen_core::Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(KitchenError::InvalidQuantity {
                ingredient_id: ingredient.id.clone(),
                quantity,
            });
        }
        if !ingredient.has_batches() {
            return Err(KitchenError::BatchesNotInitialized(ingredient.id.clone()));
        }

        let available = ingredient.batch_total();
        if available < quantity {
            tracing::warn!(
                "庫存不足：食材 {} 需要 {}, 可用 {}",
                ingredient.id,
                quantity,
                available
            );
            return Err(KitchenError::InsufficientStock {
                ingredient_id: ingredient.id.clone(),
                requested: quantity,
                available,
            });
        }
        Ok(())
    }

    /// 先進先出扣庫
    ///
    /// 依入庫時間由舊至新扣除（同時間依新增順序）。扣至 0 的批次保留作為稽核記錄。
    /// 庫存不足時回傳 `InsufficientStock`，不修改任何狀態。
    pub fn consume(ingredient: &Ingredient, quantity: Decimal) -> kitchen_core::Result<Consumption> {
        Self::check_available(ingredient, quantity)?;

        let mut next = ingredient.clone();
        let mut draws = Vec::new();
        let mut remaining = quantity;

        let batches = next.batches.get_or_insert_with(Vec::new);
        // 穩定排序，保留同時間批次的新增順序
        batches.sort_by_key(|b| b.received_date);

        for batch in batches.iter_mut() {
            if remaining <= Decimal::ZERO {
                break;
            }
            if batch.quantity <= Decimal::ZERO {
                continue;
            }

            let drawn = batch.quantity.min(remaining);
            batch.quantity -= drawn;
            remaining -= drawn;

            draws.push(BatchDraw {
                batch_id: batch.id,
                quantity: drawn,
                unit_cost: batch.unit_cost,
            });
        }

        next.recompute_stock();

        tracing::debug!(
            "食材 {} 扣庫 {}，動用 {} 個批次，剩餘庫存 {}",
            next.id,
            quantity,
            draws.len(),
            next.stock
        );

        Ok(Consumption {
            ingredient: next,
            draws,
        })
    }

    /// 封存已耗盡的批次（明確的歸檔步驟，扣庫時不會自動刪除）
    pub fn archive_drained_batches(ingredient: &Ingredient) -> (Ingredient, Vec<IngredientBatch>) {
        let mut next = ingredient.clone();
        let mut archived = Vec::new();

        if let Some(batches) = next.batches.take() {
            let (drained, active): (Vec<_>, Vec<_>) =
                batches.into_iter().partition(IngredientBatch::is_depleted);
            archived = drained;
            next.batches = Some(active);
        }

        next.recompute_stock();
        (next, archived)
    }

    /// 指定天數內到期且仍有庫存的批次（依到期日排序）
    pub fn expiring_within(
        ingredient: &Ingredient,
        now: DateTime<Utc>,
        days: u32,
    ) -> Vec<&IngredientBatch> {
        // 超出日期範圍時視為無上限
        let horizon = shift_timestamp(now, i64::from(days)).ok();
        let mut expiring: Vec<_> = ingredient
            .batches()
            .iter()
            .filter(|b| !b.is_depleted() && horizon.map_or(true, |h| b.expiry_date <= h))
            .collect();
        expiring.sort_by_key(|b| b.expiry_date);
        expiring
    }

    /// 庫存價值（依批次成本）
    pub fn stock_value(ingredient: &Ingredient) -> Decimal {
        ingredient.batches().iter().map(IngredientBatch::value).sum()
    }
}
