//! 食材與庫存批次模型

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::parse_timestamp;
use crate::Result;

fn default_yield_factor() -> Decimal {
    Decimal::ONE
}

/// 食材
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// 食材ID
    pub id: String,

    /// 顯示名稱
    #[serde(default)]
    pub name: String,

    /// 計量單位（kg、L、件…）
    pub unit: String,

    /// 目前單位成本
    pub cost_per_unit: Decimal,

    /// 出成率（修整/損耗後可用比例）
    #[serde(default = "default_yield_factor")]
    pub yield_factor: Decimal,

    /// 過敏原
    #[serde(default)]
    pub allergens: BTreeSet<String>,

    /// 供應商
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,

    /// 再訂購門檻（未設定視為 0）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<Decimal>,

    /// 總庫存（由批次加總而來）
    #[serde(default)]
    pub stock: Decimal,

    /// 庫存批次（None 表示尚未從舊版純量庫存遷移）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batches: Option<Vec<IngredientBatch>>,

    /// 價格歷史（依日期遞增，只可追加）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_history: Option<Vec<PriceHistoryEntry>>,

    /// 營業點（僅在持久層使用，引擎原樣保留）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_id: Option<String>,
}

impl Ingredient {
    /// 創建新的食材（無庫存、無批次）
    pub fn new(id: String, name: String, unit: String, cost_per_unit: Decimal) -> Self {
        Self {
            id,
            name,
            unit,
            cost_per_unit,
            yield_factor: Decimal::ONE,
            allergens: BTreeSet::new(),
            supplier_id: None,
            min_stock: None,
            stock: Decimal::ZERO,
            batches: None,
            price_history: None,
            outlet_id: None,
        }
    }

    /// 建構器模式：設置供應商
    pub fn with_supplier_id(mut self, supplier_id: String) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// 建構器模式：設置再訂購門檻
    pub fn with_min_stock(mut self, min_stock: Decimal) -> Self {
        self.min_stock = Some(min_stock);
        self
    }

    /// 建構器模式：設置舊版純量庫存（尚無批次）
    pub fn with_legacy_stock(mut self, stock: Decimal) -> Self {
        self.stock = stock;
        self.batches = None;
        self
    }

    /// 建構器模式：設置批次並重算總庫存
    pub fn with_batches(mut self, batches: Vec<IngredientBatch>) -> Self {
        self.batches = Some(batches);
        self.recompute_stock();
        self
    }

    /// 建構器模式：設置出成率
    pub fn with_yield_factor(mut self, yield_factor: Decimal) -> Self {
        self.yield_factor = yield_factor;
        self
    }

    /// 建構器模式：設置過敏原
    pub fn with_allergens<I, S>(mut self, allergens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allergens = allergens.into_iter().map(Into::into).collect();
        self
    }

    /// 建構器模式：設置營業點
    pub fn with_outlet_id(mut self, outlet_id: String) -> Self {
        self.outlet_id = Some(outlet_id);
        self
    }

    /// 批次列表（未初始化時為空）
    pub fn batches(&self) -> &[IngredientBatch] {
        self.batches.as_deref().unwrap_or(&[])
    }

    /// 價格歷史（未記錄時為空）
    pub fn price_history(&self) -> &[PriceHistoryEntry] {
        self.price_history.as_deref().unwrap_or(&[])
    }

    /// 是否已完成批次初始化
    pub fn has_batches(&self) -> bool {
        self.batches.is_some()
    }

    /// 批次數量加總
    pub fn batch_total(&self) -> Decimal {
        self.batches().iter().map(|b| b.quantity).sum()
    }

    /// 依批次重算總庫存
    pub fn recompute_stock(&mut self) {
        self.stock = self.batch_total();
    }

    /// 再訂購門檻（未設定時為 0）
    pub fn reorder_threshold(&self) -> Decimal {
        self.min_stock.unwrap_or(Decimal::ZERO)
    }

    /// 檢查庫存是否低於再訂購門檻
    pub fn is_below_min_stock(&self) -> bool {
        self.stock < self.reorder_threshold()
    }

    /// 檢查是否含有指定過敏原
    pub fn contains_allergen(&self, allergen: &str) -> bool {
        self.allergens.contains(allergen)
    }
}

/// 庫存批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientBatch {
    /// 批次ID
    pub id: Uuid,

    /// 剩餘數量（永不為負）
    pub quantity: Decimal,

    /// 入庫時單位成本
    pub unit_cost: Decimal,

    /// 入庫時間
    pub received_date: DateTime<Utc>,

    /// 到期時間
    pub expiry_date: DateTime<Utc>,
}

impl IngredientBatch {
    /// 創建新的批次
    pub fn new(
        quantity: Decimal,
        unit_cost: Decimal,
        received_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            quantity,
            unit_cost,
            received_date,
            expiry_date,
        }
    }

    /// 檢查批次是否已耗盡
    pub fn is_depleted(&self) -> bool {
        self.quantity.is_zero()
    }

    /// 檢查批次在指定時間是否已過期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date <= now
    }

    /// 批次剩餘價值
    pub fn value(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

impl From<BatchInput> for IngredientBatch {
    fn from(input: BatchInput) -> Self {
        Self::new(
            input.quantity,
            input.unit_cost,
            input.received_date,
            input.expiry_date,
        )
    }
}

/// 新增批次的輸入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInput {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub received_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

impl BatchInput {
    /// 創建新的批次輸入
    pub fn new(
        quantity: Decimal,
        unit_cost: Decimal,
        received_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            quantity,
            unit_cost,
            received_date,
            expiry_date,
        }
    }

    /// 從外部字串日期建立（日期格式錯誤時回傳 InvalidDate）
    pub fn parse(
        quantity: Decimal,
        unit_cost: Decimal,
        received_date: &str,
        expiry_date: &str,
    ) -> Result<Self> {
        Ok(Self::new(
            quantity,
            unit_cost,
            parse_timestamp(received_date)?,
            parse_timestamp(expiry_date)?,
        ))
    }
}

/// 價格變動記錄（不可變）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub date: DateTime<Utc>,
    pub price: Decimal,
    pub reason: String,
}

impl PriceHistoryEntry {
    pub fn new(date: DateTime<Utc>, price: Decimal, reason: String) -> Self {
        Self {
            date,
            price,
            reason,
        }
    }
}
