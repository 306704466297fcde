//! 缺口計算（庫存 - 需求 對比再訂購門檻）

use chrono::NaiveDate;
use kitchen_core::Ingredient;
use rust_decimal::Decimal;

use crate::demand::{DemandMap, DemandSummary};

/// 單一食材的缺口計算結果
#[derive(Debug, Clone, PartialEq)]
pub struct Deficit {
    pub ingredient_id: String,
    /// 目前庫存
    pub current_stock: Decimal,
    /// 需求量
    pub demand_quantity: Decimal,
    /// 預計庫存 = 目前庫存 - 需求量
    pub projected_stock: Decimal,
    /// 再訂購門檻
    pub min_stock: Decimal,
    /// 缺口（未低於門檻時為 0，未捨入）
    pub deficit: Decimal,
    /// 最早需求日期
    pub earliest_needed_date: NaiveDate,
}

impl Deficit {
    /// 檢查是否需要補貨
    pub fn needs_reorder(&self) -> bool {
        self.deficit > Decimal::ZERO
    }
}

/// 缺口計算器
pub struct NettingCalculator;

impl NettingCalculator {
    /// 計算單一食材的缺口
    ///
    /// 無需求時需求量為 0，最早需求日期為 `today`。
    pub fn calculate(
        ingredient: &Ingredient,
        demand: Option<&DemandSummary>,
        today: NaiveDate,
    ) -> Deficit {
        let demand_quantity = demand.map(|d| d.total_quantity).unwrap_or(Decimal::ZERO);
        let earliest_needed_date = demand.map(|d| d.earliest_needed_date).unwrap_or(today);

        let projected_stock = ingredient.stock - demand_quantity;
        let min_stock = ingredient.reorder_threshold();

        let deficit = if projected_stock < min_stock {
            min_stock - projected_stock
        } else {
            Decimal::ZERO
        };

        Deficit {
            ingredient_id: ingredient.id.clone(),
            current_stock: ingredient.stock,
            demand_quantity,
            projected_stock,
            min_stock,
            deficit,
            earliest_needed_date,
        }
    }

    /// 計算整個食材目錄的缺口（只回傳需要補貨的食材）
    pub fn shortages(catalogue: &[Ingredient], demand: &DemandMap, today: NaiveDate) -> Vec<Deficit> {
        catalogue
            .iter()
            .map(|ingredient| Self::calculate(ingredient, demand.get(&ingredient.id), today))
            .filter(Deficit::needs_reorder)
            .collect()
    }
}
