//! 採購草稿產生

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use kitchen_core::{EngineConfig, Ingredient, PurchaseOrder, PurchaseOrderItem, Supplier};
use rust_decimal::Decimal;

use crate::demand::DemandMap;
use crate::lead_time::LeadTimeCalculator;
use crate::netting::NettingCalculator;
use crate::{DraftResult, ProcurementWarning};

/// 單一供應商的明細累積
struct SupplierBucket {
    items: Vec<PurchaseOrderItem>,
    earliest_needed_date: NaiveDate,
}

/// 採購草稿產生器
pub struct DraftOrderGenerator;

impl DraftOrderGenerator {
    /// 依需求與庫存產生採購草稿
    ///
    /// 逐一檢查整個食材目錄（不只有需求的食材），缺口依供應商分組成草稿採購單。
    /// 未指定供應商的缺口直接略過；低於最低訂購金額仍產生採購單並附加警告。
    pub fn generate(
        catalogue: &[Ingredient],
        demand: &DemandMap,
        suppliers: &[Supplier],
        today: NaiveDate,
        config: &EngineConfig,
    ) -> DraftResult {
        tracing::info!(
            "開始產生採購草稿：食材 {} 筆，需求 {} 筆，供應商 {} 筆",
            catalogue.len(),
            demand.len(),
            suppliers.len()
        );

        let directory: HashMap<&str, &Supplier> =
            suppliers.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut result = DraftResult::empty();
        let mut buckets: BTreeMap<String, SupplierBucket> = BTreeMap::new();

        // Step 1: 計算缺口並依供應商分組
        for ingredient in catalogue {
            let deficit = NettingCalculator::calculate(ingredient, demand.get(&ingredient.id), today);
            if !deficit.needs_reorder() {
                continue;
            }

            let Some(supplier_id) = ingredient.supplier_id.as_deref() else {
                tracing::debug!("食材 {} 缺口 {} 但未指定供應商，略過", ingredient.id, deficit.deficit);
                continue;
            };

            if !directory.contains_key(supplier_id) {
                result.add_warning(ProcurementWarning::unknown_supplier(supplier_id, &ingredient.id));
                continue;
            }

            // 只在明細邊界捨入
            let quantity = config.round_line_quantity(deficit.deficit);
            if quantity <= Decimal::ZERO {
                continue;
            }

            let item = PurchaseOrderItem::new(
                ingredient.id.clone(),
                quantity,
                ingredient.unit.clone(),
                ingredient.cost_per_unit,
            );

            buckets
                .entry(supplier_id.to_string())
                .and_modify(|bucket| {
                    if deficit.earliest_needed_date < bucket.earliest_needed_date {
                        bucket.earliest_needed_date = deficit.earliest_needed_date;
                    }
                })
                .or_insert_with(|| SupplierBucket {
                    items: Vec::new(),
                    earliest_needed_date: deficit.earliest_needed_date,
                })
                .items
                .push(item);
        }

        // Step 2: 每個供應商組成一張草稿採購單
        for (supplier_id, bucket) in buckets {
            let Some(supplier) = directory.get(supplier_id.as_str()) else {
                continue;
            };

            let delivery_date = bucket.earliest_needed_date;
            let order_deadline =
                match LeadTimeCalculator::calculate_order_deadline(delivery_date, supplier.lead_time) {
                    Ok(deadline) => deadline,
                    Err(error) => {
                        tracing::warn!("供應商 {} 無法計算下單截止日：{}", supplier_id, error);
                        result.add_warning(ProcurementWarning::deadline_out_of_range(
                            &supplier_id,
                            supplier.lead_time,
                        ));
                        continue;
                    }
                };

            let order = PurchaseOrder::draft(
                supplier_id.clone(),
                today,
                delivery_date,
                order_deadline,
                bucket.items,
            );

            if let Some(shortfall) = supplier.minimum_order_shortfall(order.total_cost) {
                tracing::warn!(
                    "供應商 {} 訂單金額 {} 低於最低訂購金額，差額 {}",
                    supplier_id,
                    order.total_cost,
                    shortfall
                );
                let name = if supplier.name.is_empty() {
                    supplier.id.as_str()
                } else {
                    supplier.name.as_str()
                };
                result.add_warning(ProcurementWarning::below_minimum(
                    name,
                    &supplier.id,
                    order.total_cost,
                    supplier.minimum_order_value,
                ));
            }

            result.orders.push(order);
        }

        tracing::info!(
            "採購草稿完成：採購單 {} 張，警告 {} 筆",
            result.orders.len(),
            result.warnings.len()
        );

        result
    }
}
