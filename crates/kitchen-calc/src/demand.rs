//! 活動需求彙總

use std::collections::BTreeMap;

use chrono::NaiveDate;
use kitchen_core::{shift_date, Event};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

/// 單一食材的彙總需求
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandSummary {
    /// 總需求量
    pub total_quantity: Decimal,

    /// 最早需求日期（用於推算下單截止日）
    pub earliest_needed_date: NaiveDate,
}

impl DemandSummary {
    pub fn new(total_quantity: Decimal, earliest_needed_date: NaiveDate) -> Self {
        Self {
            total_quantity,
            earliest_needed_date,
        }
    }

    /// 合併另一筆需求
    fn absorb(&mut self, quantity: Decimal, date: NaiveDate) {
        self.total_quantity += quantity;
        if date < self.earliest_needed_date {
            self.earliest_needed_date = date;
        }
    }
}

/// 食材ID → 彙總需求
pub type DemandMap = BTreeMap<String, DemandSummary>;

/// 少於此數量的活動直接循序摺疊
const PARALLEL_THRESHOLD: usize = 256;

/// 需求彙總器
///
/// 純函數：相同的活動集合永遠得到相同的結果。大量活動時以 rayon 平行摺疊，
/// 十進位加法精確，因此結果與分割方式無關；呼叫端看到的仍是同步呼叫。
pub struct DemandAggregator;

impl DemandAggregator {
    /// 彙總所有活動的食材需求
    pub fn aggregate(events: &[Event]) -> DemandMap {
        tracing::debug!("彙總 {} 個活動的需求", events.len());
        Self::fold(&events.iter().collect::<Vec<_>>())
    }

    /// 只彙總日期落在 `[from, to]` 的活動
    pub fn aggregate_within(events: &[Event], from: NaiveDate, to: NaiveDate) -> DemandMap {
        let selected: Vec<&Event> = events
            .iter()
            .filter(|e| e.date >= from && e.date <= to)
            .collect();
        Self::fold(&selected)
    }

    /// 依計劃時界彙總（從 `today` 起算 `horizon_days` 天，超出日期範圍時不設上限）
    pub fn aggregate_horizon(events: &[Event], today: NaiveDate, horizon_days: u32) -> DemandMap {
        let to = shift_date(today, i64::from(horizon_days)).unwrap_or(NaiveDate::MAX);
        Self::aggregate_within(events, today, to)
    }

    fn fold(events: &[&Event]) -> DemandMap {
        if events.len() < PARALLEL_THRESHOLD {
            return events.iter().fold(DemandMap::new(), |mut acc, event| {
                Self::accumulate(&mut acc, event);
                acc
            });
        }

        events
            .par_iter()
            .fold(DemandMap::new, |mut acc, event| {
                Self::accumulate(&mut acc, event);
                acc
            })
            .reduce(DemandMap::new, Self::merge)
    }

    /// 將單一活動的需求累加到彙總表
    fn accumulate(acc: &mut DemandMap, event: &Event) {
        let Some(menu) = &event.menu else {
            return;
        };
        let pax = Decimal::from(event.pax);

        for recipe in &menu.recipes {
            for line in &recipe.ingredients {
                let quantity = line.quantity * pax;
                acc.entry(line.ingredient_id.clone())
                    .and_modify(|summary| summary.absorb(quantity, event.date))
                    .or_insert_with(|| DemandSummary::new(quantity, event.date));
            }
        }
    }

    fn merge(mut left: DemandMap, right: DemandMap) -> DemandMap {
        for (ingredient_id, summary) in right {
            left.entry(ingredient_id)
                .and_modify(|existing| {
                    existing.absorb(summary.total_quantity, summary.earliest_needed_date)
                })
                .or_insert(summary);
        }
        left
    }
}
