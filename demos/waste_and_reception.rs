//! 報廢、生產扣庫與分批收貨示例

use anyhow::Result;
use chrono::{Duration, Utc};
use kitchen::{
    BatchInput, BatchLedger, Ingredient, KitchenStore, Recipe, ReceptionInput, Supplier,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== 報廢與收貨示例 ===\n");

    let store = KitchenStore::default();
    let now = Utc::now();

    store.load_catalogue(
        vec![Ingredient::new("CREAM".into(), "鮮奶油".into(), "L".into(), Decimal::from(4))
            .with_min_stock(Decimal::from(6))
            .with_supplier_id("SUP-DAIRY".into())],
        now,
    )?;
    store.load_suppliers(vec![Supplier::new("SUP-DAIRY".into(), "鮮乳坊".into(), 1)]);

    // 兩個批次：舊批次較便宜
    store.add_batch(
        "CREAM",
        BatchInput::new(Decimal::from(5), Decimal::from(4), now - Duration::days(3), now + Duration::days(2)),
        now,
    )?;
    store.add_batch(
        "CREAM",
        BatchInput::new(Decimal::from(5), Decimal::new(450, 2), now, now + Duration::days(7)),
        now,
    )?;

    let waste = store.record_waste("CREAM", Decimal::from(2), "打發失敗")?;
    println!("報廢成本: {}", waste.cost());

    let panna_cotta = Recipe::new("R-PANNA".into(), "奶酪".into()).with_line("CREAM", Decimal::new(25, 2));
    let production = store.record_production(&panna_cotta, Decimal::from(20))?;
    for consumption in &production {
        for draw in &consumption.draws {
            println!("  批次 {} 扣除 {} @ {}", draw.batch_id, draw.quantity, draw.unit_cost);
        }
    }

    if let Err(error) = store.consume("CREAM", Decimal::from(50)) {
        println!("扣庫失敗: {}", error);
    }

    let archived = store.archive_drained_batches("CREAM")?;
    println!("封存耗盡批次: {}", archived.len());

    let cream = store.ingredient("CREAM")?;
    println!(
        "目前庫存: {} (版本 {}), 庫存價值: {}",
        cream.ingredient.stock,
        cream.version,
        BatchLedger::stock_value(&cream.ingredient)
    );

    let drafts = store.generate_drafts(&[], now.date_naive())?;
    let Some(order) = drafts.orders.first() else {
        println!("無需補貨");
        return Ok(());
    };

    store.mark_ordered(order.id, now)?;
    let outstanding = order.items[0].quantity;
    let half = (outstanding / Decimal::from(2)).round_dp(2);

    let partial = store.receive(order.id, &ReceptionInput::new().with_quantity("CREAM", half), now)?;
    println!("\n第一次收貨後狀態: {}", partial.status);

    let rest = outstanding - half;
    let received = store.receive(
        order.id,
        &ReceptionInput::new()
            .with_quantity("CREAM", rest)
            .with_expiry("CREAM", now + Duration::days(10)),
        now,
    )?;
    println!("第二次收貨後狀態: {}", received.status);
    println!("收貨後庫存: {}", store.ingredient("CREAM")?.ingredient.stock);

    Ok(())
}
