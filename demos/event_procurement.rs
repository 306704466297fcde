//! 活動需求 → 採購草稿示例

use anyhow::Result;
use chrono::Utc;
use kitchen::{
    parse_date, EngineConfig, Event, Ingredient, KitchenStore, Menu, Recipe, Supplier,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 活動採購草稿示例 ===\n");

    let config = EngineConfig::from_json(r#"{ "receptionShelfLifeDays": 14 }"#)?;
    let store = KitchenStore::new(config);
    let now = Utc::now();

    // 食材目錄（舊版純量庫存，載入時遷移為批次）
    store.load_catalogue(
        vec![
            Ingredient::new("FLOUR".into(), "麵粉".into(), "kg".into(), Decimal::new(150, 2))
                .with_legacy_stock(Decimal::from(20))
                .with_min_stock(Decimal::from(10))
                .with_supplier_id("SUP-MILL".into()),
            Ingredient::new("BUTTER".into(), "奶油".into(), "kg".into(), Decimal::new(750, 2))
                .with_legacy_stock(Decimal::from(2))
                .with_supplier_id("SUP-DAIRY".into()),
            Ingredient::new("SAFFRON".into(), "番紅花".into(), "g".into(), Decimal::from(12))
                .with_min_stock(Decimal::from(5)),
        ],
        now,
    )?;

    store.load_suppliers(vec![
        Supplier::new("SUP-MILL".into(), "北區磨坊".into(), 3),
        Supplier::new("SUP-DAIRY".into(), "鮮乳坊".into(), 2)
            .with_minimum_order_value(Decimal::from(200)),
    ]);

    let croissant = Recipe::new("R-CROISSANT".into(), "可頌".into())
        .with_line("FLOUR", Decimal::new(2, 1))
        .with_line("BUTTER", Decimal::new(1, 1));
    let menu = Menu::new("M-BRUNCH".into(), "早午餐".into(), vec![croissant]);

    let events = vec![
        Event::new("企業早午餐".into(), parse_date("2025-06-15")?, 120).with_menu(menu.clone()),
        Event::new("週末市集".into(), parse_date("2025-06-20")?, 80).with_menu(menu),
        Event::new("場地勘查".into(), parse_date("2025-06-10")?, 4),
    ];

    let drafts = store.generate_drafts(&events, parse_date("2025-06-01")?)?;

    println!("草稿採購單:");
    for order in &drafts.orders {
        println!(
            "  - 供應商: {}, 交貨日: {}, 下單期限: {}, 金額: {}",
            order.supplier_id, order.delivery_date, order.order_deadline, order.total_cost
        );
        for item in &order.items {
            println!(
                "      {} × {} {} @ {}",
                item.ingredient_id, item.quantity, item.unit, item.cost_per_unit
            );
        }
    }

    println!("\n警告:");
    for message in drafts.warning_messages() {
        println!("  - {}", message);
    }

    println!("\n草稿總金額: {}", drafts.total_cost());
    println!("\n{}", serde_json::to_string_pretty(&drafts)?);

    Ok(())
}
