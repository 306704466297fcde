//! # Kitchen
//!
//! 廚房庫存批次帳本與採購草稿引擎
//!
//! - `kitchen_core`：資料模型、配置與錯誤類型
//! - `kitchen_calc`：批次帳本、需求彙總、缺口計算、採購草稿與採購單生命週期
//! - `kitchen_store`：帶版本號的交易邊界
//!
//! ```no_run
//! use chrono::Utc;
//! use kitchen::{Ingredient, KitchenStore};
//! use rust_decimal::Decimal;
//!
//! let store = KitchenStore::default();
//! let flour = Ingredient::new("FLOUR".into(), "麵粉".into(), "kg".into(), Decimal::ONE)
//!     .with_legacy_stock(Decimal::from(20));
//! store.load_catalogue(vec![flour], Utc::now()).unwrap();
//! store.consume("FLOUR", Decimal::from(5)).unwrap();
//! ```

pub use kitchen_core::*;

pub use kitchen_calc::{
    BatchDraw, BatchLedger, Consumption, Deficit, DemandAggregator, DemandMap, DemandSummary,
    DraftOrderGenerator, DraftResult, LeadTimeCalculator, NettingCalculator, OrderLifecycle,
    PriceHistoryTracker, ProcurementWarning, Reception, ReceptionInput, WarningKind,
};

pub use kitchen_store::{DirtyTracker, KitchenStore, VersionedIngredient};
