//! # Kitchen Core
//!
//! 核心資料模型與類型定義（食材、批次、活動、供應商、採購單）

pub mod config;
pub mod date;
pub mod event;
pub mod ingredient;
pub mod order;
pub mod supplier;

// Re-export 主要類型
pub use config::EngineConfig;
pub use date::{parse_date, parse_timestamp, shift_date, shift_timestamp};
pub use event::{Event, Menu, Recipe, RecipeLine};
pub use ingredient::{BatchInput, Ingredient, IngredientBatch, PriceHistoryEntry};
pub use order::{OrderStatus, PurchaseOrder, PurchaseOrderItem};
pub use supplier::Supplier;

use rust_decimal::Decimal;
use uuid::Uuid;

/// 食材庫存引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum KitchenError {
    #[error("找不到食材: {0}")]
    IngredientNotFound(String),

    #[error("找不到採購單: {0}")]
    OrderNotFound(Uuid),

    #[error("庫存不足：食材 {ingredient_id} 需要 {requested}, 可用 {available}")]
    InsufficientStock {
        ingredient_id: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("無效的數量：食材 {ingredient_id} 數量 {quantity}")]
    InvalidQuantity {
        ingredient_id: String,
        quantity: Decimal,
    },

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("採購單 {order_id} 狀態為 {from}，不允許{action}")]
    InvalidTransition {
        order_id: Uuid,
        from: OrderStatus,
        action: &'static str,
    },

    #[error("食材 {0} 尚未初始化批次")]
    BatchesNotInitialized(String),

    #[error("版本衝突：食材 {ingredient_id} 預期版本 {expected}, 實際版本 {actual}")]
    VersionConflict {
        ingredient_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("鎖已失效: {0}")]
    LockPoisoned(String),

    #[error("序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KitchenError>;
