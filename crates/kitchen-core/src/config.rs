//! 引擎配置

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Result;

/// 庫存與採購引擎參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// 舊版純量庫存遷移為批次時的預設保存期限（天）
    pub migration_shelf_life_days: u32,

    /// 收貨未提供到期日時的預設保存期限（天）
    pub reception_shelf_life_days: u32,

    /// 採購明細數量的小數位數
    pub line_rounding_scale: u32,

    /// 價格變動的預設原因
    pub default_price_reason: String,

    /// 需求彙總時界（天）
    pub planning_horizon_days: u32,
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            migration_shelf_life_days: 30,
            reception_shelf_life_days: 30,
            line_rounding_scale: 2,
            default_price_reason: "手動更新".to_string(),
            planning_horizon_days: 90,
        }
    }

    /// 從 JSON 載入（缺少的欄位使用預設值）
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 建構器模式：設置遷移保存期限
    pub fn with_migration_shelf_life(mut self, days: u32) -> Self {
        self.migration_shelf_life_days = days;
        self
    }

    /// 建構器模式：設置收貨保存期限
    pub fn with_reception_shelf_life(mut self, days: u32) -> Self {
        self.reception_shelf_life_days = days;
        self
    }

    /// 建構器模式：設置明細小數位數
    pub fn with_line_rounding_scale(mut self, scale: u32) -> Self {
        self.line_rounding_scale = scale;
        self
    }

    /// 建構器模式：設置計劃時界
    pub fn with_planning_horizon(mut self, days: u32) -> Self {
        self.planning_horizon_days = days;
        self
    }

    /// 將明細數量捨入（四捨五入，僅在明細邊界使用）
    pub fn round_line_quantity(&self, quantity: Decimal) -> Decimal {
        quantity.round_dp_with_strategy(
            self.line_rounding_scale,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
