//! 活動、菜單與食譜模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::parse_date;
use crate::Result;

/// 食譜食材行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    /// 食材ID
    pub ingredient_id: String,

    /// 每份用量
    #[serde(alias = "quantityPerServing")]
    pub quantity: Decimal,
}

impl RecipeLine {
    pub fn new(ingredient_id: String, quantity: Decimal) -> Self {
        Self {
            ingredient_id,
            quantity,
        }
    }
}

/// 食譜
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// 食材行
    pub ingredients: Vec<RecipeLine>,
}

impl Recipe {
    /// 創建空食譜
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            ingredients: Vec::new(),
        }
    }

    /// 建構器模式：添加食材行
    pub fn with_line(mut self, ingredient_id: &str, quantity: Decimal) -> Self {
        self.ingredients
            .push(RecipeLine::new(ingredient_id.to_string(), quantity));
        self
    }

    /// 指定份數的總用量（同一食材多行時合併）
    pub fn requirements_for(&self, servings: Decimal) -> Vec<RecipeLine> {
        let mut merged: Vec<RecipeLine> = Vec::new();
        for line in &self.ingredients {
            let quantity = line.quantity * servings;
            match merged
                .iter_mut()
                .find(|m| m.ingredient_id == line.ingredient_id)
            {
                Some(existing) => existing.quantity += quantity,
                None => merged.push(RecipeLine::new(line.ingredient_id.clone(), quantity)),
            }
        }
        merged
    }
}

/// 菜單（一組食譜）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub recipes: Vec<Recipe>,
}

impl Menu {
    pub fn new(id: String, name: String, recipes: Vec<Recipe>) -> Self {
        Self { id, name, recipes }
    }
}

/// 排定的活動（宴會、外燴、固定供餐）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// 活動ID
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[serde(default)]
    pub name: String,

    /// 活動日期
    pub date: NaiveDate,

    /// 人數
    pub pax: u32,

    /// 綁定菜單（未綁定時不產生需求）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<Menu>,
}

impl Event {
    /// 創建新的活動
    pub fn new(name: String, date: NaiveDate, pax: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            date,
            pax,
            menu: None,
        }
    }

    /// 從外部字串日期建立活動
    pub fn parse(name: String, date: &str, pax: u32) -> Result<Self> {
        Ok(Self::new(name, parse_date(date)?, pax))
    }

    /// 建構器模式：綁定菜單
    pub fn with_menu(mut self, menu: Menu) -> Self {
        self.menu = Some(menu);
        self
    }

    /// 檢查是否已綁定菜單
    pub fn has_menu(&self) -> bool {
        self.menu.is_some()
    }
}
