//! 髒標記追蹤（上次產生草稿後庫存有變動的食材）

use dashmap::DashSet;

/// 髒標記追蹤器
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_ingredients: DashSet<String>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self {
            dirty_ingredients: DashSet::new(),
        }
    }

    /// 標記食材為髒
    pub fn mark_dirty(&self, ingredient_id: &str) {
        self.dirty_ingredients.insert(ingredient_id.to_string());
    }

    /// 檢查食材是否為髒
    pub fn is_dirty(&self, ingredient_id: &str) -> bool {
        self.dirty_ingredients.contains(ingredient_id)
    }

    /// 是否有任何變動
    pub fn has_changes(&self) -> bool {
        !self.dirty_ingredients.is_empty()
    }

    /// 清除所有髒標記
    pub fn clear(&self) {
        self.dirty_ingredients.clear();
    }

    /// 獲取所有髒食材（排序）
    pub fn get_dirty_ingredients(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.dirty_ingredients.iter().map(|id| id.clone()).collect();
        ids.sort();
        ids
    }
}
