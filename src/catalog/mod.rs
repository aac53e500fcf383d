//! 菜单目录
//!
//! 启动时加载一次，之后只读

pub mod tags;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{KioskError, Result};

const BUILTIN_MENU: &str = include_str!("menu.json");

/// 出品方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServingType {
    Hot,
    Iced,
}

impl ServingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Iced => "ICED",
        }
    }
}

/// 饮品 / 食品
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Drink,
    Food,
}

/// 大类 (推荐去重用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorCategory {
    Coffee,
    Tea,
    Other,
}

/// 菜单项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// 菜单分组 (展示用)
    #[serde(default)]
    pub group: Option<String>,
    pub kind: ItemKind,
    #[serde(default)]
    pub serving_types: Vec<ServingType>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// 最小货币单位
    pub price_cents: u32,
    /// 按出品方式区分的图片
    #[serde(default)]
    pub images: BTreeMap<ServingType, String>,
    /// 单一图片
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub model_3d: Option<String>,
}

impl MenuItem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_any(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }

    pub fn is_food(&self) -> bool {
        self.kind == ItemKind::Food
    }

    pub fn supports(&self, serving: ServingType) -> bool {
        self.serving_types.contains(&serving)
    }

    pub fn major_category(&self) -> MajorCategory {
        if self.has_any(tags::COFFEE_MARKERS) {
            MajorCategory::Coffee
        } else if self.has_tag(tags::TEA) {
            MajorCategory::Tea
        } else {
            MajorCategory::Other
        }
    }

    /// 优先取偏好的出品方式，不支持时退回第一个支持的
    pub fn resolve_serving(&self, preferred: ServingType) -> Option<ServingType> {
        if self.supports(preferred) {
            Some(preferred)
        } else {
            self.serving_types.first().copied()
        }
    }

    /// 对应出品方式的展示图片
    pub fn asset_for(&self, serving: ServingType) -> Option<&str> {
        self.images
            .get(&serving)
            .or(self.image.as_ref())
            .map(String::as_str)
    }
}

/// 菜单目录
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<MenuItem>,
}

impl Catalog {
    /// 内置菜单
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MENU)
    }

    /// 从文件加载
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        info!("菜单已加载: {} ({} 项)", path.display(), catalog.len());
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let items: Vec<MenuItem> = serde_json::from_str(raw)?;
        Self::new(items)
    }

    pub fn new(items: Vec<MenuItem>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(KioskError::Config(format!("duplicate menu id: {}", item.id)));
            }
            if !item.is_food() && item.serving_types.is_empty() {
                return Err(KioskError::Config(format!("drink without serving type: {}", item.id)));
            }
        }
        Ok(Self { items })
    }

    /// 参与推荐的饮品 (保持目录顺序)
    pub fn drinks(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(|m| !m.is_food())
    }

    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 47);
        assert_eq!(catalog.drinks().count(), 16);
        // 目录顺序保持不变
        assert_eq!(catalog.drinks().next().unwrap().id, "americano");
    }

    #[test]
    fn test_major_category() {
        let catalog = Catalog::builtin().unwrap();
        let category = |id: &str| catalog.get(id).unwrap().major_category();
        assert_eq!(category("americano"), MajorCategory::Coffee);
        assert_eq!(category("java_chip_frappuccino"), MajorCategory::Coffee);
        assert_eq!(category("injeolmi_cream_latte"), MajorCategory::Coffee);
        assert_eq!(category("mint_blend_tea"), MajorCategory::Tea);
        assert_eq!(category("cool_lime_fizzio"), MajorCategory::Other);
    }

    #[test]
    fn test_resolve_serving_and_asset() {
        let catalog = Catalog::builtin().unwrap();

        let latte = catalog.get("latte").unwrap();
        assert_eq!(latte.resolve_serving(ServingType::Iced), Some(ServingType::Iced));
        assert_eq!(latte.asset_for(ServingType::Iced), Some("ice_latte.png"));

        let fizzio = catalog.get("cool_lime_fizzio").unwrap();
        assert_eq!(fizzio.resolve_serving(ServingType::Hot), Some(ServingType::Iced));
        assert_eq!(fizzio.asset_for(ServingType::Iced), Some("cool_lime_fizzio.png"));

        let cold_brew = catalog.get("vanilla_cream_cold_brew").unwrap();
        assert_eq!(cold_brew.asset_for(ServingType::Iced), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = r#"[
            {"id": "a", "name": "A", "kind": "food", "price_cents": 1},
            {"id": "a", "name": "A2", "kind": "food", "price_cents": 2}
        ]"#;
        assert!(matches!(Catalog::from_json(raw), Err(KioskError::Config(_))));
    }
}
