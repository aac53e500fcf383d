//! 菜单标签词表
//!
//! 只列出评分和分类会读取的标签，菜单里其余标签仅供展示。

pub const CAFFEINE: &str = "caffeine";
pub const CAFFEINE_COFFEE: &str = "caffeine-coffee";
pub const HIGH_CAFFEINE: &str = "high-caffeine";
pub const NON_CAFFEINE: &str = "non-caffeine";
pub const DECAF_AVAILABLE: &str = "decaf-available";

pub const BOLD_COFFEE: &str = "bold-coffee";
pub const SMOOTH_COFFEE: &str = "smooth-coffee";
pub const COFFEE_FLAVOR: &str = "coffee-flavor";
pub const TEA: &str = "tea";

pub const SWEET: &str = "sweet";
pub const EXTRA_SWEET: &str = "extra-sweet";
pub const SOUR_SWEET: &str = "sour-sweet";
pub const DESSERT_DRINK: &str = "dessert-drink";
pub const CREAMY: &str = "creamy";
pub const FRUITY: &str = "fruity";
pub const CLEAN_TASTE: &str = "clean-taste";

pub const POPULAR: &str = "popular";
pub const CLASSIC: &str = "classic";

/// 任一即归为咖啡类
pub const COFFEE_MARKERS: &[&str] = &[CAFFEINE, CAFFEINE_COFFEE, BOLD_COFFEE, SMOOTH_COFFEE, COFFEE_FLAVOR];
