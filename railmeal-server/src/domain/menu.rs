//! Menu items.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::restaurant::RestaurantCode;
use super::time::TimeWindow;

/// Identifier of a menu item.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dietary marker shown next to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DietaryCategory {
    Veg,
    Jain,
    NonVeg,
    #[default]
    Unspecified,
}

impl DietaryCategory {
    /// Lenient parse of the store's free-text column.
    pub fn parse(s: Option<&str>) -> Self {
        let Some(s) = s else {
            return DietaryCategory::Unspecified;
        };
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "veg" | "vegetarian" => DietaryCategory::Veg,
            "jain" => DietaryCategory::Jain,
            "nonveg" | "nonvegetarian" => DietaryCategory::NonVeg,
            _ => DietaryCategory::Unspecified,
        }
    }
}

/// Lifecycle status of a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    On,
    Off,
    Deleted,
}

impl ItemStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Some(ItemStatus::On),
            "OFF" => Some(ItemStatus::Off),
            "DELETED" => Some(ItemStatus::Deleted),
            _ => None,
        }
    }
}

/// One orderable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: ItemId,
    pub restaurant: RestaurantCode,
    pub name: String,
    pub description: Option<String>,
    pub dietary: DietaryCategory,
    pub cuisine: Option<String>,
    /// Display bucket ("Thali", "Beverages", ...).
    pub menu_group: Option<String>,
    /// `None` when the stored bounds do not parse; such items are never
    /// offered.
    pub service_window: Option<TimeWindow>,
    pub base_price: Decimal,
    pub gst_percent: Decimal,
    pub selling_price: Decimal,
    pub status: ItemStatus,
}

impl MenuItem {
    pub fn is_on(&self) -> bool {
        self.status == ItemStatus::On
    }
}
