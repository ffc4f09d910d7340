//! Menu filtering by arrival time.
//!
//! Each item carries its own service window, which (unlike restaurant
//! hours) may wrap past midnight. Items whose window did not parse are never
//! offered.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Deserialize;

use crate::domain::{ClockTime, MenuItem};

/// Display order of menu groups.
#[derive(Debug, Clone)]
pub struct MenuConfig {
    /// Preferred group order, matched case-insensitively. Groups not listed
    /// follow in the order they are first seen.
    pub category_order: Vec<String>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            category_order: [
                "Thali",
                "Combo",
                "Meals",
                "Biryani",
                "Main Course",
                "Breads",
                "Snacks",
                "Beverages",
                "Desserts",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl MenuConfig {
    pub fn with_category_order(mut self, order: Vec<String>) -> Self {
        self.category_order = order;
        self
    }
}

/// Secondary sort key within a menu group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuSort {
    #[default]
    Price,
    Name,
}

impl FromStr for MenuSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(MenuSort::Price),
            "name" => Ok(MenuSort::Name),
            other => Err(format!("unknown sort: {other}")),
        }
    }
}

/// Whether an item can be served at `t`. Items without a usable window
/// cannot.
pub fn is_served_at(item: &MenuItem, t: ClockTime) -> bool {
    item.is_on() && item.service_window.is_some_and(|w| w.contains(t))
}

/// Group rank of each item: configured groups by position, unknown groups
/// after them in encounter order, ungrouped items last.
fn group_ranks(items: &[MenuItem], config: &MenuConfig) -> Vec<usize> {
    let known: Vec<String> = config
        .category_order
        .iter()
        .map(|g| g.trim().to_lowercase())
        .collect();
    let mut unknown: Vec<String> = Vec::new();

    items
        .iter()
        .map(|item| {
            let Some(group) = item.menu_group.as_deref().map(|g| g.trim().to_lowercase()) else {
                return usize::MAX;
            };
            if let Some(i) = known.iter().position(|k| *k == group) {
                return i;
            }
            let i = match unknown.iter().position(|u| *u == group) {
                Some(i) => i,
                None => {
                    unknown.push(group);
                    unknown.len() - 1
                }
            };
            known.len() + i
        })
        .collect()
}

fn compare_within_group(a: &MenuItem, b: &MenuItem, sort: MenuSort) -> Ordering {
    let by_price = a.selling_price.cmp(&b.selling_price);
    let by_name = a.name.to_lowercase().cmp(&b.name.to_lowercase());
    match sort {
        MenuSort::Price => by_price.then(by_name),
        MenuSort::Name => by_name.then(by_price),
    }
}

/// Sort items for display.
pub fn sort_menu(items: Vec<MenuItem>, sort: MenuSort, config: &MenuConfig) -> Vec<MenuItem> {
    let ranks = group_ranks(&items, config);
    let mut ranked: Vec<(usize, MenuItem)> = ranks.into_iter().zip(items).collect();
    ranked.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| compare_within_group(a, b, sort)));
    ranked.into_iter().map(|(_, item)| item).collect()
}

/// Items that can be served at `arrival`, sorted for display.
pub fn filter_menu(
    items: Vec<MenuItem>,
    arrival: ClockTime,
    sort: MenuSort,
    config: &MenuConfig,
) -> Vec<MenuItem> {
    let visible: Vec<MenuItem> = items
        .into_iter()
        .filter(|item| is_served_at(item, arrival))
        .collect();
    sort_menu(visible, sort, config)
}
