//! Menu item and collection models.
//!
//! The JSON shape matches the menu API: camelCase field names, optional
//! presentation fields defaulted when absent.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// A single menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    /// Ordered so that serializing the same item always yields the same bytes
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            category: String::new(),
            image_url: None,
            tags: BTreeSet::new(),
            stock: 0,
            featured: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn as_featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// An ordered list of menu items.
///
/// Order is display order only. Ids must be unique and prices non-negative;
/// `validate` checks both, and every collection parsed with `from_json` has
/// already passed it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MenuCollection(Vec<MenuItem>);

impl MenuCollection {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self(items)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON array of items and validate it.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let collection: MenuCollection = serde_json::from_str(json)?;
        collection.validate()?;
        Ok(collection)
    }

    pub fn to_json(&self) -> Result<String, CacheError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for item in &self.0 {
            if item.id.is_empty() {
                return Err(CacheError::MalformedPayload(format!(
                    "item '{}' has an empty id",
                    item.name
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(CacheError::MalformedPayload(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(CacheError::MalformedPayload(format!(
                    "item '{}' has invalid price {}",
                    item.id, item.price
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MenuItem> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[MenuItem] {
        &self.0
    }

    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.0.iter().find(|item| item.id == id)
    }

    pub fn featured(&self) -> Vec<&MenuItem> {
        self.0.iter().filter(|item| item.featured).collect()
    }

    pub fn in_stock(&self) -> Vec<&MenuItem> {
        self.0.iter().filter(|item| item.is_available()).collect()
    }

    pub fn in_category(&self, category: &str) -> Vec<&MenuItem> {
        self.0
            .iter()
            .filter(|item| item.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Distinct categories in the order they first appear, compared
    /// case-insensitively like `in_category`.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(|item| item.category.as_str())
            .filter(|c| !c.is_empty() && seen.insert(c.to_ascii_lowercase()))
            .collect()
    }

    pub fn uncategorized(&self) -> Vec<&MenuItem> {
        self.0.iter().filter(|item| item.category.is_empty()).collect()
    }
}

impl From<Vec<MenuItem>> for MenuCollection {
    fn from(items: Vec<MenuItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<MenuItem> for MenuCollection {
    fn from_iter<I: IntoIterator<Item = MenuItem>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MenuCollection {
    type Item = &'a MenuItem;
    type IntoIter = std::slice::Iter<'a, MenuItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for MenuCollection {
    type Item = MenuItem;
    type IntoIter = std::vec::IntoIter<MenuItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burger() -> MenuItem {
        MenuItem::new("1", "Burger", 12.5)
            .with_category("Mains")
            .with_tags(["beef", "grill"])
            .with_stock(4)
            .as_featured()
    }

    #[test]
    fn test_parse_api_payload() {
        let json = r#"[{"id":"1","name":"Burger","description":"Smash patty","price":12.5,
            "category":"Mains","imageUrl":"/uploads/burger.jpg","tags":["grill","beef"],
            "stock":4,"featured":true}]"#;

        let menu = MenuCollection::from_json(json).expect("valid payload");
        assert_eq!(menu.len(), 1);

        let item = menu.get("1").expect("item present");
        assert_eq!(item.image_url.as_deref(), Some("/uploads/burger.jpg"));
        assert!(item.has_tag("beef"));
        assert!(item.featured);
    }

    #[test]
    fn test_parse_defaults_optional_fields() {
        let menu = MenuCollection::from_json(r#"[{"id":"7","name":"Water","price":0}]"#)
            .expect("minimal item parses");
        let item = &menu.as_slice()[0];
        assert_eq!(item.stock, 0);
        assert!(item.tags.is_empty());
        assert!(item.image_url.is_none());
        assert!(!item.featured);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let menu = MenuCollection::new(vec![burger(), burger()]);
        assert!(matches!(menu.validate(), Err(CacheError::MalformedPayload(_))));
    }

    #[test]
    fn test_rejects_negative_price() {
        let result = MenuCollection::from_json(r#"[{"id":"1","name":"Refund","price":-1}]"#);
        assert!(matches!(result, Err(CacheError::MalformedPayload(_))));
    }

    #[test]
    fn test_rejects_negative_stock() {
        let result = MenuCollection::from_json(r#"[{"id":"1","name":"Fries","price":3,"stock":-2}]"#);
        assert!(matches!(result, Err(CacheError::MalformedPayload(_))));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = MenuItem::new("1", "Burger", 12.5).with_tags(["grill", "beef"]);
        let b = MenuItem::new("1", "Burger", 12.5).with_tags(["beef", "grill"]);
        let first = MenuCollection::new(vec![a]).to_json().expect("serialize");
        let second = MenuCollection::new(vec![b]).to_json().expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_helpers() {
        let menu = MenuCollection::new(vec![
            burger(),
            MenuItem::new("2", "Fries", 4.0).with_category("Sides").with_stock(0),
            MenuItem::new("3", "Shake", 5.5).with_category("mains").with_stock(2),
        ]);

        assert_eq!(menu.featured().len(), 1);
        assert_eq!(menu.in_stock().len(), 2);
        assert_eq!(menu.in_category("Mains").len(), 2);
        assert_eq!(menu.categories(), vec!["Mains", "Sides"]);
        assert!(menu.uncategorized().is_empty());
        assert!(menu.get("missing").is_none());
    }
}
