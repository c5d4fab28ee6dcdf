//! Garments available to the studio.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::image::ImageRef;

/// Garment identifier, unique within a wardrobe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GarmentId(String);

impl GarmentId {
    /// Create a garment ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GarmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GarmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of garment. Accessories are added on top of an outfit; everything
/// else replaces what the model is wearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Clothing,
    Accessory,
    Top,
    Bottom,
    Outerwear,
    Shoes,
    Dress,
}

impl GarmentCategory {
    /// Whether applying this garment adds to the outfit instead of replacing it.
    #[must_use]
    pub const fn is_accessory(self) -> bool {
        matches!(self, Self::Accessory)
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clothing => "clothing",
            Self::Accessory => "accessory",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Outerwear => "outerwear",
            Self::Shoes => "shoes",
            Self::Dress => "dress",
        };
        f.write_str(s)
    }
}

/// A garment the model can wear. Immutable; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub id: GarmentId,
    pub name: String,
    pub url: ImageRef,
    pub category: GarmentCategory,
}

/// The garments a session can pick from, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Wardrobe {
    items: Vec<WardrobeItem>,
}

impl Wardrobe {
    /// Wardrobe seeded with the hosted starter garments.
    #[must_use]
    pub fn starter() -> Self {
        const STARTER: [(&str, &str, &str, GarmentCategory); 5] = [
            (
                "gemini-sweat",
                "Gemini Sweat",
                "https://raw.githubusercontent.com/ammaarreshi/app-images/refs/heads/main/gemini-sweat-2.png",
                GarmentCategory::Clothing,
            ),
            (
                "gemini-tee",
                "Gemini Tee",
                "https://raw.githubusercontent.com/ammaarreshi/app-images/refs/heads/main/Gemini-tee.png",
                GarmentCategory::Clothing,
            ),
            (
                "aviator-sunglasses",
                "Aviators",
                "https://raw.githubusercontent.com/google-gemini-api/app-images/main/try-on/accessories/aviator-sunglasses.png",
                GarmentCategory::Accessory,
            ),
            (
                "beanie-hat",
                "Beanie Hat",
                "https://raw.githubusercontent.com/google-gemini-api/app-images/main/try-on/accessories/beanie-hat.png",
                GarmentCategory::Accessory,
            ),
            (
                "gold-necklace",
                "Gold Necklace",
                "https://raw.githubusercontent.com/google-gemini-api/app-images/main/try-on/accessories/gold-necklace.png",
                GarmentCategory::Accessory,
            ),
        ];

        let items = STARTER
            .iter()
            .filter_map(|(id, name, url, category)| {
                Some(WardrobeItem {
                    id: GarmentId::new(*id),
                    name: (*name).to_owned(),
                    url: ImageRef::parse(url).ok()?,
                    category: *category,
                })
            })
            .collect();

        Self { items }
    }

    /// Create a wardrobe from items. Later duplicates of an ID are dropped.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = WardrobeItem>) -> Self {
        let mut wardrobe = Self::default();
        for item in items {
            wardrobe.insert(item);
        }
        wardrobe
    }

    /// All items in display order.
    #[must_use]
    pub fn items(&self) -> &[WardrobeItem] {
        &self.items
    }

    /// Find an item by ID.
    #[must_use]
    pub fn get(&self, id: &GarmentId) -> Option<&WardrobeItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Add an item unless one with the same ID exists. Returns whether it was added.
    pub fn insert(&mut self, item: WardrobeItem) -> bool {
        if self.get(&item.id).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove an item by ID. Returns the removed item.
    pub fn remove(&mut self, id: &GarmentId) -> Option<WardrobeItem> {
        let pos = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the wardrobe is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee() -> WardrobeItem {
        WardrobeItem {
            id: GarmentId::new("tee"),
            name: "Tee".to_string(),
            url: ImageRef::parse("https://example.com/tee.png").expect("url"),
            category: GarmentCategory::Clothing,
        }
    }

    #[test]
    fn test_starter_wardrobe() {
        let wardrobe = Wardrobe::starter();
        assert_eq!(wardrobe.len(), 5);
        let aviators = wardrobe
            .get(&GarmentId::new("aviator-sunglasses"))
            .expect("aviators");
        assert!(aviators.category.is_accessory());
    }

    #[test]
    fn test_insert_ignores_duplicate_ids() {
        let mut wardrobe = Wardrobe::default();
        assert!(wardrobe.insert(tee()));
        let mut renamed = tee();
        renamed.name = "Other".to_string();
        assert!(!wardrobe.insert(renamed));
        assert_eq!(wardrobe.len(), 1);
        assert_eq!(wardrobe.items()[0].name, "Tee");
    }

    #[test]
    fn test_remove() {
        let mut wardrobe = Wardrobe::from_items([tee()]);
        assert!(wardrobe.remove(&GarmentId::new("tee")).is_some());
        assert!(wardrobe.is_empty());
        assert!(wardrobe.remove(&GarmentId::new("tee")).is_none());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&GarmentCategory::Outerwear).expect("serialize");
        assert_eq!(json, "\"outerwear\"");
        let parsed: GarmentCategory = serde_json::from_str("\"accessory\"").expect("parse");
        assert_eq!(parsed, GarmentCategory::Accessory);
    }
}
