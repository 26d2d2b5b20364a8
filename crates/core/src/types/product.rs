//! Product catalog model.
//!
//! The catalog carries peripherals across a fixed set of categories. The
//! original storefront modelled each category as its own product subtype;
//! here a single [`Product`] record carries a [`ProductCategory`] tag instead,
//! so cart and persistence code dispatch on data rather than on types.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Product category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Mouse,
    Keyboard,
    Headset,
    Mic,
    Controller,
    Speaker,
    Webcam,
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mouse => "mouse",
            Self::Keyboard => "keyboard",
            Self::Headset => "headset",
            Self::Mic => "mic",
            Self::Controller => "controller",
            Self::Speaker => "speaker",
            Self::Webcam => "webcam",
        };
        f.write_str(name)
    }
}

/// A purchasable variant of a product (e.g., a colorway).
///
/// Variants compare by name; two "Crimson" variants on different products are
/// considered the same selection, which is exactly how the cart's
/// variant-matching rule treats them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Display name of the variant.
    pub name: String,
}

impl Variant {
    /// Create a variant from a display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog-unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category tag (replaces the original per-category subtypes).
    pub category: ProductCategory,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    pub stock: u32,
    /// Marketing description.
    pub description: String,
    /// Image URL for the product page.
    pub image_url: String,
    /// Variants available for selection.
    pub variants: Vec<Variant>,
}
