//! Product catalog models
//!
//! Product names are stored composed: `"<CATEGORY> <base name>"` when the
//! product belongs to one of the fixed categories, or just the base name when
//! it is uncategorized. The category is recovered by checking the first
//! whitespace-delimited token of the stored name against the vocabulary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed product category vocabulary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Abarrotes,
    Bebida,
    Botana,
    Dulces,
    Higiene,
    Lacteos,
    Limpieza,
    Panaderia,
    /// Sentinel for products without a category prefix
    Uncategorized,
}

impl Category {
    /// All categories in the vocabulary (excludes the sentinel)
    pub fn vocabulary() -> &'static [Category] {
        &[
            Category::Abarrotes,
            Category::Bebida,
            Category::Botana,
            Category::Dulces,
            Category::Higiene,
            Category::Lacteos,
            Category::Limpieza,
            Category::Panaderia,
        ]
    }

    /// Uppercase token used as the name prefix. The sentinel has no label.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Category::Abarrotes => Some("ABARROTES"),
            Category::Bebida => Some("BEBIDA"),
            Category::Botana => Some("BOTANA"),
            Category::Dulces => Some("DULCES"),
            Category::Higiene => Some("HIGIENE"),
            Category::Lacteos => Some("LACTEOS"),
            Category::Limpieza => Some("LIMPIEZA"),
            Category::Panaderia => Some("PANADERIA"),
            Category::Uncategorized => None,
        }
    }

    /// Look up a category by its uppercase label
    pub fn from_label(label: &str) -> Option<Category> {
        Category::vocabulary()
            .iter()
            .copied()
            .find(|c| c.label() == Some(label))
    }
}

/// Compose a stored product name from a category and base name
pub fn compose_name(category: Category, base_name: &str) -> String {
    match category.label() {
        Some(label) if !base_name.is_empty() => format!("{} {}", label, base_name),
        Some(label) => label.to_string(),
        None => base_name.to_string(),
    }
}

/// Split a stored product name back into (category, base name)
pub fn split_name(name: &str) -> (Category, &str) {
    let mut parts = name.splitn(2, ' ');
    let first = parts.next().unwrap_or("");
    match Category::from_label(first) {
        Some(category) => (category, parts.next().unwrap_or("")),
        None => (Category::Uncategorized, name),
    }
}

/// Derive the default selling price from cost and margin percent
pub fn derive_selling_price(purchase_cost: Decimal, margin_percent: Decimal) -> Decimal {
    purchase_cost * (Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED)
}

/// A product master record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMaster {
    pub id: Uuid,
    /// Barcode or internal code; not required to be unique
    pub code: String,
    /// Stored composed name (see module docs)
    pub name: String,
    pub purchase_cost: Decimal,
    pub margin_percent: Decimal,
    pub selling_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductMaster {
    pub fn category(&self) -> Category {
        split_name(&self.name).0
    }

    pub fn base_name(&self) -> &str {
        split_name(&self.name).1
    }
}

/// An in-memory, not-yet-persisted edit of a product's master fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Absent for not-yet-created products
    pub id: Option<Uuid>,
    pub code: String,
    pub category: Category,
    pub base_name: String,
    pub purchase_cost: Decimal,
    pub margin_percent: Decimal,
    pub selling_price: Decimal,
}

impl ProductDraft {
    /// The composed name this draft will be stored under
    pub fn full_name(&self) -> String {
        compose_name(self.category, &self.base_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_compose_and_split_categorized() {
        let name = compose_name(Category::Bebida, "Coca Cola 500ml");
        assert_eq!(name, "BEBIDA Coca Cola 500ml");
        assert_eq!(split_name(&name), (Category::Bebida, "Coca Cola 500ml"));
    }

    #[test]
    fn test_split_uncategorized() {
        assert_eq!(
            split_name("Chicle Motita"),
            (Category::Uncategorized, "Chicle Motita")
        );
    }

    #[test]
    fn test_compose_uncategorized_is_identity() {
        assert_eq!(compose_name(Category::Uncategorized, "Cafe de olla"), "Cafe de olla");
    }

    #[test]
    fn test_split_base_starting_with_vocabulary_word() {
        // A base name that itself starts with a category token still
        // round-trips once composed under a category.
        let name = compose_name(Category::Dulces, "BEBIDA sabor cola");
        assert_eq!(split_name(&name), (Category::Dulces, "BEBIDA sabor cola"));
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Category::from_label("LIMPIEZA"), Some(Category::Limpieza));
        assert_eq!(Category::from_label("limpieza"), None);
        assert_eq!(Category::from_label("OTRA"), None);
    }

    #[test]
    fn test_derive_selling_price() {
        let cost = Decimal::from_str("10.00").unwrap();
        let margin = Decimal::from_str("30").unwrap();
        assert_eq!(derive_selling_price(cost, margin), Decimal::from_str("13.0000").unwrap());
    }
}
