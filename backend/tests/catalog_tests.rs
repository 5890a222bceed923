//! Product catalog tests
//!
//! Covers the category vocabulary, the composed-name round trip, price
//! derivation, and quantity clamping.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{compose_name, derive_selling_price, split_name, Category, ProductDraft};
use shared::validation::{clamp_quantity, validate_product_draft};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    /// The vocabulary is fixed, uppercase, and free of duplicates
    #[test]
    fn test_vocabulary_shape() {
        let vocabulary = Category::vocabulary();
        assert_eq!(vocabulary.len(), 8);

        let labels: Vec<&str> = vocabulary.iter().map(|c| c.label().unwrap()).collect();
        for label in &labels {
            assert!(label.chars().all(|c| c.is_ascii_uppercase()));
            assert!(!label.contains(' '));
        }

        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
    }

    /// The sentinel never appears in the vocabulary and has no label
    #[test]
    fn test_uncategorized_is_sentinel() {
        assert!(!Category::vocabulary().contains(&Category::Uncategorized));
        assert_eq!(Category::Uncategorized.label(), None);
    }

    #[test]
    fn test_composed_name_round_trip() {
        let name = compose_name(Category::Bebida, "Coca Cola 500ml");
        assert_eq!(name, "BEBIDA Coca Cola 500ml");

        let (category, base) = split_name(&name);
        assert_eq!(category, Category::Bebida);
        assert_eq!(base, "Coca Cola 500ml");
    }

    /// Names whose first token is not in the vocabulary stay whole
    #[test]
    fn test_unprefixed_name_is_uncategorized() {
        let (category, base) = split_name("Chicle Motita");
        assert_eq!(category, Category::Uncategorized);
        assert_eq!(base, "Chicle Motita");
    }

    /// Lowercase and partial matches do not count as category prefixes
    #[test]
    fn test_prefix_match_is_exact() {
        assert_eq!(split_name("bebida Coca").0, Category::Uncategorized);
        assert_eq!(split_name("BEBIDAS Coca").0, Category::Uncategorized);
    }

    #[test]
    fn test_derive_selling_price() {
        assert_eq!(
            derive_selling_price(dec("10.00"), dec("30")),
            dec("13.0000")
        );
        assert_eq!(derive_selling_price(dec("0"), dec("50")), dec("0"));
    }

    #[test]
    fn test_draft_validation_rejects_blank_name() {
        let draft = ProductDraft {
            id: None,
            code: String::new(),
            category: Category::Bebida,
            base_name: "  ".to_string(),
            purchase_cost: dec("1"),
            margin_percent: dec("10"),
            selling_price: dec("1.10"),
        };
        assert!(validate_product_draft(&draft).is_err());
    }

    #[test]
    fn test_draft_validation_rejects_negative_money() {
        let draft = ProductDraft {
            id: None,
            code: String::new(),
            category: Category::Bebida,
            base_name: "Agua 1L".to_string(),
            purchase_cost: dec("-1"),
            margin_percent: dec("10"),
            selling_price: dec("1.10"),
        };
        assert!(validate_product_draft(&draft).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::vocabulary().to_vec())
}

/// Base names that do not themselves start with a vocabulary token; split
/// is keyed on the first token only, so composed names always round-trip.
fn base_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 ]{0,30}".prop_map(|s| s.trim().to_string())
}

proptest! {
    /// compose then split recovers the category and base name exactly
    #[test]
    fn prop_name_round_trip(
        category in category_strategy(),
        base in base_name_strategy(),
    ) {
        prop_assume!(!base.is_empty());

        let name = compose_name(category, &base);
        let (split_category, split_base) = split_name(&name);

        prop_assert_eq!(split_category, category);
        prop_assert_eq!(split_base, base);
    }

    /// Uncategorized names pass through compose unchanged
    #[test]
    fn prop_uncategorized_compose_is_identity(base in base_name_strategy()) {
        prop_assert_eq!(compose_name(Category::Uncategorized, &base), base);
    }

    /// Selling price derivation is monotonic in the margin
    #[test]
    fn prop_selling_price_grows_with_margin(
        cost_cents in 1i64..1_000_000,
        margin_a in 0u32..500,
        margin_b in 0u32..500,
    ) {
        let cost = Decimal::new(cost_cents, 2);
        let price_a = derive_selling_price(cost, Decimal::from(margin_a));
        let price_b = derive_selling_price(cost, Decimal::from(margin_b));

        if margin_a <= margin_b {
            prop_assert!(price_a <= price_b);
        } else {
            prop_assert!(price_a >= price_b);
        }
    }

    /// Clamping is idempotent and never negative
    #[test]
    fn prop_clamp_is_idempotent(quantity in i32::MIN..i32::MAX) {
        let clamped = clamp_quantity(quantity);
        prop_assert!(clamped >= 0);
        prop_assert_eq!(clamp_quantity(clamped), clamped);
    }
}
