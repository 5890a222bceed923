//! Validation utilities for the POS Inventory Platform

use rust_decimal::Decimal;

use crate::models::ProductDraft;

/// Clamp a requested stock quantity to the valid range.
///
/// Negative requests are clamped to zero rather than rejected, so common
/// off-by-one corrections are not blocked.
pub fn clamp_quantity(requested: i32) -> i32 {
    requested.max(0)
}

/// Validate that a monetary field is non-negative
pub fn validate_money(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Monetary values cannot be negative");
    }
    Ok(())
}

/// Validate a product code (barcode or internal code, optional)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    if code.len() > 64 {
        return Err("Product code must be at most 64 characters");
    }
    if code.chars().any(|c| c.is_whitespace()) {
        return Err("Product code cannot contain whitespace");
    }
    Ok(())
}

/// Validate the numeric fields and name of a product draft
pub fn validate_product_draft(draft: &ProductDraft) -> Result<(), &'static str> {
    if draft.base_name.trim().is_empty() {
        return Err("Product name cannot be empty");
    }
    validate_product_code(&draft.code)?;
    validate_money(draft.purchase_cost)?;
    validate_money(draft.margin_percent)?;
    validate_money(draft.selling_price)?;
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate business code format (3-10 uppercase alphanumeric)
pub fn validate_business_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Business code must be at least 3 characters");
    }
    if code.len() > 10 {
        return Err("Business code must be at most 10 characters");
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err("Business code must be uppercase alphanumeric only");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            id: None,
            code: "7501055300075".to_string(),
            category: Category::Bebida,
            base_name: "Coca Cola 500ml".to_string(),
            purchase_cost: dec("12.50"),
            margin_percent: dec("20"),
            selling_price: dec("15.00"),
        }
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(5), 5);
        assert_eq!(clamp_quantity(0), 0);
        assert_eq!(clamp_quantity(-3), 0);
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money(dec("0")).is_ok());
        assert!(validate_money(dec("10.50")).is_ok());
        assert!(validate_money(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("").is_ok());
        assert!(validate_product_code("7501055300075").is_ok());
        assert!(validate_product_code("AB 123").is_err());
    }

    #[test]
    fn test_validate_product_draft_ok() {
        assert!(validate_product_draft(&draft()).is_ok());
    }

    #[test]
    fn test_validate_product_draft_negative_cost() {
        let mut d = draft();
        d.purchase_cost = dec("-1");
        assert!(validate_product_draft(&d).is_err());
    }

    #[test]
    fn test_validate_product_draft_empty_name() {
        let mut d = draft();
        d.base_name = "   ".to_string();
        assert!(validate_product_draft(&d).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("caja@tienda.mx").is_ok());
        assert!(validate_email("invalid").is_err());
    }

    #[test]
    fn test_validate_business_code() {
        assert!(validate_business_code("CENTRO").is_ok());
        assert!(validate_business_code("AB").is_err());
        assert!(validate_business_code("centro").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("short").is_err());
    }
}
