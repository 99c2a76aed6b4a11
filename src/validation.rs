//! Field validators shared by the auction factory and any upstream caller
//! that wants to reject input before building an `Auction`.

use crate::constants::{
    MAX_TEXT_FIELD_CHARS, MIN_CATEGORY_CHARS, MIN_DESCRIPTION_CHARS, MIN_PRODUCT_NAME_CHARS,
};

fn validate_text(value: &str, min_exclusive: usize) -> Result<(), &'static str> {
    let char_count = value.trim().chars().count();
    if char_count <= min_exclusive {
        return Err("too short");
    }
    if char_count > MAX_TEXT_FIELD_CHARS {
        return Err("too long");
    }
    Ok(())
}

pub fn validate_product_name(product_name: &str) -> Result<(), &'static str> {
    validate_text(product_name, MIN_PRODUCT_NAME_CHARS)
        .map_err(|_| "product name must be 2 to 2000 characters")
}

pub fn validate_category(category: &str) -> Result<(), &'static str> {
    validate_text(category, MIN_CATEGORY_CHARS).map_err(|_| "category must be 3 to 2000 characters")
}

/// Descriptions carry the strictest minimum: at least 11 characters.
pub fn validate_description(description: &str) -> Result<(), &'static str> {
    validate_text(description, MIN_DESCRIPTION_CHARS)
        .map_err(|_| "description must be 11 to 2000 characters")
}
