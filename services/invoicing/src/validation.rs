//! Input validation utilities

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

use crate::models::ItemInput;

/// Validate that a text field is present
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    if value.len() > 255 {
        return Err(format!("{} must be at most 255 characters long", field));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Validate a bank account number; empty means not provided
pub fn validate_account_number(number: &str) -> Result<(), String> {
    if number.is_empty() {
        return Ok(());
    }

    static ACCOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = ACCOUNT_REGEX
        .get_or_init(|| Regex::new(r"^[0-9]{4,34}$").expect("Failed to compile account regex"));

    if !regex.is_match(number) {
        return Err("Bank account number must contain 4 to 34 digits".to_string());
    }

    Ok(())
}

/// Validate a money amount or percentage
pub fn validate_non_negative(field: &str, value: Decimal) -> Result<(), String> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("{} must not be negative", field));
    }

    Ok(())
}

/// Validate invoice lines
pub fn validate_items(items: &[ItemInput]) -> Result<(), String> {
    for (index, item) in items.iter().enumerate() {
        validate_required(&format!("items[{}].description", index), &item.description)?;

        if item.quantity < 1 {
            return Err(format!("items[{}].quantity must be at least 1", index));
        }

        validate_non_negative(&format!("items[{}].unit_price", index), item.unit_price)?;
    }

    Ok(())
}
