//! Product form input and the rules a stored product must satisfy.

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::DomainError;

/// Price as submitted by a form or JSON client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Whole(u64),
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// Resolve to whole currency units, rejecting negative or fractional amounts.
    pub fn resolve(&self) -> Result<u64, DomainError> {
        match self {
            PriceInput::Whole(value) => Ok(*value),
            PriceInput::Number(value) => whole_units(*value),
            PriceInput::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation("price", "price is required"));
                }
                if let Ok(value) = trimmed.parse::<u64>() {
                    return Ok(value);
                }
                let value = trimmed.parse::<f64>().map_err(|_| {
                    DomainError::validation("price", format!("`{trimmed}` is not a number"))
                })?;
                whole_units(value)
            }
        }
    }
}

fn whole_units(value: f64) -> Result<u64, DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(
            "price",
            "price must be a non-negative amount",
        ));
    }
    if value.fract() != 0.0 {
        return Err(DomainError::validation(
            "price",
            "price must be a whole amount",
        ));
    }
    if value > u64::MAX as f64 {
        return Err(DomainError::validation("price", "price is out of range"));
    }
    Ok(value as u64)
}

/// Unvalidated product fields from the admin form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: PriceInput,
    pub category: String,
    pub product_type: String,
    pub description: String,
    pub image: String,
    pub shopee_link: String,
    pub is_best_seller: bool,
}

/// Product fields that passed validation and are ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: u64,
    pub category: String,
    pub product_type: String,
    pub description: String,
    pub image: String,
    pub shopee_link: String,
    pub is_best_seller: bool,
}

impl ProductInput {
    pub fn validate(self) -> Result<ProductFields, DomainError> {
        let name = required(self.name, "name")?;
        let price = self.price.resolve()?;
        let category = required(self.category, "category")?;
        let product_type = required(self.product_type, "type")?;
        let shopee_link = self.shopee_link.trim().to_string();
        if !shopee_link.is_empty() {
            validate_link(&shopee_link)?;
        }

        Ok(ProductFields {
            name,
            price,
            category,
            product_type,
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            shopee_link,
            is_best_seller: self.is_best_seller,
        })
    }
}

/// Validate a category or product type pair submitted by the admin dashboard.
pub fn validate_taxonomy(key: &str, value: &str) -> Result<(String, String), DomainError> {
    let key = required(key.to_string(), "key")?;
    let value = required(value.to_string(), "value")?;
    Ok((key, value))
}

fn required(raw: String, field: &'static str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "please fill in all fields"));
    }
    Ok(trimmed.to_string())
}

fn validate_link(link: &str) -> Result<(), DomainError> {
    let parsed = Url::parse(link)
        .map_err(|err| DomainError::validation("shopeeLink", format!("invalid URL: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DomainError::validation(
            "shopeeLink",
            format!("unsupported URL scheme `{other}`"),
        )),
    }
}
