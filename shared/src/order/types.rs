//! Order building blocks

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Customer contact data attached to an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Customer {
    /// Identity used to count distinct customers: email when present, else phone
    pub fn dedup_key(&self) -> String {
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_lowercase(),
            _ => self.phone.trim().to_string(),
        }
    }
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product_ref: String,
    pub name: String,
    pub unit_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    /// Free-form selections (size, extras, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Value>,
}

fn default_quantity() -> u32 {
    1
}

/// Client-local cart line, never persisted to the order store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_ref: String,
    pub name: String,
    pub unit_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Value>,
}

impl CartLine {
    pub fn new(product_ref: impl Into<String>, name: impl Into<String>, unit_price: f64) -> Self {
        Self {
            product_ref: product_ref.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
            customization: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_customization(mut self, customization: Value) -> Self {
        self.customization = Some(customization);
        self
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_ref: line.product_ref.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            description: String::new(),
            customization: line.customization.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_prefers_email() {
        let mut c = Customer {
            name: "Ana".into(),
            phone: "3001234567".into(),
            address: "Calle 10".into(),
            email: Some(" Ana@Mail.com ".into()),
        };
        assert_eq!(c.dedup_key(), "ana@mail.com");
        c.email = Some("   ".into());
        assert_eq!(c.dedup_key(), "3001234567");
        c.email = None;
        assert_eq!(c.dedup_key(), "3001234567");
    }

    #[test]
    fn test_item_quantity_defaults_to_one() {
        let item: OrderItem =
            serde_json::from_str(r#"{"name":"Arepa","unitPrice":2500}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.customization.is_none());
    }
}
