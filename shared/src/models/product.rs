//! Product Model
//!
//! Mirrors the REST product API. Field names on the wire are Spanish
//! (`nombre`, `precio`, `disponible`, ...); both spellings deserialize.

use crate::order::CartLine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "precio")]
    pub price: f64,
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    /// API sends 0/1
    #[serde(default = "default_available", alias = "disponible", deserialize_with = "bool_or_int")]
    pub available: bool,
    #[serde(default, alias = "imagenes")]
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductImage {
    #[serde(alias = "url_imagen")]
    pub url: String,
    #[serde(default, alias = "orden")]
    pub position: i32,
}

/// Query for the product list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub available: Option<bool>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl Product {
    /// Image with the lowest position
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.iter().min_by_key(|img| img.position)
    }

    pub fn to_cart_line(&self, quantity: u32) -> CartLine {
        CartLine::new(self.id.clone(), self.name.clone(), self.price).with_quantity(quantity)
    }
}

fn default_available() -> bool {
    true
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        Value::Null => Ok(default_available()),
        other => Err(serde::de::Error::custom(format!(
            "expected bool or 0/1, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_payload() {
        let json = r#"{
            "id": 7,
            "nombre": "Arepa de queso",
            "precio": 2500,
            "categoria": "arepas",
            "descripcion": "Con queso costeño",
            "disponible": 0,
            "imagenes": [
                {"url_imagen": "b.jpg", "orden": 2},
                {"url_imagen": "a.jpg", "orden": 1}
            ]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, "7");
        assert_eq!(product.price, 2500.0);
        assert!(!product.available);
        assert_eq!(product.primary_image().unwrap().url, "a.jpg");
    }

    #[test]
    fn test_to_cart_line() {
        let product: Product =
            serde_json::from_str(r#"{"id":"p1","name":"Jugo","price":4500}"#).unwrap();
        assert!(product.available);
        let line = product.to_cart_line(2);
        assert_eq!(line.product_ref, "p1");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, 4500.0);
    }
}
