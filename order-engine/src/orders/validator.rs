//! Order payload validation
//!
//! Turns a raw storefront payload into a normalized [`Order`] or reports
//! every violated rule at once. Pure: no I/O, the only ambient input is the
//! clock, and [`validate_at`] takes that explicitly.
//!
//! Both English (`customer`, `items`, `unitPrice`) and the storefront's
//! Spanish keys (`cliente`, `productos`, `precio`) are accepted.

use crate::utils::{money, now_millis};
use serde_json::{Map, Value};
use shared::error::{FieldViolation, ValidationError};
use shared::order::{Customer, Order, OrderItem, OrderStatus};
use std::collections::BTreeMap;

// ── Limits ──────────────────────────────────────────────────────────

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PHONE_LEN: usize = 7;
pub const MIN_ADDRESS_LEN: usize = 5;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_SHORT_TEXT_LEN: usize = 100;
pub const MAX_ADDRESS_LEN: usize = 500;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NOTE_LEN: usize = 500;
pub const MAX_QUANTITY: u32 = 9999;
pub const MAX_UNIT_PRICE: f64 = 100_000_000.0;
pub const MAX_TOTAL: f64 = 1_000_000_000_000.0;

/// Validate against the current clock
pub fn validate(raw: &Value) -> Result<Order, ValidationError> {
    validate_at(raw, now_millis())
}

/// Validate and normalize, stamping `created_at`/`updated_at` with `now`
pub fn validate_at(raw: &Value, now: i64) -> Result<Order, ValidationError> {
    let Some(root) = raw.as_object() else {
        return Err(ValidationError::single("order", "order must be an object"));
    };

    let mut violations = Vec::new();

    let customer = parse_customer(field(root, &["customer", "cliente"]), &mut violations);
    let items = parse_items(field(root, &["items", "productos"]), &mut violations);

    let total = field(root, &["total"]).and_then(number).unwrap_or(0.0);
    let amount = if total <= 0.0 {
        violations.push(FieldViolation::new("total", "total must be greater than 0"));
        None
    } else if total > MAX_TOTAL {
        violations.push(FieldViolation::new(
            "total",
            format!("total must not exceed {}", MAX_TOTAL),
        ));
        None
    } else {
        let amount = money::to_decimal(total);
        if amount.is_none() {
            violations.push(FieldViolation::new("total", "total is not a valid amount"));
        }
        amount
    };
    if let (Some(amount), Some(items)) = (amount, &items) {
        match money::items_total(items) {
            Some(expected) if money::money_eq(amount, expected) => {}
            Some(expected) => violations.push(FieldViolation::new(
                "total",
                format!("total {} does not match item sum {}", total, money::to_f64(expected)),
            )),
            None => violations.push(FieldViolation::new("total", "item sum is out of range")),
        }
    }

    let notes = field(root, &["notes", "notas"]).and_then(text).filter(|n| !n.is_empty());
    if let Some(n) = &notes {
        check_max(n, "notes", MAX_NOTE_LEN, &mut violations);
    }

    if !violations.is_empty() {
        return Err(ValidationError::new(violations));
    }

    // Every None above produced a violation
    let (Some(customer), Some(items), Some(amount)) = (customer, items, amount) else {
        return Err(ValidationError::single("order", "order is incomplete"));
    };

    let local_id = field(root, &["localId"])
        .and_then(text)
        .or_else(|| field(root, &["id"]).and_then(text))
        .filter(|id| !id.is_empty());
    let owner_ref = field(root, &["ownerRef", "userId"])
        .and_then(text)
        .filter(|o| !o.is_empty());

    Ok(Order {
        id: String::new(),
        local_id,
        customer,
        items,
        total: money::to_f64(amount),
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
        status_history: BTreeMap::new(),
        status_notes: BTreeMap::new(),
        notes,
        owner_ref,
    })
}

fn parse_customer(raw: Option<&Value>, violations: &mut Vec<FieldViolation>) -> Option<Customer> {
    let Some(obj) = raw.and_then(Value::as_object) else {
        violations.push(FieldViolation::new("customer", "customer is required"));
        return None;
    };

    let name = field(obj, &["name", "nombre"]).and_then(text).unwrap_or_default();
    let phone = field(obj, &["phone", "telefono"]).and_then(text).unwrap_or_default();
    let address = field(obj, &["address", "direccion"]).and_then(text).unwrap_or_default();
    let email = field(obj, &["email"]).and_then(text).filter(|e| !e.is_empty());

    let before = violations.len();
    check_min(&name, "customer.name", "name", MIN_NAME_LEN, violations);
    check_max(&name, "customer.name", MAX_NAME_LEN, violations);
    check_min(&phone, "customer.phone", "phone", MIN_PHONE_LEN, violations);
    check_max(&phone, "customer.phone", MAX_SHORT_TEXT_LEN, violations);
    check_min(&address, "customer.address", "address", MIN_ADDRESS_LEN, violations);
    check_max(&address, "customer.address", MAX_ADDRESS_LEN, violations);
    if let Some(e) = &email {
        check_max(e, "customer.email", MAX_EMAIL_LEN, violations);
    }

    (violations.len() == before).then_some(Customer {
        name,
        phone,
        address,
        email,
    })
}

fn parse_items(
    raw: Option<&Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<Vec<OrderItem>> {
    let list = match raw {
        Some(Value::Array(list)) if !list.is_empty() => list,
        Some(Value::Array(_)) => {
            violations.push(FieldViolation::new("items", "order must contain at least one item"));
            return None;
        }
        _ => {
            violations.push(FieldViolation::new("items", "items are required"));
            return None;
        }
    };

    let before = violations.len();
    let mut items = Vec::with_capacity(list.len());
    for (index, raw_item) in list.iter().enumerate() {
        if let Some(item) = parse_item(index, raw_item, violations) {
            items.push(item);
        }
    }
    (violations.len() == before).then_some(items)
}

fn parse_item(
    index: usize,
    raw: &Value,
    violations: &mut Vec<FieldViolation>,
) -> Option<OrderItem> {
    let path = |f: &str| format!("items[{}].{}", index, f);
    let label = index + 1;

    let Some(obj) = raw.as_object() else {
        violations.push(FieldViolation::new(
            format!("items[{}]", index),
            format!("item {}: must be an object", label),
        ));
        return None;
    };

    let before = violations.len();

    let name = field(obj, &["name", "nombre"]).and_then(text).unwrap_or_default();
    if name.is_empty() {
        violations.push(FieldViolation::new(
            path("name"),
            format!("item {}: name is required", label),
        ));
    }

    let unit_price = field(obj, &["unitPrice", "price", "precio"])
        .and_then(number)
        .unwrap_or(0.0);
    if unit_price <= 0.0 {
        violations.push(FieldViolation::new(
            path("unitPrice"),
            format!("item {}: price must be greater than 0", label),
        ));
    } else if unit_price > MAX_UNIT_PRICE {
        violations.push(FieldViolation::new(
            path("unitPrice"),
            format!("item {}: price must not exceed {}", label, MAX_UNIT_PRICE),
        ));
    }

    let quantity = match field(obj, &["quantity", "cantidad"]) {
        None => Some(1),
        Some(v) => number(v)
            .filter(|q| q.fract() == 0.0 && *q >= 1.0 && *q <= f64::from(MAX_QUANTITY))
            .map(|q| q as u32),
    };
    if quantity.is_none() {
        violations.push(FieldViolation::new(
            path("quantity"),
            format!(
                "item {}: quantity must be a whole number between 1 and {}",
                label, MAX_QUANTITY
            ),
        ));
    }

    if violations.len() != before {
        return None;
    }

    Some(OrderItem {
        product_ref: field(obj, &["productRef", "productId", "id"])
            .and_then(text)
            .unwrap_or_default(),
        name,
        unit_price,
        quantity: quantity.unwrap_or(1),
        description: field(obj, &["description", "descripcion"])
            .and_then(text)
            .unwrap_or_default(),
        customization: field(obj, &["customization", "personalizacion"]).cloned(),
    })
}

// ── Helpers ─────────────────────────────────────────────────────────

/// First present, non-null value among `keys`
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Trimmed string; numbers are accepted and rendered
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number; numeric strings are coerced
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn check_min(
    value: &str,
    field: &str,
    label: &str,
    min: usize,
    violations: &mut Vec<FieldViolation>,
) {
    if value.chars().count() < min {
        violations.push(FieldViolation::new(
            field,
            format!("{} must have at least {} characters", label, min),
        ));
    }
}

fn check_max(value: &str, field: &str, max: usize, violations: &mut Vec<FieldViolation>) {
    let len = value.chars().count();
    if len > max {
        violations.push(FieldViolation::new(
            field,
            format!("{} is too long ({} chars, max {})", field, len, max),
        ));
    }
}
