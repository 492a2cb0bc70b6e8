use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// The employee signed in at the register.
///
/// Built from the session configuration every time it is sent, so it is a
/// snapshot rather than shared state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub username: String,
}

impl Employee {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// The loyalty customer currently checked in at the register.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// A single line on an order.
///
/// Prices are exact decimals and travel as JSON numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skus: Vec<String>,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::arbitrary_precision::serialize",
        deserialize_with = "decimal_or_zero"
    )]
    pub price: Decimal,
}

impl OrderItem {
    /// Builds a single-SKU line, trimming trailing whitespace from the SKU
    /// and name (register exports pad these fields).
    pub fn new(sku: &str, name: &str, price: Decimal) -> Self {
        Self {
            name: name.trim_end().to_string(),
            skus: vec![sku.trim_end().to_string()],
            price,
        }
    }
}

/// A reward or promotion applied to an order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Discount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skus: Vec<String>,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::arbitrary_precision::serialize",
        deserialize_with = "decimal_or_zero"
    )]
    pub percent: Decimal,
}

impl Discount {
    pub fn new(sku: &str, name: &str, percent: Decimal) -> Self {
        Self {
            name: name.trim_end().to_string(),
            skus: vec![sku.trim_end().to_string()],
            percent,
        }
    }

    /// Whether the percentage lies within `0..=100`.
    pub fn percent_in_range(&self) -> bool {
        self.percent >= Decimal::ZERO && self.percent <= Decimal::ONE_HUNDRED
    }
}

/// An order as exchanged with the register.
///
/// `total` is supplied by the caller and never derived from the lines.
/// `discounts` and `total` are omitted from the wire when absent; the
/// register distinguishes "no discount list" from an empty one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounts: Option<Vec<Discount>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub total: Option<Decimal>,
}

// The register sends `null` for empty reference fields; read those as the
// field's default so one sparse line does not reject the whole order.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = rust_decimal::serde::arbitrary_precision_option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
