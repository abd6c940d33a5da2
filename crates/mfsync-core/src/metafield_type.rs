//! Declared metafield types and conversion of raw values into typed ones.
//!
//! Shopify stores every metafield value as a string alongside a declared
//! type. Before a value is copied to another owner it is decoded per the
//! donor's declared type and re-encoded, so malformed integers surface as
//! per-field errors instead of remote validation failures.
//!
//! JSON is the exception: text that does not parse is passed through as-is
//! rather than rejected.

use std::fmt;

use thiserror::Error;

/// Lowercased strings that decode to `true` for boolean metafields.
const TRUTHY: [&str; 3] = ["true", "1", "yes"];

/// Declared type of a metafield, as sent in the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetafieldType {
    /// `single_line_text_field` / `multi_line_text_field`.
    Text(String),
    /// `number_integer` or legacy `integer`.
    Integer(String),
    /// `number_decimal` or legacy `float` / `decimal`.
    Decimal(String),
    Boolean,
    /// `json` or legacy `json_string`.
    Json(String),
    /// Legacy untyped `string`.
    Generic,
    /// Any other Shopify type (references, dimensions, lists...), passed through.
    Other(String),
}

impl MetafieldType {
    /// Parses the wire form. Returns `None` for a missing or blank type.
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        let parsed = match raw {
            "single_line_text_field" | "multi_line_text_field" => Self::Text(raw.to_owned()),
            "number_integer" | "integer" => Self::Integer(raw.to_owned()),
            "number_decimal" | "float" | "decimal" => Self::Decimal(raw.to_owned()),
            "boolean" => Self::Boolean,
            "json" | "json_string" => Self::Json(raw.to_owned()),
            "string" => Self::Generic,
            other => Self::Other(other.to_owned()),
        };
        Some(parsed)
    }

    /// The exact string to send back to the API.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Text(s) | Self::Integer(s) | Self::Decimal(s) | Self::Json(s) | Self::Other(s) => {
                s
            }
            Self::Boolean => "boolean",
            Self::Generic => "string",
        }
    }

    /// `true` for a type that carries no real information about the value.
    ///
    /// An existing field with an unset or generic type adopts the donor's type
    /// when overwritten; every other existing type is kept.
    #[must_use]
    pub fn is_generic(declared: Option<&Self>) -> bool {
        matches!(declared, None | Some(Self::Generic))
    }
}

impl fmt::Display for MetafieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CoerceError {
    #[error("value {value:?} is not a valid integer")]
    InvalidInteger { value: String },

    #[error("value {value:?} is not a valid decimal")]
    InvalidDecimal { value: String },
}

/// A metafield value decoded according to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Json(serde_json::Value),
}

impl CoercedValue {
    /// Re-encodes the value in the string form the Admin API expects.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Decimal(x) => x.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Json(v) => v.to_string(),
        }
    }
}

/// Decodes `value` per `declared`.
///
/// A missing value decodes as empty text for text-like types and fails for
/// numeric ones.
///
/// # Errors
///
/// Returns [`CoerceError`] when an integer or decimal metafield holds text
/// that is not a number.
pub fn coerce(value: Option<&str>, declared: Option<&MetafieldType>) -> Result<CoercedValue, CoerceError> {
    let raw = value.unwrap_or_default();
    match declared {
        Some(MetafieldType::Integer(_)) => raw
            .trim()
            .parse::<i64>()
            .map(CoercedValue::Integer)
            .map_err(|_| CoerceError::InvalidInteger {
                value: raw.to_owned(),
            }),
        Some(MetafieldType::Decimal(_)) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(CoercedValue::Decimal)
            .ok_or_else(|| CoerceError::InvalidDecimal {
                value: raw.to_owned(),
            }),
        Some(MetafieldType::Boolean) => Ok(CoercedValue::Boolean(
            TRUTHY.contains(&raw.to_lowercase().as_str()),
        )),
        Some(MetafieldType::Json(_)) => Ok(serde_json::from_str::<serde_json::Value>(raw)
            .map_or_else(|_| CoercedValue::Text(raw.to_owned()), CoercedValue::Json)),
        Some(MetafieldType::Text(_) | MetafieldType::Generic | MetafieldType::Other(_)) | None => {
            Ok(CoercedValue::Text(raw.to_owned()))
        }
    }
}
