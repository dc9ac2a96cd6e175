//! Input validation
//!
//! Turns raw field text into usage values and reports every problem as a
//! typed [`ValidationError`]. Nothing here panics or short-circuits: a whole
//! record is always checked field by field.

mod numeric;


use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::usage::{sanitize_usage_record, PartialUsage, UsageField, UsageRecord};

pub use numeric::{decimal_places, parse_numeric, sanitize_numeric_text};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,

    #[error("Please enter a valid number")]
    NotANumber,

    #[error("Value cannot be negative")]
    NegativeNumber,

    #[error("Value must be at least {min}")]
    TooSmall { min: f64 },

    #[error("Value must not exceed {max}")]
    TooLarge { max: f64 },

    #[error("Maximum {allowed} decimal places allowed")]
    InvalidDecimalPlaces { allowed: u32 },
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required => "REQUIRED",
            ValidationError::NotANumber => "NOT_A_NUMBER",
            ValidationError::NegativeNumber => "NEGATIVE_NUMBER",
            ValidationError::TooSmall { .. } => "TOO_SMALL",
            ValidationError::TooLarge { .. } => "TOO_LARGE",
            ValidationError::InvalidDecimalPlaces { .. } => "INVALID_DECIMAL_PLACES",
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Validate the text of one field.
///
/// Empty text is `Required` for required fields and `0` otherwise. The
/// negative check runs before the generic bound checks.
pub fn validate_field(
    text: &str,
    field: UsageField,
    required: bool,
) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return if required {
            Err(ValidationError::Required)
        } else {
            Ok(0.0)
        };
    }

    let value = parse_numeric(trimmed).ok_or(ValidationError::NotANumber)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeNumber);
    }

    let bounds = field.spec().bounds;
    if value < bounds.min {
        return Err(ValidationError::TooSmall { min: bounds.min });
    }
    if value > bounds.max {
        return Err(ValidationError::TooLarge { max: bounds.max });
    }
    if decimal_places(trimmed) > bounds.max_decimal_places {
        return Err(ValidationError::InvalidDecimalPlaces {
            allowed: bounds.max_decimal_places,
        });
    }

    // "-0" parses as negative zero
    Ok(if value == 0.0 { 0.0 } else { value })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeValidation {
    pub valid: bool,
    pub error: Option<ValidationError>,
    pub sanitized_value: Option<f64>,
    /// Invalid and non-empty. An empty required field is invalid but is not
    /// flagged while the user is still typing.
    pub show_error: bool,
}

pub fn validate_real_time(text: &str, field: UsageField, required: bool) -> RealTimeValidation {
    match validate_field(text, field, required) {
        Ok(value) => RealTimeValidation {
            valid: true,
            error: None,
            sanitized_value: Some(value),
            show_error: false,
        },
        Err(error) => RealTimeValidation {
            valid: false,
            error: Some(error),
            sanitized_value: None,
            show_error: !text.trim().is_empty(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordValidation {
    pub valid: bool,
    pub errors: BTreeMap<UsageField, ValidationError>,
    /// Fields that passed, with zero for the ones that did not.
    pub record: UsageRecord,
    pub unknown_fields: Vec<String>,
}

/// Validate a raw `fieldKey -> text` map.
///
/// Every known field is checked, missing ones as optional-empty. Unknown keys
/// are reported back but do not make the record invalid.
pub fn validate_record(raw: &BTreeMap<String, String>) -> RecordValidation {
    let mut texts: BTreeMap<UsageField, &str> = BTreeMap::new();
    let mut unknown_fields = Vec::new();
    for (key, text) in raw {
        match key.parse::<UsageField>() {
            Ok(field) => {
                texts.insert(field, text.as_str());
            }
            Err(_) => {
                warn!(key = %key, "ignoring unknown usage field");
                unknown_fields.push(key.clone());
            }
        }
    }

    let mut errors = BTreeMap::new();
    let mut accepted = PartialUsage::new();
    for field in UsageField::ALL {
        let text = texts.get(&field).copied().unwrap_or("");
        match validate_field(text, field, false) {
            Ok(value) => {
                accepted.insert(field, value);
            }
            Err(error) => {
                debug!(field = %field, code = error.code(), "field failed validation");
                errors.insert(field, error);
            }
        }
    }

    RecordValidation {
        valid: errors.is_empty(),
        errors,
        record: sanitize_usage_record(&accepted),
        unknown_fields,
    }
}
