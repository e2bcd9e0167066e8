//! Raw runtime values supplied for execution-plan parameters.
//!
//! Values arrive untyped (usually from JSON) and are validated and coerced
//! against the plan's declared parameters before execution proceeds.
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use pure_grammar::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    /// Calendar date without a time component.
    Date(NaiveDate),
    /// Date and time without a zone.
    LocalDateTime(NaiveDateTime),
    /// Point on the timeline, normalized to UTC.
    Instant(DateTime<Utc>),
    List(Vec<RawValue>),
}

impl RawValue {
    /// Map a JSON parameter value. Whole numbers stay integers; temporal
    /// values arrive as strings and are only classified during coercion.
    pub fn from_json(value: &JsonValue) -> EngineResult<RawValue> {
        Ok(match value {
            JsonValue::Null => RawValue::Null,
            JsonValue::Bool(value) => RawValue::Boolean(*value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(value) => RawValue::Integer(value),
                None => RawValue::Float(number.as_f64().ok_or_else(|| {
                    EngineError::execution(format!(
                        "Unsupported numeric parameter value: {}",
                        number
                    ))
                })?),
            },
            JsonValue::String(value) => RawValue::String(value.clone()),
            JsonValue::Array(values) => RawValue::List(
                values
                    .iter()
                    .map(RawValue::from_json)
                    .collect::<EngineResult<Vec<_>>>()?,
            ),
            JsonValue::Object(_) => {
                return Err(EngineError::execution(
                    "Unsupported object parameter value",
                ));
            }
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Boolean(value) => write!(f, "{}", value),
            RawValue::Integer(value) => write!(f, "{}", value),
            // whole floats keep one fractional digit so they read as floats
            RawValue::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                write!(f, "{:.1}", value)
            }
            RawValue::Float(value) => write!(f, "{}", value),
            RawValue::Decimal(value) => write!(f, "{}", value),
            RawValue::String(value) => write!(f, "{}", value),
            RawValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            RawValue::LocalDateTime(value) => {
                if value.nanosecond() == 0 {
                    write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S"))
                } else {
                    write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.3f"))
                }
            }
            RawValue::Instant(value) => {
                if value.nanosecond() == 0 {
                    write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%SZ"))
                } else {
                    write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
                }
            }
            RawValue::List(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        assert_eq!(RawValue::from_json(&json!(null)).unwrap(), RawValue::Null);
        assert_eq!(
            RawValue::from_json(&json!(42)).unwrap(),
            RawValue::Integer(42)
        );
        assert_eq!(
            RawValue::from_json(&json!(2.5)).unwrap(),
            RawValue::Float(2.5)
        );
        assert_eq!(
            RawValue::from_json(&json!([1, "a"])).unwrap(),
            RawValue::List(vec![
                RawValue::Integer(1),
                RawValue::String("a".to_string())
            ])
        );
        assert!(RawValue::from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(RawValue::Integer(5).to_string(), "5");
        assert_eq!(RawValue::Float(5.0).to_string(), "5.0");
        assert_eq!(RawValue::Float(2.75).to_string(), "2.75");
        assert_eq!(RawValue::String("hi".to_string()).to_string(), "hi");
        assert_eq!(
            RawValue::List(vec![RawValue::Integer(1), RawValue::Integer(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(
            RawValue::Date(NaiveDate::from_ymd_opt(2020, 7, 14).unwrap()).to_string(),
            "2020-07-14"
        );
    }
}
