//! Raw-text → JSON value converters for scalar fields.
use std::fmt;
use std::rc::Rc;

use serde_json::{Number, Value};

use crate::error::ConvertError;

const TRUTHY: &[&str] = &["yes", "y", "true", "t", "on"];
const FALSY: &[&str] = &["no", "n", "false", "f", "off"];

pub type CustomConverter = Rc<dyn Fn(&str) -> Result<Value, ConvertError>>;

#[derive(Clone, Default)]
pub enum Converter {
    #[default]
    Text,
    Bool,
    Integer,
    Float,
    /// RFC 3339 timestamp, stored normalized.
    DateTime,
    /// Only the listed strings are accepted, verbatim.
    Choice(Vec<String>),
    Custom(CustomConverter),
}

impl Converter {
    pub fn custom(f: impl Fn(&str) -> Result<Value, ConvertError> + 'static) -> Self {
        Converter::Custom(Rc::new(f))
    }

    pub fn convert(&self, raw: &str) -> Result<Value, ConvertError> {
        match self {
            Converter::Text => Ok(Value::String(raw.to_string())),
            Converter::Bool => parse_bool(raw).map(Value::Bool),
            Converter::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| ConvertError::new(format!("invalid integer {raw:?}: {e}"))),
            Converter::Float => {
                let f = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| ConvertError::new(format!("invalid number {raw:?}: {e}")))?;
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| ConvertError::new(format!("number must be finite: {raw:?}")))
            }
            Converter::DateTime => chrono::DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| Value::String(dt.to_rfc3339()))
                .map_err(|e| ConvertError::new(format!("invalid RFC 3339 timestamp {raw:?}: {e}"))),
            Converter::Choice(choices) => {
                if choices.iter().any(|c| c == raw) {
                    Ok(Value::String(raw.to_string()))
                } else {
                    let listed = choices.iter().map(|c| format!("{c:?}")).collect::<Vec<_>>();
                    Err(ConvertError::new(format!("value must be one of: {}", listed.join(","))))
                }
            }
            Converter::Custom(f) => f(raw),
        }
    }

    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Converter::Choice(choices) => Some(choices),
            _ => None,
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converter::Text => f.write_str("Text"),
            Converter::Bool => f.write_str("Bool"),
            Converter::Integer => f.write_str("Integer"),
            Converter::Float => f.write_str("Float"),
            Converter::DateTime => f.write_str("DateTime"),
            Converter::Choice(choices) => f.debug_tuple("Choice").field(choices).finish(),
            Converter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub fn parse_bool(raw: &str) -> Result<bool, ConvertError> {
    let lowered = raw.trim().to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(ConvertError::new("value must be yes or no"))
    }
}
