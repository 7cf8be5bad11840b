use std::cmp::Ordering;
use std::fmt;

use crate::common::{Result, StoreError};

use super::DataType;

/// Represents a typed attribute value.
/// Each variant corresponds to a DataType and holds the actual data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer
    Int(i32),

    /// String value, stored NUL-padded in a fixed-length field
    String(String),

    /// 32-bit floating point
    Float(f32),

    /// Boolean value
    Bool(bool),
}

impl Value {
    /// Returns true if this value can be stored in an attribute of the given type.
    pub fn matches_type(&self, data_type: &DataType) -> bool {
        matches!(
            (self, data_type),
            (Value::Int(_), DataType::Int)
                | (Value::String(_), DataType::String(_))
                | (Value::Float(_), DataType::Float)
                | (Value::Bool(_), DataType::Bool)
        )
    }

    /// Returns the boolean payload, if this is a Bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Encodes the value into `out`, which must be exactly `data_type.size()` bytes.
    pub fn encode(&self, data_type: &DataType, out: &mut [u8]) -> Result<()> {
        if out.len() != data_type.size() {
            return Err(StoreError::invalid(format!(
                "{} needs {} bytes, got {}",
                data_type,
                data_type.size(),
                out.len()
            )));
        }

        match (self, data_type) {
            (Value::Int(v), DataType::Int) => out.copy_from_slice(&v.to_le_bytes()),
            (Value::Float(v), DataType::Float) => out.copy_from_slice(&v.to_le_bytes()),
            (Value::Bool(b), DataType::Bool) => out[0] = u8::from(*b),
            (Value::String(s), DataType::String(n)) => {
                let bytes = s.as_bytes();
                if bytes.len() > *n as usize {
                    return Err(StoreError::invalid(format!(
                        "string of {} bytes does not fit {}",
                        bytes.len(),
                        data_type
                    )));
                }
                if bytes.contains(&0) {
                    return Err(StoreError::invalid("string values may not contain NUL"));
                }
                // NUL-pad to the declared length
                out.fill(0);
                out[..bytes.len()].copy_from_slice(bytes);
            }
            _ => {
                return Err(StoreError::invalid(format!(
                    "value {} does not match attribute type {}",
                    self, data_type
                )))
            }
        }
        Ok(())
    }

    /// Decodes a value of the given type from `data`, which must be exactly
    /// `data_type.size()` bytes.
    pub fn decode(data: &[u8], data_type: &DataType) -> Result<Self> {
        if data.len() != data_type.size() {
            return Err(StoreError::invalid(format!(
                "{} needs {} bytes, got {}",
                data_type,
                data_type.size(),
                data.len()
            )));
        }

        let value = match data_type {
            DataType::Int => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(data);
                Value::Int(i32::from_le_bytes(bytes))
            }
            DataType::Float => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(data);
                Value::Float(f32::from_le_bytes(bytes))
            }
            DataType::Bool => Value::Bool(data[0] != 0),
            DataType::String(_) => {
                // Read up to the first NUL
                let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
                Value::String(String::from_utf8_lossy(&data[..end]).into_owned())
            }
        };
        Ok(value)
    }

    /// Compares two values for ordering.
    /// Returns None if the values are of different types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
