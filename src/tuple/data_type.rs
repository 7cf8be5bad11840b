use std::fmt;

use crate::common::{Result, StoreError};

/// Represents the attribute types a table schema can hold.
/// Every type has a fixed width, so all slots of a table have the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer: 4 bytes, little-endian
    Int,

    /// Fixed-length string: exactly n bytes, NUL-padded
    String(u16),

    /// 32-bit floating point: 4 bytes, IEEE 754
    Float,

    /// Boolean: 1 byte (0 = false, 1 = true)
    Bool,
}

impl DataType {
    /// Returns the number of bytes a value of this type occupies in a record.
    pub fn size(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::String(n) => *n as usize,
            DataType::Float => 4,
            DataType::Bool => 1,
        }
    }

    /// Returns the type code stored on the header page.
    pub fn type_code(&self) -> i32 {
        match self {
            DataType::Int => 0,
            DataType::String(_) => 1,
            DataType::Float => 2,
            DataType::Bool => 3,
        }
    }

    /// Returns the declared type length stored next to the type code.
    /// Only strings carry one.
    pub fn type_length(&self) -> i32 {
        match self {
            DataType::String(n) => *n as i32,
            _ => 0,
        }
    }

    /// Rebuilds a DataType from its stored type code and length.
    pub fn from_code(code: i32, length: i32) -> Result<Self> {
        match code {
            0 => Ok(DataType::Int),
            1 => {
                let n = u16::try_from(length)
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        StoreError::invalid(format!("invalid string length {}", length))
                    })?;
                Ok(DataType::String(n))
            }
            2 => Ok(DataType::Float),
            3 => Ok(DataType::Bool),
            _ => Err(StoreError::UnsupportedType(code)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::String(n) => write!(f, "STRING({})", n),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Bool => write!(f, "BOOL"),
        }
    }
}
