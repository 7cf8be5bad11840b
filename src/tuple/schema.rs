use std::collections::HashMap;

use crate::common::codec::{read_i32, write_i32};
use crate::common::{Result, StoreError, ATTRIBUTE_NAME_SIZE, PAGE_SIZE};

use super::DataType;

/// Bytes one attribute occupies in the serialized schema:
/// name field + type code (4) + type length (4)
const ATTRIBUTE_ENTRY_SIZE: usize = ATTRIBUTE_NAME_SIZE + 8;

/// Bytes of the serialized schema preamble: attribute count (4) + key count (4)
const SCHEMA_PREAMBLE_SIZE: usize = 8;

/// Represents a single attribute in a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    data_type: DataType,
}

impl Attribute {
    /// Creates a new attribute definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Returns the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attribute data type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Returns the number of bytes this attribute occupies in a record.
    pub fn size(&self) -> usize {
        self.data_type.size()
    }

    fn validate(&self) -> Result<()> {
        let name = self.name.as_bytes();
        if name.is_empty() || name.len() > ATTRIBUTE_NAME_SIZE {
            return Err(StoreError::invalid(format!(
                "attribute name '{}' must be 1..={} bytes",
                self.name, ATTRIBUTE_NAME_SIZE
            )));
        }
        if name.contains(&0) {
            return Err(StoreError::invalid("attribute names may not contain NUL"));
        }
        if self.data_type.size() == 0 {
            return Err(StoreError::invalid(format!(
                "attribute '{}' has zero width",
                self.name
            )));
        }
        Ok(())
    }
}

/// Represents the schema of a table: its ordered attributes and key attributes.
///
/// ## Record Layout
///
/// ```text
/// +--------+-------------+-------------+-----+
/// | marker | attribute 0 | attribute 1 | ... |
/// | 1 byte | width(0)    | width(1)    |     |
/// +--------+-------------+-------------+-----+
/// ```
///
/// Attribute offsets count from 1 because byte 0 is the slot's occupancy
/// marker. Every record of a table is exactly `record_size()` bytes.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of attributes
    attributes: Vec<Attribute>,

    /// Indices of the key attributes
    key_attrs: Vec<usize>,

    /// Map from attribute name to attribute index
    name_to_index: HashMap<String, usize>,

    /// Byte offset of each attribute within a record
    offsets: Vec<usize>,

    /// Marker byte plus all attribute widths
    record_size: usize,
}

impl Schema {
    /// Creates a new schema from a list of attributes and key attribute indices.
    pub fn new(attributes: Vec<Attribute>, key_attrs: Vec<usize>) -> Result<Self> {
        if attributes.is_empty() {
            return Err(StoreError::invalid("a schema needs at least one attribute"));
        }

        let mut name_to_index = HashMap::with_capacity(attributes.len());
        let mut offsets = Vec::with_capacity(attributes.len());
        let mut offset = 1;

        for (i, attr) in attributes.iter().enumerate() {
            attr.validate()?;
            if name_to_index.insert(attr.name.clone(), i).is_some() {
                return Err(StoreError::invalid(format!(
                    "duplicate attribute name '{}'",
                    attr.name
                )));
            }
            offsets.push(offset);
            offset += attr.size();
        }

        if offset > PAGE_SIZE {
            return Err(StoreError::invalid(format!(
                "record size {} exceeds page size {}",
                offset, PAGE_SIZE
            )));
        }

        for (n, &key) in key_attrs.iter().enumerate() {
            if key >= attributes.len() {
                return Err(StoreError::invalid(format!(
                    "key attribute {} out of range",
                    key
                )));
            }
            if key_attrs[..n].contains(&key) {
                return Err(StoreError::invalid(format!(
                    "key attribute {} listed twice",
                    key
                )));
            }
        }

        Ok(Self {
            attributes,
            key_attrs,
            name_to_index,
            offsets,
            record_size: offset,
        })
    }

    /// Creates a schema builder for fluent construction.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the number of attributes in the schema.
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Returns the attribute at the given index.
    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    /// Returns the index of the attribute with the given name.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Returns an iterator over all attributes.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Returns the indices of the key attributes.
    pub fn key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }

    /// Returns the size of one record: the marker byte plus every attribute width.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Returns the size of the attribute payload (record size without the marker).
    pub fn payload_size(&self) -> usize {
        self.record_size - 1
    }

    /// Returns the byte offset of an attribute within a record, counting the
    /// marker byte at offset 0.
    pub fn attribute_offset(&self, index: usize) -> Result<usize> {
        self.offsets.get(index).copied().ok_or_else(|| {
            StoreError::invalid(format!(
                "attribute index {} out of range (schema has {})",
                index,
                self.attributes.len()
            ))
        })
    }

    /// Returns the attribute and its record offset, or InvalidArgument.
    pub(crate) fn locate(&self, index: usize) -> Result<(&Attribute, usize)> {
        let offset = self.attribute_offset(index)?;
        Ok((&self.attributes[index], offset))
    }

    /// Returns the number of bytes `serialize_into` writes.
    pub fn serialized_size(&self) -> usize {
        SCHEMA_PREAMBLE_SIZE
            + self.attributes.len() * ATTRIBUTE_ENTRY_SIZE
            + self.key_attrs.len() * 4
    }

    /// Serializes the schema for the header page.
    ///
    /// Format: attribute count (4) + key count (4) +
    /// [name (15, NUL-padded) + type code (4) + type length (4)]... +
    /// [key index (4)]...
    pub fn serialize_into(&self, out: &mut [u8]) -> Result<usize> {
        let size = self.serialized_size();
        if out.len() < size {
            return Err(StoreError::invalid(format!(
                "schema needs {} bytes, only {} available",
                size,
                out.len()
            )));
        }

        write_i32(out, 0, self.attributes.len() as i32);
        write_i32(out, 4, self.key_attrs.len() as i32);

        let mut offset = SCHEMA_PREAMBLE_SIZE;
        for attr in &self.attributes {
            let name = attr.name.as_bytes();
            out[offset..offset + ATTRIBUTE_NAME_SIZE].fill(0);
            out[offset..offset + name.len()].copy_from_slice(name);
            offset += ATTRIBUTE_NAME_SIZE;

            write_i32(out, offset, attr.data_type.type_code());
            write_i32(out, offset + 4, attr.data_type.type_length());
            offset += 8;
        }

        for &key in &self.key_attrs {
            write_i32(out, offset, key as i32);
            offset += 4;
        }

        Ok(offset)
    }

    /// Deserializes a schema written by `serialize_into`.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < SCHEMA_PREAMBLE_SIZE {
            return Err(StoreError::invalid("schema preamble truncated"));
        }

        let num_attrs = Self::read_count(data, 0, "attribute count")?;
        let num_keys = Self::read_count(data, 4, "key count")?;

        let needed = SCHEMA_PREAMBLE_SIZE + num_attrs * ATTRIBUTE_ENTRY_SIZE + num_keys * 4;
        if data.len() < needed {
            return Err(StoreError::invalid(format!(
                "schema of {} attributes truncated",
                num_attrs
            )));
        }

        let mut attributes = Vec::with_capacity(num_attrs);
        let mut offset = SCHEMA_PREAMBLE_SIZE;
        for _ in 0..num_attrs {
            let field = &data[offset..offset + ATTRIBUTE_NAME_SIZE];
            let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
            let name = String::from_utf8_lossy(&field[..end]).into_owned();
            offset += ATTRIBUTE_NAME_SIZE;

            let data_type = DataType::from_code(read_i32(data, offset), read_i32(data, offset + 4))?;
            offset += 8;

            attributes.push(Attribute::new(name, data_type));
        }

        let mut key_attrs = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            let key = read_i32(data, offset);
            let key = usize::try_from(key)
                .map_err(|_| StoreError::invalid(format!("negative key index {}", key)))?;
            key_attrs.push(key);
            offset += 4;
        }

        Schema::new(attributes, key_attrs)
    }

    fn read_count(data: &[u8], offset: usize, what: &str) -> Result<usize> {
        let count = read_i32(data, offset);
        usize::try_from(count)
            .ok()
            .filter(|&c| c <= PAGE_SIZE)
            .ok_or_else(|| StoreError::invalid(format!("invalid {} {}", what, count)))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.key_attrs == other.key_attrs
    }
}

impl Eq for Schema {}

/// Builder for constructing schemas fluently.
pub struct SchemaBuilder {
    attributes: Vec<Attribute>,
    key_attrs: Vec<usize>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            key_attrs: Vec::new(),
        }
    }

    /// Adds an attribute.
    pub fn attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.attributes.push(Attribute::new(name, data_type));
        self
    }

    /// Adds an attribute and marks it as part of the key.
    pub fn key_attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.key_attrs.push(self.attributes.len());
        self.attributes.push(Attribute::new(name, data_type));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Result<Schema> {
        Schema::new(self.attributes, self.key_attrs)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
