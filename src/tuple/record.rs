use crate::common::{RecordId, Result, StoreError};
use crate::storage::page::SlotState;

use super::{Schema, Value};

/// One tuple buffer: a record ID plus exactly `schema.record_size()` bytes
/// laid out as `[marker][attribute bytes...]`.
///
/// Attribute bytes are only reachable through `get_attr`/`set_attr`, which
/// compute offsets from the schema the caller passes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: RecordId,
    data: Vec<u8>,
}

impl Record {
    /// Creates a zeroed record sized for the given schema.
    pub fn new(schema: &Schema) -> Self {
        let mut data = vec![0u8; schema.record_size()];
        data[0] = SlotState::Free.as_byte();
        Self {
            id: RecordId::default(),
            data,
        }
    }

    /// Creates a record holding the given values, one per attribute.
    pub fn from_values(schema: &Schema, values: &[Value]) -> Result<Self> {
        if values.len() != schema.num_attributes() {
            return Err(StoreError::invalid(format!(
                "expected {} values, got {}",
                schema.num_attributes(),
                values.len()
            )));
        }

        let mut record = Self::new(schema);
        for (i, value) in values.iter().enumerate() {
            record.set_attr(schema, i, value)?;
        }
        Ok(record)
    }

    /// Creates a record from a raw attribute payload (record bytes without the marker).
    pub(crate) fn from_payload(id: RecordId, payload: &[u8]) -> Self {
        let mut data = Vec::with_capacity(payload.len() + 1);
        data.push(SlotState::Occupied.as_byte());
        data.extend_from_slice(payload);
        Self { id, data }
    }

    /// Returns the record ID. Meaningful once the record was inserted or fetched.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Sets the record ID, e.g. to address an update.
    pub fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    /// Returns the full record buffer including the marker byte.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the attribute payload (everything after the marker byte).
    pub fn payload(&self) -> &[u8] {
        &self.data[1..]
    }

    /// Replaces this record's contents with a payload read from a page.
    pub(crate) fn load(&mut self, id: RecordId, payload: &[u8]) {
        self.id = id;
        self.data.clear();
        self.data.push(SlotState::Occupied.as_byte());
        self.data.extend_from_slice(payload);
    }

    /// Fails with InvalidArgument unless this buffer is sized for the schema.
    pub fn check_size(&self, schema: &Schema) -> Result<()> {
        if self.data.len() != schema.record_size() {
            return Err(StoreError::invalid(format!(
                "record holds {} bytes, schema needs {}",
                self.data.len(),
                schema.record_size()
            )));
        }
        Ok(())
    }

    /// Reads attribute `index`, typed by the schema.
    pub fn get_attr(&self, schema: &Schema, index: usize) -> Result<Value> {
        self.check_size(schema)?;
        let (attr, offset) = schema.locate(index)?;
        Value::decode(&self.data[offset..offset + attr.size()], attr.data_type())
    }

    /// Writes attribute `index`. The value must match the schema's type.
    pub fn set_attr(&mut self, schema: &Schema, index: usize, value: &Value) -> Result<()> {
        self.check_size(schema)?;
        let (attr, offset) = schema.locate(index)?;
        value.encode(attr.data_type(), &mut self.data[offset..offset + attr.size()])
    }

    /// Reads every attribute in schema order.
    pub fn values(&self, schema: &Schema) -> Result<Vec<Value>> {
        (0..schema.num_attributes())
            .map(|i| self.get_attr(schema, i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PageId, SlotId};
    use crate::tuple::DataType;

    fn create_test_schema() -> Schema {
        Schema::builder()
            .key_attribute("a", DataType::Int)
            .attribute("b", DataType::String(4))
            .attribute("c", DataType::Float)
            .attribute("d", DataType::Bool)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_record_is_zeroed() {
        let schema = create_test_schema();
        let record = Record::new(&schema);

        assert_eq!(record.data().len(), schema.record_size());
        assert!(record.data().iter().all(|&b| b == 0));
        assert_eq!(record.get_attr(&schema, 0).unwrap(), Value::Int(0));
        assert_eq!(record.get_attr(&schema, 1).unwrap(), Value::from(""));
    }

    #[test]
    fn test_set_and_get_attr() {
        let schema = create_test_schema();
        let mut record = Record::new(&schema);

        record.set_attr(&schema, 0, &Value::Int(7)).unwrap();
        record.set_attr(&schema, 1, &Value::from("abc")).unwrap();
        record.set_attr(&schema, 2, &Value::Float(2.5)).unwrap();
        record.set_attr(&schema, 3, &Value::Bool(true)).unwrap();

        assert_eq!(
            record.values(&schema).unwrap(),
            vec![
                Value::Int(7),
                Value::from("abc"),
                Value::Float(2.5),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_type_comes_from_schema() {
        let schema = create_test_schema();
        let mut record = Record::new(&schema);

        // Attribute 1 is a string; an integer must be rejected, not coerced
        assert!(record.set_attr(&schema, 1, &Value::Int(3)).is_err());
        record.set_attr(&schema, 1, &Value::from("xy")).unwrap();
        assert_eq!(record.get_attr(&schema, 1).unwrap(), Value::from("xy"));
    }

    #[test]
    fn test_attr_index_out_of_range() {
        let schema = create_test_schema();
        let record = Record::new(&schema);
        assert!(matches!(
            record.get_attr(&schema, 9),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_values_arity() {
        let schema = create_test_schema();
        assert!(Record::from_values(&schema, &[Value::Int(1)]).is_err());
    }

    #[test]
    fn test_mismatched_schema() {
        let schema = create_test_schema();
        let other = Schema::builder()
            .attribute("x", DataType::Int)
            .build()
            .unwrap();
        let record = Record::new(&other);
        assert!(record.get_attr(&schema, 0).is_err());
    }

    #[test]
    fn test_from_payload_marks_occupied() {
        let rid = RecordId::new(PageId::new(1), SlotId::new(3));
        let record = Record::from_payload(rid, &[1, 2, 3]);

        assert_eq!(record.id(), rid);
        assert_eq!(record.data()[0], SlotState::Occupied.as_byte());
        assert_eq!(record.payload(), &[1, 2, 3]);
    }
}
