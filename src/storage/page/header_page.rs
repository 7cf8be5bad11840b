use crate::common::codec::{read_i32, write_i32};
use crate::common::{PageId, Result, StoreError, FIRST_DATA_PAGE_ID, HEADER_PAGE_ID, PAGE_SIZE};
use crate::tuple::Schema;

const TUPLE_COUNT_OFFSET: usize = 0;
const FREE_PAGE_HINT_OFFSET: usize = 4;
const SCHEMA_OFFSET: usize = 8;

/// Bookkeeping stored on page 0 of every table file.
///
/// ```text
/// +-------------+----------------+---------------------------------+
/// | tuple count | free-page hint | schema (attribute count, key    |
/// | i32         | i32            | count, attributes, key indices) |
/// +-------------+----------------+---------------------------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub tuple_count: u32,
    pub free_page_hint: PageId,
    pub schema: Schema,
}

impl TableHeader {
    /// Header of a freshly created, empty table.
    pub fn new(schema: Schema) -> Self {
        Self {
            tuple_count: 0,
            free_page_hint: FIRST_DATA_PAGE_ID,
            schema,
        }
    }

    /// Fails with InvalidArgument if the schema cannot be stored on page 0.
    pub fn check_fits(schema: &Schema) -> Result<()> {
        let needed = SCHEMA_OFFSET + schema.serialized_size();
        if needed > PAGE_SIZE {
            return Err(StoreError::invalid(format!(
                "schema needs {} header bytes, page holds {}",
                needed, PAGE_SIZE
            )));
        }
        Ok(())
    }

    /// Writes the whole header into a page buffer.
    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        Self::check_page(data.len())?;
        Self::check_fits(&self.schema)?;

        data.fill(0);
        Self::write_counters(data, self.tuple_count, self.free_page_hint)?;
        self.schema.serialize_into(&mut data[SCHEMA_OFFSET..])?;
        Ok(())
    }

    /// Rewrites only the tuple count and free-page hint, leaving the schema bytes alone.
    pub fn write_counters(data: &mut [u8], tuple_count: u32, free_page_hint: PageId) -> Result<()> {
        Self::check_page(data.len())?;
        let count = i32::try_from(tuple_count)
            .map_err(|_| StoreError::invalid(format!("tuple count {} overflows", tuple_count)))?;
        let hint = i32::try_from(free_page_hint.as_u32()).map_err(|_| {
            StoreError::invalid(format!("page hint {} overflows", free_page_hint))
        })?;

        write_i32(data, TUPLE_COUNT_OFFSET, count);
        write_i32(data, FREE_PAGE_HINT_OFFSET, hint);
        Ok(())
    }

    /// Decodes a header page.
    ///
    /// Negative counters and malformed schema bytes are reported as a corrupt
    /// page. Unknown attribute type codes surface as `UnsupportedType`.
    pub fn read_from(data: &[u8]) -> Result<Self> {
        Self::check_page(data.len())?;

        let count = read_i32(data, TUPLE_COUNT_OFFSET);
        let tuple_count =
            u32::try_from(count).map_err(|_| corrupt(format!("negative tuple count {}", count)))?;

        let hint = read_i32(data, FREE_PAGE_HINT_OFFSET);
        let free_page_hint = u32::try_from(hint)
            .ok()
            .map(PageId::new)
            .filter(|p| *p >= FIRST_DATA_PAGE_ID)
            .ok_or_else(|| corrupt(format!("invalid free-page hint {}", hint)))?;

        let schema = match Schema::deserialize(&data[SCHEMA_OFFSET..]) {
            Ok(schema) => schema,
            Err(StoreError::InvalidArgument(reason)) => return Err(corrupt(reason)),
            Err(e) => return Err(e),
        };

        Ok(Self {
            tuple_count,
            free_page_hint,
            schema,
        })
    }

    fn check_page(len: usize) -> Result<()> {
        if len != PAGE_SIZE {
            return Err(StoreError::invalid(format!(
                "header page must be {} bytes, got {}",
                PAGE_SIZE, len
            )));
        }
        Ok(())
    }
}

fn corrupt(reason: impl Into<String>) -> StoreError {
    StoreError::CorruptPage {
        page_id: HEADER_PAGE_ID,
        reason: reason.into(),
    }
}
