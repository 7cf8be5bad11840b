use std::path::Path;

use tracing::{debug, info, warn};

use crate::buffer::BufferPoolManager;
use crate::common::{
    PageId, RecordId, Result, StoreError, FIRST_DATA_PAGE_ID, HEADER_PAGE_ID, PAGE_SIZE,
};
use crate::expr::Expr;
use crate::storage::disk::DiskManager;
use crate::storage::page::{slots_per_page, RecordPage, RecordPageRef, SlotState, TableHeader};
use crate::tuple::{Record, Schema};

use super::{TableOptions, TableScan};

/// An open table: one page file, its schema and the buffer pool over it.
///
/// ## File Layout
///
/// ```text
/// +--------+--------+--------+-----+
/// | page 0 | page 1 | page 2 | ... |
/// | header | slots  | slots  |     |
/// +--------+--------+--------+-----+
/// ```
///
/// Page 0 holds the tuple count, the free-page hint and the schema. Every
/// other page is a record page of `schema.record_size()` byte slots. Data
/// pages are appended on demand by inserts.
pub struct Table {
    name: String,
    pub(super) schema: Schema,
    pub(super) pool: BufferPoolManager,
    tuple_count: u32,
    free_page_hint: PageId,
}

impl Table {
    /// Creates a table file holding only the header page.
    pub fn create<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<()> {
        let path = path.as_ref();

        let mut header_page = vec![0u8; PAGE_SIZE];
        TableHeader::new(schema.clone()).write_to(&mut header_page)?;

        Self::create_file(path, &header_page)?;

        info!(
            path = %path.display(),
            attributes = schema.num_attributes(),
            record_size = schema.record_size(),
            "created table"
        );
        Ok(())
    }

    /// Creates the page file and writes its header page. A file left without
    /// a header is removed again.
    fn create_file(path: &Path, header_page: &[u8]) -> Result<()> {
        DiskManager::create(path)?;
        let written = DiskManager::open(path).and_then(|mut disk_manager| {
            disk_manager.write_page(HEADER_PAGE_ID, header_page)?;
            disk_manager.close()
        });

        if let Err(e) = written {
            if let Err(cleanup) = DiskManager::destroy(path) {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "failed to remove partially created table"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Opens a table with the default buffer pool settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, TableOptions::default())
    }

    /// Opens a table, reading its header through a new buffer pool.
    pub fn open_with<P: AsRef<Path>>(path: P, options: TableOptions) -> Result<Self> {
        let path = path.as_ref();
        let disk_manager = DiskManager::open(path)?;
        let mut pool = BufferPoolManager::new(disk_manager, options.pool_size, options.policy)?;

        let header = {
            let guard = pool.checked_read_page(HEADER_PAGE_ID)?;
            TableHeader::read_from(guard.data())?
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!(
            table = %name,
            tuples = header.tuple_count,
            pages = pool.num_pages(),
            "opened table"
        );

        Ok(Self {
            name,
            schema: header.schema,
            pool,
            tuple_count: header.tuple_count,
            free_page_hint: header.free_page_hint,
        })
    }

    /// Flushes every dirty page and closes the file.
    pub fn close(self) -> Result<()> {
        let name = self.name;
        let tuples = self.tuple_count;
        self.pool.shutdown()?;
        info!(table = %name, tuples, "closed table");
        Ok(())
    }

    /// Removes a table file. The table must not be open.
    pub fn delete<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        DiskManager::destroy(path)?;
        info!(path = %path.display(), "deleted table");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the number of live tuples.
    pub fn tuple_count(&self) -> u32 {
        self.tuple_count
    }

    /// Returns the page the next insert tries first.
    pub fn free_page_hint(&self) -> PageId {
        self.free_page_hint
    }

    /// Returns the number of slots on each data page.
    pub fn slots_per_page(&self) -> usize {
        slots_per_page(self.schema.record_size())
    }

    /// Returns the number of pages in the table file, header included.
    pub fn num_pages(&self) -> u32 {
        self.pool.num_pages()
    }

    pub fn buffer_pool(&self) -> &BufferPoolManager {
        &self.pool
    }

    /// Writes every dirty page to disk without closing the table.
    pub fn flush(&mut self) -> Result<()> {
        self.pool.flush_all()
    }

    /// Inserts a record and returns its new ID, which is also stored in the record.
    ///
    /// Probing starts at the free-page hint and walks forward page by page,
    /// appending a page when it runs past the end of the file.
    pub fn insert_tuple(&mut self, record: &mut Record) -> Result<RecordId> {
        record.check_size(&self.schema)?;
        let record_size = self.schema.record_size();

        let mut page_id = self.free_page_hint;
        loop {
            if page_id.as_u32() >= self.pool.num_pages() {
                self.pool.ensure_capacity(page_id.as_u32() + 1)?;
            }

            let slot = {
                let mut guard = self.pool.checked_write_page(page_id)?;
                // A full page is searched without being dirtied
                let slot = RecordPage::new(page_id, guard.data_mut_unmarked(), record_size)?
                    .insert_tuple(record.payload())?;
                if slot.is_some() {
                    guard.mark_dirty();
                }
                slot
            };

            if let Some(slot_id) = slot {
                let rid = RecordId::new(page_id, slot_id);
                record.set_id(rid);
                self.tuple_count += 1;
                self.free_page_hint = page_id;
                self.write_header()?;
                debug!(table = %self.name, %rid, "inserted tuple");
                return Ok(rid);
            }

            page_id = page_id.next();
        }
    }

    /// Deletes the tuple at `rid`. Deleting a free slot fails with `TupleNotFound`.
    pub fn delete_tuple(&mut self, rid: RecordId) -> Result<()> {
        self.check_rid(rid)?;
        let record_size = self.schema.record_size();

        {
            let mut guard = self.pool.checked_write_page(rid.page_id)?;
            let state = RecordPageRef::new(rid.page_id, guard.data(), record_size)?
                .slot_state(rid.slot_id)?;
            if state == SlotState::Free {
                return Err(StoreError::TupleNotFound(rid));
            }
            RecordPage::new(rid.page_id, guard.data_mut(), record_size)?.delete_tuple(rid.slot_id)?;
        }

        self.tuple_count = self.tuple_count.saturating_sub(1);
        self.free_page_hint = rid.page_id;
        self.write_header()?;
        debug!(table = %self.name, %rid, "deleted tuple");
        Ok(())
    }

    /// Overwrites the tuple at `record.id()` in place. The record ID never changes.
    pub fn update_tuple(&mut self, record: &Record) -> Result<()> {
        record.check_size(&self.schema)?;
        let rid = record.id();
        self.check_rid(rid)?;
        let record_size = self.schema.record_size();

        let mut guard = self.pool.checked_write_page(rid.page_id)?;
        let state = RecordPageRef::new(rid.page_id, guard.data(), record_size)?
            .slot_state(rid.slot_id)?;
        if state == SlotState::Free {
            return Err(StoreError::TupleNotFound(rid));
        }
        let mut page = RecordPage::new(rid.page_id, guard.data_mut(), record_size)?;
        page.update_tuple(rid.slot_id, record.payload())
    }

    /// Fetches the tuple at `rid`.
    pub fn get_tuple(&mut self, rid: RecordId) -> Result<Record> {
        let mut record = Record::new(&self.schema);
        self.get_tuple_into(rid, &mut record)?;
        Ok(record)
    }

    /// Fetches the tuple at `rid` into an existing record buffer.
    /// The buffer is left untouched on failure.
    pub fn get_tuple_into(&mut self, rid: RecordId, record: &mut Record) -> Result<()> {
        record.check_size(&self.schema)?;
        self.check_rid(rid)?;
        let record_size = self.schema.record_size();

        let guard = self.pool.checked_read_page(rid.page_id)?;
        let payload = RecordPageRef::new(rid.page_id, guard.data(), record_size)?.get_tuple(rid.slot_id)?;
        record.load(rid, payload);
        Ok(())
    }

    /// Starts a sequential scan returning the records that satisfy `predicate`.
    pub fn start_scan(&mut self, predicate: Expr) -> Result<TableScan<'_>> {
        predicate.validate(&self.schema)?;
        Ok(TableScan::new(self, predicate))
    }

    /// Stores the tuple count and free-page hint in the header frame.
    fn write_header(&mut self) -> Result<()> {
        let mut guard = self.pool.checked_write_page(HEADER_PAGE_ID)?;
        TableHeader::write_counters(guard.data_mut(), self.tuple_count, self.free_page_hint)
    }

    fn check_rid(&self, rid: RecordId) -> Result<()> {
        if rid.page_id < FIRST_DATA_PAGE_ID {
            return Err(StoreError::invalid(format!(
                "record {} points at the header page",
                rid
            )));
        }
        if rid.slot_id.as_usize() >= self.slots_per_page() {
            return Err(StoreError::invalid(format!(
                "record {} is past the last slot ({} per page)",
                rid,
                self.slots_per_page()
            )));
        }
        Ok(())
    }
}
