use tracing::trace;

use crate::common::{RecordId, Result, SlotId, FIRST_DATA_PAGE_ID};
use crate::expr::{eval_predicate, Expr};
use crate::storage::page::{slots_per_page, RecordPageRef};
use crate::tuple::Record;

use super::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Active,
    Exhausted,
}

/// Sequential scan over a table, yielding the records a predicate accepts.
///
/// Slots are visited in ascending (page, slot) order starting at the first
/// data page. The scan stops once it has examined as many occupied slots as
/// the table held when the scan started, or at the end of the file. No page
/// stays pinned between calls to `next_tuple`.
pub struct TableScan<'a> {
    table: &'a mut Table,
    predicate: Expr,
    /// Next slot to examine
    position: RecordId,
    /// Occupied slots examined so far
    examined: u32,
    /// Tuple count when the scan started
    snapshot: u32,
    state: ScanState,
}

impl<'a> TableScan<'a> {
    pub(super) fn new(table: &'a mut Table, predicate: Expr) -> Self {
        let snapshot = table.tuple_count();
        Self {
            table,
            predicate,
            position: RecordId::new(FIRST_DATA_PAGE_ID, SlotId::new(0)),
            examined: 0,
            snapshot,
            state: ScanState::Active,
        }
    }

    /// Returns the next matching record, or None once the scan is exhausted.
    pub fn next_tuple(&mut self) -> Result<Option<Record>> {
        if self.state == ScanState::Exhausted {
            return Ok(None);
        }

        let schema = &self.table.schema;
        let record_size = schema.record_size();
        let slots = slots_per_page(record_size);

        while self.examined < self.snapshot {
            let page_id = self.position.page_id;
            if page_id.as_u32() >= self.table.pool.num_pages() {
                break;
            }

            let guard = self.table.pool.checked_read_page(page_id)?;
            let page = RecordPageRef::new(page_id, guard.data(), record_size)?;

            let mut slot = self.position.slot_id.as_usize();
            let mut found = None;
            while self.examined < self.snapshot {
                let Some(slot_id) = page.next_occupied_slot(SlotId::new(slot as u16))? else {
                    slot = slots;
                    break;
                };
                slot = slot_id.as_usize() + 1;

                self.examined += 1;
                let rid = RecordId::new(page_id, slot_id);
                let record = Record::from_payload(rid, page.get_tuple(slot_id)?);
                if eval_predicate(&record, schema, &self.predicate)? {
                    trace!(%rid, "scan match");
                    found = Some(record);
                    break;
                }
            }

            self.position = if slot < slots {
                RecordId::new(page_id, SlotId::new(slot as u16))
            } else {
                RecordId::new(page_id.next(), SlotId::new(0))
            };

            if found.is_some() {
                return Ok(found);
            }
        }

        self.state = ScanState::Exhausted;
        Ok(None)
    }

    /// Returns the number of occupied slots examined so far.
    pub fn tuples_examined(&self) -> u32 {
        self.examined
    }

    /// Ends the scan.
    pub fn close(self) {}
}

impl Iterator for TableScan<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.next_tuple().transpose();
        if matches!(item, Some(Err(_))) {
            self.state = ScanState::Exhausted;
        }
        item
    }
}
