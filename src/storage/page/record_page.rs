use crate::common::{PageId, RecordId, Result, SlotId, StoreError, PAGE_SIZE};

// Record page layout:
//
// +----------------------------------+
// | slot 0: [marker][payload ...]    |
// | slot 1: [marker][payload ...]    |
// | ...                              |
// | slot n-1                         |
// +----------------------------------+
// | unused tail (< record_size)      |
// +----------------------------------+
//
// Every slot is `record_size` bytes, so n = PAGE_SIZE / record_size.
// The marker byte is the only thing that says whether a slot is live.

/// Occupancy marker stored as the first byte of every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Occupied,
}

impl SlotState {
    pub fn as_byte(&self) -> u8 {
        match self {
            SlotState::Free => 0x00,
            SlotState::Occupied => 0x01,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(SlotState::Free),
            0x01 => Some(SlotState::Occupied),
            _ => None,
        }
    }
}

/// Returns how many slots of `record_size` bytes fit on one page.
pub fn slots_per_page(record_size: usize) -> usize {
    PAGE_SIZE / record_size
}

fn check_layout(data_len: usize, record_size: usize) -> Result<()> {
    if data_len != PAGE_SIZE {
        return Err(StoreError::invalid(format!(
            "record page must be {} bytes, got {}",
            PAGE_SIZE, data_len
        )));
    }
    if record_size < 2 || record_size > PAGE_SIZE {
        return Err(StoreError::invalid(format!(
            "record size {} does not fit a page",
            record_size
        )));
    }
    Ok(())
}

/// Read-only view of a record page.
pub struct RecordPageRef<'a> {
    page_id: PageId,
    data: &'a [u8],
    record_size: usize,
}

impl<'a> RecordPageRef<'a> {
    /// Creates a read-only view over a page buffer.
    pub fn new(page_id: PageId, data: &'a [u8], record_size: usize) -> Result<Self> {
        check_layout(data.len(), record_size)?;
        Ok(Self {
            page_id,
            data,
            record_size,
        })
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the number of slots on this page.
    pub fn slots_per_page(&self) -> usize {
        slots_per_page(self.record_size)
    }

    fn slot_start(&self, slot_id: SlotId) -> Result<usize> {
        if slot_id.as_usize() >= self.slots_per_page() {
            return Err(StoreError::invalid(format!(
                "slot {} out of range (page holds {})",
                slot_id.as_u16(),
                self.slots_per_page()
            )));
        }
        Ok(slot_id.as_usize() * self.record_size)
    }

    /// Returns the occupancy state of a slot.
    pub fn slot_state(&self, slot_id: SlotId) -> Result<SlotState> {
        let start = self.slot_start(slot_id)?;
        SlotState::from_byte(self.data[start]).ok_or_else(|| StoreError::CorruptPage {
            page_id: self.page_id,
            reason: format!(
                "slot {} has unknown marker {:#04x}",
                slot_id.as_u16(),
                self.data[start]
            ),
        })
    }

    /// Returns the payload of an occupied slot.
    pub fn get_tuple(&self, slot_id: SlotId) -> Result<&'a [u8]> {
        let start = self.slot_start(slot_id)?;
        match self.slot_state(slot_id)? {
            SlotState::Occupied => Ok(&self.data[start + 1..start + self.record_size]),
            SlotState::Free => Err(StoreError::TupleNotFound(RecordId::new(
                self.page_id,
                slot_id,
            ))),
        }
    }

    /// Returns the first free slot, scanning in ascending order.
    pub fn first_free_slot(&self) -> Result<Option<SlotId>> {
        for slot in 0..self.slots_per_page() {
            let slot_id = SlotId::new(slot as u16);
            if self.slot_state(slot_id)? == SlotState::Free {
                return Ok(Some(slot_id));
            }
        }
        Ok(None)
    }

    /// Returns the first occupied slot at or after `from`.
    pub fn next_occupied_slot(&self, from: SlotId) -> Result<Option<SlotId>> {
        for slot in from.as_usize()..self.slots_per_page() {
            let slot_id = SlotId::new(slot as u16);
            if self.slot_state(slot_id)? == SlotState::Occupied {
                return Ok(Some(slot_id));
            }
        }
        Ok(None)
    }
}

/// Mutable view of a record page.
pub struct RecordPage<'a> {
    page_id: PageId,
    data: &'a mut [u8],
    record_size: usize,
}

impl<'a> RecordPage<'a> {
    /// Creates a mutable view over a page buffer.
    pub fn new(page_id: PageId, data: &'a mut [u8], record_size: usize) -> Result<Self> {
        check_layout(data.len(), record_size)?;
        Ok(Self {
            page_id,
            data,
            record_size,
        })
    }

    /// Borrows this page as a read-only view.
    pub fn view(&self) -> RecordPageRef<'_> {
        RecordPageRef {
            page_id: self.page_id,
            data: &*self.data,
            record_size: self.record_size,
        }
    }

    fn check_payload(&self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.record_size - 1 {
            return Err(StoreError::invalid(format!(
                "payload of {} bytes, slots hold {}",
                payload.len(),
                self.record_size - 1
            )));
        }
        Ok(())
    }

    fn write_slot(&mut self, slot_id: SlotId, state: SlotState, payload: Option<&[u8]>) {
        let start = slot_id.as_usize() * self.record_size;
        self.data[start] = state.as_byte();
        if let Some(payload) = payload {
            self.data[start + 1..start + self.record_size].copy_from_slice(payload);
        }
    }

    /// Stores the payload in the first free slot.
    /// Returns None if every slot is occupied.
    pub fn insert_tuple(&mut self, payload: &[u8]) -> Result<Option<SlotId>> {
        self.check_payload(payload)?;
        let slot_id = match self.view().first_free_slot()? {
            Some(slot_id) => slot_id,
            None => return Ok(None),
        };
        self.write_slot(slot_id, SlotState::Occupied, Some(payload));
        Ok(Some(slot_id))
    }

    /// Marks an occupied slot free. The payload bytes are left in place.
    pub fn delete_tuple(&mut self, slot_id: SlotId) -> Result<()> {
        let state = self.view().slot_state(slot_id)?;
        match state {
            SlotState::Occupied => {
                self.write_slot(slot_id, SlotState::Free, None);
                Ok(())
            }
            SlotState::Free => Err(StoreError::TupleNotFound(RecordId::new(
                self.page_id,
                slot_id,
            ))),
        }
    }

    /// Overwrites the payload of an occupied slot, keeping its marker.
    pub fn update_tuple(&mut self, slot_id: SlotId, payload: &[u8]) -> Result<()> {
        self.check_payload(payload)?;
        let state = self.view().slot_state(slot_id)?;
        match state {
            SlotState::Occupied => {
                self.write_slot(slot_id, SlotState::Occupied, Some(payload));
                Ok(())
            }
            SlotState::Free => Err(StoreError::TupleNotFound(RecordId::new(
                self.page_id,
                slot_id,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD_SIZE: usize = 9;

    #[test]
    fn test_slots_per_page() {
        assert_eq!(slots_per_page(RECORD_SIZE), PAGE_SIZE / 9);
        assert_eq!(slots_per_page(PAGE_SIZE), 1);
    }

    #[test]
    fn test_empty_page_is_all_free() {
        let data = [0u8; PAGE_SIZE];
        let page = RecordPageRef::new(PageId::new(1), &data, RECORD_SIZE).unwrap();

        assert_eq!(page.first_free_slot().unwrap(), Some(SlotId::new(0)));
        assert_eq!(page.next_occupied_slot(SlotId::new(0)).unwrap(), None);
    }

    #[test]
    fn test_insert_get_delete() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(PageId::new(1), &mut data, RECORD_SIZE).unwrap();

        let s0 = page.insert_tuple(&[1u8; 8]).unwrap().unwrap();
        let s1 = page.insert_tuple(&[2u8; 8]).unwrap().unwrap();
        assert_eq!(s0, SlotId::new(0));
        assert_eq!(s1, SlotId::new(1));
        assert_eq!(page.view().get_tuple(s1).unwrap(), &[2u8; 8]);

        page.delete_tuple(s0).unwrap();
        assert!(matches!(
            page.view().get_tuple(s0),
            Err(StoreError::TupleNotFound(_))
        ));
        assert!(matches!(
            page.delete_tuple(s0),
            Err(StoreError::TupleNotFound(_))
        ));

        // Freed slot is reused first
        let s2 = page.insert_tuple(&[3u8; 8]).unwrap().unwrap();
        assert_eq!(s2, SlotId::new(0));
    }

    #[test]
    fn test_update_keeps_slot() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(PageId::new(2), &mut data, RECORD_SIZE).unwrap();

        let slot = page.insert_tuple(&[1u8; 8]).unwrap().unwrap();
        page.update_tuple(slot, &[9u8; 8]).unwrap();
        assert_eq!(page.view().get_tuple(slot).unwrap(), &[9u8; 8]);

        assert!(matches!(
            page.update_tuple(SlotId::new(5), &[9u8; 8]),
            Err(StoreError::TupleNotFound(_))
        ));
    }

    #[test]
    fn test_full_page() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(PageId::new(1), &mut data, RECORD_SIZE).unwrap();

        for _ in 0..slots_per_page(RECORD_SIZE) {
            assert!(page.insert_tuple(&[7u8; 8]).unwrap().is_some());
        }
        assert_eq!(page.insert_tuple(&[7u8; 8]).unwrap(), None);
        assert_eq!(page.view().first_free_slot().unwrap(), None);
    }

    #[test]
    fn test_next_occupied_skips_free_slots() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(PageId::new(1), &mut data, RECORD_SIZE).unwrap();
        for _ in 0..4 {
            page.insert_tuple(&[5u8; 8]).unwrap();
        }
        page.delete_tuple(SlotId::new(0)).unwrap();
        page.delete_tuple(SlotId::new(2)).unwrap();

        let view = page.view();
        assert_eq!(
            view.next_occupied_slot(SlotId::new(0)).unwrap(),
            Some(SlotId::new(1))
        );
        assert_eq!(
            view.next_occupied_slot(SlotId::new(2)).unwrap(),
            Some(SlotId::new(3))
        );
        assert_eq!(view.next_occupied_slot(SlotId::new(4)).unwrap(), None);
    }

    #[test]
    fn test_payload_size_checked() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(PageId::new(1), &mut data, RECORD_SIZE).unwrap();
        assert!(matches!(
            page.insert_tuple(&[1u8; 3]),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_slot_out_of_range() {
        let data = [0u8; PAGE_SIZE];
        let page = RecordPageRef::new(PageId::new(1), &data, RECORD_SIZE).unwrap();
        let past_end = SlotId::new(slots_per_page(RECORD_SIZE) as u16);
        assert!(matches!(
            page.slot_state(past_end),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_marker_is_corrupt() {
        let mut data = [0u8; PAGE_SIZE];
        data[RECORD_SIZE] = b'?';
        let page = RecordPageRef::new(PageId::new(1), &data, RECORD_SIZE).unwrap();
        assert!(matches!(
            page.slot_state(SlotId::new(1)),
            Err(StoreError::CorruptPage { .. })
        ));
    }

    #[test]
    fn test_next_occupied_slot() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(PageId::new(1), &mut data, RECORD_SIZE).unwrap();
        for _ in 0..4 {
            page.insert_tuple(&[1u8; 8]).unwrap();
        }
        page.delete_tuple(SlotId::new(1)).unwrap();
        page.delete_tuple(SlotId::new(2)).unwrap();

        let view = page.view();
        assert_eq!(
            view.next_occupied_slot(SlotId::new(1)).unwrap(),
            Some(SlotId::new(3))
        );
        assert_eq!(view.next_occupied_slot(SlotId::new(4)).unwrap(), None);
    }
}
