//! Tuplestore - a single-file tuple store with a pluggable buffer pool
//!
//! Each table lives in one page file. A fixed-size buffer pool caches its
//! pages, and a slotted record layer on top stores fixed-width tuples.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Storage Layer** (`storage`): Handles disk I/O and page organization
//!   - `DiskManager`: Reads, writes and appends pages of a table file
//!   - `RecordPage`: Fixed-width slots with an occupancy marker per slot
//!   - `TableHeader`: Page 0 bookkeeping (tuple count, free-page hint, schema)
//!
//! - **Buffer Pool** (`buffer`): Memory management for table pages
//!   - `BufferPoolManager`: Pins pages, reads them on a miss, writes back dirty victims
//!   - `Replacer`: FIFO, LRU, CLOCK, LFU and LRU-K eviction policies
//!   - `ReadPageGuard`/`WritePageGuard`: RAII guards that unpin on drop
//!   - `SharedBufferPool`: A pool behind one lock for sharing between threads
//!
//! - **Tuples** (`tuple`): Schemas, typed values and record buffers
//!
//! - **Expressions** (`expr`): Predicates evaluated against records
//!
//! - **Tables** (`table`): Tuple insert/get/update/delete and sequential scans
//!
//! # Example
//!
//! ```rust,no_run
//! use tuplestore::expr::Expr;
//! use tuplestore::table::Table;
//! use tuplestore::tuple::{DataType, Record, Schema, Value};
//!
//! let schema = Schema::builder()
//!     .key_attribute("id", DataType::Int)
//!     .attribute("name", DataType::String(16))
//!     .build()
//!     .unwrap();
//!
//! Table::create("people.tbl", &schema).unwrap();
//! let mut table = Table::open("people.tbl").unwrap();
//!
//! let mut record = Record::from_values(&schema, &[Value::Int(1), Value::from("ann")]).unwrap();
//! let rid = table.insert_tuple(&mut record).unwrap();
//! assert_eq!(table.get_tuple(rid).unwrap().payload(), record.payload());
//!
//! let predicate = Expr::equal(Expr::attr(0), Expr::constant(1));
//! for record in table.start_scan(predicate).unwrap() {
//!     println!("{:?}", record.unwrap().values(&schema).unwrap());
//! }
//!
//! table.close().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod expr;
pub mod storage;
pub mod table;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{ErrorKind, PageId, RecordId, Result, SlotId, StoreError};
