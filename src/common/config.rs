use super::types::PageId;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Page holding the table header: tuple count, free-page hint and schema
pub const HEADER_PAGE_ID: PageId = PageId(0);

/// First page that stores tuples
pub const FIRST_DATA_PAGE_ID: PageId = PageId(1);

/// Width of the NUL-padded attribute name field on the header page
pub const ATTRIBUTE_NAME_SIZE: usize = 15;

/// Default buffer pool size (number of frames) used when opening a table
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 100;

/// Default K value for the LRU-K replacement policy
pub const DEFAULT_LRUK_K: usize = 2;
