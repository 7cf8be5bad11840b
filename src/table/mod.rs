mod options;
mod table_heap;
mod table_scan;

pub use options::*;
pub use table_heap::*;
pub use table_scan::*;
