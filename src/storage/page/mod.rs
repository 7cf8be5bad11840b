mod header_page;
mod record_page;

pub use header_page::*;
pub use record_page::*;
