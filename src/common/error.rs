use std::path::PathBuf;

use thiserror::Error;

use super::types::{PageId, RecordId};

/// Coarse error classification shared by every layer of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, page beyond end-of-file, or no tuple at a record ID
    NotFound,
    /// No unpinned frame is available for eviction
    CapacityExceeded,
    /// Failure reported by the storage layer
    IoError,
    /// Bad handle, out-of-range index, or mismatched payload size
    InvalidArgument,
    /// Attribute type code not recognized
    UnsupportedType,
}

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File {} not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("File {} already exists", .0.display())]
    FileAlreadyExists(PathBuf),

    #[error("Page {0} not found")]
    PageNotFound(PageId),

    #[error("No tuple at record {0}")]
    TupleNotFound(RecordId),

    #[error("Buffer pool is full, no evictable frames available")]
    BufferPoolFull,

    #[error("Page {0} is not pinned")]
    PageNotPinned(PageId),

    #[error("Page {0} is still pinned")]
    PageStillPinned(PageId),

    #[error("Page {page_id} is corrupt: {reason}")]
    CorruptPage { page_id: PageId, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported data type code {0}")]
    UnsupportedType(i32),
}

impl StoreError {
    /// Returns the taxonomy kind this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::FileNotFound(_)
            | StoreError::PageNotFound(_)
            | StoreError::TupleNotFound(_) => ErrorKind::NotFound,
            StoreError::BufferPoolFull => ErrorKind::CapacityExceeded,
            StoreError::Io(_) | StoreError::CorruptPage { .. } => ErrorKind::IoError,
            StoreError::InvalidArgument(_)
            | StoreError::FileAlreadyExists(_)
            | StoreError::PageNotPinned(_)
            | StoreError::PageStillPinned(_) => ErrorKind::InvalidArgument,
            StoreError::UnsupportedType(_) => ErrorKind::UnsupportedType,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SlotId;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StoreError::PageNotFound(PageId::new(3)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StoreError::TupleNotFound(RecordId::new(PageId::new(1), SlotId::new(0))).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(StoreError::BufferPoolFull.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(StoreError::UnsupportedType(9).kind(), ErrorKind::UnsupportedType);
        assert_eq!(
            StoreError::invalid("bad slot").kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let err: StoreError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(err.to_string().contains("disk gone"));
    }
}
