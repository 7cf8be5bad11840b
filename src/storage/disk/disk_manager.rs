use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::{PageId, Result, StoreError, PAGE_SIZE};

/// DiskManager is the block device behind a table: it reads and writes
/// fixed-size pages of a single file and tracks how many pages it holds.
pub struct DiskManager {
    /// The page file
    file: File,
    /// Path to the page file
    path: PathBuf,
    /// Number of pages currently in the file
    num_pages: u32,
    /// Number of page reads performed
    num_reads: u64,
    /// Number of page writes performed (appends included)
    num_writes: u64,
}

impl DiskManager {
    /// Creates a new page file holding a single zero-filled page.
    /// Fails if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::FileAlreadyExists(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(&[0u8; PAGE_SIZE])?;
        file.sync_all()?;
        debug!(path = %path.display(), "created page file");
        Ok(())
    }

    /// Opens an existing page file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            num_pages,
            num_reads: 0,
            num_writes: 0,
        })
    }

    /// Syncs the file and releases the handle.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Removes a page file from disk.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "destroyed page file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a page from disk into the provided buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn read_page(&mut self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        Self::check_buffer(data.len())?;
        self.check_page(page_id)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.read_exact(data)?;

        self.num_reads += 1;
        Ok(())
    }

    /// Writes a page to disk from the provided buffer.
    /// The page must already exist; use `append_empty_page` to grow the file.
    pub fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        Self::check_buffer(data.len())?;
        self.check_page(page_id)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(data)?;
        self.file.flush()?;

        self.num_writes += 1;
        Ok(())
    }

    /// Grows the file by one zero-filled page and returns its page ID.
    pub fn append_empty_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.num_pages);

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.flush()?;

        self.num_pages += 1;
        self.num_writes += 1;
        debug!(page = page_id.as_u32(), "appended empty page");
        Ok(page_id)
    }

    /// Appends empty pages until the file holds at least `num_pages` pages.
    pub fn ensure_capacity(&mut self, num_pages: u32) -> Result<()> {
        while self.num_pages < num_pages {
            self.append_empty_page()?;
        }
        Ok(())
    }

    /// Returns the number of pages in the file.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns the number of page reads performed.
    pub fn num_reads(&self) -> u64 {
        self.num_reads
    }

    /// Returns the number of page writes performed.
    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }

    /// Returns the path to the page file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn offset(page_id: PageId) -> u64 {
        (page_id.as_u32() as u64) * (PAGE_SIZE as u64)
    }

    fn check_page(&self, page_id: PageId) -> Result<()> {
        if page_id.as_u32() >= self.num_pages {
            return Err(StoreError::PageNotFound(page_id));
        }
        Ok(())
    }

    fn check_buffer(len: usize) -> Result<()> {
        if len != PAGE_SIZE {
            return Err(StoreError::invalid(format!(
                "page buffer must be {} bytes, got {}",
                PAGE_SIZE, len
            )));
        }
        Ok(())
    }
}
