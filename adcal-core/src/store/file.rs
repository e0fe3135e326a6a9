//! File-backed store for host tools
//!
//! Keeps a calibration image in a regular file so it can be prepared,
//! inspected or replayed on a workstation. Page `n` lives at byte offset
//! `n * PAGE_SIZE`. A new or short file is padded with erased bytes up to
//! the requested page count.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{NvStore, Page};
use crate::constants::{layout::ERASED_BYTE, PAGE_SIZE};

/// Page store over a file
///
/// ## Example
///
/// ```rust,no_run
/// use adcal_core::{store::FileStore, CalibrationTable, TableConfig, IMAGE_PAGES};
///
/// let store = FileStore::open("calibration.bin", IMAGE_PAGES)?;
/// let mut table = CalibrationTable::new(store, TableConfig::default());
/// table.init().expect("image readable");
/// println!("serial: {}", table.serial_number());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct FileStore {
    file: File,
    pages: usize,
}

impl FileStore {
    /// Open or create an image file holding `pages` pages
    pub fn open<P: AsRef<Path>>(path: P, pages: usize) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let wanted = (pages * PAGE_SIZE) as u64;
        let current = file.metadata()?.len();
        if current < wanted {
            file.seek(SeekFrom::Start(current))?;
            let pad = [ERASED_BYTE; PAGE_SIZE];
            let mut missing = wanted - current;
            while missing > 0 {
                let chunk = missing.min(PAGE_SIZE as u64) as usize;
                file.write_all(&pad[..chunk])?;
                missing -= chunk as u64;
            }
            file.flush()?;
        }

        Ok(Self { file, pages })
    }

    fn seek_page(&mut self, page: usize) -> io::Result<()> {
        if page >= self.pages {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "page beyond end of image",
            ));
        }
        self.file.seek(SeekFrom::Start((page * PAGE_SIZE) as u64))?;
        Ok(())
    }
}

impl NvStore for FileStore {
    type Error = io::Error;

    fn page_count(&self) -> usize {
        self.pages
    }

    fn read_page(&mut self, page: usize, buf: &mut Page) -> nb::Result<(), Self::Error> {
        self.seek_page(page)?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn erase_page(&mut self, page: usize) -> nb::Result<(), Self::Error> {
        self.seek_page(page)?;
        self.file.write_all(&[ERASED_BYTE; PAGE_SIZE])?;
        Ok(())
    }

    fn program_page(&mut self, page: usize, data: &Page) -> nb::Result<(), Self::Error> {
        self.seek_page(page)?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }
}
