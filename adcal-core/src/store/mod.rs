//! Nonvolatile store adapter
//!
//! The calibration table talks to persistent memory through the narrow
//! [`NvStore`] page interface:
//!
//! - pages are [`PAGE_SIZE`] bytes and are the erase and program unit
//! - a page must be erased before it is programmed
//! - each call is atomic at page granularity
//!
//! Calls return `nb::Result` so a driver can report `WouldBlock` while an
//! erase or program cycle is running. The table waits with `nb::block!`;
//! store latency is the only place it suspends.
//!
//! ## Module Organization
//!
//! - `memory` - RAM-backed store with fault injection, for tests and host tools
//! - `file` - file-backed store (requires `store-file`)

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::PAGE_SIZE;
use crate::errors::{CalError, CalResult};
use crate::image::Source;

pub mod memory;

#[cfg(feature = "store-file")]
pub mod file;

pub use memory::{MemoryStore, MemoryStoreError};

#[cfg(feature = "store-file")]
pub use file::FileStore;

/// One page of store content
pub type Page = [u8; PAGE_SIZE];

/// Store primitive that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreOp {
    /// Page read
    Read,
    /// Page erase
    Erase,
    /// Page program
    Program,
    /// Write enable of the flash controller
    Unlock,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Erase => write!(f, "erase"),
            Self::Program => write!(f, "program"),
            Self::Unlock => write!(f, "unlock"),
        }
    }
}

/// Page-granular persistent memory
///
/// Page numbers are absolute; the table adds its configured base page.
pub trait NvStore {
    /// Driver error
    type Error: fmt::Debug;

    /// Number of pages available
    fn page_count(&self) -> usize;

    /// Read a whole page
    fn read_page(&mut self, page: usize, buf: &mut Page) -> nb::Result<(), Self::Error>;

    /// Erase a page to all `0xFF`
    fn erase_page(&mut self, page: usize) -> nb::Result<(), Self::Error>;

    /// Program an erased page
    fn program_page(&mut self, page: usize, data: &Page) -> nb::Result<(), Self::Error>;

    /// Enable erase/program (flash controller unlock)
    ///
    /// Called when entering calibration mode.
    fn unlock(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Disable erase/program
    ///
    /// Called when leaving calibration mode. Cannot fail.
    fn lock(&mut self) {}
}

impl<S: NvStore + ?Sized> NvStore for &mut S {
    type Error = S::Error;

    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn read_page(&mut self, page: usize, buf: &mut Page) -> nb::Result<(), Self::Error> {
        (**self).read_page(page, buf)
    }

    fn erase_page(&mut self, page: usize) -> nb::Result<(), Self::Error> {
        (**self).erase_page(page)
    }

    fn program_page(&mut self, page: usize, data: &Page) -> nb::Result<(), Self::Error> {
        (**self).program_page(page, data)
    }

    fn unlock(&mut self) -> Result<(), Self::Error> {
        (**self).unlock()
    }

    fn lock(&mut self) {
        (**self).lock()
    }
}

/// Log a driver error and reduce it to a [`CalError`]
pub(crate) fn store_failure<E: fmt::Debug>(op: StoreOp, page: usize, error: E) -> CalError {
    #[cfg(feature = "log")]
    log::error!("Store {} failed at page {}: {:?}", op, page, error);
    #[cfg(not(feature = "log"))]
    {
        let _ = error;
        log_error!("Store {} failed at page {}", op, page);
    }
    CalError::StoreFailure { op, page }
}

/// Sequential reader over consecutive store pages
///
/// Pages are fetched on demand, so a blank image costs a single read.
pub(crate) struct PageSource<'a, S: NvStore> {
    store: &'a mut S,
    next_page: usize,
    buf: Page,
    pos: usize,
}

impl<'a, S: NvStore> PageSource<'a, S> {
    pub(crate) fn new(store: &'a mut S, first_page: usize) -> Self {
        Self {
            store,
            next_page: first_page,
            buf: [0; PAGE_SIZE],
            pos: PAGE_SIZE,
        }
    }
}

impl<S: NvStore> Source for PageSource<'_, S> {
    fn take(&mut self, out: &mut [u8]) -> CalResult<()> {
        let mut filled = 0;
        while filled < out.len() {
            if self.pos == PAGE_SIZE {
                let page = self.next_page;
                nb::block!(self.store.read_page(page, &mut self.buf))
                    .map_err(|e| store_failure(StoreOp::Read, page, e))?;
                self.next_page += 1;
                self.pos = 0;
            }
            let n = (out.len() - filled).min(PAGE_SIZE - self.pos);
            out[filled..filled + n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            filled += n;
        }
        Ok(())
    }
}
