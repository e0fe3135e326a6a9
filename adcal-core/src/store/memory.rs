//! RAM-backed store for testing and host tools
//!
//! Behaves like NOR flash at page granularity:
//! - starts erased (all `0xFF`)
//! - refuses to program a page that was not erased first
//! - refuses erase/program while locked, if lock enforcement is on
//!
//! ## Fault Injection
//!
//! [`MemoryStore::fail_after`] makes every operation of one kind fail once a
//! number of them have succeeded, which models a power cut or a worn page.
//! [`MemoryStore::with_latency`] makes erase/program report `WouldBlock` a
//! few times before completing.

use super::{NvStore, Page, StoreOp};
use crate::constants::{layout::ERASED_BYTE, PAGE_SIZE};

/// Errors reported by [`MemoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryStoreError {
    /// Page number beyond the store
    OutOfRange,
    /// Program attempted on a page that was not erased
    NotErased,
    /// Erase/program attempted while the store is locked
    WriteProtected,
    /// Fault injected by the test
    Injected,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    op: StoreOp,
    remaining: u32,
}

/// In-memory page store
///
/// ## Example
///
/// ```rust
/// use adcal_core::store::{MemoryStore, NvStore};
///
/// let mut store: MemoryStore<4> = MemoryStore::new();
/// let data = [0x42; adcal_core::constants::PAGE_SIZE];
///
/// nb::block!(store.erase_page(1)).unwrap();
/// nb::block!(store.program_page(1, &data)).unwrap();
/// assert_eq!(store.page(1)[0], 0x42);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore<const PAGES: usize> {
    pages: [Page; PAGES],
    erased: [bool; PAGES],
    locked: bool,
    enforce_lock: bool,
    fault: Option<Fault>,
    unlock_fails: bool,
    latency: u8,
    pending: u8,
    erase_count: u32,
    program_count: u32,
    read_count: u32,
}

impl<const PAGES: usize> MemoryStore<PAGES> {
    /// Blank store, every page erased
    pub fn new() -> Self {
        Self {
            pages: [[ERASED_BYTE; PAGE_SIZE]; PAGES],
            erased: [true; PAGES],
            locked: true,
            enforce_lock: false,
            fault: None,
            unlock_fails: false,
            latency: 0,
            pending: 0,
            erase_count: 0,
            program_count: 0,
            read_count: 0,
        }
    }

    /// Reject erase/program unless [`NvStore::unlock`] was called
    pub fn with_lock_enforced(mut self) -> Self {
        self.enforce_lock = true;
        self
    }

    /// Report `WouldBlock` this many times before each erase/program completes
    pub fn with_latency(mut self, polls: u8) -> Self {
        self.latency = polls;
        self
    }

    /// Fail every `op` after `successes` more of them succeed
    pub fn fail_after(&mut self, op: StoreOp, successes: u32) {
        self.fault = Some(Fault { op, remaining: successes });
    }

    /// Make [`NvStore::unlock`] fail
    pub fn fail_unlock(&mut self, fail: bool) {
        self.unlock_fails = fail;
    }

    /// Remove any injected fault
    pub fn clear_faults(&mut self) {
        self.fault = None;
        self.unlock_fails = false;
    }

    /// Raw page content
    pub fn page(&self, page: usize) -> &Page {
        &self.pages[page]
    }

    /// Flip bits of one stored byte, bypassing flash rules
    pub fn corrupt(&mut self, page: usize, offset: usize, mask: u8) {
        self.pages[page][offset] ^= mask;
    }

    /// Whether the flash controller is currently write enabled
    pub fn is_unlocked(&self) -> bool {
        !self.locked
    }

    /// Completed erase cycles
    pub fn erase_count(&self) -> u32 {
        self.erase_count
    }

    /// Completed program cycles
    pub fn program_count(&self) -> u32 {
        self.program_count
    }

    /// Completed page reads
    pub fn read_count(&self) -> u32 {
        self.read_count
    }

    fn check_page(&self, page: usize) -> Result<(), MemoryStoreError> {
        if page < PAGES {
            Ok(())
        } else {
            Err(MemoryStoreError::OutOfRange)
        }
    }

    fn check_fault(&mut self, op: StoreOp) -> Result<(), MemoryStoreError> {
        match &mut self.fault {
            Some(fault) if fault.op == op => {
                if fault.remaining == 0 {
                    return Err(MemoryStoreError::Injected);
                }
                fault.remaining -= 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_writable(&self) -> Result<(), MemoryStoreError> {
        if self.enforce_lock && self.locked {
            Err(MemoryStoreError::WriteProtected)
        } else {
            Ok(())
        }
    }

    fn poll_busy(&mut self) -> nb::Result<(), MemoryStoreError> {
        if self.pending < self.latency {
            self.pending += 1;
            return Err(nb::Error::WouldBlock);
        }
        self.pending = 0;
        Ok(())
    }
}

impl<const PAGES: usize> Default for MemoryStore<PAGES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PAGES: usize> NvStore for MemoryStore<PAGES> {
    type Error = MemoryStoreError;

    fn page_count(&self) -> usize {
        PAGES
    }

    fn read_page(&mut self, page: usize, buf: &mut Page) -> nb::Result<(), Self::Error> {
        self.check_page(page)?;
        self.check_fault(StoreOp::Read)?;
        buf.copy_from_slice(&self.pages[page]);
        self.read_count += 1;
        Ok(())
    }

    fn erase_page(&mut self, page: usize) -> nb::Result<(), Self::Error> {
        self.check_page(page)?;
        self.check_writable()?;
        self.poll_busy()?;
        self.check_fault(StoreOp::Erase)?;
        self.pages[page] = [ERASED_BYTE; PAGE_SIZE];
        self.erased[page] = true;
        self.erase_count += 1;
        Ok(())
    }

    fn program_page(&mut self, page: usize, data: &Page) -> nb::Result<(), Self::Error> {
        self.check_page(page)?;
        self.check_writable()?;
        if !self.erased[page] {
            return Err(nb::Error::Other(MemoryStoreError::NotErased));
        }
        self.poll_busy()?;
        self.check_fault(StoreOp::Program)?;
        self.pages[page].copy_from_slice(data);
        self.erased[page] = false;
        self.program_count += 1;
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), Self::Error> {
        if self.unlock_fails {
            return Err(MemoryStoreError::Injected);
        }
        self.locked = false;
        Ok(())
    }

    fn lock(&mut self) {
        self.locked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_erased() {
        let mut store: MemoryStore<2> = MemoryStore::new();
        let mut buf = [0u8; PAGE_SIZE];
        nb::block!(store.read_page(1, &mut buf)).unwrap();
        assert!(buf.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn program_requires_erase() {
        let mut store: MemoryStore<2> = MemoryStore::new();
        let data = [0x11; PAGE_SIZE];
        nb::block!(store.program_page(0, &data)).unwrap();
        assert_eq!(
            nb::block!(store.program_page(0, &data)),
            Err(MemoryStoreError::NotErased)
        );
        nb::block!(store.erase_page(0)).unwrap();
        nb::block!(store.program_page(0, &data)).unwrap();
        assert_eq!(store.program_count(), 2);
        assert_eq!(store.erase_count(), 1);
    }

    #[test]
    fn out_of_range_page() {
        let mut store: MemoryStore<2> = MemoryStore::new();
        assert_eq!(nb::block!(store.erase_page(2)), Err(MemoryStoreError::OutOfRange));
    }

    #[test]
    fn lock_enforcement() {
        let mut store: MemoryStore<1> = MemoryStore::new().with_lock_enforced();
        assert_eq!(nb::block!(store.erase_page(0)), Err(MemoryStoreError::WriteProtected));
        store.unlock().unwrap();
        assert!(nb::block!(store.erase_page(0)).is_ok());
        store.lock();
        assert!(!store.is_unlocked());
    }

    #[test]
    fn latency_reports_would_block() {
        let mut store: MemoryStore<1> = MemoryStore::new().with_latency(2);
        assert_eq!(store.erase_page(0), Err(nb::Error::WouldBlock));
        assert_eq!(store.erase_page(0), Err(nb::Error::WouldBlock));
        assert_eq!(store.erase_page(0), Ok(()));
    }

    #[test]
    fn injected_fault_after_successes() {
        let mut store: MemoryStore<4> = MemoryStore::new();
        store.fail_after(StoreOp::Erase, 1);
        assert!(nb::block!(store.erase_page(0)).is_ok());
        assert_eq!(nb::block!(store.erase_page(1)), Err(MemoryStoreError::Injected));
        assert_eq!(nb::block!(store.erase_page(2)), Err(MemoryStoreError::Injected));

        store.clear_faults();
        assert!(nb::block!(store.erase_page(2)).is_ok());
    }
}
