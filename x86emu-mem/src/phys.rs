use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use x86emu_types::PhysAddr;

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub struct Page([u8; 4096]);

impl Page {
    pub const SIZE: u32 = core::mem::size_of::<Self>() as u32;
    pub const SHIFT: u32 = 12;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum MemError {
    #[error("physical address {0:#x} is beyond the end of memory")]
    OutOfRange(PhysAddr),
}

/// Sparse physical memory, materialised one zeroed page at a time on first write.
///
/// Addresses at or beyond `page_limit` pages are not backed: reads float high (`0xFF`) and writes
/// are dropped.
#[derive(Debug)]
pub struct SysMemory {
    page_limit: u32,
    pages: HashMap<u32, Box<Page>>,
}

impl SysMemory {
    pub fn new(page_limit: u32) -> Self {
        Self {
            page_limit,
            pages: HashMap::new(),
        }
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Number of pages that have been materialised so far.
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    fn split(addr: PhysAddr) -> (u32, usize) {
        (addr >> Page::SHIFT, (addr & (Page::SIZE - 1)) as usize)
    }

    /// The page holding `addr`, materialised if needed.
    fn page_mut(&mut self, addr: PhysAddr) -> Result<&mut Page, MemError> {
        let (page, _) = Self::split(addr);
        if page >= self.page_limit {
            return Err(MemError::OutOfRange(addr));
        }

        let pg = self
            .pages
            .entry(page)
            .or_insert_with(|| Box::new(Page::zeroed()));
        Ok(&mut **pg)
    }

    pub fn read_byte(&self, addr: PhysAddr) -> u8 {
        let (page, offset) = Self::split(addr);
        if page >= self.page_limit {
            return 0xFF;
        }
        self.pages.get(&page).map_or(0, |pg| pg.0[offset])
    }

    pub fn write_byte(&mut self, addr: PhysAddr, val: u8) -> Result<(), MemError> {
        let (_, offset) = Self::split(addr);
        self.page_mut(addr)?.0[offset] = val;
        Ok(())
    }

    /// Copies `bytes` into memory starting at `addr`, crossing page boundaries as needed.
    pub fn load(&mut self, mut addr: PhysAddr, mut bytes: &[u8]) -> Result<(), MemError> {
        while !bytes.is_empty() {
            let (_, offset) = Self::split(addr);
            let pg = self.page_mut(addr)?;
            let len = bytes.len().min(Page::SIZE as usize - offset);
            pg.0[offset..][..len].copy_from_slice(&bytes[..len]);
            bytes = &bytes[len..];
            addr = addr.wrapping_add(len as u32);
        }
        Ok(())
    }

    /// Directly accesses the page containing `addr`, if it has been materialised.
    pub fn with_page<R>(&self, addr: PhysAddr, f: impl FnOnce(&Page) -> R) -> Option<R> {
        let (page, _) = Self::split(addr);
        self.pages.get(&page).map(|pg| f(pg))
    }
}

impl Page {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_untouched_memory_reads_zero_without_allocating() {
        let mem = SysMemory::new(16);
        assert_eq!(mem.read_byte(0x1234), 0);
        assert_eq!(mem.resident_pages(), 0);
    }

    #[test]
    fn test_beyond_limit_floats_high() {
        let mut mem = SysMemory::new(1);
        assert_eq!(mem.read_byte(0x1000), 0xFF);
        assert_eq!(mem.write_byte(0x1000, 1), Err(MemError::OutOfRange(0x1000)));
        assert_eq!(mem.write_byte(0x1ABC, 1), Err(MemError::OutOfRange(0x1ABC)));
    }

    #[test]
    fn test_load_reports_first_unbacked_address() {
        let mut mem = SysMemory::new(1);
        assert_eq!(
            mem.load(0x0FFE, &[1, 2, 3, 4]),
            Err(MemError::OutOfRange(0x1000))
        );
        assert_eq!(mem.read_byte(0x0FFF), 2);
    }

    #[test]
    fn test_load_crosses_pages() {
        let mut mem = SysMemory::new(4);
        mem.load(0x0FFE, &[1, 2, 3, 4]).unwrap();
        assert_eq!(mem.read_byte(0x0FFF), 2);
        assert_eq!(mem.read_byte(0x1000), 3);
        assert_eq!(mem.resident_pages(), 2);
        assert_eq!(mem.with_page(0x1000, |pg| pg.bytes()[1]), Some(4));
    }
}
