//! Page table views over simulated physical memory.

use crate::{
    PageEntry,
    layout::{L2_PT_ENTRIES, PTE_SIZE},
};

/// Number of entries in a page table.
///
/// Both levels use the same fan-out, so a single view type serves for either.
const ENTRY_COUNT: usize = L2_PT_ENTRIES;

fn read_entry(bytes: &[u8], index: usize) -> PageEntry {
    assert!(index < ENTRY_COUNT, "page table index out of bounds");
    let offset = index * PTE_SIZE;
    let mut raw = [0u8; PTE_SIZE];
    raw.copy_from_slice(&bytes[offset..offset + PTE_SIZE]);
    PageEntry::from_bytes(raw)
}

/// A read-only view of a page table stored in one frame.
///
/// Entries are decoded from the frame's bytes on every access.
#[derive(Clone, Copy)]
pub struct PageTable<'a> {
    bytes: &'a [u8],
}

impl<'a> PageTable<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(bytes.len() >= ENTRY_COUNT * PTE_SIZE);
        Self { bytes }
    }

    /// Returns the entry at the given index.
    ///
    /// # Panics
    /// Panics if index >= 8.
    pub fn entry(&self, index: usize) -> PageEntry {
        read_entry(self.bytes, index)
    }

    /// Returns the number of entries in this page table.
    pub const fn len(&self) -> usize {
        ENTRY_COUNT
    }

    /// Iterates over every entry, valid or not.
    pub fn entries(self) -> impl Iterator<Item = PageEntry> + 'a {
        let bytes = self.bytes;
        (0..ENTRY_COUNT).map(move |index| read_entry(bytes, index))
    }

    /// Iterates over the valid entries together with their indexes.
    pub fn valid_entries(self) -> impl Iterator<Item = (usize, PageEntry)> + 'a {
        self.entries()
            .enumerate()
            .filter(|(_, entry)| entry.is_valid())
    }
}

/// A writable view of a page table stored in one frame.
pub struct PageTableMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> PageTableMut<'a> {
    pub(crate) fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert!(bytes.len() >= ENTRY_COUNT * PTE_SIZE);
        Self { bytes }
    }

    /// Returns the entry at the given index.
    pub fn entry(&self, index: usize) -> PageEntry {
        read_entry(self.bytes, index)
    }

    /// Overwrites the entry at the given index.
    ///
    /// # Panics
    /// Panics if index >= 8.
    pub fn set_entry(&mut self, index: usize, entry: PageEntry) {
        assert!(index < ENTRY_COUNT, "page table index out of bounds");
        let offset = index * PTE_SIZE;
        self.bytes[offset..offset + PTE_SIZE].copy_from_slice(&entry.to_bytes());
    }

    /// Reads, modifies and writes back the entry at the given index.
    pub fn update<R>(&mut self, index: usize, f: impl FnOnce(&mut PageEntry) -> R) -> R {
        let mut entry = self.entry(index);
        let result = f(&mut entry);
        self.set_entry(index, entry);
        result
    }
}
