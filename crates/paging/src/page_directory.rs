//! Two-level page table management.
//!
//! This module provides the `PageDirectory` type, which owns a process's first-level table
//! and walks the two-level hierarchy to translate logical pages into physical frames,
//! allocating second-level tables and data frames on first touch.

use crate::{AllocError, FrameNumber, PageEntry, PageNumber, PhysicalMemory};

/// The outcome of translating one logical page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// The page that was translated.
    pub page: PageNumber,
    /// The second-level table holding the page's entry.
    pub table: FrameNumber,
    /// Whether the second-level table was created by this translation.
    pub table_allocated: bool,
    /// The data frame backing the page.
    pub frame: FrameNumber,
    /// Whether the data frame was allocated by this translation (a page fault).
    pub fault: bool,
}

/// A valid second-level mapping, as seen by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMapping {
    pub page: PageNumber,
    pub frame: FrameNumber,
    pub ref_count: u8,
}

/// A valid first-level entry and the mappings reachable through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Index of the entry in the first-level table.
    pub index: usize,
    /// Frame holding the second-level table.
    pub table: FrameNumber,
    /// Valid mappings in the second-level table, in index order.
    pub pages: Vec<PageMapping>,
}

/// A process's two-level page table.
///
/// The directory only remembers the frame of its first-level table; every entry lives in
/// simulated physical memory and is read and written through table views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDirectory {
    /// Frame holding the first-level table.
    root: FrameNumber,
}

impl PageDirectory {
    /// Creates a page directory, allocating its first-level table.
    pub fn new(memory: &mut PhysicalMemory) -> Result<Self, AllocError> {
        let root = memory.allocate_page_table()?;
        Ok(Self { root })
    }

    /// Returns the frame holding the first-level table.
    pub fn root(&self) -> FrameNumber {
        self.root
    }

    /// Translates a logical page to its data frame, allocating on demand.
    ///
    /// A missing second-level table is allocated and linked into the first-level table; this
    /// is not a page fault. A missing data frame is allocated and recorded with a reference
    /// count of one; this is a page fault. Translating an already mapped page bumps its
    /// reference count.
    ///
    /// Frames consumed before an allocation failure stay allocated.
    pub fn translate(
        &self,
        memory: &mut PhysicalMemory,
        page: PageNumber,
    ) -> Result<Translation, AllocError> {
        let l1 = page.l1_index();
        let existing = memory.table(self.root).entry(l1).frame();
        let (table, table_allocated) = match existing {
            Some(table) => (table, false),
            None => {
                let table = memory.allocate_page_table()?;
                memory
                    .table_mut(self.root)
                    .set_entry(l1, PageEntry::new(table, 0));
                log::debug!("page {page}: second-level table {l1} placed in frame {table}");
                (table, true)
            }
        };

        let l2 = page.l2_index();
        let existing = memory.table(table).entry(l2).frame();
        let (frame, fault) = match existing {
            Some(frame) => {
                memory.table_mut(table).update(l2, PageEntry::touch);
                (frame, false)
            }
            None => {
                let frame = memory.allocate_frame()?;
                memory
                    .table_mut(table)
                    .set_entry(l2, PageEntry::new(frame, 1));
                (frame, true)
            }
        };

        Ok(Translation {
            page,
            table,
            table_allocated,
            frame,
            fault,
        })
    }

    /// Looks up the second-level entry for a page without allocating anything.
    ///
    /// Returns None if the page has never been touched.
    pub fn lookup(&self, memory: &PhysicalMemory, page: PageNumber) -> Option<PageEntry> {
        let table = memory.table(self.root).entry(page.l1_index()).frame()?;
        let entry = memory.table(table).entry(page.l2_index());
        entry.is_valid().then_some(entry)
    }

    /// Collects every valid mapping, grouped by first-level entry.
    pub fn mappings(&self, memory: &PhysicalMemory) -> Vec<DirectoryEntry> {
        memory
            .table(self.root)
            .valid_entries()
            .filter_map(|(index, entry)| {
                let table = entry.frame()?;
                let pages = memory
                    .table(table)
                    .valid_entries()
                    .filter_map(|(l2, entry)| {
                        Some(PageMapping {
                            page: PageNumber::from_indices(index, l2)?,
                            frame: entry.frame()?,
                            ref_count: entry.ref_count(),
                        })
                    })
                    .collect();
                Some(DirectoryEntry {
                    index,
                    table,
                    pages,
                })
            })
            .collect()
    }
}
