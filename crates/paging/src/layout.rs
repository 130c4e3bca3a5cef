//! Fixed geometry of the simulated machine.
//!
//! The simulated machine is deliberately tiny so that every table and frame can be printed:
//! - 32-byte frames, 256 of them (8 KiB of physical memory)
//! - 64 logical pages per process
//! - 2 levels of page tables with 8 entries each (3-bit indexes)
//! - 4-byte page table entries, so one table fills exactly one frame

/// Size of a frame (and of a logical page) in bytes.
pub const PAGE_SIZE: usize = 32;

/// Number of frames in the simulated physical address space.
pub const PAS_FRAMES: usize = 256;

/// Size of the simulated physical address space in bytes.
pub const PAS_SIZE: usize = PAGE_SIZE * PAS_FRAMES;

/// Number of logical pages in a process's address space.
pub const VAS_PAGES: usize = 64;

/// Size of an encoded page table entry in bytes.
pub const PTE_SIZE: usize = 4;

/// Number of entries in a first-level page table.
pub const L1_PT_ENTRIES: usize = 8;

/// Number of entries in a second-level page table.
pub const L2_PT_ENTRIES: usize = 8;

/// Maximum number of processes accepted from the input.
pub const MAX_PROCESSES: usize = 10;

/// Maximum length of a single process's reference sequence.
pub const MAX_REFERENCES: usize = 256;

const _: () = assert!(L2_PT_ENTRIES * PTE_SIZE == PAGE_SIZE);
const _: () = assert!(L1_PT_ENTRIES * PTE_SIZE <= PAGE_SIZE);
const _: () = assert!(L1_PT_ENTRIES * L2_PT_ENTRIES == VAS_PAGES);
const _: () = assert!(PAS_FRAMES <= u8::MAX as usize + 1);

/// Returns the first-level table index for a logical page.
#[inline]
pub const fn l1_index(page: usize) -> usize {
    page / L2_PT_ENTRIES
}

/// Returns the second-level table index for a logical page.
#[inline]
pub const fn l2_index(page: usize) -> usize {
    page % L2_PT_ENTRIES
}

/// Recombines first- and second-level indexes into a logical page number.
#[inline]
pub const fn page_from_indices(l1: usize, l2: usize) -> usize {
    l1 * L2_PT_ENTRIES + l2
}
