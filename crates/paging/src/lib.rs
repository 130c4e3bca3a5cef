//! # Paging
//!
//! A two-level demand paging simulator. It provides:
//!
//! - A simulated physical address space with a never-freeing frame allocator.
//! - Two-level page tables stored inside that address space and accessed through typed views.
//! - Lazy allocation of second-level tables and data frames, with fault and reference counts.
//! - Round-robin execution of several processes' page reference streams.
//! - Loading of process records and reporting of the final page tables.

mod entry;
pub mod layout;
mod loader;
mod numbers;
mod page_directory;
mod physical_memory;
mod process;
mod report;
mod simulation;
mod table;

pub use entry::PageEntry;
pub use loader::{BinaryReader, LoadError, ProcessRecord, parse_text, write_binary};
pub use numbers::{FrameNumber, PageNumber};
pub use page_directory::{DirectoryEntry, PageDirectory, PageMapping, Translation};
pub use physical_memory::{AllocError, PhysicalMemory};
pub use process::{AccessEvent, Process};
pub use report::{ProcessReport, Report};
pub use simulation::{RunSummary, Simulation, SimulationError, State};
pub use table::{PageTable, PageTableMut};

pub use layout::{PAGE_SIZE, PAS_FRAMES, VAS_PAGES};
