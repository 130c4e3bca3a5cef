//! Simulated physical memory and its frame allocator.
//!
//! All page tables and data frames of every process live in one flat byte arena. Frames are
//! handed out by a bump counter and are never freed, so a run can only ever grow until the
//! arena is exhausted.

use core::fmt;

use crate::{
    FrameNumber,
    layout::{PAGE_SIZE, PAS_FRAMES},
    table::{PageTable, PageTableMut},
};

/// Errors that can occur during frame allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// Every frame of physical memory has already been handed out.
    OutOfMemory,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::OutOfMemory => f.write_str("out of physical frames"),
        }
    }
}

impl core::error::Error for AllocError {}

/// The simulated physical address space.
///
/// Owns both the backing bytes and the allocation counter. Frame `f` occupies bytes
/// `[f * PAGE_SIZE, (f + 1) * PAGE_SIZE)` of the arena.
pub struct PhysicalMemory {
    memory: Box<[u8]>,
    next_frame: usize,
}

impl PhysicalMemory {
    /// Creates physical memory with the full `PAS_FRAMES` frames.
    pub fn new() -> Self {
        Self::with_frame_count(PAS_FRAMES)
    }

    /// Creates physical memory with a reduced number of frames.
    ///
    /// # Panics
    /// Panics if `frames` exceeds `PAS_FRAMES`, since frame numbers must fit in a page
    /// table entry.
    pub fn with_frame_count(frames: usize) -> Self {
        assert!(
            frames <= PAS_FRAMES,
            "physical memory cannot exceed {PAS_FRAMES} frames"
        );
        Self {
            memory: vec![0u8; frames * PAGE_SIZE].into_boxed_slice(),
            next_frame: 0,
        }
    }

    /// Returns the total number of frames.
    pub fn frame_count(&self) -> usize {
        self.memory.len() / PAGE_SIZE
    }

    /// Returns the number of frames handed out so far.
    pub fn allocated_frames(&self) -> usize {
        self.next_frame
    }

    /// Returns the number of frames still available.
    pub fn free_frames(&self) -> usize {
        self.frame_count() - self.next_frame
    }

    /// Allocates the next unused frame.
    ///
    /// The frame's contents are left as they are; use [`Self::allocate_page_table`] for
    /// frames that will hold page table entries.
    pub fn allocate_frame(&mut self) -> Result<FrameNumber, AllocError> {
        if self.next_frame >= self.frame_count() {
            log::error!(
                "frame allocation failed: all {} frames in use",
                self.frame_count()
            );
            return Err(AllocError::OutOfMemory);
        }

        let frame = FrameNumber::new(self.next_frame);
        self.next_frame += 1;
        log::debug!("allocated frame {frame}");
        Ok(frame)
    }

    /// Allocates a frame to hold a page table and fills it with invalid entries.
    pub fn allocate_page_table(&mut self) -> Result<FrameNumber, AllocError> {
        let frame = self.allocate_frame()?;
        self.frame_mut(frame).fill(0);
        log::debug!("frame {frame} initialized as page table");
        Ok(frame)
    }

    /// Returns the bytes of an allocated frame.
    ///
    /// # Panics
    /// Panics if the frame has not been allocated.
    pub fn frame(&self, frame: FrameNumber) -> &[u8] {
        assert!(
            frame.as_usize() < self.next_frame,
            "frame {frame} has not been allocated"
        );
        &self.memory[frame.range()]
    }

    /// Returns the bytes of an allocated frame, mutably.
    ///
    /// # Panics
    /// Panics if the frame has not been allocated.
    pub fn frame_mut(&mut self, frame: FrameNumber) -> &mut [u8] {
        assert!(
            frame.as_usize() < self.next_frame,
            "frame {frame} has not been allocated"
        );
        &mut self.memory[frame.range()]
    }

    /// Returns a read-only view of the page table stored in `frame`.
    pub fn table(&self, frame: FrameNumber) -> PageTable<'_> {
        PageTable::new(self.frame(frame))
    }

    /// Returns a writable view of the page table stored in `frame`.
    pub fn table_mut(&mut self, frame: FrameNumber) -> PageTableMut<'_> {
        PageTableMut::new(self.frame_mut(frame))
    }
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}
