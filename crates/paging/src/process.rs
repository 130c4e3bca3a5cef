//! Simulated processes and their reference streams.

use core::fmt;

use crate::{AllocError, FrameNumber, PageDirectory, PageNumber, PhysicalMemory};

/// One page access performed on behalf of a process.
///
/// Renders as the trace line for the access: a separate line for a newly created
/// second-level table, followed by the data frame line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEvent {
    /// The process that made the access.
    pub pid: i32,
    /// Position of the access in the process's reference sequence.
    pub index: usize,
    /// The page that was accessed.
    pub page: PageNumber,
    /// Frame of the second-level table the page's entry lives in.
    pub table: FrameNumber,
    /// Whether that second-level table was created by this access.
    pub table_allocated: bool,
    /// The data frame backing the page.
    pub frame: FrameNumber,
    /// Whether the data frame was allocated by this access.
    pub fault: bool,
}

impl AccessEvent {
    fn write_prefix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[PID {:02} IDX:{:03}] Page access {}: ",
            self.pid, self.index, self.page
        )
    }
}

impl fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table_allocated {
            self.write_prefix(f)?;
            writeln!(f, "(L1PT) PF -> Allocated Frame {}", self.table)?;
        }
        self.write_prefix(f)?;
        if self.fault {
            write!(
                f,
                "(L1PT) Frame {},(L2PT) PF -> Allocated Frame {}",
                self.table, self.frame
            )
        } else {
            write!(f, "(L1PT) Frame {}, (L2PT) Frame {}", self.table, self.frame)
        }
    }
}

/// A process with a fixed sequence of page references.
///
/// The process owns its page directory, whose first-level table is allocated when the
/// process is created. Each call to [`Process::step`] consumes exactly one reference.
#[derive(Debug, Clone)]
pub struct Process {
    pid: i32,
    references: Vec<PageNumber>,
    cursor: usize,
    page_faults: usize,
    directory: PageDirectory,
}

impl Process {
    /// Creates a process, allocating its first-level page table.
    pub fn new(
        memory: &mut PhysicalMemory,
        pid: i32,
        references: Vec<PageNumber>,
    ) -> Result<Self, AllocError> {
        let directory = PageDirectory::new(memory)?;
        Ok(Self {
            pid,
            references,
            cursor: 0,
            page_faults: 0,
            directory,
        })
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn references(&self) -> &[PageNumber] {
        &self.references
    }

    /// Number of references consumed so far.
    pub fn ref_count(&self) -> usize {
        self.cursor
    }

    /// Number of data frames allocated for this process.
    pub fn page_faults(&self) -> usize {
        self.page_faults
    }

    /// Frames attributed to this process: the first-level table plus one per fault.
    ///
    /// Second-level tables are not included.
    pub fn allocated_frames(&self) -> usize {
        1 + self.page_faults
    }

    pub fn directory(&self) -> &PageDirectory {
        &self.directory
    }

    /// Returns the next reference without consuming it.
    pub fn next_reference(&self) -> Option<PageNumber> {
        self.references.get(self.cursor).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.references.len()
    }

    /// Consumes the next reference and translates it.
    ///
    /// Returns `Ok(None)` once the reference sequence is exhausted. The reference counts as
    /// consumed even when translation fails.
    pub fn step(
        &mut self,
        memory: &mut PhysicalMemory,
    ) -> Result<Option<AccessEvent>, AllocError> {
        let Some(page) = self.next_reference() else {
            return Ok(None);
        };
        let index = self.cursor;
        self.cursor += 1;

        let translation = self.directory.translate(memory, page)?;
        if translation.fault {
            self.page_faults += 1;
        }

        Ok(Some(AccessEvent {
            pid: self.pid,
            index,
            page,
            table: translation.table,
            table_allocated: translation.table_allocated,
            frame: translation.frame,
            fault: translation.fault,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(raw: &[usize]) -> Vec<PageNumber> {
        raw.iter().map(|&p| PageNumber::new(p).unwrap()).collect()
    }

    #[test]
    fn creation_allocates_first_level_table() {
        let mut memory = PhysicalMemory::new();
        let process = Process::new(&mut memory, 3, pages(&[1, 2])).unwrap();
        assert_eq!(memory.allocated_frames(), 1);
        assert_eq!(process.directory().root(), FrameNumber::new(0));
        assert_eq!(process.allocated_frames(), 1);
        assert!(!process.is_finished());
    }

    #[test]
    fn creation_fails_without_frames() {
        let mut memory = PhysicalMemory::with_frame_count(0);
        assert_eq!(
            Process::new(&mut memory, 1, Vec::new()).unwrap_err(),
            AllocError::OutOfMemory
        );
    }

    #[test]
    fn empty_sequence_is_finished_immediately() {
        let mut memory = PhysicalMemory::new();
        let mut process = Process::new(&mut memory, 1, Vec::new()).unwrap();
        assert!(process.is_finished());
        assert_eq!(process.step(&mut memory), Ok(None));
    }

    #[test]
    fn step_consumes_references_in_order() {
        let mut memory = PhysicalMemory::new();
        let mut process = Process::new(&mut memory, 1, pages(&[4, 9, 4])).unwrap();

        let mut seen = Vec::new();
        while let Some(event) = process.step(&mut memory).unwrap() {
            seen.push((event.index, event.page.as_usize(), event.fault));
        }
        assert_eq!(seen, vec![(0, 4, true), (1, 9, true), (2, 4, false)]);
        assert_eq!(process.ref_count(), 3);
        assert!(process.is_finished());
    }

    #[test]
    fn faults_count_distinct_pages() {
        let mut memory = PhysicalMemory::new();
        let refs = [0, 63, 0, 17, 63, 17, 17, 32, 0];
        let mut process = Process::new(&mut memory, 1, pages(&refs)).unwrap();
        while process.step(&mut memory).unwrap().is_some() {}
        assert_eq!(process.page_faults(), 4);
        assert_eq!(process.allocated_frames(), 5);
    }

    #[test]
    fn failed_step_still_consumes_reference() {
        let mut memory = PhysicalMemory::with_frame_count(1);
        let mut process = Process::new(&mut memory, 1, pages(&[0, 1])).unwrap();
        assert_eq!(process.step(&mut memory), Err(AllocError::OutOfMemory));
        assert_eq!(process.ref_count(), 1);
        assert_eq!(process.page_faults(), 0);
    }

    mod display {
        use super::*;

        fn event(table_allocated: bool, fault: bool) -> AccessEvent {
            AccessEvent {
                pid: 1,
                index: 0,
                page: PageNumber::new(8).unwrap(),
                table: FrameNumber::new(4),
                table_allocated,
                frame: FrameNumber::new(5),
                fault,
            }
        }

        #[test]
        fn hit() {
            assert_eq!(
                event(false, false).to_string(),
                "[PID 01 IDX:000] Page access 008: (L1PT) Frame 004, (L2PT) Frame 005"
            );
        }

        #[test]
        fn fault() {
            assert_eq!(
                event(false, true).to_string(),
                "[PID 01 IDX:000] Page access 008: (L1PT) Frame 004,(L2PT) PF -> Allocated Frame 005"
            );
        }

        #[test]
        fn fault_with_new_table() {
            assert_eq!(
                event(true, true).to_string(),
                "[PID 01 IDX:000] Page access 008: (L1PT) PF -> Allocated Frame 004\n\
                 [PID 01 IDX:000] Page access 008: (L1PT) Frame 004,(L2PT) PF -> Allocated Frame 005"
            );
        }
    }
}
