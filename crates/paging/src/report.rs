//! Final statistics and page table dumps.

use core::fmt;

use crate::{DirectoryEntry, PhysicalMemory, Process};

/// Final state of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub pid: i32,
    /// The first-level table plus one frame per fault. Second-level tables are not counted
    /// here, although they are included in [`Report::allocated_frames`].
    pub allocated_frames: usize,
    pub page_faults: usize,
    pub references: usize,
    /// Valid first-level entries and their mappings.
    pub tables: Vec<DirectoryEntry>,
}

/// Snapshot of a finished simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub processes: Vec<ProcessReport>,
    /// Every frame handed out, page tables included.
    pub allocated_frames: usize,
    pub page_faults: usize,
    pub references: usize,
}

impl Report {
    /// Captures the current state of physical memory and the given processes.
    pub fn capture(memory: &PhysicalMemory, processes: &[Process]) -> Self {
        let processes: Vec<_> = processes
            .iter()
            .map(|process| ProcessReport {
                pid: process.pid(),
                allocated_frames: process.allocated_frames(),
                page_faults: process.page_faults(),
                references: process.ref_count(),
                tables: process.directory().mappings(memory),
            })
            .collect();

        Self {
            allocated_frames: memory.allocated_frames(),
            page_faults: processes.iter().map(|p| p.page_faults).sum(),
            references: processes.iter().map(|p| p.references).sum(),
            processes,
        }
    }
}

impl fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "** Process {:03}: Allocated Frames={:03} PageFaults/References={:03}/{:03}",
            self.pid, self.allocated_frames, self.page_faults, self.references
        )?;
        for table in &self.tables {
            writeln!(f, "(L1PT) PTE {:03} -> [FRAME] {}", table.index, table.table)?;
            for mapping in &table.pages {
                writeln!(
                    f,
                    "(L2PT) [PAGE] {} -> [FRAME] {} REF={:03}",
                    mapping.page, mapping.frame, mapping.ref_count
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for process in &self.processes {
            write!(f, "{process}")?;
        }
        write!(
            f,
            "Total: Allocated Frames={:03} Page Faults/References={:03}/{:03}",
            self.allocated_frames, self.page_faults, self.references
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PageNumber, ProcessRecord, Simulation};

    fn run(records: &[(i32, &[usize])]) -> Report {
        let mut sim = Simulation::new(PhysicalMemory::new());
        for &(pid, raw) in records {
            let references = raw.iter().map(|&p| PageNumber::new(p).unwrap()).collect();
            sim.add_process(ProcessRecord { pid, references }).unwrap();
        }
        sim.run(|_| {}).unwrap();
        sim.report().unwrap()
    }

    #[test]
    fn totals_include_table_frames() {
        let report = run(&[(1, &[0, 1, 8, 0][..]), (2, &[63][..])]);
        // Roots 0 and 1, second-level tables 2, 4 and 7, data frames 3, 5, 6 and 8.
        assert_eq!(report.allocated_frames, 9);
        assert_eq!(report.page_faults, 4);
        assert_eq!(report.references, 5);

        let sum: usize = report.processes.iter().map(|p| p.allocated_frames).sum();
        assert_eq!(sum, 2 + 4);
    }

    #[test]
    fn renders_single_process() {
        let report = run(&[(1, &[0, 1, 8, 0][..])]);
        let expected = "\
** Process 001: Allocated Frames=004 PageFaults/References=003/004
(L1PT) PTE 000 -> [FRAME] 001
(L2PT) [PAGE] 000 -> [FRAME] 002 REF=002
(L2PT) [PAGE] 001 -> [FRAME] 003 REF=001
(L1PT) PTE 001 -> [FRAME] 004
(L2PT) [PAGE] 008 -> [FRAME] 005 REF=001
Total: Allocated Frames=006 Page Faults/References=003/004";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn process_without_references_reports_only_header() {
        let report = run(&[(7, &[][..])]);
        assert_eq!(
            report.processes[0].to_string(),
            "** Process 007: Allocated Frames=001 PageFaults/References=000/000\n"
        );
        assert!(report.processes[0].tables.is_empty());
    }
}
