//! Round-robin execution of loaded processes.
//!
//! A [`Simulation`] owns the physical memory and every process sharing it. Running it
//! advances each unfinished process by one reference per cycle, in load order, until a cycle
//! passes in which no process had anything left to do.

use core::fmt;

use crate::{
    AccessEvent, LoadError, PageNumber, PhysicalMemory, Process, ProcessRecord, Report,
    layout::MAX_PROCESSES,
};

/// Errors that end a simulation run.
#[derive(Debug)]
pub enum SimulationError {
    /// Reading the process records failed.
    Load(LoadError),
    /// Physical memory ran out.
    ///
    /// `page` is the reference being translated, or `None` if the first-level table of a
    /// newly loaded process could not be allocated.
    OutOfMemory { pid: i32, page: Option<PageNumber> },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Load(err) => write!(f, "failed to load processes: {err}"),
            SimulationError::OutOfMemory {
                pid,
                page: Some(page),
            } => write!(f, "out of memory translating page {page} for process {pid}"),
            SimulationError::OutOfMemory { pid, page: None } => {
                write!(f, "out of memory creating page table for process {pid}")
            }
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Load(err) => Some(err),
            SimulationError::OutOfMemory { .. } => None,
        }
    }
}

impl From<LoadError> for SimulationError {
    fn from(err: LoadError) -> Self {
        SimulationError::Load(err)
    }
}

/// Lifecycle of a simulation.
///
/// Whether a single process is still running or done is tracked by the process itself
/// ([`Process::is_finished`]); this is the state of the run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Processes may be added; nothing has run yet.
    Loading,
    /// Every process has consumed its whole reference sequence.
    Done,
    /// Memory ran out; the run cannot be resumed or reported.
    Failed,
}

/// Statistics about a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles in which at least one process made progress.
    pub cycles: usize,
    /// Total references translated.
    pub accesses: usize,
}

/// A set of processes sharing one simulated physical memory.
pub struct Simulation {
    memory: PhysicalMemory,
    processes: Vec<Process>,
    state: State,
}

impl Simulation {
    /// Creates an empty simulation over the given physical memory.
    pub fn new(memory: PhysicalMemory) -> Self {
        Self {
            memory,
            processes: Vec::new(),
            state: State::Loading,
        }
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    /// Processes in load order.
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Adds a process, allocating its first-level page table.
    ///
    /// # Panics
    /// Panics if the simulation has already run.
    pub fn add_process(&mut self, record: ProcessRecord) -> Result<&Process, SimulationError> {
        assert_eq!(
            self.state,
            State::Loading,
            "processes can only be added before the simulation runs"
        );

        let ProcessRecord { pid, references } = record;
        match Process::new(&mut self.memory, pid, references) {
            Ok(process) => {
                log::info!(
                    "loaded process {pid} with {} references, page table in frame {}",
                    process.references().len(),
                    process.directory().root()
                );
                self.processes.push(process);
                Ok(&self.processes[self.processes.len() - 1])
            }
            Err(_) => {
                log::error!("out of memory loading process {pid}");
                self.state = State::Failed;
                Err(SimulationError::OutOfMemory { pid, page: None })
            }
        }
    }

    /// Adds processes from a record stream, stopping after `MAX_PROCESSES` of them.
    ///
    /// Returns the number of processes added.
    pub fn load<I>(&mut self, records: I) -> Result<usize, SimulationError>
    where
        I: IntoIterator<Item = Result<ProcessRecord, LoadError>>,
    {
        let mut loaded = 0;
        for record in records.into_iter().take(MAX_PROCESSES) {
            self.add_process(record?)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Runs every process to completion.
    ///
    /// `on_access` is called once for every reference translated, in execution order. The
    /// run stops at the first allocation failure, leaving the simulation `Failed`.
    ///
    /// # Panics
    /// Panics if the simulation has already run.
    pub fn run(
        &mut self,
        mut on_access: impl FnMut(&AccessEvent),
    ) -> Result<RunSummary, SimulationError> {
        assert_eq!(self.state, State::Loading, "simulation has already run");
        log::info!("simulation start: {} processes", self.processes.len());

        let mut summary = RunSummary {
            cycles: 0,
            accesses: 0,
        };

        loop {
            let mut progressed = false;

            for process in &mut self.processes {
                let page = process.next_reference();
                let event = match process.step(&mut self.memory) {
                    Ok(Some(event)) => event,
                    Ok(None) => continue,
                    Err(_) => {
                        log::error!(
                            "out of memory: process {} at reference {}",
                            process.pid(),
                            process.ref_count() - 1
                        );
                        self.state = State::Failed;
                        return Err(SimulationError::OutOfMemory {
                            pid: process.pid(),
                            page,
                        });
                    }
                };

                progressed = true;
                summary.accesses += 1;
                log::trace!("{event}");
                on_access(&event);
            }

            if !progressed {
                break;
            }
            summary.cycles += 1;
        }

        self.state = State::Done;
        log::info!(
            "simulation end: {} references in {} cycles, {} frames allocated, {} free",
            summary.accesses,
            summary.cycles,
            self.memory.allocated_frames(),
            self.memory.free_frames()
        );
        Ok(summary)
    }

    /// Captures the final state of a completed run.
    ///
    /// Returns None unless the simulation has run to completion.
    pub fn report(&self) -> Option<Report> {
        (self.state == State::Done).then(|| Report::capture(&self.memory, &self.processes))
    }
}
