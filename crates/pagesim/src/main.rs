use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use paging::{
    BinaryReader, LoadError, PhysicalMemory, ProcessRecord, Simulation, SimulationError,
    parse_text, write_binary,
};

mod console;

use console::Console;

#[derive(Parser)]
#[command(name = "pagesim")]
#[command(about = "Two-level demand paging simulator")]
struct Args {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every process's references through the simulator and print the final page tables
    Run {
        /// Process records to load (defaults to standard input)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Encoding of the process records
        #[arg(short, long, value_enum, default_value_t = Format::Binary)]
        format: Format,

        /// Suppress the per-reference access trace
        #[arg(short, long)]
        quiet: bool,
    },
    /// Convert text process records into the binary record format
    Encode {
        /// Text records, one process per line: `pid page page ...`
        #[arg(short, long)]
        input: PathBuf,

        /// Binary output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Little-endian `i32 pid, i32 count, count × u8 page` records
    Binary,
    /// One process per line: `pid page page ...`
    Text,
}

type Records = Box<dyn Iterator<Item = Result<ProcessRecord, LoadError>>>;

fn open_records(
    input: Option<PathBuf>,
    format: Format,
) -> Result<Records, Box<dyn std::error::Error>> {
    let reader: Box<dyn Read> = match &input {
        Some(path) => Box::new(BufReader::new(fs::File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    match format {
        Format::Binary => Ok(Box::new(BinaryReader::new(reader))),
        Format::Text => {
            let mut text = String::new();
            let mut reader = reader;
            reader.read_to_string(&mut text)?;
            let records = parse_text(&text)?;
            Ok(Box::new(records.into_iter().map(Ok::<_, LoadError>)))
        }
    }
}

fn echo_record(out: &mut impl Write, record: &ProcessRecord) -> io::Result<()> {
    writeln!(out, "{} {}", record.pid, record.references.len())?;
    for page in &record.references {
        write!(out, "{:02} ", page.as_usize())?;
    }
    writeln!(out)
}

fn report_failure(out: &mut impl Write, err: SimulationError) -> Box<dyn std::error::Error> {
    if matches!(err, SimulationError::OutOfMemory { .. }) {
        if let Err(write_err) = writeln!(out, "Out of memory!!") {
            return write_err.into();
        }
    }
    err.into()
}

/// Loads `records` into `memory`, runs them, and writes the echo, trace and report to `out`.
fn simulate(
    out: &mut impl Write,
    records: impl Iterator<Item = Result<ProcessRecord, LoadError>>,
    memory: PhysicalMemory,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut simulation = Simulation::new(memory);

    writeln!(out, "load_process() start")?;
    let mut echoed: io::Result<()> = Ok(());
    let loaded = simulation.load(records.inspect(|record| {
        if let Ok(record) = record {
            if echoed.is_ok() {
                echoed = echo_record(&mut *out, record);
            }
        }
    }));
    echoed?;
    let loaded = loaded.map_err(|err| report_failure(&mut *out, err))?;
    writeln!(out, "load_process() end")?;
    log::info!("{loaded} processes loaded");

    writeln!(out, "simulate() start")?;
    let mut traced: io::Result<()> = Ok(());
    let summary = simulation.run(|event| {
        if !quiet && traced.is_ok() {
            traced = writeln!(out, "{event}");
        }
    });
    traced?;
    let summary = summary.map_err(|err| report_failure(&mut *out, err))?;
    writeln!(out, "simulate() end")?;
    log::info!(
        "{} references over {} cycles",
        summary.accesses, summary.cycles
    );

    let report = simulation
        .report()
        .ok_or("simulation did not run to completion")?;
    writeln!(out, "{report}")?;
    Ok(())
}

fn run(
    input: Option<PathBuf>,
    format: Format,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = open_records(input, format)?;
    let mut out = io::stdout().lock();
    simulate(&mut out, records, PhysicalMemory::new(), quiet)?;
    out.flush()?;
    Ok(())
}

fn encode(input: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&input)?;
    let records = parse_text(&text)?;

    let file = fs::File::create(&output)?;
    write_binary(BufWriter::new(file), &records)?;

    log::info!(
        "wrote {} process records to {}",
        records.len(),
        output.display()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    Console::init(Console::level_for(args.verbose)).map_err(|err| err.to_string())?;

    match args.command {
        Command::Run {
            input,
            format,
            quiet,
        } => run(input, format, quiet),
        Command::Encode { input, output } => encode(input, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paging::PageNumber;

    fn record(pid: i32, raw: &[usize]) -> Result<ProcessRecord, LoadError> {
        Ok(ProcessRecord {
            pid,
            references: raw.iter().map(|&p| PageNumber::new(p).unwrap()).collect(),
        })
    }

    fn output(
        records: Vec<Result<ProcessRecord, LoadError>>,
        memory: PhysicalMemory,
        quiet: bool,
    ) -> (String, Result<(), Box<dyn std::error::Error>>) {
        let mut out = Vec::new();
        let result = simulate(&mut out, records.into_iter(), memory, quiet);
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn single_process_run() {
        let (text, result) = output(vec![record(1, &[0, 1, 8, 0])], PhysicalMemory::new(), false);
        result.unwrap();
        let expected = "\
load_process() start
1 4
00 01 08 00 
load_process() end
simulate() start
[PID 01 IDX:000] Page access 000: (L1PT) PF -> Allocated Frame 001
[PID 01 IDX:000] Page access 000: (L1PT) Frame 001,(L2PT) PF -> Allocated Frame 002
[PID 01 IDX:001] Page access 001: (L1PT) Frame 001,(L2PT) PF -> Allocated Frame 003
[PID 01 IDX:002] Page access 008: (L1PT) PF -> Allocated Frame 004
[PID 01 IDX:002] Page access 008: (L1PT) Frame 004,(L2PT) PF -> Allocated Frame 005
[PID 01 IDX:003] Page access 000: (L1PT) Frame 001, (L2PT) Frame 002
simulate() end
** Process 001: Allocated Frames=004 PageFaults/References=003/004
(L1PT) PTE 000 -> [FRAME] 001
(L2PT) [PAGE] 000 -> [FRAME] 002 REF=002
(L2PT) [PAGE] 001 -> [FRAME] 003 REF=001
(L1PT) PTE 001 -> [FRAME] 004
(L2PT) [PAGE] 008 -> [FRAME] 005 REF=001
Total: Allocated Frames=006 Page Faults/References=003/004
";
        assert_eq!(text, expected);
    }

    #[test]
    fn quiet_run_omits_the_trace() {
        let (text, result) = output(vec![record(1, &[0, 1])], PhysicalMemory::new(), true);
        result.unwrap();
        assert!(!text.contains("[PID"));
        assert!(text.contains("simulate() start\nsimulate() end\n"));
        assert!(text.contains("Total: Allocated Frames=004"));
    }

    #[test]
    fn exhaustion_during_run_prints_no_report() {
        let (text, result) = output(
            vec![record(1, &[0, 1]), record(2, &[0, 1])],
            PhysicalMemory::with_frame_count(4),
            false,
        );
        assert!(result.is_err());
        assert!(text.ends_with("Allocated Frame 003\nOut of memory!!\n"));
        assert!(!text.contains("simulate() end"));
        assert!(!text.contains("Total:"));
    }

    #[test]
    fn exhaustion_during_load_stops_before_simulating() {
        let (text, result) = output(
            vec![record(1, &[0]), record(2, &[0])],
            PhysicalMemory::with_frame_count(1),
            false,
        );
        assert!(result.is_err());
        assert_eq!(
            text,
            "load_process() start\n1 1\n00 \n2 1\n00 \nOut of memory!!\n"
        );
    }

    #[test]
    fn truncated_input_fails_without_out_of_memory() {
        let (text, result) = output(
            vec![record(1, &[0]), Err(LoadError::Truncated { record: 1 })],
            PhysicalMemory::new(),
            false,
        );
        assert!(result.is_err());
        assert!(!text.contains("Out of memory!!"));
        assert!(!text.contains("load_process() end"));
    }
}
