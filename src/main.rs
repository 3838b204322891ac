use std::{
    error::Error,
    io::{self, BufRead},
    thread,
};

use chrono::Local;
use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use lockin_scan::{
    args::{self, Args},
    checkpoint::format_estimate,
    config::BatchFile,
    devices::{SimulatedLockIn, SimulatedSynthesizer},
    instrument::Band,
    monitoring::{operator_console, progress_logger},
    record::{Destination, RecordWriter},
    timer::DeadlineTimer,
    BatchScheduler, BatchStatus, Command, ScanEngine,
};
use tracing::{error, info, warn};

fn confirm() -> io::Result<bool> {
    println!("Start the batch? [yes/no]");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "yes"))
}

fn main() -> Result<(), Box<dyn Error>> {
    // Get the CLI options
    let cli = Args::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(args::convert_filter(cli.verbose.log_level_filter()))
        .init();

    let batch = BatchFile::load(&cli.batch)?;
    let band = match cli.band {
        Some(b) => Band::new(b.into())?,
        None => Band::new(batch.band.unwrap_or_default())?,
    };
    info!(
        "Loaded {} windows from {}, {}",
        batch.entries.len(),
        cli.batch.display(),
        band.label()
    );
    for entry in &batch.entries {
        info!("{}", entry.describe());
    }

    println!("{}", format_estimate(&batch.entries, Local::now()));
    if !cli.yes && !confirm()? {
        warn!("Batch cancelled");
        return Ok(());
    }

    let engine = ScanEngine::new(
        SimulatedSynthesizer::default(),
        SimulatedLockIn::new(cli.seed),
        RecordWriter,
        DeadlineTimer::default(),
        band,
    );
    let (progress_tx, progress_rx) = bounded(1024);
    let mut scheduler = BatchScheduler::new(engine).with_progress(progress_tx);

    // Operator input, ctrl-c and the console both feed the same queue
    let (cmd_tx, cmd_rx) = unbounded();
    let ctrlc_tx = cmd_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Command::AbortBatch);
    })?;
    thread::spawn(move || operator_console(io::stdin().lock(), cmd_tx));
    let logger = thread::spawn(move || progress_logger(progress_rx));

    let destination = Destination::new(cli.output.clone());
    if scheduler.start(batch.entries, destination)? == BatchStatus::Running {
        let report = scheduler.run(cmd_rx);
        match report.status {
            BatchStatus::Aborted => error!(
                "Batch aborted after {} windows, unsaved data was discarded",
                report.windows_done
            ),
            _ => info!(
                "Done! {} windows written to {}",
                report.windows_done,
                cli.output.display()
            ),
        }
    }

    // Hang up on the logger so it drains and exits
    drop(scheduler);
    let _ = logger.join();
    Ok(())
}
