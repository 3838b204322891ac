//! Argument parsing for running from the command line

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// TOML batch file listing the frequency windows to scan
    #[clap(short, long)]
    pub batch: PathBuf,
    /// File the averaged spectra are appended to
    #[clap(short, long)]
    pub output: PathBuf,
    /// VDI band index (0-9), overrides the batch file
    #[clap(long)]
    #[clap(value_parser = clap::value_parser!(u8).range(0..10))]
    pub band: Option<u8>,
    /// Start without confirming the time estimate
    #[clap(short, long)]
    pub yes: bool,
    /// Seed for the simulated lock-in readings
    #[clap(long, default_value_t = 0)]
    pub seed: u64,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

/// Match verbosity filter with tracing subscriber log levels
pub fn convert_filter(filter: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    match filter {
        log::LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF,
        log::LevelFilter::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing_subscriber::filter::LevelFilter::WARN,
        log::LevelFilter::Info => tracing_subscriber::filter::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "lockin_scan",
            "--batch",
            "batch.toml",
            "-o",
            "scan.lwa",
            "--band",
            "4",
            "-y",
        ]);
        assert_eq!(args.batch, PathBuf::from("batch.toml"));
        assert_eq!(args.band, Some(4));
        assert!(args.yes);
        assert!(Args::try_parse_from(["lockin_scan", "-b", "x", "-o", "y", "--band", "10"]).is_err());
    }

    #[test]
    fn test_convert_filter() {
        assert_eq!(
            convert_filter(log::LevelFilter::Debug),
            tracing_subscriber::filter::LevelFilter::DEBUG
        );
    }
}
