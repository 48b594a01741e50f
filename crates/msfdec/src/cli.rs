use std::fmt::Display;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program reads transitions of a digital MSF receiver line and decodes the UK MSF time signal. The decoded date and time are printed as the clock display would show them.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program reads transitions of a digital MSF receiver line and decodes the UK MSF time signal. The decoded date and time are printed as the clock display would show them.

The line must be HIGH while the 60 kHz carrier is switched OFF. Most receiver modules offer this polarity on their non-inverting output.

By default, the input is text with one observation per line:

    <level> <timestamp>

where <level> is 0 or 1 (or low/high) and <timestamp> is a monotonic time in milliseconds. Lines may be repeated at the same level; only changes matter. Blank lines and lines starting with # are ignored.

    0 1000
    1 1500
    0 2000

With --raw, the input is instead one unsigned byte per sample of the line, taken at the sampling --rate. Any non-zero byte is HIGH.

Use --demo to decode a few minutes of synthetic signal for the current UTC time. No input is read.
"#;

const ADVANCED: &str = "Advanced Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even the time
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Read raw 8-bit line samples instead of text
    #[arg(long)]
    pub raw: bool,

    /// Sampling rate of --raw input (Hz)
    #[arg(short, long, default_value_t = 1000)]
    #[arg(value_parser = value_parser!(u32).range(10..))]
    pub rate: u32,

    /// Print both rows of a 16x2 clock display
    #[arg(long)]
    pub lcd: bool,

    /// Decode synthetic signal for the current time and exit
    #[arg(long)]
    pub demo: bool,

    /// Give up the lock after this long without seconds (s)
    ///
    /// By default, the lock is never given up, and the time is
    /// extrapolated through any amount of bad signal.
    #[arg(long)]
    #[arg(help_heading = ADVANCED)]
    pub lock_timeout: Option<u64>,

    /// Timestamps wrap at 2^BITS (text input only)
    ///
    /// Set this if the timestamps come from a counter which
    /// overflows, like a 32-bit millisecond tick.
    #[arg(long, value_name = "BITS")]
    #[arg(value_parser = value_parser!(u8).range(8..64))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timestamp_bits: Option<u8>,

    /// Number of minutes to generate in --demo mode
    #[arg(long, default_value_t = 3)]
    #[arg(value_parser = value_parser!(u32).range(1..=60))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub demo_minutes: u32,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }

    /// Lock timeout, in milliseconds
    pub fn lock_timeout_ms(&self) -> Option<u64> {
        self.lock_timeout.map(|secs| secs.saturating_mul(1000))
    }

    /// Timestamp wrap modulus, if any
    ///
    /// Raw samples are timed by counting them, so they never
    /// wrap.
    pub fn timestamp_wrap(&self) -> Option<u64> {
        if self.raw {
            None
        } else {
            self.timestamp_bits.map(|bits| 1u64 << bits)
        }
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["msfdec"]).expect("defaults");
        assert!(args.input_is_stdin());
        assert_eq!(args.lock_timeout_ms(), None);
        assert_eq!(args.timestamp_wrap(), None);

        let args = Args::try_parse_from([
            "msfdec",
            "--file",
            "edges.txt",
            "--lock-timeout",
            "30",
            "--timestamp-bits",
            "32",
        ])
        .expect("valid");
        assert!(!args.input_is_stdin());
        assert_eq!(args.lock_timeout_ms(), Some(30_000));
        assert_eq!(args.timestamp_wrap(), Some(1 << 32));

        assert!(Args::try_parse_from(["msfdec", "--raw", "--rate", "2"]).is_err());

        // raw sample times are counted, not read
        let args = Args::try_parse_from(["msfdec", "--raw", "--timestamp-bits", "32"])
            .expect("valid");
        assert_eq!(args.timestamp_wrap(), None);
    }
}
