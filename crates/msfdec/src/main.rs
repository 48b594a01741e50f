use std::io;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, LevelFilter};

use msftime::MsfReceiverBuilder;

mod app;
mod cli;
mod source;

use cli::{Args, CliError};

fn main() {
    match msfdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn msfdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder
    let mut builder = MsfReceiverBuilder::new();
    if let Some(timeout) = args.lock_timeout_ms() {
        builder.with_lock_timeout(timeout);
    }
    let mut rx = builder.build();

    let mut display = app::ConsoleDisplay::new(io::stdout(), args.quiet, args.lcd);

    if args.demo {
        app::run_demo(&args, &mut rx, &mut display)?;
        return Ok(());
    }

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    app::run(&args, &mut rx, inbuf, &mut display);

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("msftime", log_filter)
            .filter_module("msfdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("MSF decoder reading standard input");
        if args.raw && is_terminal(&std::io::stdin()) {
            Err(anyhow!(
                "cowardly refusing to read raw line samples from a terminal.

Pipe the output of a GPIO sampler or a recording into this program,
or omit --raw to type text observations."
            ))
        } else {
            Ok(Box::new(io::BufReader::new(stdin)))
        }
    } else {
        info!("MSF decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}
