//! stream-walker - incremental directory walker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use stream_walker::config::{CliArgs, WalkConfig};
use stream_walker::error::EnumerationError;
use stream_walker::fs::{DirectoryItem, FileItem};
use stream_walker::progress::{print_header, print_summary, ProgressReporter};
use stream_walker::walker::{WalkEventHandler, WalkSummary, Walker};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose)?;

    let quiet = args.quiet;
    let events = args.events;
    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    if !quiet {
        print_header(&config, config.traversal);
    }

    let progress = if quiet {
        None
    } else {
        Some(Arc::new(ProgressReporter::new()))
    };

    let summary = if events {
        run_events(config, progress.clone())?
    } else {
        run_pull(config, progress.as_deref())?
    };

    if let Some(p) = &progress {
        p.finish_and_clear();
    }
    if !quiet {
        print_summary(&summary);
    }

    if !summary.completed {
        info!("Walk was interrupted before completion");
    }
    if summary.errors > 0 {
        info!(errors = summary.errors, "Walk completed with errors");
    }

    Ok(())
}

/// Read results through the pull API, updating the spinner while waiting
fn run_pull(config: WalkConfig, progress: Option<&ProgressReporter>) -> Result<WalkSummary> {
    let walker = Walker::new(config).context("Failed to initialize walker")?;
    install_interrupt_handler(&walker)?;

    loop {
        let next = walker.get_next_with(|snapshot| {
            if let Some(p) = progress {
                p.update(snapshot);
            }
        });

        match next.context("Walk failed")? {
            Some(item) => emit(progress, &item.to_string()),
            None => break,
        }
    }

    let summary = walker.wait().context("Walk failed")?;
    Ok(summary)
}

/// Deliver results through callbacks on the walker's threads
fn run_events(
    config: WalkConfig,
    progress: Option<Arc<ProgressReporter>>,
) -> Result<WalkSummary> {
    let poll = config.poll_interval;
    let printer = Arc::new(Printer {
        progress: progress.clone(),
    });

    let walker = Walker::new(config.with_event_handler(printer))
        .context("Failed to initialize walker")?;
    install_interrupt_handler(&walker)?;
    walker.start().context("Failed to start walk")?;

    if let Some(p) = &progress {
        while walker.status().is_active() {
            p.update(&walker.snapshot());
            thread::sleep(poll);
        }
    }

    let summary = walker.wait().context("Walk failed")?;
    Ok(summary)
}

struct Printer {
    progress: Option<Arc<ProgressReporter>>,
}

impl WalkEventHandler for Printer {
    fn on_file(&self, item: &FileItem) {
        emit(self.progress.as_deref(), &item.to_string());
    }

    fn on_directory(&self, item: &DirectoryItem) {
        emit(self.progress.as_deref(), &item.to_string());
    }

    fn on_error(&self, error: &EnumerationError) {
        if let Some(p) = &self.progress {
            p.set_status(&error.to_string());
        }
    }
}

fn emit(progress: Option<&ProgressReporter>, line: &str) {
    match progress {
        Some(p) => p.println(line),
        None => println!("{}", line),
    }
}

fn install_interrupt_handler(walker: &Walker) -> Result<()> {
    let stop = walker.stop_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping...");
        stop.stop();
    })
    .context("Failed to set signal handler")
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("stream_walker=debug,warn")
    } else {
        EnvFilter::new("stream_walker=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
