use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use petdo_core::config::default_config_path;
use petdo_core::impls::BroadcastSink;
use petdo_core::{TrackerBuilder, TrackerConfig, TrackerRuntime};

mod repl;

use repl::{Flow, Line};

const EVENT_BUFFER: usize = 32;

/// Task tracker with a companion that grows as you finish things.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where the companion record lives (overrides config and PETDO_DATA_DIR)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Seconds between deadline checks
    #[arg(long, value_name = "SECS")]
    tick_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "petdo failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config = TrackerConfig::load(&config_path)?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(secs) = args.tick_secs {
        config.tick_interval_secs = secs;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    let sink = Arc::new(BroadcastSink::new(EVENT_BUFFER));
    let mut events = sink.subscribe();
    let tracker = TrackerBuilder::from_config(&config).sink(sink).build();
    let runtime = TrackerRuntime::spawn(tracker, config.tick_interval());
    let handle = runtime.handle();

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => println!("{}", repl::describe_event(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "companion events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    repl::print_view(&handle.view());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                // also covers `help`
                let _ = err.print();
                continue;
            }
        };
        match repl::execute(&handle, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => println!("! {err}"),
        }
    }

    runtime.shutdown_and_join().await;
    printer.abort();
    Ok(())
}
