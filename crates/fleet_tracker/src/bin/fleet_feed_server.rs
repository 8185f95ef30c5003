use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use fleet_tracker::feed::{FeedServer, FeedServerConfig, FleetDataset, DEFAULT_FEED_ADDR};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    dataset_path: Option<PathBuf>,
    bind_addr: String,
    poll_ms: u64,
    write_demo: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            dataset_path: None,
            bind_addr: DEFAULT_FEED_ADDR.to_string(),
            poll_ms: 250,
            write_demo: None,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_options(args.iter().skip(1).map(|arg| arg.as_str())) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            print_help();
            process::exit(1);
        }
    };

    if let Some(path) = options.write_demo.as_ref() {
        if let Err(err) = FleetDataset::demo().save_json(path) {
            eprintln!("failed to write demo dataset to {}: {err}", path.display());
            process::exit(1);
        }
        tracing::info!(path = %path.display(), "wrote demo fleet dataset");
        return;
    }

    if let Err(err) = ctrlc::set_handler(|| {
        tracing::info!("fleet feed server interrupted, shutting down");
        process::exit(0);
    }) {
        tracing::warn!(error = %err, "failed to install interrupt handler");
    }

    let mut config = FeedServerConfig::default()
        .with_bind_addr(options.bind_addr)
        .with_poll_interval(Duration::from_millis(options.poll_ms));
    if let Some(path) = options.dataset_path {
        config = config.with_dataset_path(path);
    }

    let server = match FeedServer::load(config) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("failed to load fleet dataset: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = server.run() {
        eprintln!("fleet feed server failed: {err}");
        process::exit(1);
    }
}

fn parse_options<'a>(args: impl Iterator<Item = &'a str>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut iter = args.peekable();

    while let Some(arg) = iter.next() {
        match arg {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--bind" => {
                options.bind_addr = iter
                    .next()
                    .ok_or_else(|| "--bind requires an address".to_string())?
                    .to_string();
            }
            "--poll-ms" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| "--poll-ms requires a positive integer".to_string())?;
                options.poll_ms = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or_else(|| "--poll-ms requires a positive integer".to_string())?;
            }
            "--write-demo" => {
                options.write_demo = Some(PathBuf::from(
                    iter.next()
                        .ok_or_else(|| "--write-demo requires a path".to_string())?,
                ));
            }
            "-" => {
                options.dataset_path = None;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option: {other}"));
            }
            path => {
                if options.dataset_path.is_some() {
                    return Err(format!("unexpected extra argument: {path}"));
                }
                options.dataset_path = Some(PathBuf::from(path));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("Usage: fleet_feed_server [dataset.json|-] [--bind <addr>] [--poll-ms <ms>]");
    println!("       fleet_feed_server --write-demo <path>");
    println!("Options:");
    println!("  --bind <addr>       Bind address (default: {DEFAULT_FEED_ADDR})");
    println!("  --poll-ms <ms>      Dataset reload check interval (default: 250)");
    println!("  --write-demo <path> Write the built-in demo dataset as JSON and exit");
    println!("Without a dataset path (or with '-') the built-in demo fleet is served.");
}
