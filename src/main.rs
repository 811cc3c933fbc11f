use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scrapedesk::artifacts::{KeyScheme, RemoteOutcome, DEFAULT_PREVIEW_ROWS};
use scrapedesk::upload::HttpUploader;
use scrapedesk::{ArtifactStore, OutputPreview, StoreConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scrapedesk", version, about = "Prepare smart web crawler tasks and preview their results")]
struct Cli {
    /// Directory holding saved task configs
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Directory the crawler notebook writes CSV results to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Append a unique suffix to new config names
    #[arg(long, global = true)]
    unique_keys: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a new task config
    Save {
        #[arg(long, default_value = "Scrape latest laptops on Newegg with prices and ratings")]
        prompt: String,
        #[arg(long, default_value = "https://www.newegg.com/laptops")]
        url: String,
        /// Comma-separated attribute names
        #[arg(long, default_value = "price, rating")]
        filters: String,
        /// Mirror the saved config through the configured upload endpoint
        #[arg(long)]
        upload: bool,
    },
    /// List saved configs, newest first
    Configs,
    /// Print a saved config (the newest when no key is given)
    Show { key: Option<String> },
    /// List output tables, newest first
    Outputs,
    /// Preview an output table (the newest when no key is given)
    Preview {
        key: Option<String>,
        #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        rows: usize,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::builder()
        .filter_level(level)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = StoreConfig::from_env()?;
    if let Some(dir) = &cli.config_dir {
        config = config.with_config_dir(dir);
    }
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if cli.unique_keys {
        config = config.with_key_scheme(KeyScheme::Unique);
    }
    Ok(config)
}

fn print_preview(key: &str, preview: &OutputPreview) {
    println!("Showing output: {key}");
    println!("{}", preview.headers.join(" | "));
    for row in &preview.rows {
        println!("{}", row.join(" | "));
    }
    if preview.is_truncated() {
        println!("... {} of {} rows shown", preview.rows.len(), preview.total_rows);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = store_config(&cli)?;
    let store = ArtifactStore::open(&config).context("failed to open artifact store")?;

    match cli.command {
        Command::Save {
            prompt,
            url,
            filters,
            upload,
        } => {
            let stored = if upload {
                store
                    .create_config_then_upload(&prompt, &url, &filters, HttpUploader::from_env)
                    .await?
            } else {
                store.create_config(&prompt, &url, &filters).await?
            };
            println!("Config saved as {}", stored.key);
            match stored.remote {
                RemoteOutcome::Skipped => {}
                RemoteOutcome::Uploaded(link) => println!("Uploaded: {link}"),
                RemoteOutcome::Failed(err) => eprintln!("Warning: upload failed: {err}"),
            }
        }
        Command::Configs => {
            for key in store.list_configs().await? {
                println!("{key}");
            }
        }
        Command::Show { key } => {
            let found = match key {
                Some(key) => Some((key.clone(), store.read_config(&key).await?)),
                None => store.latest_config().await?,
            };
            match found {
                Some((key, record)) => {
                    println!("{key}");
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                None => println!("No configs saved yet."),
            }
        }
        Command::Outputs => {
            for key in store.list_outputs().await? {
                println!("{key}");
            }
        }
        Command::Preview { key, rows } => {
            let found = match key {
                Some(key) => Some((key.clone(), store.read_output_preview(&key, rows).await?)),
                None => store.latest_output_preview(rows).await?,
            };
            match found {
                Some((key, preview)) => print_preview(&key, &preview),
                None => println!(
                    "No output files found yet. Run the crawler notebook to generate results."
                ),
            }
        }
    }

    Ok(())
}
