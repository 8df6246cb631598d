use std::path::PathBuf;

use clap::Parser;
use ddr_rating_scraping::{
    api::WikiClient,
    batch::{is_chart_file, run},
    config::{Config, SearchCredentials, DEFAULT_CREDENTIALS_PATH},
    difficulty::RatingMode,
    lookup::{ManualRatings, WikiLookup},
    search::CustomSearch,
};
use log::{info, warn};

/// Updates the difficulty ratings of DDR chart files from RemyWiki.
#[derive(Parser)]
struct Opts {
    /// Chart file (.sm / .dwi) or a directory to search for them
    #[arg(short, long)]
    file: PathBuf,
    /// Ratings to write instead of looking them up, e.g. `3,6,9,12,4,7,10,13`
    ///
    /// Eight values leave the single beginner chart untouched; nine include it.
    /// Only used when `--file` is a single chart.
    #[arg(short, long)]
    difficultylist: Option<ManualRatings>,
    #[arg(short, long, value_enum, ignore_case = true, default_value_t)]
    mode: RatingMode,
    /// TOML file overriding the wiki URL, retry and search settings
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::parse();
    let config = Config::load(opts.config.as_deref())?;
    let single = is_chart_file(&opts.file);

    let summary = match opts.difficultylist {
        Some(manual) if single => {
            info!("Using manual ratings {manual}");
            run(&opts.file, &manual).await?
        }
        manual => {
            if manual.is_some() {
                warn!("--difficultylist only applies to a single chart file, ignoring it");
            }
            let client = WikiClient::new(config.retry)?;
            let search = SearchCredentials::load_if_exists(&opts.credentials_path)?
                .map(|credentials| CustomSearch::new(client.reqwest().clone(), credentials));
            let lookup = WikiLookup::new(client, search, &config, opts.mode)?;
            info!("Looking up ratings in {} mode", opts.mode);
            run(&opts.file, &lookup).await?
        }
    };

    if !single {
        summary.print();
    }
    Ok(())
}
