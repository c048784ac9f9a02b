use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yt_rank_sheet::commands;
use yt_rank_sheet::config::{DEFAULT_DELAY_SECS, DEFAULT_MAX_RETRIES, Throttle, load_env};
use yt_rank_sheet::fetcher::{FetchOptions, PartialFailurePolicy};

#[derive(Parser)]
#[command(name = "yt-rank-sheet")]
#[command(about = "Rank a YouTube channel's videos by views and publish them to Google Sheets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Tuning {
    /// Seconds to wait between API calls
    #[arg(long, env = "RATE_LIMIT_DELAY_SECS", default_value_t = DEFAULT_DELAY_SECS)]
    delay_secs: u64,

    /// Attempts per listing loop and per statistics batch
    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// What to do with a statistics batch that keeps failing
    #[arg(long, value_enum, default_value_t = PartialFailurePolicy::Skip)]
    on_batch_failure: PartialFailurePolicy,
}

impl Tuning {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            throttle: Throttle::new(self.delay_secs, self.max_retries),
            on_batch_failure: self.on_batch_failure,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a channel's videos and publish them ranked by views
    Sync {
        /// Channel ID (e.g., UCX6OQ3DkcsbYNE6H8uQQuVA)
        #[arg(short, long, env = "CHANNEL_ID")]
        channel: Option<String>,

        /// Target spreadsheet ID
        #[arg(short, long, env = "SPREADSHEET_ID")]
        spreadsheet: Option<String>,

        /// Sheet (tab) name; defaults to the channel name
        #[arg(long)]
        sheet_name: Option<String>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Print a channel's most viewed videos without publishing
    Preview {
        /// Channel ID
        #[arg(short, long, env = "CHANNEL_ID")]
        channel: Option<String>,

        /// Maximum number of videos to show (default: 20)
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Save API key and default IDs to the config file
    Init {
        /// YouTube Data API key
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Default spreadsheet ID
        #[arg(short, long)]
        spreadsheet: Option<String>,

        /// Default channel ID
        #[arg(short, long)]
        channel: Option<String>,

        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("yt_rank_sheet=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads its env fallbacks
    load_env();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            channel,
            spreadsheet,
            sheet_name,
            tuning,
        } => commands::sync::run(channel, spreadsheet, sheet_name, tuning.fetch_options()).await,
        Commands::Preview {
            channel,
            limit,
            json,
            tuning,
        } => commands::preview::run(channel, limit, json, tuning.fetch_options()).await,
        Commands::Init {
            api_key,
            spreadsheet,
            channel,
            force,
        } => commands::init::run(api_key, spreadsheet, channel, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
