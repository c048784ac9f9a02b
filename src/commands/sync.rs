use super::partial_data_warnings;
use crate::config::require;
use crate::error::Result;
use crate::fetcher::FetchOptions;
use crate::pipeline::{self, RunConfig, RunOutcome};
use crate::sheets::SheetsClient;
use crate::youtube::YouTubeClient;

pub async fn run(
    channel: Option<String>,
    spreadsheet: Option<String>,
    sheet_name: Option<String>,
    fetch: FetchOptions,
) -> Result<()> {
    let config = RunConfig {
        channel_id: require(channel, "Channel ID", "CHANNEL_ID")?,
        spreadsheet_id: require(spreadsheet, "Spreadsheet ID", "SPREADSHEET_ID")?,
        sheet_name,
        fetch,
    };

    let youtube = YouTubeClient::new()?;
    let sheets = SheetsClient::new().await?;

    eprintln!("Fetching videos for channel {}...", config.channel_id);
    let outcome = pipeline::run(&youtube, &sheets, &config).await?;

    match outcome {
        RunOutcome::NoVideos { channel } => {
            println!("No videos found for {} (or API limit reached).", channel);
        }
        RunOutcome::Published {
            channel,
            sheet,
            rows,
            dropped_ids,
            listing_complete,
        } => {
            println!("Uploaded {} video(s) from {} to sheet '{}'.", rows, channel, sheet);
            for warning in partial_data_warnings(dropped_ids, listing_complete) {
                println!("{}", warning);
            }
        }
    }

    Ok(())
}
