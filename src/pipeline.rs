use tracing::{Instrument, info, info_span};

use crate::error::Result;
use crate::fetcher::{FetchOptions, FetchReport, collect_channel_videos};
use crate::sheets::{SheetsApi, publish};
use crate::video::{VideoRecord, rank_by_views};
use crate::youtube::VideoApi;

/// Inputs for one channel-to-sheet run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub channel_id: String,
    pub spreadsheet_id: String,
    /// Defaults to the channel's display name
    pub sheet_name: Option<String>,
    pub fetch: FetchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was retrieved; the spreadsheet was left alone
    NoVideos { channel: String },
    Published {
        channel: String,
        sheet: String,
        rows: usize,
        dropped_ids: usize,
        listing_complete: bool,
    },
}

/// Resolve the channel, then fetch and rank its videos
pub async fn collect_ranked<V: VideoApi + ?Sized>(
    videos: &V,
    channel_id: &str,
    options: &FetchOptions,
) -> Result<(String, Vec<VideoRecord>, FetchReport)> {
    let channel = videos.channel_title(channel_id).await?;
    info!(channel = %channel, "resolved channel");

    let mut report = collect_channel_videos(videos, channel_id, options).await?;
    let ranked = rank_by_views(std::mem::take(&mut report.records));
    Ok((channel, ranked, report))
}

/// Resolve, fetch, rank and publish a channel's videos
pub async fn run<V, S>(videos: &V, sheets: &S, config: &RunConfig) -> Result<RunOutcome>
where
    V: VideoApi + ?Sized,
    S: SheetsApi + ?Sized,
{
    let span = info_span!("run", channel_id = %config.channel_id);

    async move {
        let (channel, ranked, report) =
            collect_ranked(videos, &config.channel_id, &config.fetch).await?;

        if ranked.is_empty() {
            info!("no videos retrieved, skipping publish");
            return Ok(RunOutcome::NoVideos { channel });
        }

        let sheet = config.sheet_name.clone().unwrap_or_else(|| channel.clone());
        info!(sheet = %sheet, rows = ranked.len(), "publishing");
        publish(
            sheets,
            &config.spreadsheet_id,
            &sheet,
            &ranked,
            config.fetch.throttle.delay,
        )
        .await?;

        Ok(RunOutcome::Published {
            channel,
            sheet,
            rows: ranked.len(),
            dropped_ids: report.dropped_ids,
            listing_complete: report.listing_complete,
        })
    }
    .instrument(span)
    .await
}
