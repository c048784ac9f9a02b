use super::partial_data_warnings;
use crate::config::require;
use crate::error::Result;
use crate::fetcher::FetchOptions;
use crate::pipeline::collect_ranked;
use crate::video::VideoRecord;
use crate::youtube::YouTubeClient;

pub async fn run(channel: Option<String>, limit: usize, json: bool, fetch: FetchOptions) -> Result<()> {
    let channel_id = require(channel, "Channel ID", "CHANNEL_ID")?;
    let youtube = YouTubeClient::new()?;

    eprintln!("Fetching videos from channel...");
    let (channel_name, ranked, report) = collect_ranked(&youtube, &channel_id, &fetch).await?;

    if json {
        let top: Vec<&VideoRecord> = ranked.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&top)?);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No videos found for channel: {}", channel_name);
        return Ok(());
    }

    println!("{}: {} video(s), most viewed first:\n", channel_name, ranked.len());

    for (i, video) in ranked.iter().take(limit).enumerate() {
        print_video_entry(i + 1, video);
    }

    for warning in partial_data_warnings(report.dropped_ids, report.listing_complete) {
        eprintln!("{}", warning);
    }

    println!("To publish the full list, run:");
    println!("  yt-rank-sheet sync --channel {}", channel_id);

    Ok(())
}

fn print_video_entry(index: usize, video: &VideoRecord) {
    println!("{}. {}", index, video.title);
    println!("   {} views", video.human_view_count);
    println!("   {}", video.url);
    println!();
}
