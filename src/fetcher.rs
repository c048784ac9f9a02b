use clap::ValueEnum;
use tracing::{debug, warn};

use crate::config::Throttle;
use crate::error::{Error, Result};
use crate::retry::{backoff, pause};
use crate::video::VideoRecord;
use crate::youtube::VideoApi;

/// Maximum ids per `videos.list` call
pub const SUB_BATCH_SIZE: usize = 25;

/// What to do with a sub-batch that still fails after all retries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PartialFailurePolicy {
    /// Log a warning, drop the batch and keep going
    #[default]
    Skip,
    /// Stop the run with an error
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub throttle: Throttle,
    pub on_batch_failure: PartialFailurePolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            throttle: Throttle::default(),
            on_batch_failure: PartialFailurePolicy::Skip,
        }
    }
}

/// Everything collected from a channel, in retrieval order
#[derive(Debug, Default)]
pub struct FetchReport {
    pub records: Vec<VideoRecord>,
    /// Listing pages fetched successfully
    pub pages: usize,
    /// Sub-batches given up on
    pub failed_batches: usize,
    /// Ids belonging to dropped sub-batches
    pub dropped_ids: usize,
    /// False when listing stopped on errors before the last page
    pub listing_complete: bool,
}

/// Page through a channel's videos and fetch statistics for each page.
///
/// Listing failures share one retry budget across the loop and end the listing
/// early with whatever was already collected. Statistics failures are retried
/// per sub-batch and then handled according to `options.on_batch_failure`.
/// Quota and authorization rejections (403) are handled the same way: they
/// end listing or drop the sub-batch instead of discarding collected records.
pub async fn collect_channel_videos<A: VideoApi + ?Sized>(
    api: &A,
    channel_id: &str,
    options: &FetchOptions,
) -> Result<FetchReport> {
    let throttle = options.throttle;
    let mut report = FetchReport::default();
    let mut page_token: Option<String> = None;
    let mut retry_count: u32 = 0;
    let mut batch_index: usize = 0;

    loop {
        let page = match api.search_page(channel_id, page_token.as_deref()).await {
            Ok(page) => page,
            Err(e) if e.is_retryable() => {
                retry_count += 1;
                if retry_count >= throttle.max_retries {
                    warn!(error = %e, "max listing retries reached, keeping partial results");
                    return Ok(report);
                }
                warn!(
                    attempt = retry_count,
                    max = throttle.max_retries,
                    error = %e,
                    "listing page failed, retrying"
                );
                pause(backoff(throttle.backoff_unit, retry_count)).await;
                continue;
            }
            Err(e) => {
                warn!(error = %e, "listing page failed, keeping partial results");
                return Ok(report);
            }
        };

        report.pages += 1;
        debug!(page = report.pages, videos = page.video_ids.len(), "fetched listing page");

        if page.video_ids.is_empty() {
            report.listing_complete = true;
            return Ok(report);
        }

        for chunk in page.video_ids.chunks(SUB_BATCH_SIZE) {
            batch_index += 1;
            match fetch_sub_batch(api, chunk, batch_index, &throttle).await {
                Ok(records) => report.records.extend(records),
                Err(e) => match options.on_batch_failure {
                    PartialFailurePolicy::Skip => {
                        warn!(
                            batch = batch_index,
                            videos = chunk.len(),
                            error = %e,
                            "dropping batch after retries"
                        );
                        report.failed_batches += 1;
                        report.dropped_ids += chunk.len();
                    }
                    PartialFailurePolicy::Abort => {
                        return Err(Error::BatchFailed {
                            batch: batch_index,
                            message: e.to_string(),
                        });
                    }
                },
            }
            pause(throttle.delay).await;
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => {
                report.listing_complete = true;
                return Ok(report);
            }
        }

        pause(throttle.delay).await;
        retry_count = 0;
    }
}

/// Fetch statistics for one sub-batch, retrying transient failures with backoff
pub async fn fetch_sub_batch<A: VideoApi + ?Sized>(
    api: &A,
    video_ids: &[String],
    batch_index: usize,
    throttle: &Throttle,
) -> Result<Vec<VideoRecord>> {
    let mut attempt: u32 = 0;

    loop {
        match api.video_details(video_ids).await {
            Ok(items) => {
                debug!(batch = batch_index, requested = video_ids.len(), returned = items.len(), "fetched statistics");
                return Ok(items.iter().map(VideoRecord::from_item).collect());
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(
                    batch = batch_index,
                    attempt = attempt + 1,
                    max = throttle.max_retries,
                    error = %e,
                    "statistics request failed"
                );
                if attempt + 1 >= throttle.max_retries {
                    return Err(e);
                }
                pause(backoff(throttle.backoff_unit, attempt)).await;
                attempt += 1;
            }
        }
    }
}
