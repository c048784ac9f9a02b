use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::youtube_api_key;
use crate::error::{Error, Result};

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Maximum ids per search page accepted by the API
pub const PAGE_SIZE: usize = 50;

/// One page of a channel's video ids, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Video item from `videos.list`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default, rename = "contentDetails")]
    pub content_details: ContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDetails {
    /// ISO 8601 duration, e.g. "PT4M13S"
    pub duration: Option<String>,
}

impl VideoItem {
    /// Raw view count; absent counts are zero
    pub fn view_count(&self) -> u64 {
        let raw = self.statistics.view_count.as_deref().unwrap_or("0");
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(video_id = %self.id, view_count = raw, "unparseable view count, using 0");
            0
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

/// Read operations used against the video platform
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Display name of a channel
    async fn channel_title(&self, channel_id: &str) -> Result<String>;

    /// Up to one page of video ids, ordered by publish date descending
    async fn search_page(&self, channel_id: &str, page_token: Option<&str>) -> Result<VideoPage>;

    /// Details and statistics for a batch of ids
    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoItem>>;
}

/// YouTube Data API v3 client
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new() -> Result<Self> {
        let api_key = youtube_api_key().ok_or(Error::ApiKeyMissing)?;
        Self::with_key(api_key)
    }

    pub fn with_key(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: YOUTUBE_BASE_URL.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoApi for YouTubeClient {
    async fn channel_title(&self, channel_id: &str) -> Result<String> {
        let response: ChannelListResponse = self
            .get("channels", &[("part", "snippet"), ("id", channel_id)])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.title)
            .ok_or_else(|| Error::NotFound(format!("channel {}", channel_id)))
    }

    async fn search_page(&self, channel_id: &str, page_token: Option<&str>) -> Result<VideoPage> {
        let max_results = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "id,snippet"),
            ("channelId", channel_id),
            ("maxResults", max_results.as_str()),
            ("order", "date"),
            ("type", "video"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: SearchListResponse = self.get("search", &query).await?;
        Ok(response.into_page())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoItem>> {
        let ids = video_ids.join(",");
        let response: VideoListResponse = self
            .get(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", ids.as_str())],
            )
            .await?;
        Ok(response.items)
    }
}

impl SearchListResponse {
    fn into_page(self) -> VideoPage {
        VideoPage {
            video_ids: self.items.into_iter().filter_map(|item| item.id.video_id).collect(),
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}
