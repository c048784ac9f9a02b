use serde::Serialize;

use crate::youtube::VideoItem;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Header row written at the top of every published sheet
pub const SHEET_HEADER: [&str; 4] = ["Title", "Video Link", "View Count", "Round Off View Count"];

/// A video with its view statistics, ready for ranking and publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub title: String,
    pub url: String,
    pub raw_view_count: u64,
    pub human_view_count: String,
}

impl VideoRecord {
    pub fn new(id: &str, title: impl Into<String>, raw_view_count: u64) -> Self {
        Self {
            title: title.into(),
            url: watch_url(id),
            raw_view_count,
            human_view_count: format_view_count(raw_view_count),
        }
    }

    pub fn from_item(item: &VideoItem) -> Self {
        let views = item.view_count();
        Self::new(&item.id, item.snippet.title.clone(), views)
    }

    /// Sheet row: title, link, raw count, rounded count
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.url.clone(),
            self.raw_view_count.to_string(),
            self.human_view_count.clone(),
        ]
    }
}

pub fn watch_url(id: &str) -> String {
    format!("{}{}", WATCH_URL_PREFIX, id)
}

/// Format a view count as "1.2M", "3.4K" or the plain integer below 1000
pub fn format_view_count(views: u64) -> String {
    if views >= 1_000_000 {
        format!("{:.1}M", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K", views as f64 / 1_000.0)
    } else {
        views.to_string()
    }
}

/// Sort by raw view count, highest first. Ties keep retrieval order.
pub fn rank_by_views(mut records: Vec<VideoRecord>) -> Vec<VideoRecord> {
    records.sort_by(|a, b| b.raw_view_count.cmp(&a.raw_view_count));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_millions() {
        assert_eq!(format_view_count(1_234_567), "1.2M");
        assert_eq!(format_view_count(1_000_000), "1.0M");
        assert_eq!(format_view_count(250_000_000), "250.0M");
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_view_count(2_500), "2.5K");
        assert_eq!(format_view_count(1_000), "1.0K");
        assert_eq!(format_view_count(999_999), "1000.0K");
    }

    #[test]
    fn formats_small_counts_as_plain_integers() {
        assert_eq!(format_view_count(7), "7");
        assert_eq!(format_view_count(0), "0");
        assert_eq!(format_view_count(999), "999");
    }

    #[test]
    fn builds_watch_url_and_row() {
        let record = VideoRecord::new("abc123", "Hello", 4_321);
        assert_eq!(record.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(
            record.to_row(),
            vec!["Hello", "https://www.youtube.com/watch?v=abc123", "4321", "4.3K"]
        );
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let records = vec![
            VideoRecord::new("a", "first tie", 10),
            VideoRecord::new("b", "big", 500),
            VideoRecord::new("c", "second tie", 10),
            VideoRecord::new("d", "small", 1),
        ];

        let ranked = rank_by_views(records);
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["big", "first tie", "second tie", "small"]);
    }

    #[test]
    fn ranking_sorted_input_is_a_no_op() {
        let ranked = rank_by_views(vec![
            VideoRecord::new("x", "x", 3),
            VideoRecord::new("y", "y", 1),
            VideoRecord::new("z", "z", 2),
            VideoRecord::new("w", "w", 2),
        ]);
        assert_eq!(rank_by_views(ranked.clone()), ranked);
    }

    #[test]
    fn ranking_empty_input() {
        assert!(rank_by_views(Vec::new()).is_empty());
    }
}
