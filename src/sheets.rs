use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use yup_oauth2::ServiceAccountAuthenticator;

use crate::config::{SheetsCredential, sheets_credential};
use crate::error::{Error, Result};
use crate::retry::pause;
use crate::video::{SHEET_HEADER, VideoRecord};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Rows per append request
pub const ROW_BATCH_SIZE: usize = 50;
/// Size of a freshly created sheet
pub const NEW_SHEET_ROWS: u32 = 1000;
pub const NEW_SHEET_COLS: u32 = 20;

/// Spreadsheet operations the publisher relies on
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Titles of every sheet in the spreadsheet; fails if the spreadsheet is inaccessible
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>>;

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str, rows: u32, cols: u32) -> Result<()>;

    /// Remove all values from a sheet
    async fn clear(&self, spreadsheet_id: &str, title: &str) -> Result<()>;

    /// Append rows after the last non-empty row of a sheet
    async fn append_rows(&self, spreadsheet_id: &str, title: &str, rows: &[Vec<String>]) -> Result<()>;
}

/// Replace the content of `sheet_name` with a header row and the ranked records.
///
/// The sheet is created when missing and cleared when present, so publishing
/// the same records twice leaves the same content behind.
pub async fn publish<S: SheetsApi + ?Sized>(
    api: &S,
    spreadsheet_id: &str,
    sheet_name: &str,
    records: &[VideoRecord],
    delay: Duration,
) -> Result<()> {
    let titles = api.sheet_titles(spreadsheet_id).await?;

    if !titles.iter().any(|t| t == sheet_name) {
        info!(sheet = sheet_name, "sheet not found, creating it");
        api.add_sheet(spreadsheet_id, sheet_name, NEW_SHEET_ROWS, NEW_SHEET_COLS)
            .await?;
    }

    api.clear(spreadsheet_id, sheet_name).await?;

    let header: Vec<String> = SHEET_HEADER.iter().map(|h| h.to_string()).collect();
    api.append_rows(spreadsheet_id, sheet_name, &[header]).await?;

    for (i, batch) in records.chunks(ROW_BATCH_SIZE).enumerate() {
        let rows: Vec<Vec<String>> = batch.iter().map(VideoRecord::to_row).collect();
        api.append_rows(spreadsheet_id, sheet_name, &rows).await?;
        debug!(batch = i + 1, rows = rows.len(), "appended rows");
        pause(delay).await;
    }

    Ok(())
}

/// Quote a sheet title for use as an A1 range, e.g. `'Bob''s Videos'`
pub fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Serialize)]
struct ValueRange<'a> {
    values: &'a [Vec<String>],
}

type TokenFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// Yields the bearer token for each request. Service-account tokens are
/// cached and refreshed by the authenticator.
type TokenSource = Arc<dyn Fn() -> TokenFuture + Send + Sync>;

/// Google Sheets API v4 client
pub struct SheetsClient {
    client: Client,
    tokens: TokenSource,
}

impl SheetsClient {
    /// Build a client from the credential configured in the environment
    pub async fn new() -> Result<Self> {
        Self::from_credential(sheets_credential()?).await
    }

    pub async fn from_credential(credential: SheetsCredential) -> Result<Self> {
        let key = match credential {
            SheetsCredential::AccessToken(token) => return Self::with_token(token),
            SheetsCredential::ServiceAccountJson(json) => yup_oauth2::parse_service_account_key(json)
                .map_err(|e| Error::Config(format!("invalid service account key: {}", e)))?,
            SheetsCredential::ServiceAccountFile(path) => {
                yup_oauth2::read_service_account_key(&path).await.map_err(|e| {
                    Error::Config(format!("cannot read service account key {}: {}", path.display(), e))
                })?
            }
        };

        let auth = Arc::new(ServiceAccountAuthenticator::builder(key).build().await?);
        let tokens: TokenSource = Arc::new(move || -> TokenFuture {
            let auth = Arc::clone(&auth);
            Box::pin(async move {
                let token = auth.token(&[SHEETS_SCOPE]).await?;
                token.token().map(str::to_string).ok_or_else(|| {
                    Error::Authorization("service account returned no access token".to_string())
                })
            })
        });

        Self::with_token_source(tokens)
    }

    /// Use a pre-resolved bearer token as is
    pub fn with_token(access_token: String) -> Result<Self> {
        let token: Arc<str> = Arc::from(access_token);
        Self::with_token_source(Arc::new(move || -> TokenFuture {
            let token = Arc::clone(&token);
            Box::pin(async move { Ok(token.to_string()) })
        }))
    }

    fn with_token_source(tokens: TokenSource) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, tokens })
    }

    /// `<base>/<spreadsheet>/<segments...>` with each segment percent-encoded
    fn url(&self, spreadsheet_id: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_BASE_URL)
            .map_err(|e| Error::Config(format!("invalid Sheets URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Sheets URL cannot be a base".to_string()))?
            .push(spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = (self.tokens)().await?;
        let response = request.bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, text));
        }

        Ok(response)
    }
}

#[async_trait]
impl SheetsApi for SheetsClient {
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let url = self.url(spreadsheet_id, &[])?;
        let response = self
            .send(self.client.get(url).query(&[("fields", "sheets.properties.title")]))
            .await?;

        let spreadsheet: SpreadsheetResponse = response.json().await?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str, rows: u32, cols: u32) -> Result<()> {
        let mut url = self.url(spreadsheet_id, &[])?;
        // batchUpdate is a custom method on the spreadsheet resource
        let path = format!("{}:batchUpdate", url.path());
        url.set_path(&path);

        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn clear(&self, spreadsheet_id: &str, title: &str) -> Result<()> {
        let range = format!("{}:clear", sheet_range(title));
        let url = self.url(spreadsheet_id, &["values", &range])?;

        self.send(self.client.post(url).json(&json!({}))).await?;
        Ok(())
    }

    async fn append_rows(&self, spreadsheet_id: &str, title: &str, rows: &[Vec<String>]) -> Result<()> {
        let range = format!("{}:append", sheet_range(title));
        let url = self.url(spreadsheet_id, &["values", &range])?;

        let request = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&ValueRange { values: rows });

        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory spreadsheet keyed by sheet title
    #[derive(Default)]
    struct FakeSheets {
        accessible: bool,
        sheets: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
        append_calls: Mutex<usize>,
    }

    impl FakeSheets {
        fn accessible() -> Self {
            Self {
                accessible: true,
                ..Default::default()
            }
        }

        fn rows(&self, title: &str) -> Vec<Vec<String>> {
            self.sheets.lock().unwrap().get(title).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl SheetsApi for FakeSheets {
        async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
            if !self.accessible {
                return Err(Error::NotFound(format!("spreadsheet {}", spreadsheet_id)));
            }
            Ok(self.sheets.lock().unwrap().keys().cloned().collect())
        }

        async fn add_sheet(&self, _id: &str, title: &str, rows: u32, cols: u32) -> Result<()> {
            assert_eq!((rows, cols), (NEW_SHEET_ROWS, NEW_SHEET_COLS));
            self.sheets.lock().unwrap().insert(title.to_string(), Vec::new());
            Ok(())
        }

        async fn clear(&self, _id: &str, title: &str) -> Result<()> {
            let mut sheets = self.sheets.lock().unwrap();
            let sheet = sheets
                .get_mut(title)
                .ok_or_else(|| Error::NotFound(title.to_string()))?;
            sheet.clear();
            Ok(())
        }

        async fn append_rows(&self, _id: &str, title: &str, rows: &[Vec<String>]) -> Result<()> {
            *self.append_calls.lock().unwrap() += 1;
            let mut sheets = self.sheets.lock().unwrap();
            let sheet = sheets
                .get_mut(title)
                .ok_or_else(|| Error::NotFound(title.to_string()))?;
            sheet.extend(rows.iter().cloned());
            Ok(())
        }
    }

    fn records(n: u64) -> Vec<VideoRecord> {
        (0..n)
            .map(|i| VideoRecord::new(&format!("id{}", i), format!("Video {}", i), 1000 - i))
            .collect()
    }

    #[tokio::test]
    async fn creates_missing_sheet_and_writes_header_then_rows() {
        let sheets = FakeSheets::accessible();
        let data = records(120);

        publish(&sheets, "sheet-id", "My Channel", &data, Duration::ZERO)
            .await
            .unwrap();

        let rows = sheets.rows("My Channel");
        assert_eq!(rows.len(), 121);
        assert_eq!(rows[0], SHEET_HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1], data[0].to_row());
        assert_eq!(rows[120], data[119].to_row());
        // header + 50 + 50 + 20
        assert_eq!(*sheets.append_calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn publishing_twice_replaces_instead_of_accumulating() {
        let sheets = FakeSheets::accessible();
        sheets
            .sheets
            .lock()
            .unwrap()
            .insert("Chan".to_string(), vec![vec!["stale".to_string()]]);
        let data = records(3);

        publish(&sheets, "id", "Chan", &data, Duration::ZERO).await.unwrap();
        let first = sheets.rows("Chan");
        publish(&sheets, "id", "Chan", &data, Duration::ZERO).await.unwrap();
        let second = sheets.rows("Chan");

        assert_eq!(first, second);
        assert_eq!(second.len(), 4);
        assert!(second.iter().all(|row| row[0] != "stale"));
    }

    #[tokio::test]
    async fn empty_records_leave_only_header() {
        let sheets = FakeSheets::accessible();
        publish(&sheets, "id", "Empty", &[], Duration::ZERO).await.unwrap();
        assert_eq!(sheets.rows("Empty").len(), 1);
    }

    #[tokio::test]
    async fn inaccessible_spreadsheet_is_fatal() {
        let sheets = FakeSheets::default();
        let err = publish(&sheets, "missing", "Chan", &records(1), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(sheets.rows("Chan").is_empty());
    }

    #[test]
    fn quotes_sheet_titles_for_ranges() {
        assert_eq!(sheet_range("Channel"), "'Channel'");
        assert_eq!(sheet_range("Bob's Videos"), "'Bob''s Videos'");
    }

    #[tokio::test]
    async fn access_token_credential_is_sent_verbatim() {
        let client = SheetsClient::from_credential(SheetsCredential::AccessToken("ya29.abc".to_string()))
            .await
            .unwrap();
        assert_eq!((client.tokens)().await.unwrap(), "ya29.abc");
    }

    #[tokio::test]
    async fn malformed_service_account_json_is_a_config_error() {
        let result =
            SheetsClient::from_credential(SheetsCredential::ServiceAccountJson("not json".to_string())).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn missing_service_account_file_is_a_config_error() {
        let result = SheetsClient::from_credential(SheetsCredential::ServiceAccountFile(
            "/nonexistent/yt-rank-sheet/sa.json".into(),
        ))
        .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn encodes_range_segments_in_urls() {
        let client = SheetsClient::with_token("token".to_string()).unwrap();
        let range = format!("{}:append", sheet_range("My Sheet"));
        let url = client.url("abc", &["values", &range]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'My%20Sheet':append"
        );
    }
}
