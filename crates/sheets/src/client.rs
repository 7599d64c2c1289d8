use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{SheetsError, auth::TokenSource};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    // Omitted by the API when the range is empty.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValuesBody<'a> {
    major_dimension: &'static str,
    values: &'a [Vec<Value>],
}

/// Minimal client for the `spreadsheets.values` endpoints.
#[derive(Debug)]
pub(crate) struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    tokens: TokenSource,
}

impl SheetsClient {
    pub(crate) fn new(
        http: Client,
        base_url: String,
        spreadsheet_id: String,
        tokens: TokenSource,
    ) -> Self {
        Self {
            http,
            base_url,
            spreadsheet_id,
            tokens,
        }
    }

    /// `.../spreadsheets/{id}/values/{range}{suffix}` with every segment
    /// percent-encoded.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|err| SheetsError::Url(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Url(self.base_url.clone()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    /// Reads `range` as rows of unformatted cells.
    pub(crate) async fn get_values(&self, range: &str) -> Result<Vec<Vec<Value>>, SheetsError> {
        let token = self.tokens.token(&self.http).await?;
        let resp = self
            .http
            .get(self.values_url(range, "")?)
            .bearer_auth(token)
            .query(&[
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<ValueRange>().await?.values);
        }
        Err(server_error(status, resp).await)
    }

    /// Appends `rows` after the last row of the table found in `range`.
    pub(crate) async fn append_values(
        &self,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<(), SheetsError> {
        let token = self.tokens.token(&self.http).await?;
        let resp = self
            .http
            .post(self.values_url(range, ":append")?)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValuesBody {
                major_dimension: "ROWS",
                values: rows,
            })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(server_error(status, resp).await)
    }

    /// Overwrites the cells of `range` with `rows`.
    pub(crate) async fn update_values(
        &self,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<(), SheetsError> {
        let token = self.tokens.token(&self.http).await?;
        let resp = self
            .http
            .put(self.values_url(range, "")?)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&ValuesBody {
                major_dimension: "ROWS",
                values: rows,
            })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(server_error(status, resp).await)
    }
}

async fn server_error(status: StatusCode, resp: reqwest::Response) -> SheetsError {
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => "server error".to_string(),
    };
    tracing::debug!("sheets request failed with {status}: {message}");
    SheetsError::Server { status, message }
}

/// A1 range covering a whole sheet, quoted so any sheet name works.
pub(crate) fn sheet_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// A1 range of the first row of a sheet.
pub(crate) fn header_range(sheet: &str) -> String {
    format!("{}!1:1", sheet_range(sheet))
}

/// Cell as text, the way the record layout parses it.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
