//! Google Sheets record store.
//!
//! Expenses live in one sheet of a spreadsheet, one row per expense, with a
//! header row naming the columns. The header is written on first use when
//! the sheet is empty; sheets created by hand may order their columns
//! freely. A header without a user column gets one before the first append.

use async_trait::async_trait;
use engine::{
    ExpenseRecord, RecordStore, StoreError,
    record::{Column, RowLayout, header_row},
    store::filter_user,
};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

pub use auth::{Credentials, ServiceAccountKey};
pub use client::DEFAULT_BASE_URL;
pub use error::SheetsError;

mod auth;
mod client;
mod error;

use client::{SheetsClient, cell_text, header_range, sheet_range};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

pub struct SheetsStore {
    client: SheetsClient,
    sheet_name: String,
    // Resolved from the header row on first use.
    layout: Mutex<Option<RowLayout>>,
}

impl SheetsStore {
    pub fn builder() -> SheetsStoreBuilder {
        SheetsStoreBuilder::default()
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Column layout of the sheet, writing the header row if the sheet is
    /// empty.
    async fn layout(&self) -> Result<RowLayout, StoreError> {
        let mut cached = self.layout.lock().await;
        if let Some(layout) = *cached {
            return Ok(layout);
        }

        let rows = self.client.get_values(&header_range(&self.sheet_name)).await?;
        let header: Vec<String> = rows
            .first()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();

        let layout = if header.iter().all(|cell| cell.trim().is_empty()) {
            tracing::info!("initializing header of sheet {}", self.sheet_name);
            let header = header_row().map(|h| Value::String(h.to_string())).to_vec();
            self.client
                .append_values(&sheet_range(&self.sheet_name), &[header])
                .await?;
            RowLayout::default()
        } else {
            let layout = RowLayout::from_header(&header)?;
            if layout.has_user() {
                layout
            } else {
                let width = header.len();
                self.add_user_column(header).await?;
                layout.with_user_at(width)
            }
        };

        *cached = Some(layout);
        Ok(layout)
    }

    /// Extends a header written without a user column; existing rows keep an
    /// empty user.
    async fn add_user_column(&self, header: Vec<String>) -> Result<(), StoreError> {
        tracing::info!("adding a {} column to sheet {}", Column::User.header(), self.sheet_name);
        let header: Vec<Value> = header
            .into_iter()
            .chain([Column::User.header().to_string()])
            .map(Value::String)
            .collect();
        self.client
            .update_values(&header_range(&self.sheet_name), &[header])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn append(&self, record: &ExpenseRecord) -> Result<(), StoreError> {
        let layout = self.layout().await?;
        let [date, _, category, user] = record.to_cells();
        let row = layout.arrange([
            Value::String(date),
            serde_json::json!(record.amount.value()),
            Value::String(category),
            Value::String(user),
        ]);
        self.client
            .append_values(&sheet_range(&self.sheet_name), &[row])
            .await?;
        Ok(())
    }

    async fn read_all(&self, user: Option<&str>) -> Result<Vec<ExpenseRecord>, StoreError> {
        let rows = self.client.get_values(&sheet_range(&self.sheet_name)).await?;
        let mut rows = rows
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        let layout = RowLayout::from_header(&header)?;
        // A header without a user column is extended on the next append.
        if layout.has_user() {
            *self.layout.lock().await = Some(layout);
        }

        let mut records = Vec::new();
        for (idx, row) in rows.enumerate() {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            match layout.parse(&row) {
                Ok(record) => records.push(record),
                // Data rows start at sheet row 2.
                Err(err) => tracing::warn!(
                    "skipping row {} of sheet {}: {err}",
                    idx + 2,
                    self.sheet_name
                ),
            }
        }
        Ok(filter_user(records, user))
    }
}

#[derive(Debug, Default)]
pub struct SheetsStoreBuilder {
    spreadsheet_id: String,
    sheet_name: Option<String>,
    credentials: Option<Credentials>,
    base_url: Option<String>,
    http: Option<Client>,
}

impl SheetsStoreBuilder {
    pub fn spreadsheet_id(mut self, id: &str) -> SheetsStoreBuilder {
        self.spreadsheet_id = id.trim().to_string();
        self
    }

    pub fn sheet_name(mut self, name: &str) -> SheetsStoreBuilder {
        self.sheet_name = Some(name.to_string());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> SheetsStoreBuilder {
        self.credentials = Some(credentials);
        self
    }

    /// Overrides the Sheets API endpoint.
    pub fn base_url(mut self, url: &str) -> SheetsStoreBuilder {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn http_client(mut self, http: Client) -> SheetsStoreBuilder {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<SheetsStore, SheetsError> {
        if self.spreadsheet_id.is_empty() {
            return Err(SheetsError::Credentials(
                "spreadsheet id is missing".to_string(),
            ));
        }
        let credentials = self
            .credentials
            .ok_or_else(|| SheetsError::Credentials("no credentials configured".to_string()))?;
        let sheet_name = self
            .sheet_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

        tracing::info!(
            "using sheet {sheet_name} of spreadsheet {}",
            self.spreadsheet_id
        );
        let client = SheetsClient::new(
            self.http.unwrap_or_default(),
            self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            self.spreadsheet_id,
            auth::TokenSource::new(credentials),
        );

        Ok(SheetsStore {
            client,
            sheet_name,
            layout: Mutex::new(None),
        })
    }
}
