use std::{
    fs::{self, File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RecordStore, filter_user};
use crate::{
    ExpenseRecord, StoreError,
    record::{Column, RowLayout, header_row},
};

/// Local CSV file store, one expense per line.
///
/// The header row is written when the file is created (or found empty).
/// Existing files keep their column order; a file without a user column
/// gets one appended to its header before the first write.
/// Writes are serialized inside the process; the file is not safe to share
/// between processes.
#[derive(Clone, Debug)]
pub struct CsvStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for CsvStore {
    async fn append(&self, record: &ExpenseRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        append_row(&self.path, record)
    }

    async fn read_all(&self, user: Option<&str>) -> Result<Vec<ExpenseRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let records = read_rows(&self.path)?;
        Ok(filter_user(records, user))
    }
}

fn append_row(path: &Path, record: &ExpenseRecord) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let layout = match read_header(path)? {
        Some(header) => {
            let layout = RowLayout::from_header(&header)?;
            if layout.has_user() {
                layout
            } else {
                add_user_column(path, &header)?;
                layout.with_user_at(header.len())
            }
        }
        None => {
            // Missing or blank: start over with the default header.
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(header_row())?;
            writer.flush()?;
            RowLayout::default()
        }
    };

    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(layout.arrange(record.to_cells()))?;
    writer.flush()?;
    Ok(())
}

/// First record of the file, or `None` when the file is missing or has no
/// header.
fn read_header(path: &Path) -> Result<Option<Vec<String>>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let Some(first) = reader.records().next().transpose()? else {
        return Ok(None);
    };
    let header: Vec<String> = first.iter().map(str::to_string).collect();
    if header.iter().all(|cell| cell.trim().is_empty()) {
        return Ok(None);
    }
    Ok(Some(header))
}

/// Rewrites the header line of a file written without a user column.
/// Existing rows keep an empty user.
fn add_user_column(path: &Path, header: &[String]) -> Result<(), StoreError> {
    tracing::info!("adding a {} column to {}", Column::User.header(), path.display());

    let raw = fs::read_to_string(path)?;
    let rows = raw.split_once('\n').map_or("", |(_, rows)| rows);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header.iter().map(String::as_str).chain([Column::User.header()]))?;
    let mut contents = writer.into_inner().map_err(|err| err.into_error())?;
    contents.extend_from_slice(rows.as_bytes());

    fs::write(path, contents)?;
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<ExpenseRecord>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.is_empty() {
        return Ok(Vec::new());
    }
    let layout = RowLayout::from_header(&header)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let cells: Vec<&str> = row.iter().collect();
        match layout.parse(&cells) {
            Ok(record) => records.push(record),
            // Line numbers are 1-based and the header is line 1.
            Err(err) => tracing::warn!("skipping line {} of {}: {err}", idx + 2, path.display()),
        }
    }

    Ok(records)
}
