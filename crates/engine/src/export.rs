//! CSV export of a user's records.
use csv::Writer;

use crate::{ExpenseRecord, StoreError, record::header_row};

/// File name used when the export is sent as a document.
pub const EXPORT_FILE_NAME: &str = "expenses.csv";

/// Serializes `records` with a header row, in the order given.
pub fn to_csv(records: &[ExpenseRecord]) -> Result<Vec<u8>, StoreError> {
    let mut writer = Writer::from_writer(vec![]);
    writer.write_record(header_row())?;
    for record in records {
        writer.write_record(record.to_cells())?;
    }
    writer
        .into_inner()
        .map_err(|err| StoreError::Io(err.into_error()))
}
