//! Expense records and their tabular layout.
//!
//! A record store keeps one row per expense with the columns
//! `Date, Amount, Category, User`. Sheets written by older deployments use
//! Indonesian headers and may lack the user column; [`RowLayout`] resolves
//! both shapes from the header row.
use chrono::NaiveDate;

use crate::{Amount, Category, StoreError};

/// Date format used in every row.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One expense as stored in a record store.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub amount: Amount,
    pub category: Category,
    pub user: String,
}

impl ExpenseRecord {
    pub fn new(date: NaiveDate, amount: Amount, category: Category, user: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            category,
            user: user.into(),
        }
    }

    /// Cells in [`Column::ALL`] order.
    pub fn to_cells(&self) -> [String; 4] {
        [
            self.date.format(DATE_FORMAT).to_string(),
            self.amount.to_string(),
            self.category.to_string(),
            self.user.clone(),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Date,
    Amount,
    Category,
    User,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Date, Column::Amount, Column::Category, Column::User];

    /// Header written when a store is initialized.
    pub const fn header(self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Amount => "Amount",
            Column::Category => "Category",
            Column::User => "User",
        }
    }

    /// Resolves a header cell, accepting the legacy Indonesian names.
    pub fn from_header(name: &str) -> Option<Column> {
        match name.trim().to_ascii_lowercase().as_str() {
            "date" | "tanggal" => Some(Column::Date),
            "amount" | "jumlah" => Some(Column::Amount),
            "category" | "keterangan" | "jenis" => Some(Column::Category),
            "user" | "username" => Some(Column::User),
            _ => None,
        }
    }
}

/// Header row written by the stores.
pub fn header_row() -> [&'static str; 4] {
    Column::ALL.map(Column::header)
}

/// Column positions resolved from a header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLayout {
    date: usize,
    amount: usize,
    category: Option<usize>,
    user: Option<usize>,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            date: 0,
            amount: 1,
            category: Some(2),
            user: Some(3),
        }
    }
}

impl RowLayout {
    /// Reads the header row. `Date` and `Amount` are mandatory.
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self, StoreError> {
        let position = |column: Column| {
            header
                .iter()
                .position(|cell| Column::from_header(cell.as_ref()) == Some(column))
        };

        let date = position(Column::Date)
            .ok_or_else(|| StoreError::Malformed("missing Date column".to_string()))?;
        let amount = position(Column::Amount)
            .ok_or_else(|| StoreError::Malformed("missing Amount column".to_string()))?;

        Ok(Self {
            date,
            amount,
            category: position(Column::Category),
            user: position(Column::User),
        })
    }

    pub fn has_user(&self) -> bool {
        self.user.is_some()
    }

    /// The same layout with the user column at `idx`.
    pub fn with_user_at(self, idx: usize) -> Self {
        Self {
            user: Some(idx),
            ..self
        }
    }

    /// Places `cells`, given in [`Column::ALL`] order, at their positions in
    /// this layout. Columns the layout lacks are dropped and gaps are filled
    /// with `T::default()`.
    pub fn arrange<T: Default>(&self, cells: [T; 4]) -> Vec<T> {
        let positions = [Some(self.date), Some(self.amount), self.category, self.user];
        let width = positions.iter().flatten().max().map_or(0, |max| max + 1);

        let mut row: Vec<T> = std::iter::repeat_with(T::default).take(width).collect();
        for (position, cell) in positions.into_iter().zip(cells) {
            if let Some(idx) = position {
                row[idx] = cell;
            }
        }
        row
    }

    /// Converts a data row into a typed record.
    ///
    /// Rows without a user column yield an empty user; they never match a
    /// per-user filter.
    pub fn parse<S: AsRef<str>>(&self, cells: &[S]) -> Result<ExpenseRecord, StoreError> {
        let cell = |idx: usize| cells.get(idx).map(|c| c.as_ref().trim()).unwrap_or("");

        let raw_date = cell(self.date);
        let date = parse_date(raw_date)
            .ok_or_else(|| StoreError::Malformed(format!("invalid date {raw_date:?}")))?;

        let raw_amount = cell(self.amount);
        let amount = raw_amount
            .parse::<Amount>()
            .map_err(|_| StoreError::Malformed(format!("invalid amount {raw_amount:?}")))?;

        let category = self
            .category
            .map(|idx| Category::new(cell(idx)))
            .unwrap_or_default();
        let user = self.user.map(cell).unwrap_or("").to_string();

        Ok(ExpenseRecord::new(date, amount, category, user))
    }
}

// Spreadsheets sometimes render dates with a time part ("2025-01-31 00:00:00").
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cells_follow_header_order() {
        let record = ExpenseRecord::new(
            date(2025, 3, 9),
            Amount::new(25000.0).unwrap(),
            Category::new("Lunch"),
            "alice",
        );
        assert_eq!(record.to_cells(), ["2025-03-09", "25000", "Lunch", "alice"]);
        assert_eq!(header_row(), ["Date", "Amount", "Category", "User"]);
    }

    #[test]
    fn layout_from_reordered_header() {
        let layout = RowLayout::from_header(&["User", "amount", "Date", "Category"]).unwrap();
        let record = layout.parse(&["bob", "1500", "2025-03-09", "Dinner"]).unwrap();
        assert_eq!(record.user, "bob");
        assert_eq!(record.amount.value(), 1500.0);
        assert_eq!(record.date, date(2025, 3, 9));
        assert_eq!(record.category.as_str(), "Dinner");
    }

    #[test]
    fn legacy_header_without_user() {
        let layout = RowLayout::from_header(&["Tanggal", "Jumlah", "Keterangan"]).unwrap();
        let record = layout
            .parse(&["2024-12-01 00:00:00", "15000", "Makan Siang"])
            .unwrap();
        assert_eq!(record.date, date(2024, 12, 1));
        assert_eq!(record.category.as_str(), "Makan Siang");
        assert!(record.user.is_empty());
    }

    #[test]
    fn arrange_follows_layout() {
        let layout = RowLayout::from_header(&["User", "", "Amount", "Date"]).unwrap();
        let row = layout.arrange(["d", "a", "c", "u"].map(String::from));
        assert_eq!(row, vec!["u", "", "a", "d"]);

        assert_eq!(RowLayout::default().arrange([1, 2, 3, 4]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn user_column_can_be_added() {
        let layout = RowLayout::from_header(&["Tanggal", "Jumlah", "Keterangan"]).unwrap();
        assert!(!layout.has_user());

        let layout = layout.with_user_at(3);
        assert!(layout.has_user());
        assert_eq!(layout, RowLayout::default());
    }

    #[test]
    fn header_without_amount_is_rejected() {
        let err = RowLayout::from_header(&["Date", "Category"]).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn malformed_rows_are_errors() {
        let layout = RowLayout::default();
        assert!(layout.parse(&["yesterday", "100", "Lunch", "a"]).is_err());
        assert!(layout.parse(&["2025-01-01", "-5", "Lunch", "a"]).is_err());
        assert!(layout.parse(&["2025-01-01"]).is_err());
    }

    #[test]
    fn missing_category_cell_uses_fallback() {
        let layout = RowLayout::default();
        let record = layout.parse(&["2025-01-01", "100", "", "a"]).unwrap();
        assert_eq!(record.category, Category::fallback());
    }
}
