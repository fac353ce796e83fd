use crate::errors::LoadError;
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;
use tracing::debug;

/// An untyped grid read from delimited text: one header row followed by rows whose first cell is
/// the row label.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTable {
    /// Column labels, excluding the label column.
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    pub label: String,
    /// One cell per header column, padded with empty cells for short rows.
    pub cells: Vec<String>,
}

impl RawTable {
    /// Reads the grid, discarding the first `skip_rows` records as metadata. The record directly
    /// after those is taken to be the header.
    pub fn from_reader(source: impl Read, skip_rows: usize) -> Result<Self, LoadError> {
        let mut reader = CsvReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(source);

        let mut records = reader.records().skip(skip_rows);

        let header_record = records
            .next()
            .ok_or(LoadError::MissingHeaderRow { skipped: skip_rows })??;
        let header: Vec<String> = header_record.iter().skip(1).map(clean_label).collect();
        let width = header.len();

        let mut rows = vec![];
        for record in records {
            let record = record?;
            let label = record.get(0).map(clean_label).unwrap_or_default();
            let mut cells: Vec<String> = record.iter().skip(1).map(str::to_owned).collect();
            if cells.len() != width {
                debug!(
                    label = %label,
                    found = cells.len(),
                    expected = width,
                    "row width differs from header"
                );
            }
            cells.resize(width, String::new());
            rows.push(RawRow { label, cells });
        }

        debug!(columns = width, rows = rows.len(), "read raw table");

        Ok(Self { header, rows })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.label == label)
    }
}

impl RawRow {
    pub fn values(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(|cell| parse_cell(cell)).collect()
    }
}

/// Trim whitespace and strip one pair of outer quotes if present.
pub fn clean_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Reads a numeric cell. Thousands separators are allowed; anything that still isn't a number
/// (blank, "ND", "-", footnote text) is a missing value.
pub fn parse_cell(raw: &str) -> Option<f64> {
    let cleaned = clean_label(raw).replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Reads a column label as a year, accepting integral decimals such as "2006.0".
pub fn parse_year_label(raw: &str) -> Option<i32> {
    let cleaned = clean_label(raw);
    if let Ok(year) = cleaned.parse::<i32>() {
        return Some(year);
    }
    let value = cleaned.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64)
        .then_some(value as i32)
}
