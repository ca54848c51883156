use chrono::{DateTime, NaiveDateTime, Utc};
use quantcol_core::{finite, Column, Table};
use std::path::Path;

use crate::frame::{Frame, TextColumn};
use crate::DataError;

/// Cell contents treated as an absent value.
const ABSENT_TOKENS: &[&str] = &["", "nan", "null", "none", "na"];

/// Load a CSV file with a header row into a [`Frame`].
///
/// A column is numeric when every non-absent cell parses as a float; all
/// other columns are kept as text. Non-finite numbers (`inf`, `-inf`) load
/// as absent. Rows keep their file order. If a timestamp column
/// (`timestamp`, `date`, `datetime`, `time`) is present, either as text or
/// as Unix seconds, out-of-order rows are reported but never reordered.
pub fn load_frame_from_csv(path: &Path) -> Result<Frame, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::ParseError(format!("Failed to open CSV: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| DataError::ParseError(format!("CSV record error at row {}: {}", row, e)))?;
        for (i, cell) in record.iter().enumerate() {
            cells[i].push(cell.to_string());
        }
    }

    let mut text = Vec::new();
    let mut numeric = Vec::new();
    for (name, values) in headers.iter().zip(cells) {
        match parse_numeric(&values) {
            Some(parsed) => numeric.push(Column::new(name, parsed)),
            None => text.push(TextColumn {
                name: name.to_string(),
                values,
            }),
        }
    }

    if let Some(idx) = find_column(&headers, &["timestamp", "date", "datetime", "time"]) {
        let name = &headers[idx];
        let order = if let Some(column) = text.iter().find(|c| c.name == name) {
            first_out_of_order(column.values.iter().map(|cell| parse_timestamp(cell)))
        } else if let Some(column) = numeric.iter().find(|c| c.name() == name) {
            first_out_of_order(column.values().iter().map(|v| epoch_timestamp(*v)))
        } else {
            Ok(None)
        };
        report_order(name, order);
    }

    let table = Table::from_columns(numeric)?;
    let frame = Frame::new(text, table)?;
    tracing::debug!(
        path = %path.display(),
        rows = frame.num_rows(),
        numeric = frame.table().num_columns(),
        text = frame.text_columns().len(),
        "Loaded CSV"
    );
    Ok(frame)
}

/// Write a [`Frame`] as CSV: text columns first, then numeric columns.
/// Absent values are written as empty cells.
pub fn write_frame_to_csv(frame: &Frame, path: &Path) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(frame.headers())?;

    let numeric: Vec<&Column> = frame.table().columns().collect();
    for row in 0..frame.num_rows() {
        let mut record: Vec<String> = frame
            .text_columns()
            .iter()
            .map(|c| c.values[row].clone())
            .collect();
        record.extend(
            numeric
                .iter()
                .map(|c| c.get(row).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = frame.num_rows(), "Wrote CSV");
    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn is_absent(cell: &str) -> bool {
    ABSENT_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t))
}

/// Parse every cell as a float, or `None` if any present cell is not numeric.
fn parse_numeric(values: &[String]) -> Option<Vec<Option<f64>>> {
    values
        .iter()
        .map(|cell| {
            if is_absent(cell) {
                Some(None)
            } else {
                cell.parse::<f64>().ok().map(|v| finite(Some(v)))
            }
        })
        .collect()
}

/// Row of the first timestamp earlier than the one before it.
fn first_out_of_order(
    timestamps: impl IntoIterator<Item = Result<DateTime<Utc>, DataError>>,
) -> Result<Option<usize>, DataError> {
    let mut prev: Option<DateTime<Utc>> = None;
    for (row, ts) in timestamps.into_iter().enumerate() {
        let ts = ts?;
        if prev.is_some_and(|p| ts < p) {
            return Ok(Some(row));
        }
        prev = Some(ts);
    }
    Ok(None)
}

fn report_order(column: &str, order: Result<Option<usize>, DataError>) {
    match order {
        Ok(None) => {}
        Ok(Some(row)) => {
            tracing::warn!(column, row, "Rows are not in chronological order");
        }
        Err(e) => {
            tracing::warn!(column, error = %e, "Skipping chronological check");
        }
    }
}

/// Numeric timestamp cell as Unix seconds.
fn epoch_timestamp(value: Option<f64>) -> Result<DateTime<Utc>, DataError> {
    value
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .ok_or_else(|| {
            DataError::ParseError(format!("Unable to parse timestamp: '{:?}'", value))
        })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    for (i, header) in headers.iter().enumerate() {
        let h = header.trim().to_lowercase();
        for name in names {
            if h == *name {
                return Some(i);
            }
        }
    }
    None
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DataError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Without a timezone, assume UTC
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y%m%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    // Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!(
        "Unable to parse timestamp: '{}'",
        s
    )))
}
