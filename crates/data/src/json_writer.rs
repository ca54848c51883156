use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::frame::Frame;
use crate::DataError;

/// Convert a frame into one JSON object per row. Absent and non-finite
/// values become `null`.
pub fn frame_to_json(frame: &Frame) -> Value {
    let rows = (0..frame.num_rows())
        .map(|row| {
            let mut object = Map::new();
            for column in frame.text_columns() {
                object.insert(column.name.clone(), Value::String(column.values[row].clone()));
            }
            for column in frame.table().columns() {
                let value = column
                    .get(row)
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null);
                object.insert(column.name().to_string(), value);
            }
            Value::Object(object)
        })
        .collect();
    Value::Array(rows)
}

/// Write a frame as a pretty-printed JSON array of row objects.
pub fn write_frame_to_json(frame: &Frame, path: &Path) -> Result<(), DataError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &frame_to_json(frame))?;
    tracing::debug!(path = %path.display(), rows = frame.num_rows(), "Wrote JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::TextColumn;
    use quantcol_core::{Column, Table};
    use serde_json::json;

    #[test]
    fn test_frame_to_json_rows() {
        let table = Table::from_columns([
            Column::from_values("close", [10.0, 11.0]),
            Column::new("sma_2", vec![None, Some(10.5)]),
        ])
        .unwrap();
        let text = vec![TextColumn {
            name: "symbol".to_string(),
            values: vec!["BTC".to_string(), "BTC".to_string()],
        }];
        let frame = Frame::new(text, table).unwrap();

        assert_eq!(
            frame_to_json(&frame),
            json!([
                { "symbol": "BTC", "close": 10.0, "sma_2": null },
                { "symbol": "BTC", "close": 11.0, "sma_2": 10.5 },
            ])
        );
    }
}
