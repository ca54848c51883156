pub mod ema;
pub mod macd;
pub mod pipeline;
pub mod rsi;
pub mod sma;

pub use ema::{ema, Ema, EmaSeeding};
pub use macd::{macd, Macd, MacdValues};
pub use pipeline::{IndicatorSpec, Pipeline};
pub use rsi::{rsi, Rsi};
pub use sma::{sma, Sma};

use quantcol_core::{finite, Column, Table, TableError};

/// Errors raised by misconfigured indicator invocations.
///
/// Per-row numeric problems (absent inputs, degenerate ratios) are never
/// errors; they surface as absent values in the output column.
#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    #[error("{indicator} {parameter} must be a positive integer, got {value}")]
    InvalidPeriod {
        indicator: &'static str,
        parameter: &'static str,
        value: usize,
    },
    #[error("Source column not found: {0}")]
    ColumnNotFound(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// A configured indicator that derives new columns from one source column.
///
/// Implementations are stateless: every call reads the input table and
/// returns a new one, so the same value can be applied to any number of
/// tables.
pub trait Indicator: Send + Sync + std::fmt::Debug {
    /// Short identifier, e.g. `"sma"`.
    fn kind(&self) -> &'static str;

    /// Name of the column the indicator reads.
    fn source(&self) -> &str;

    /// Names of the columns the indicator produces, in output order.
    fn output_columns(&self) -> Vec<String>;

    /// Check the parameters without looking at any data.
    fn check_config(&self) -> Result<(), IndicatorError>;

    /// Compute the output columns from the source column.
    fn compute(&self, source: &Column) -> Vec<Column>;

    /// Check the parameters and resolve the source column in `table`.
    fn validate<'t>(&self, table: &'t Table) -> Result<&'t Column, IndicatorError> {
        self.check_config()?;
        table
            .column(self.source())
            .ok_or_else(|| IndicatorError::ColumnNotFound(self.source().to_string()))
    }

    /// Return `table` extended with this indicator's columns.
    fn apply(&self, table: &Table) -> Result<Table, IndicatorError> {
        let source = self.validate(table)?;
        let columns = self.compute(source);
        for column in &columns {
            tracing::debug!(
                indicator = self.kind(),
                column = %column.name(),
                rows = column.len(),
                defined = column.defined_count(),
                "Computed indicator column"
            );
        }
        Ok(table.with_columns(columns)?)
    }
}

pub(crate) fn check_period(
    indicator: &'static str,
    parameter: &'static str,
    value: usize,
) -> Result<(), IndicatorError> {
    if value == 0 {
        return Err(IndicatorError::InvalidPeriod {
            indicator,
            parameter,
            value,
        });
    }
    Ok(())
}

/// Arithmetic mean of a window; absent if any value in it is absent or
/// non-finite.
pub(crate) fn mean(window: &[Option<f64>]) -> Option<f64> {
    let sum: Option<f64> = window.iter().copied().map(finite).sum();
    sum.map(|s| s / window.len() as f64)
}

#[cfg(test)]
pub(crate) mod test_util {
    use quantcol_core::{Column, Table};

    pub fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got absent"));
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    pub fn close_table(values: &[f64]) -> Table {
        Table::from_columns([Column::from_values("close", values.iter().copied())]).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_requires_every_value() {
        assert_eq!(mean(&[Some(1.0), Some(2.0), Some(3.0)]), Some(2.0));
        assert_eq!(mean(&[Some(1.0), None, Some(3.0)]), None);
        assert_eq!(mean(&[Some(1.0), Some(f64::NAN)]), None);
        assert_eq!(mean(&[Some(f64::INFINITY), Some(1.0)]), None);
    }

    #[test]
    fn test_check_period_rejects_zero() {
        let err = check_period("sma", "period", 0).unwrap_err();
        assert_eq!(err.to_string(), "sma period must be a positive integer, got 0");
        assert!(check_period("sma", "period", 1).is_ok());
    }
}
