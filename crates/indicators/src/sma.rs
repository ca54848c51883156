use crate::{check_period, mean, Indicator, IndicatorError};
use quantcol_core::{Column, Table};

/// Rolling mean over the last `period` values.
///
/// Rows before the window fills are absent, as is any row whose window
/// contains an absent value. Each window is summed directly over its slice,
/// so results do not depend on how earlier rows were accumulated.
pub fn sma_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for (i, window) in values.windows(period).enumerate() {
        out[i + period - 1] = mean(window);
    }
    out
}

/// Simple Moving Average (SMA).
#[derive(Debug, Clone, PartialEq)]
pub struct Sma {
    column: String,
    period: usize,
}

impl Sma {
    pub fn new(column: impl Into<String>, period: usize) -> Self {
        Self {
            column: column.into(),
            period,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn output_name(&self) -> String {
        format!("sma_{}", self.period)
    }
}

impl Indicator for Sma {
    fn kind(&self) -> &'static str {
        "sma"
    }

    fn source(&self) -> &str {
        &self.column
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.output_name()]
    }

    fn check_config(&self) -> Result<(), IndicatorError> {
        check_period("sma", "period", self.period)
    }

    fn compute(&self, source: &Column) -> Vec<Column> {
        vec![Column::new(
            self.output_name(),
            sma_values(source.values(), self.period),
        )]
    }
}

/// Append `sma_{period}` computed over `column`.
pub fn sma(table: &Table, column: &str, period: usize) -> Result<Table, IndicatorError> {
    Sma::new(column, period).apply(table)
}
