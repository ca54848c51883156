use crate::sma::sma_values;
use crate::{check_period, Indicator, IndicatorError};
use quantcol_core::{finite, Column, Table};

/// Split row-to-row changes into gains and losses (both non-negative).
///
/// The first row has no prior observation and counts as no change. A change
/// touching an absent or non-finite value is absent in both outputs.
pub fn gains_and_losses(values: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());

    if let Some(first) = values.first() {
        let zero = finite(*first).map(|_| 0.0);
        gains.push(zero);
        losses.push(zero);
    }
    for pair in values.windows(2) {
        let change = finite(pair[1])
            .zip(finite(pair[0]))
            .map(|(curr, prev)| curr - prev);
        gains.push(change.map(|c| if c > 0.0 { c } else { 0.0 }));
        losses.push(change.map(|c| if c < 0.0 { -c } else { 0.0 }));
    }

    (gains, losses)
}

/// RSI from one pair of average gain and average loss.
///
/// No movement at all (0 / 0) has no defined strength and yields `None`;
/// gains with no losses saturate at 100.
pub fn rsi_from_averages(avg_gain: Option<f64>, avg_loss: Option<f64>) -> Option<f64> {
    let (gain, loss) = avg_gain.zip(avg_loss)?;
    if loss == 0.0 {
        return if gain == 0.0 { None } else { Some(100.0) };
    }
    let rs = gain / loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// RSI series using plain rolling means of gains and losses.
pub fn rsi_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let (gains, losses) = gains_and_losses(values);
    let avg_gain = sma_values(&gains, period);
    let avg_loss = sma_values(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| rsi_from_averages(g, l))
        .collect()
}

/// Relative Strength Index (RSI).
#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    column: String,
    period: usize,
}

impl Rsi {
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
        format!("rsi_{}", self.period)
    }
}

impl Indicator for Rsi {
    fn kind(&self) -> &'static str {
        "rsi"
    }

    fn source(&self) -> &str {
        &self.column
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.output_name()]
    }

    fn check_config(&self) -> Result<(), IndicatorError> {
        check_period("rsi", "period", self.period)
    }

    fn compute(&self, source: &Column) -> Vec<Column> {
        vec![Column::new(
            self.output_name(),
            rsi_values(source.values(), self.period),
        )]
    }
}

/// Append `rsi_{period}` computed over `column`.
pub fn rsi(table: &Table, column: &str, period: usize) -> Result<Table, IndicatorError> {
    Rsi::new(column, period).apply(table)
}
