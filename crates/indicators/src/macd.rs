use crate::ema::{ema_values, EmaSeeding};
use crate::{check_period, Indicator, IndicatorError};
use quantcol_core::{Column, Table};

/// The three MACD series, each aligned to the source rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdValues {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

fn difference(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.zip(*y).map(|(x, y)| x - y))
        .collect()
}

/// Compute the MACD line, signal line and histogram.
///
/// Fast and slow EMAs are SMA-seeded over the source, so the MACD line
/// starts at row `max(fast, slow) - 1`. The signal line is an SMA-seeded EMA
/// of the MACD line whose seed window covers the first `signal` defined MACD
/// values, not the first `signal` rows of the table.
pub fn macd_values(values: &[Option<f64>], fast: usize, slow: usize, signal: usize) -> MacdValues {
    let fast_ema = ema_values(values, fast, EmaSeeding::SmaSeeded);
    let slow_ema = ema_values(values, slow, EmaSeeding::SmaSeeded);
    let macd = difference(&fast_ema, &slow_ema);
    let signal = ema_values(&macd, signal, EmaSeeding::SmaSeeded);
    let histogram = difference(&macd, &signal);

    MacdValues {
        macd,
        signal,
        histogram,
    }
}

/// MACD (Moving Average Convergence Divergence).
///
/// Produces three columns:
/// - `macd_{fast}_{slow}_{signal}`: fast EMA minus slow EMA
/// - `macd_signal_{fast}_{slow}_{signal}`: EMA of the MACD line
/// - `macd_hist_{fast}_{slow}_{signal}`: MACD line minus signal line
///
/// The intermediate EMAs are never written to the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    column: String,
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(
        column: impl Into<String>,
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Self {
        Self {
            column: column.into(),
            fast_period,
            slow_period,
            signal_period,
        }
    }

    /// Standard MACD (12, 26, 9).
    pub fn default_periods(column: impl Into<String>) -> Self {
        Self::new(column, 12, 26, 9)
    }

    /// Rows needed before the signal line and histogram are defined.
    pub fn warm_up(&self) -> usize {
        self.fast_period.max(self.slow_period) + self.signal_period - 1
    }

    fn suffix(&self) -> String {
        format!(
            "{}_{}_{}",
            self.fast_period, self.slow_period, self.signal_period
        )
    }

    pub fn macd_name(&self) -> String {
        format!("macd_{}", self.suffix())
    }

    pub fn signal_name(&self) -> String {
        format!("macd_signal_{}", self.suffix())
    }

    pub fn histogram_name(&self) -> String {
        format!("macd_hist_{}", self.suffix())
    }
}

impl Indicator for Macd {
    fn kind(&self) -> &'static str {
        "macd"
    }

    fn source(&self) -> &str {
        &self.column
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.macd_name(), self.signal_name(), self.histogram_name()]
    }

    fn check_config(&self) -> Result<(), IndicatorError> {
        check_period("macd", "fast period", self.fast_period)?;
        check_period("macd", "slow period", self.slow_period)?;
        check_period("macd", "signal period", self.signal_period)
    }

    fn compute(&self, source: &Column) -> Vec<Column> {
        if source.len() < self.warm_up() {
            tracing::debug!(
                rows = source.len(),
                required = self.warm_up(),
                "Not enough rows for a MACD signal line"
            );
        }
        let values = macd_values(
            source.values(),
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );
        vec![
            Column::new(self.macd_name(), values.macd),
            Column::new(self.signal_name(), values.signal),
            Column::new(self.histogram_name(), values.histogram),
        ]
    }
}

/// Append the MACD, signal and histogram columns computed over `column`.
pub fn macd(
    table: &Table,
    column: &str,
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Result<Table, IndicatorError> {
    Macd::new(column, fast_period, slow_period, signal_period).apply(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ema::smoothing_factor;
    use crate::test_util::{assert_close, close_table};

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_macd_short_table_is_all_absent() {
        let table = close_table(&[42.0; 20]);
        let out = macd(&table, "close", 12, 26, 9).unwrap();

        assert_eq!(out.num_rows(), 20);
        for name in ["macd_12_26_9", "macd_signal_12_26_9", "macd_hist_12_26_9"] {
            let col = out.column(name).unwrap();
            assert_eq!(col.len(), 20);
            assert_eq!(col.defined_count(), 0, "{name} should be absent");
        }
    }

    #[test]
    fn test_macd_warm_up_alignment() {
        let prices = wave(60);
        let values = macd_values(&prices.iter().copied().map(Some).collect::<Vec<_>>(), 12, 26, 9);

        // MACD line starts at max(12, 26) - 1
        assert!(values.macd[..25].iter().all(Option::is_none));
        assert!(values.macd[25..].iter().all(Option::is_some));
        // Signal line starts after 9 valid MACD values
        assert!(values.signal[..33].iter().all(Option::is_none));
        assert!(values.signal[33..].iter().all(Option::is_some));
        assert_eq!(values.histogram.iter().position(Option::is_some), Some(33));
    }

    #[test]
    fn test_macd_signal_seed_is_mean_of_first_valid_values() {
        let prices: Vec<Option<f64>> = wave(40).into_iter().map(Some).collect();
        let values = macd_values(&prices, 3, 6, 4);

        // First MACD at row 5, signal seed at row 5 + 4 - 1 = 8
        let seed: f64 = values.macd[5..=8].iter().map(|v| v.unwrap()).sum::<f64>() / 4.0;
        assert_close(values.signal[8], seed);

        let alpha = smoothing_factor(4);
        let expected = alpha * values.macd[9].unwrap() + (1.0 - alpha) * seed;
        assert_close(values.signal[9], expected);
    }

    #[test]
    fn test_macd_line_is_fast_minus_slow() {
        let prices: Vec<Option<f64>> = wave(30).into_iter().map(Some).collect();
        let fast = ema_values(&prices, 5, EmaSeeding::SmaSeeded);
        let slow = ema_values(&prices, 10, EmaSeeding::SmaSeeded);
        let values = macd_values(&prices, 5, 10, 3);

        for row in 9..30 {
            assert_close(values.macd[row], fast[row].unwrap() - slow[row].unwrap());
        }
    }

    #[test]
    fn test_macd_histogram_is_macd_minus_signal() {
        let table = close_table(&wave(80));
        let out = macd(&table, "close", 12, 26, 9).unwrap();
        let line = out.column("macd_12_26_9").unwrap();
        let signal = out.column("macd_signal_12_26_9").unwrap();
        let hist = out.column("macd_hist_12_26_9").unwrap();

        for row in 0..80 {
            match (line.get(row), signal.get(row)) {
                (Some(m), Some(s)) => assert_close(hist.get(row), m - s),
                _ => assert_eq!(hist.get(row), None),
            }
        }
    }

    #[test]
    fn test_macd_constant_prices_are_zero() {
        let table = close_table(&[25.0; 40]);
        let out = macd(&table, "close", 12, 26, 9).unwrap();
        let hist = out.column("macd_hist_12_26_9").unwrap();
        assert_eq!(hist.first_defined(), Some(33));
        assert_close(hist.get(39), 0.0);
    }

    #[test]
    fn test_macd_outputs_only_three_columns() {
        let table = close_table(&wave(50));
        let out = Macd::default_periods("close").apply(&table).unwrap();
        let names: Vec<&str> = out.column_names().collect();
        assert_eq!(
            names,
            vec!["close", "macd_12_26_9", "macd_signal_12_26_9", "macd_hist_12_26_9"]
        );
    }

    #[test]
    fn test_macd_rejects_zero_signal_period() {
        let table = close_table(&wave(50));
        let err = macd(&table, "close", 12, 26, 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "macd signal period must be a positive integer, got 0"
        );
    }
}
