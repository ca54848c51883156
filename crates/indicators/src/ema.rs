use crate::{check_period, mean, Indicator, IndicatorError};
use quantcol_core::{finite, Column, Table};
use serde::{Deserialize, Serialize};

/// How the first value of an EMA series is produced.
///
/// The two policies give different numbers for the same input and are never
/// interchangeable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaSeeding {
    /// The first value is the first source value; the recurrence starts on
    /// the next row.
    #[default]
    Continuous,
    /// The first `period - 1` rows are absent and the next row holds the
    /// plain mean of the first `period` source values.
    SmaSeeded,
}

/// Smoothing factor `2 / (period + 1)`.
pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Exponential moving average of `values`.
///
/// Seeding starts at the first present value, so leading absent rows (the
/// warm-up of an upstream indicator) are skipped rather than poisoning the
/// series. Once the series has started, an absent value ends it: that row
/// and every later row are absent. Non-finite values count as absent.
pub fn ema_values(values: &[Option<f64>], period: usize, seeding: EmaSeeding) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let Some(start) = values.iter().position(|v| finite(*v).is_some()) else {
        return out;
    };

    let (seed_row, seed) = match seeding {
        EmaSeeding::Continuous => (start, finite(values[start])),
        EmaSeeding::SmaSeeded => {
            let seed_row = start + period - 1;
            if seed_row >= values.len() {
                return out;
            }
            (seed_row, mean(&values[start..=seed_row]))
        }
    };
    let Some(mut prev) = seed else {
        return out;
    };
    out[seed_row] = Some(prev);

    let alpha = smoothing_factor(period);
    for (i, value) in values.iter().enumerate().skip(seed_row + 1) {
        let Some(value) = finite(*value) else {
            break;
        };
        prev = alpha * value + (1.0 - alpha) * prev;
        out[i] = Some(prev);
    }
    out
}

/// Exponential Moving Average (EMA).
#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    column: String,
    period: usize,
    seeding: EmaSeeding,
}

impl Ema {
    pub fn new(column: impl Into<String>, period: usize, seeding: EmaSeeding) -> Self {
        Self {
            column: column.into(),
            period,
            seeding,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn seeding(&self) -> EmaSeeding {
        self.seeding
    }

    /// `ema_{period}` for continuous seeding, `ema_{period}_seeded` otherwise,
    /// so both policies can live in the same table.
    pub fn output_name(&self) -> String {
        match self.seeding {
            EmaSeeding::Continuous => format!("ema_{}", self.period),
            EmaSeeding::SmaSeeded => format!("ema_{}_seeded", self.period),
        }
    }
}

impl Indicator for Ema {
    fn kind(&self) -> &'static str {
        "ema"
    }

    fn source(&self) -> &str {
        &self.column
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.output_name()]
    }

    fn check_config(&self) -> Result<(), IndicatorError> {
        check_period("ema", "period", self.period)
    }

    fn compute(&self, source: &Column) -> Vec<Column> {
        vec![Column::new(
            self.output_name(),
            ema_values(source.values(), self.period, self.seeding),
        )]
    }
}

/// Append an EMA of `column` using the given seeding policy.
pub fn ema(
    table: &Table,
    column: &str,
    period: usize,
    seeding: EmaSeeding,
) -> Result<Table, IndicatorError> {
    Ema::new(column, period, seeding).apply(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{assert_close, close_table};

    #[test]
    fn test_ema_flat_input_is_unchanged() {
        let table = close_table(&[10.0, 10.0, 10.0, 10.0]);
        let out = ema(&table, "close", 3, EmaSeeding::Continuous).unwrap();
        let col = out.column("ema_3").unwrap();
        assert_eq!(col.values(), &[Some(10.0); 4]);
    }

    #[test]
    fn test_ema_continuous_recurrence() {
        let source = [2.0, 4.0, 6.0, 8.0, 7.0, 5.0];
        let period = 3;
        let alpha = smoothing_factor(period);
        assert_eq!(alpha, 0.5);

        let out = ema_values(&source.map(Some), period, EmaSeeding::Continuous);
        assert_eq!(out[0], Some(source[0]));
        for i in 1..source.len() {
            let prev = out[i - 1].unwrap();
            assert_close(out[i], alpha * source[i] + (1.0 - alpha) * prev);
        }
        // 0.5 * 4 + 0.5 * 2 = 3, then 0.5 * 6 + 0.5 * 3 = 4.5
        assert_close(out[1], 3.0);
        assert_close(out[2], 4.5);
    }

    #[test]
    fn test_ema_sma_seeded() {
        let source = [2.0, 4.0, 6.0, 8.0];
        let out = ema_values(&source.map(Some), 3, EmaSeeding::SmaSeeded);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        // Seed = (2 + 4 + 6) / 3 = 4
        assert_eq!(out[2], Some(4.0));
        // 0.5 * 8 + 0.5 * 4 = 6
        assert_close(out[3], 6.0);
    }

    #[test]
    fn test_ema_policies_differ() {
        let table = close_table(&[2.0, 4.0, 6.0, 8.0]);
        let out = ema(&table, "close", 3, EmaSeeding::Continuous).unwrap();
        let out = ema(&out, "close", 3, EmaSeeding::SmaSeeded).unwrap();

        let continuous = out.column("ema_3").unwrap();
        let seeded = out.column("ema_3_seeded").unwrap();
        assert_ne!(continuous.values(), seeded.values());
    }

    #[test]
    fn test_ema_seed_skips_leading_absent_rows() {
        let values = [None, None, Some(3.0), Some(5.0), Some(7.0), Some(9.0)];
        let out = ema_values(&values, 2, EmaSeeding::SmaSeeded);
        assert!(out[..3].iter().all(Option::is_none));
        assert_eq!(out[3], Some(4.0));

        let out = ema_values(&values, 2, EmaSeeding::Continuous);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(3.0));
    }

    #[test]
    fn test_ema_over_column_with_leading_gaps() {
        let table = Table::from_columns([Column::new(
            "close",
            vec![None, None, Some(2.0), Some(4.0), Some(6.0), Some(8.0)],
        )])
        .unwrap();

        let out = ema(&table, "close", 3, EmaSeeding::SmaSeeded).unwrap();
        let col = out.column("ema_3_seeded").unwrap();
        // Seed covers rows 2..=4: (2 + 4 + 6) / 3 = 4, then 0.5 * 8 + 0.5 * 4 = 6
        assert!(col.values()[..4].iter().all(Option::is_none));
        assert_eq!(col.get(4), Some(4.0));
        assert_close(col.get(5), 6.0);

        let out = ema(&table, "close", 3, EmaSeeding::Continuous).unwrap();
        let col = out.column("ema_3").unwrap();
        assert_eq!(col.first_defined(), Some(2));
        assert_eq!(col.get(2), Some(2.0));
        assert_close(col.get(3), 3.0);
    }

    #[test]
    fn test_ema_non_finite_value_ends_series() {
        let values = [Some(1.0), Some(3.0), Some(f64::NAN), Some(4.0)];
        let out = ema_values(&values, 3, EmaSeeding::Continuous);
        assert_close(out[1], 2.0);
        assert_eq!(out[2], None);
        assert_eq!(out[3], None);

        let values = [Some(f64::INFINITY), Some(2.0), Some(4.0)];
        let out = ema_values(&values, 2, EmaSeeding::Continuous);
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(2.0));
    }

    #[test]
    fn test_ema_absent_value_ends_series() {
        let values = [Some(1.0), Some(2.0), None, Some(4.0)];
        let out = ema_values(&values, 2, EmaSeeding::Continuous);
        assert!(out[1].is_some());
        assert_eq!(out[2], None);
        assert_eq!(out[3], None);

        let out = ema_values(&[Some(1.0), None, Some(3.0), Some(4.0)], 2, EmaSeeding::SmaSeeded);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_seeded_insufficient_data() {
        let out = ema_values(&[Some(1.0), Some(2.0)], 3, EmaSeeding::SmaSeeded);
        assert!(out.len() == 2 && out.iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_rejects_zero_period() {
        let table = close_table(&[1.0]);
        assert!(matches!(
            ema(&table, "close", 0, EmaSeeding::Continuous),
            Err(IndicatorError::InvalidPeriod { indicator: "ema", .. })
        ));
    }
}
