use crate::{Ema, EmaSeeding, Indicator, IndicatorError, Macd, Rsi, Sma};
use quantcol_core::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_source() -> String {
    "close".to_string()
}

fn default_fast() -> usize {
    12
}

fn default_slow() -> usize {
    26
}

fn default_signal() -> usize {
    9
}

/// Configuration for one indicator step.
///
/// `column` falls back to the pipeline's `source` when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Sma {
        column: Option<String>,
        period: usize,
    },
    Ema {
        column: Option<String>,
        period: usize,
        #[serde(default)]
        seeding: EmaSeeding,
    },
    Rsi {
        column: Option<String>,
        period: usize,
    },
    Macd {
        column: Option<String>,
        #[serde(default = "default_fast")]
        fast: usize,
        #[serde(default = "default_slow")]
        slow: usize,
        #[serde(default = "default_signal")]
        signal: usize,
    },
}

impl IndicatorSpec {
    /// Build the configured indicator, reading `default_column` unless the
    /// step names its own column.
    pub fn build(&self, default_column: &str) -> Box<dyn Indicator> {
        let source = |column: &Option<String>| {
            column.clone().unwrap_or_else(|| default_column.to_string())
        };
        match self {
            IndicatorSpec::Sma { column, period } => Box::new(Sma::new(source(column), *period)),
            IndicatorSpec::Ema {
                column,
                period,
                seeding,
            } => Box::new(Ema::new(source(column), *period, *seeding)),
            IndicatorSpec::Rsi { column, period } => Box::new(Rsi::new(source(column), *period)),
            IndicatorSpec::Macd {
                column,
                fast,
                slow,
                signal,
            } => Box::new(Macd::new(source(column), *fast, *slow, *signal)),
        }
    }
}

/// An ordered list of indicator steps, each consuming the previous step's
/// output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Column read by steps that do not name one.
    #[serde(default = "default_source")]
    pub source: String,
    /// Keep only the first `head` rows of the final table.
    #[serde(default)]
    pub head: Option<usize>,
    #[serde(default)]
    pub steps: Vec<IndicatorSpec>,
}

impl Default for Pipeline {
    /// RSI, EMA and SMA for periods 7, 14 and 21, followed by MACD (12, 26, 9).
    fn default() -> Self {
        let mut steps = Vec::new();
        for period in [7, 14, 21] {
            steps.push(IndicatorSpec::Rsi {
                column: None,
                period,
            });
            steps.push(IndicatorSpec::Ema {
                column: None,
                period,
                seeding: EmaSeeding::Continuous,
            });
            steps.push(IndicatorSpec::Sma {
                column: None,
                period,
            });
        }
        steps.push(IndicatorSpec::Macd {
            column: None,
            fast: default_fast(),
            slow: default_slow(),
            signal: default_signal(),
        });

        Self {
            source: default_source(),
            head: None,
            steps,
        }
    }
}

impl Pipeline {
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        self.steps.iter().map(|s| s.build(&self.source)).collect()
    }

    /// Check every step before anything is computed.
    ///
    /// A step may read a column that an earlier step produces.
    pub fn validate(&self, table: &Table) -> Result<(), IndicatorError> {
        let mut available: HashSet<String> = table.column_names().map(str::to_string).collect();
        for indicator in self.indicators() {
            indicator.check_config()?;
            if !available.contains(indicator.source()) {
                return Err(IndicatorError::ColumnNotFound(indicator.source().to_string()));
            }
            available.extend(indicator.output_columns());
        }
        Ok(())
    }

    /// Validate, then apply every step in order and trim to `head` rows.
    pub fn run(&self, table: &Table) -> Result<Table, IndicatorError> {
        self.validate(table)?;

        let mut current = table.clone();
        for indicator in self.indicators() {
            tracing::info!(
                indicator = indicator.kind(),
                source = %indicator.source(),
                outputs = ?indicator.output_columns(),
                "Applying indicator"
            );
            current = indicator.apply(&current)?;
        }

        Ok(match self.head {
            Some(n) => current.head(n),
            None => current,
        })
    }
}
