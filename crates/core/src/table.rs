use std::sync::Arc;

use crate::error::TableError;

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A named sequence of numeric-or-absent values, one per table row.
///
/// Non-finite values (NaN, infinities) are stored as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(finite).collect(),
        }
    }

    /// Build a column from raw values; only non-finite values are absent.
    pub fn from_values(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Some).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value at `row`, or `None` when the row is absent or out of range.
    pub fn get(&self, row: usize) -> Option<f64> {
        self.values.get(row).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of rows holding a value.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Index of the first row holding a value.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

/// `value` if it is a finite number, otherwise absent.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An ordered set of equally long columns.
///
/// Row position is the row's identity: insertion order is chronological
/// order, and nothing in this crate reorders rows. Columns are shared behind
/// `Arc`, so deriving a new table from an existing one never copies the
/// existing column data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: usize,
    columns: Vec<Arc<Column>>,
}

impl Table {
    /// Build a table from columns that must all share the same length and
    /// carry distinct names.
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Result<Self, TableError> {
        let mut table = Table::default();
        for column in columns {
            if table.contains(column.name()) {
                return Err(TableError::DuplicateColumn(column.name().to_string()));
            }
            table.push(column)?;
        }
        Ok(table)
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| self.columns[i].as_ref())
    }

    /// Like [`Table::column`], but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<&Column, TableError> {
        self.column(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|c| c.as_ref())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// Return a new table with `column` added.
    ///
    /// A column with the same name is replaced in place; otherwise the column
    /// is appended. `self` is left untouched.
    pub fn with_column(&self, column: Column) -> Result<Table, TableError> {
        let mut table = self.clone();
        table.push(column)?;
        Ok(table)
    }

    /// Return a new table with every column in `columns` added, as by
    /// [`Table::with_column`]. Either all columns are added or none.
    pub fn with_columns(
        &self,
        columns: impl IntoIterator<Item = Column>,
    ) -> Result<Table, TableError> {
        let mut table = self.clone();
        for column in columns {
            table.push(column)?;
        }
        Ok(table)
    }

    /// Keep only the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        if n >= self.rows {
            return self.clone();
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Arc::new(Column::new(c.name(), c.values()[..n].to_vec())))
            .collect();
        Table { rows: n, columns }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    fn push(&mut self, column: Column) -> Result<(), TableError> {
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(TableError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.rows,
                actual: column.len(),
            });
        }

        match self.position(column.name()) {
            Some(i) => {
                tracing::debug!(column = %column.name(), "Replacing existing column");
                self.columns[i] = Arc::new(column);
            }
            None => self.columns.push(Arc::new(column)),
        }
        Ok(())
    }
}
