use quantcol_core::{Table, TableError};

/// A non-numeric column carried through unchanged (timestamps, symbols).
#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
    pub name: String,
    pub values: Vec<String>,
}

/// A loaded file: passthrough text columns plus the numeric table the
/// indicators operate on. Both always have the same row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    text: Vec<TextColumn>,
    table: Table,
}

impl Frame {
    pub fn new(text: Vec<TextColumn>, table: Table) -> Result<Self, TableError> {
        let frame = Self {
            text: Vec::new(),
            table,
        };
        frame.with_text(text)
    }

    pub fn text_columns(&self) -> &[TextColumn] {
        &self.text
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn num_rows(&self) -> usize {
        match self.text.first() {
            Some(column) if self.table.num_columns() == 0 => column.values.len(),
            _ => self.table.num_rows(),
        }
    }

    /// Swap in a table derived from this frame's table.
    pub fn with_table(&self, table: Table) -> Result<Self, TableError> {
        Frame::new(self.text.clone(), table)
    }

    /// Keep only the first `n` rows of every column.
    pub fn head(&self, n: usize) -> Self {
        let text = self
            .text
            .iter()
            .map(|c| TextColumn {
                name: c.name.clone(),
                values: c.values.iter().take(n).cloned().collect(),
            })
            .collect();
        Self {
            text,
            table: self.table.head(n),
        }
    }

    /// Header names in output order: text columns first, then numeric ones.
    pub fn headers(&self) -> Vec<&str> {
        self.text
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.table.column_names())
            .collect()
    }

    fn with_text(mut self, text: Vec<TextColumn>) -> Result<Self, TableError> {
        for column in text {
            let expected = self.num_rows();
            let has_rows = self.table.num_columns() > 0 || !self.text.is_empty();
            if has_rows && column.values.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: column.name,
                    expected,
                    actual: column.values.len(),
                });
            }
            if self.table.contains(&column.name) || self.text.iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name));
            }
            self.text.push(column);
        }
        Ok(self)
    }
}
