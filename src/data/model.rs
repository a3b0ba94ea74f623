use std::fmt;

use crate::error::{PrepError, PrepResult};

// ---------------------------------------------------------------------------
// Column – one named feature vector
// ---------------------------------------------------------------------------

/// A single named column of the cluster table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// ClusterTable – the complete in-memory dataset
// ---------------------------------------------------------------------------

/// Column-oriented table of clusters.
///
/// Row `i` of every column describes the same cluster. Columns keep their
/// insertion order, which is also the order they are written out in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl ClusterTable {
    /// An empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns, checking names are unique and
    /// lengths agree.
    pub fn from_columns<I, S>(columns: I) -> PrepResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows (clusters).
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Fail with [`PrepError::MissingColumn`] on the first absent name.
    pub fn require<'a, I>(&self, names: I) -> PrepResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().try_for_each(|name| {
            if self.contains(name) {
                Ok(())
            } else {
                Err(PrepError::missing(name))
            }
        })
    }

    pub fn column(&self, name: &str) -> PrepResult<&[f64]> {
        self.position(name)
            .map(|i| self.columns[i].values.as_slice())
            .ok_or_else(|| PrepError::missing(name))
    }

    pub fn column_mut(&mut self, name: &str) -> PrepResult<&mut [f64]> {
        match self.position(name) {
            Some(i) => Ok(self.columns[i].values.as_mut_slice()),
            None => Err(PrepError::missing(name)),
        }
    }

    /// Append a column at the end of the table.
    ///
    /// The first column fixes the row count of an empty table.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> PrepResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PrepError::DuplicateColumn { column: name });
        }
        if self.columns.is_empty() {
            self.n_rows = values.len();
        } else if values.len() != self.n_rows {
            return Err(PrepError::LengthMismatch {
                column: name,
                expected: self.n_rows,
                found: values.len(),
            });
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Remove a column and hand back its values.
    pub fn drop_column(&mut self, name: &str) -> PrepResult<Vec<f64>> {
        let idx = self.position(name).ok_or_else(|| PrepError::missing(name))?;
        let column = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Ok(column.values)
    }

    /// Keep only the rows whose entry in `keep` is `true`, preserving order.
    pub fn retain_rows(&mut self, keep: &[bool]) -> PrepResult<()> {
        if keep.len() != self.n_rows {
            return Err(PrepError::LengthMismatch {
                column: "<row mask>".to_string(),
                expected: self.n_rows,
                found: keep.len(),
            });
        }
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.n_rows = keep.iter().filter(|&&k| k).count();
        Ok(())
    }
}

impl fmt::Display for ClusterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows x {} columns [{}]",
            self.n_rows,
            self.columns.len(),
            self.column_names().join(", ")
        )
    }
}
