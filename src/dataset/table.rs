//! In-memory string table with the handful of frame operations the
//! builders need: concatenation, (Name, Artist) deduplication and CSV I/O.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use super::DatasetError;

/// Names a leading index column may carry in files we read back.
const INDEX_HEADERS: &[&str] = &["", "Unnamed: 0"];

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Written as the leading unnamed column.
    pub index: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value by row position and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.cells.get(col).map(String::as_str)
    }

    /// Append a row; its index is its position in this table.
    pub fn push(&mut self, cells: Vec<String>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        let index = self.rows.len();
        self.rows.push(Row { index, cells });
    }

    /// Stack tables vertically.
    ///
    /// Columns are the union of all inputs in order of first appearance;
    /// cells for columns a table lacks are left empty. With `ignore_index`
    /// rows are renumbered by their position in the result, otherwise each
    /// keeps the index it had in its source table.
    pub fn concat(tables: impl IntoIterator<Item = Dataset>, ignore_index: bool) -> Dataset {
        let tables: Vec<Dataset> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut out = Dataset {
            columns,
            rows: Vec::new(),
        };

        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| out.column_index(c))
                .collect();

            for row in table.rows {
                let mut cells = vec![String::new(); out.columns.len()];
                for (cell, &target) in row.cells.into_iter().zip(&mapping) {
                    cells[target] = cell;
                }
                let index = if ignore_index { out.rows.len() } else { row.index };
                out.rows.push(Row { index, cells });
            }
        }

        out
    }

    /// Fail with `MissingColumn` unless every named column exists.
    pub fn require_columns(&self, names: &[&str], context: &str) -> Result<(), DatasetError> {
        for name in names {
            if self.column_index(name).is_none() {
                return Err(DatasetError::MissingColumn {
                    column: (*name).to_string(),
                    context: context.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Keep only the first row for each distinct combination of `subset`
    /// values. Returns the number of rows removed.
    pub fn drop_duplicates(&mut self, subset: &[&str]) -> Result<usize, DatasetError> {
        self.require_columns(subset, "dataset")?;
        let key_cols: Vec<usize> = subset
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        let before = self.rows.len();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        self.rows.retain(|row| {
            let key: Vec<String> = key_cols.iter().map(|&c| row.cells[c].clone()).collect();
            seen.insert(key)
        });
        Ok(before - self.rows.len())
    }

    /// Write header and rows, optionally prefixed by the index column.
    pub fn write_to<W: Write>(&self, mut writer: csv::Writer<W>, with_index: bool) -> Result<(), DatasetError> {
        let mut header: Vec<&str> = Vec::with_capacity(self.columns.len() + 1);
        if with_index {
            header.push("");
        }
        header.extend(self.columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in &self.rows {
            if with_index {
                let index = row.index.to_string();
                writer.write_record(std::iter::once(index.as_str()).chain(row.cells.iter().map(String::as_str)))?;
            } else {
                writer.write_record(&row.cells)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Write to `path`, replacing any existing file.
    pub fn write_csv(&self, path: &Path, with_index: bool) -> Result<(), DatasetError> {
        let writer = csv::Writer::from_path(path)?;
        self.write_to(writer, with_index)
    }

    /// Read a table, dropping a leading index column if there is one.
    pub fn read_from<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset, DatasetError> {
        let headers = reader.headers()?.clone();
        let skip_first = headers
            .get(0)
            .is_some_and(|h| INDEX_HEADERS.contains(&h.trim()));
        let skip = usize::from(skip_first);

        let mut dataset = Dataset::new(headers.iter().skip(skip));
        for record in reader.records() {
            let record = record?;
            dataset.push(record.iter().skip(skip).map(str::to_string).collect());
        }
        Ok(dataset)
    }

    pub fn read_csv(path: &Path) -> Result<Dataset, DatasetError> {
        let reader = csv::Reader::from_path(path)?;
        Self::read_from(reader)
    }
}
