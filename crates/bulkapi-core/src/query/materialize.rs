/// Result materializer
///
/// Converts the rows of a paged query response into a [`ResultTable`],
/// applying the renames and column order of a [`FieldSpec`]. Rows may be
/// sparse; a missing cell becomes `null`, never an error.
use super::fields::FieldSpec;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Path segment under which the remote API serves stored files
pub const DOWNLOAD_SEGMENT: &str = "/download/";

/// One page of a query or list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Map<String, Value>>,
}

impl Page {
    /// Decode a response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Materialized query result: named columns over rows of JSON values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Cell by column name
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(move |values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Cell at `index` in the named column
    pub fn get(&self, index: usize, column: &str) -> Option<&Value> {
        self.row(index).and_then(|row| row.get(column))
    }

    /// Every row as a mapping from column name to value, in column order
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|values| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Appends the rows of `other`. Columns unknown so far are added at the
    /// end and earlier rows get `null` there.
    pub fn append(&mut self, other: ResultTable) {
        let mut index: HashMap<String, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        for column in &other.columns {
            if !index.contains_key(column) {
                index.insert(column.clone(), self.columns.len());
                self.columns.push(column.clone());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, Value::Null);
        }
        for values in other.rows {
            let mut row = vec![Value::Null; width];
            for (column, value) in other.columns.iter().zip(values) {
                row[index[column]] = value;
            }
            self.rows.push(row);
        }
    }

    fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(values);
    }
}

/// Builds result tables from response rows
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    file_fields: HashSet<String>,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output columns that hold stored files; their cells are reduced to the
    /// stored file name.
    pub fn with_file_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn materialize(&self, rows: &[Map<String, Value>], spec: Option<&FieldSpec>) -> ResultTable {
        let mut table = match spec {
            Some(spec) => self.with_spec(rows, spec),
            None => self.without_spec(rows),
        };
        if !self.file_fields.is_empty() {
            for (i, column) in table.columns.clone().iter().enumerate() {
                if self.file_fields.contains(column) {
                    for row in &mut table.rows {
                        row[i] = stored_file_name(&row[i]).map_or(Value::Null, Value::String);
                    }
                }
            }
        }
        table
    }

    fn with_spec(&self, rows: &[Map<String, Value>], spec: &FieldSpec) -> ResultTable {
        let mut table = ResultTable::new(spec.output_names().into_iter().map(String::from).collect());
        for row in rows {
            let values = spec
                .iter()
                .map(|entry| {
                    row.get(&entry.source().joined())
                        .or_else(|| row.get(entry.output_name()))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();
            table.push_row(values);
        }
        table
    }

    fn without_spec(&self, rows: &[Map<String, Value>]) -> ResultTable {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for row in rows {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        let mut table = ResultTable::new(columns);
        for row in rows {
            let values = table
                .columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                .collect();
            table.push_row(values);
        }
        table
    }
}

/// Materialize with no file columns
pub fn materialize(rows: &[Map<String, Value>], spec: Option<&FieldSpec>) -> ResultTable {
    Materializer::new().materialize(rows, spec)
}

/// Stored file name carried by a file-field cell.
///
/// Accepts a download URL (`.../download/<name>`), a bare stored name, or an
/// object with a string `name`/`file_name` member.
pub fn stored_file_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(match s.split_once(DOWNLOAD_SEGMENT) {
            Some((_, name)) => name.to_string(),
            None => s.clone(),
        }),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("file_name"))
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}
