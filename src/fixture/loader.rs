//! Fixture file loading
//!
//! CSV files name their fields in the first line; JSON files hold one object
//! or an array of objects. Rows are produced lazily and in file order, and
//! every call to [`Fixture::rows`] re-reads the file from the start.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::FixtureRow;
use crate::common::{Error, Result};

/// Supported fixture file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    Csv,
    Json,
}

impl FixtureFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// A fixture file and how to read it
#[derive(Debug, Clone)]
pub struct Fixture {
    path: PathBuf,
    format: FixtureFormat,
    header_lines: usize,
    field_names: Option<Vec<String>>,
}

impl Fixture {
    /// Open a fixture, inferring its format from the extension
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::FixtureNotFound(path));
        }
        let format = FixtureFormat::from_path(&path).ok_or_else(|| {
            Error::fixture_format(&path, "unknown extension (expected .csv or .json)")
        })?;
        Ok(Self::with_format(path, format))
    }

    /// A CSV fixture with a single header line
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path.into(), FixtureFormat::Csv)
    }

    /// A JSON fixture
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path.into(), FixtureFormat::Json)
    }

    fn with_format(path: PathBuf, format: FixtureFormat) -> Self {
        Self {
            path,
            format,
            header_lines: 1,
            field_names: None,
        }
    }

    /// Number of leading CSV lines to skip; the first of them names the fields
    pub fn header_lines(mut self, n: usize) -> Self {
        self.header_lines = n;
        self
    }

    /// Explicit CSV field names, overriding the header line
    pub fn field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FixtureFormat {
        self.format
    }

    /// Iterate the rows from the start of the file
    pub fn rows(&self) -> Result<FixtureRows> {
        let file = File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FixtureNotFound(self.path.clone())
            } else {
                Error::Io(e)
            }
        })?;

        tracing::debug!(path = %self.path.display(), format = ?self.format, "Reading fixture");

        match self.format {
            FixtureFormat::Csv => self.csv_rows(file),
            FixtureFormat::Json => self.json_rows(file),
        }
    }

    /// Read every row, failing on the first malformed one
    pub fn load(&self) -> Result<Vec<FixtureRow>> {
        self.rows()?.collect()
    }

    fn csv_rows(&self, file: File) -> Result<FixtureRows> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut records = reader.into_records();

        let mut header: Option<Vec<String>> = None;
        for skipped in 0..self.header_lines {
            match records.next() {
                Some(Ok(record)) if skipped == 0 => {
                    header = Some(record.iter().map(str::to_string).collect());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(csv_error(&self.path, e)),
                None => break,
            }
        }

        let names = self.field_names.clone().or(header);

        Ok(FixtureRows {
            inner: RowsInner::Csv {
                path: self.path.clone(),
                names,
                records,
            },
        })
    }

    fn json_rows(&self, file: File) -> Result<FixtureRows> {
        let value: Value = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::fixture_format(&self.path, format!("invalid JSON: {}", e)))?;

        let rows = match value {
            Value::Object(map) => vec![object_row(1, map)],
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(object_row(i + 1, map)),
                    other => Err(Error::fixture_format(
                        &self.path,
                        format!("element {} is {}, expected an object", i + 1, kind(&other)),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(Error::fixture_format(
                    &self.path,
                    format!("top level is {}, expected an object or array", kind(&other)),
                ))
            }
        };

        Ok(FixtureRows {
            inner: RowsInner::Json(rows.into_iter()),
        })
    }
}

/// Lazy row iterator over one pass of a fixture file
pub struct FixtureRows {
    inner: RowsInner,
}

enum RowsInner {
    Csv {
        path: PathBuf,
        names: Option<Vec<String>>,
        records: csv::StringRecordsIntoIter<File>,
    },
    Json(std::vec::IntoIter<FixtureRow>),
}

impl Iterator for FixtureRows {
    type Item = Result<FixtureRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            RowsInner::Json(rows) => rows.next().map(Ok),
            RowsInner::Csv {
                path,
                names,
                records,
            } => {
                let record = match records.next()? {
                    Ok(record) => record,
                    Err(e) => return Some(Err(csv_error(path, e))),
                };
                let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

                let names = names.get_or_insert_with(|| {
                    (0..record.len()).map(|i| i.to_string()).collect()
                });
                if record.len() != names.len() {
                    return Some(Err(Error::fixture_format(
                        path.clone(),
                        format!(
                            "line {}: expected {} fields, found {}",
                            line,
                            names.len(),
                            record.len()
                        ),
                    )));
                }

                let mut row = FixtureRow::new(line);
                for (name, value) in names.iter().zip(record.iter()) {
                    row.set(name.clone(), value);
                }
                Some(Ok(row))
            }
        }
    }
}

fn csv_error(path: &Path, e: csv::Error) -> Error {
    Error::fixture_format(path, e.to_string())
}

fn object_row(line: usize, map: serde_json::Map<String, Value>) -> FixtureRow {
    let mut row = FixtureRow::new(line);
    for (name, value) in map {
        row.set(name, scalar_text(&value));
    }
    row
}

/// Textual form of a JSON value; null becomes the empty string
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
