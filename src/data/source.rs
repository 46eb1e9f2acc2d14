use std::collections::HashMap;
use std::path::{Path, PathBuf};

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::City;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// RawTable – untyped text cells as delivered by a source
// ---------------------------------------------------------------------------

/// Header plus rows of text cells. An empty cell means "no value".
///
/// Rows the source could not decode keep their position in `rows` as an
/// empty placeholder and are listed in `rejected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub rejected: Vec<RejectedRow>,
}

/// A data row that could not be decoded, by position in [`RawTable::rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub index: usize,
    pub reason: String,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable {
            columns,
            rows,
            rejected: Vec::new(),
        }
    }

    /// Why the row at `index` was rejected, if it was.
    pub fn rejection(&self, index: usize) -> Option<&str> {
        self.rejected
            .binary_search_by_key(&index, |r| r.index)
            .ok()
            .map(|pos| self.rejected[pos].reason.as_str())
    }

    /// Position of a column, matching the trimmed header text exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

/// Supplies the raw trip table for a city.
pub trait RowSource {
    fn read_table(&self, city: City) -> Result<RawTable>;
}

// ---------------------------------------------------------------------------
// MemorySource – tables held in memory
// ---------------------------------------------------------------------------

/// In-memory tables keyed by city.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<City, RawTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, city: City, table: RawTable) -> Self {
        self.tables.insert(city, table);
        self
    }
}

impl RowSource for MemorySource {
    fn read_table(&self, city: City) -> Result<RawTable> {
        self.tables
            .get(&city)
            .cloned()
            .ok_or_else(|| Error::DatasetNotFound {
                city: city.to_string(),
                root: PathBuf::from("<memory>"),
            })
    }
}

// ---------------------------------------------------------------------------
// DirectorySource – one file per city on disk
// ---------------------------------------------------------------------------

/// Extensions tried for each city, in order of preference.
const EXTENSIONS: [&str; 3] = ["csv", "parquet", "json"];

/// Reads `<root>/<city stem>.{csv,parquet,json}`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The first existing file for the city, if any.
    pub fn resolve(&self, city: City) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{ext}", city.file_stem())))
            .find(|p| p.is_file())
    }
}

impl RowSource for DirectorySource {
    fn read_table(&self, city: City) -> Result<RawTable> {
        let path = self.resolve(city).ok_or_else(|| Error::DatasetNotFound {
            city: city.to_string(),
            root: self.root.clone(),
        })?;
        log::debug!("reading {city} trips from {}", path.display());
        read_file(&path)
    }
}

/// Read a trip file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one trip per line
/// * `.parquet` – one column per field, any scalar type
/// * `.json`    – `[{ "Start Time": "...", ... }, ...]`
pub fn read_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "parquet" | "pq" => read_parquet(path),
        "json" => read_json(path),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut table = RawTable::new(columns, Vec::new());
    for record in reader.byte_records() {
        let record = record?;
        match csv::StringRecord::from_byte_record(record) {
            Ok(record) => table.rows.push(record.iter().map(|c| c.to_string()).collect()),
            Err(err) => {
                table.rejected.push(RejectedRow {
                    index: table.rows.len(),
                    reason: err.to_string(),
                });
                table.rows.push(Vec::new());
            }
        }
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the shape `df.to_json(orient='records')` writes.
/// Columns are the union of keys, in first-seen order.
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;
    let records = root
        .as_array()
        .ok_or_else(|| Error::InvalidJson("expected a top-level array".into()))?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| Error::InvalidJson(format!("record {i} is not an object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(RawTable::new(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Every column is rendered to text with Arrow's display formatting;
/// nulls become empty cells. Timestamp columns render as
/// `YYYY-MM-DDTHH:MM:SS`, which the loader accepts.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(batch.num_columns());
            for col in batch.columns() {
                if col.is_null(row) {
                    cells.push(String::new());
                } else {
                    cells.push(array_value_to_string(col.as_ref(), row)?);
                }
            }
            rows.push(cells);
        }
    }

    Ok(RawTable::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reports_missing_city() {
        let source = MemorySource::new().with_table(City::Chicago, RawTable::default());
        assert!(source.read_table(City::Chicago).is_ok());
        assert!(matches!(
            source.read_table(City::Washington),
            Err(Error::DatasetNotFound { .. })
        ));
    }

    #[test]
    fn column_index_ignores_padding() {
        let table = RawTable::new(vec!["".into(), " Start Time".into()], Vec::new());
        assert_eq!(table.column_index("Start Time"), Some(1));
        assert_eq!(table.column_index("Gender"), None);
    }

    #[test]
    fn undecodable_csv_rows_keep_their_position() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chicago.csv");
        let mut bytes = b"Start Time,Start Station\n2017-01-01 09:00:00,A\n2017-01-01 10:00:00,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"\n2017-01-01 11:00:00,C\n");
        std::fs::write(&path, bytes).unwrap();

        let table = read_file(&path).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2], vec!["2017-01-01 11:00:00", "C"]);
        assert!(table.rows[1].is_empty());
        assert!(table.rejection(1).is_some());
        assert_eq!(table.rejection(0), None);
        assert_eq!(table.rejection(2), None);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = read_file(Path::new("trips.xlsx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ext) if ext == "xlsx"));
    }
}
