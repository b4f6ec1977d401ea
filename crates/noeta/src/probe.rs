//! Schema probing of data files named by `load`.
//!
//! [`FileProbe`] reads the header and a bounded sample of a CSV file, the
//! leading records of a JSON array, the first rows of an Excel sheet, or the
//! footer schema of a Parquet file, and infers one [`DataType`] per column.
//! Any failure to open or decode the file yields an empty schema, which the
//! analyzer treats as unknown.

use std::{fmt, fs::File, io::BufReader, path::Path};

use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use indexmap::IndexMap;
use log::{debug, warn};
use parquet::{
    basic::{ConvertedType, Repetition, Type as PhysicalType},
    file::reader::{FileReader, SerializedFileReader},
};
use serde::de::{DeserializeSeed, Deserializer, SeqAccess, Visitor};

use noeta_core::{ColumnInfo, DataType};
use noeta_parser::{SchemaProbe, ast::FileFormat};

/// Reads schemas from data files on disk.
#[derive(Debug, Clone)]
pub struct FileProbe {
    sample_rows: usize,
}

impl Default for FileProbe {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FileProbe {
    /// Create a probe that looks at no more than `sample_rows` rows per file.
    pub fn new(sample_rows: usize) -> Self {
        Self { sample_rows }
    }

    fn probe_csv(&self, path: &Path) -> Result<IndexMap<String, ColumnInfo>, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let mut inferred: Vec<Inference> = vec![Inference::default(); headers.len()];

        for record in reader.records().take(self.sample_rows) {
            let record = record?;
            for (idx, inference) in inferred.iter_mut().enumerate() {
                inference.observe_text(record.get(idx).unwrap_or_default());
            }
        }

        Ok(headers
            .iter()
            .zip(inferred)
            .map(|(name, inference)| (name.to_string(), inference.into_column(name)))
            .collect())
    }

    fn probe_json(&self, path: &Path) -> Result<IndexMap<String, ColumnInfo>, serde_json::Error> {
        let file = File::open(path).map_err(serde_json::Error::io)?;
        let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(file));

        let mut records = Vec::new();
        let outcome = LeadingRecords {
            records: &mut records,
            limit: self.sample_rows,
        }
        .deserialize(&mut deserializer);
        // Reading stops at the limit, so the rest of the array is never checked.
        if records.len() < self.sample_rows {
            outcome?;
        }

        let mut columns: IndexMap<String, Inference> = IndexMap::new();
        let mut seen = 0;
        for record in &records {
            let Some(object) = record.as_object() else {
                continue;
            };
            for (name, inference) in columns.iter_mut() {
                if !object.contains_key(name) {
                    inference.nullable = true;
                }
            }
            for (name, cell) in object {
                let inference = columns.entry(name.clone()).or_insert_with(|| Inference {
                    // A key first seen after the first record was missing before.
                    nullable: seen > 0,
                    ..Inference::default()
                });
                inference.observe(Cell::from_json(cell));
            }
            seen += 1;
        }

        Ok(columns
            .into_iter()
            .map(|(name, inference)| {
                let column = inference.into_column(&name);
                (name, column)
            })
            .collect())
    }

    /// The first sheet's header row and up to `sample_rows` rows below it.
    fn probe_excel(&self, path: &Path) -> Result<IndexMap<String, ColumnInfo>, calamine::Error> {
        let mut workbook = open_workbook_auto(path)?;
        let Some(range) = workbook.worksheet_range_at(0) else {
            return Ok(IndexMap::new());
        };
        let range = range?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(IndexMap::new());
        };
        let mut inferred: Vec<Inference> = vec![Inference::default(); header.len()];

        for row in rows.take(self.sample_rows) {
            for (idx, inference) in inferred.iter_mut().enumerate() {
                inference.observe(row.get(idx).map_or(Cell::Null, Cell::from_excel));
            }
        }

        Ok(header
            .iter()
            .map(ToString::to_string)
            .zip(inferred)
            .map(|(name, inference)| {
                let column = inference.into_column(&name);
                (name, column)
            })
            .collect())
    }

    /// Top-level fields of the schema stored in the file footer.
    fn probe_parquet(
        &self,
        path: &Path,
    ) -> Result<IndexMap<String, ColumnInfo>, parquet::errors::ParquetError> {
        let reader = SerializedFileReader::new(File::open(path)?)?;
        let schema = reader.metadata().file_metadata().schema_descr();

        Ok(schema
            .root_schema()
            .get_fields()
            .iter()
            .map(|field| {
                let info = field.get_basic_info();
                let dtype = if field.is_primitive() {
                    parquet_type(field.get_physical_type(), info.converted_type())
                } else {
                    DataType::Unknown
                };
                let nullable = info.has_repetition() && info.repetition() == Repetition::OPTIONAL;
                let column = ColumnInfo::new(field.name(), dtype).with_nullable(nullable);
                (field.name().to_string(), column)
            })
            .collect())
    }
}

fn parquet_type(physical: PhysicalType, converted: ConvertedType) -> DataType {
    match converted {
        ConvertedType::UTF8 | ConvertedType::ENUM | ConvertedType::JSON => return DataType::String,
        ConvertedType::DATE
        | ConvertedType::TIMESTAMP_MILLIS
        | ConvertedType::TIMESTAMP_MICROS => return DataType::Datetime,
        _ => {}
    }
    match physical {
        PhysicalType::BOOLEAN => DataType::Boolean,
        PhysicalType::INT32 | PhysicalType::INT64 | PhysicalType::FLOAT | PhysicalType::DOUBLE => {
            DataType::Numeric
        }
        PhysicalType::INT96 => DataType::Datetime,
        _ => DataType::Unknown,
    }
}

/// Collects no more than `limit` leading elements of a JSON array.
struct LeadingRecords<'a> {
    records: &'a mut Vec<serde_json::Value>,
    limit: usize,
}

impl<'de> DeserializeSeed<'de> for LeadingRecords<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for LeadingRecords<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let Self { records, limit } = self;
        while records.len() < limit {
            match seq.next_element()? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        Ok(())
    }
}

impl SchemaProbe for FileProbe {
    fn probe(&self, path: &str, format: FileFormat) -> IndexMap<String, ColumnInfo> {
        let file_path = Path::new(path);
        let result = match format {
            FileFormat::Csv => self.probe_csv(file_path).map_err(|err| err.to_string()),
            FileFormat::Json => self.probe_json(file_path).map_err(|err| err.to_string()),
            FileFormat::Excel => self.probe_excel(file_path).map_err(|err| err.to_string()),
            FileFormat::Parquet => self.probe_parquet(file_path).map_err(|err| err.to_string()),
        };

        match result {
            Ok(columns) => {
                debug!(path = path, columns = columns.len(); "Probed schema");
                columns
            }
            Err(err) => {
                warn!(path = path, err = err.as_str(); "Could not probe schema");
                IndexMap::new()
            }
        }
    }
}

/// The shape of one sampled cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Null,
    Number,
    Boolean,
    Text,
    Datetime,
    Other,
}

impl Cell {
    fn from_json(cell: &serde_json::Value) -> Self {
        use serde_json::Value;

        match cell {
            Value::Null => Cell::Null,
            Value::Number(_) => Cell::Number,
            Value::Bool(_) => Cell::Boolean,
            Value::String(_) => Cell::Text,
            Value::Array(_) | Value::Object(_) => Cell::Other,
        }
    }

    fn from_excel(cell: &Data) -> Self {
        match cell {
            Data::Empty => Cell::Null,
            Data::Int(_) | Data::Float(_) => Cell::Number,
            Data::Bool(_) => Cell::Boolean,
            Data::String(text) if text.trim().is_empty() => Cell::Null,
            Data::String(_) => Cell::Text,
            Data::DateTime(_) | Data::DateTimeIso(_) => Cell::Datetime,
            _ => Cell::Other,
        }
    }
}

/// Running type guess for one column.
#[derive(Debug, Clone)]
struct Inference {
    values: usize,
    numeric: bool,
    datetime: bool,
    boolean: bool,
    text: bool,
    nullable: bool,
}

impl Default for Inference {
    fn default() -> Self {
        Self {
            values: 0,
            numeric: true,
            datetime: true,
            boolean: true,
            text: true,
            nullable: false,
        }
    }
}

impl Inference {
    /// CSV cells are untyped text, so every cell also counts as a string.
    fn observe_text(&mut self, cell: &str) {
        let cell = cell.trim();
        if cell.is_empty() {
            self.nullable = true;
            return;
        }
        self.values += 1;
        self.numeric &= cell.parse::<f64>().is_ok();
        self.boolean &= matches!(cell.to_lowercase().as_str(), "true" | "false");
        self.datetime = false;
    }

    fn observe(&mut self, cell: Cell) {
        if cell == Cell::Null {
            self.nullable = true;
            return;
        }
        self.values += 1;
        self.numeric &= cell == Cell::Number;
        self.datetime &= cell == Cell::Datetime;
        self.boolean &= cell == Cell::Boolean;
        self.text &= cell == Cell::Text;
    }

    fn into_column(self, name: &str) -> ColumnInfo {
        let dtype = if self.values == 0 {
            DataType::Unknown
        } else if self.numeric {
            DataType::Numeric
        } else if self.datetime {
            DataType::Datetime
        } else if self.boolean {
            DataType::Boolean
        } else if self.text {
            DataType::String
        } else {
            DataType::Unknown
        };
        ColumnInfo::new(name, dtype).with_nullable(self.nullable)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp file");
        file
    }

    fn probe(file: &NamedTempFile, format: FileFormat) -> IndexMap<String, ColumnInfo> {
        FileProbe::default().probe(&file.path().to_string_lossy(), format)
    }

    #[test]
    fn test_csv_types() {
        let file = temp_file(
            ".csv",
            "region,price,active\nnorth,10.5,true\nsouth,,false\neast,3,TRUE\n",
        );
        let columns = probe(&file, FileFormat::Csv);

        assert_eq!(
            columns.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["region", "price", "active"]
        );
        assert_eq!(columns["region"].dtype(), DataType::String);
        assert_eq!(columns["price"].dtype(), DataType::Numeric);
        assert!(columns["price"].is_nullable());
        assert_eq!(columns["active"].dtype(), DataType::Boolean);
        assert!(!columns["active"].is_nullable());
    }

    #[test]
    fn test_csv_sample_limit() {
        let file = temp_file(".csv", "code\n1\n2\nabc\n");
        let columns = FileProbe::new(2).probe(&file.path().to_string_lossy(), FileFormat::Csv);
        assert_eq!(columns["code"].dtype(), DataType::Numeric);

        let columns = FileProbe::new(3).probe(&file.path().to_string_lossy(), FileFormat::Csv);
        assert_eq!(columns["code"].dtype(), DataType::String);
    }

    #[test]
    fn test_csv_header_only() {
        let file = temp_file(".csv", "a,b\n");
        let columns = probe(&file, FileFormat::Csv);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns["a"].dtype(), DataType::Unknown);
    }

    #[test]
    fn test_json_records() {
        let file = temp_file(
            ".json",
            r#"[{"name": "a", "score": 1.5, "ok": true}, {"name": "b", "score": null, "ok": false, "extra": 1}]"#,
        );
        let columns = probe(&file, FileFormat::Json);

        assert_eq!(
            columns.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["name", "score", "ok", "extra"]
        );
        assert_eq!(columns["name"].dtype(), DataType::String);
        assert_eq!(columns["score"].dtype(), DataType::Numeric);
        assert!(columns["score"].is_nullable());
        assert_eq!(columns["ok"].dtype(), DataType::Boolean);
        assert!(columns["extra"].is_nullable());
    }

    #[test]
    fn test_json_reads_only_leading_records() {
        // Everything after the sampled records is malformed and never read.
        let file = temp_file(".json", r#"[{"code": 1}, {"code": 2}, {"code": "x"}, oops"#);
        let path = file.path().to_string_lossy();

        let columns = FileProbe::new(2).probe(&path, FileFormat::Json);
        assert_eq!(columns["code"].dtype(), DataType::Numeric);

        let columns = FileProbe::new(3).probe(&path, FileFormat::Json);
        assert_eq!(columns["code"].dtype(), DataType::Unknown);

        assert!(FileProbe::new(5).probe(&path, FileFormat::Json).is_empty());
    }

    #[test]
    fn test_excel_first_sheet() {
        let file = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile()
            .expect("Failed to create temp file");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["region", "price", "active"].into_iter().enumerate() {
            sheet
                .write_string(0, col as u16, name)
                .expect("Failed to write header");
        }
        sheet.write_string(1, 0, "north").expect("Failed to write cell");
        sheet.write_number(1, 1, 10.5).expect("Failed to write cell");
        sheet.write_boolean(1, 2, true).expect("Failed to write cell");
        sheet.write_string(2, 0, "south").expect("Failed to write cell");
        sheet.write_boolean(2, 2, false).expect("Failed to write cell");
        workbook.save(file.path()).expect("Failed to save workbook");

        let columns = probe(&file, FileFormat::Excel);
        assert_eq!(
            columns.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["region", "price", "active"]
        );
        assert_eq!(columns["region"].dtype(), DataType::String);
        assert_eq!(columns["price"].dtype(), DataType::Numeric);
        assert!(columns["price"].is_nullable());
        assert_eq!(columns["active"].dtype(), DataType::Boolean);
    }

    #[test]
    fn test_parquet_footer_schema() {
        use std::sync::Arc;

        use parquet::{
            file::{properties::WriterProperties, writer::SerializedFileWriter},
            schema::parser::parse_message_type,
        };

        let file = temp_file(".parquet", "");
        let schema = parse_message_type(
            "message sales {
                REQUIRED INT64 id;
                OPTIONAL BYTE_ARRAY region (UTF8);
                OPTIONAL DOUBLE price;
                REQUIRED BOOLEAN active;
                OPTIONAL INT96 sold_at;
            }",
        )
        .expect("Failed to parse schema");
        let writer = SerializedFileWriter::new(
            file.reopen().expect("Failed to reopen temp file"),
            Arc::new(schema),
            Arc::new(WriterProperties::builder().build()),
        )
        .expect("Failed to create writer");
        writer.close().expect("Failed to write footer");

        let columns = probe(&file, FileFormat::Parquet);
        assert_eq!(
            columns.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["id", "region", "price", "active", "sold_at"]
        );
        assert_eq!(columns["id"].dtype(), DataType::Numeric);
        assert!(!columns["id"].is_nullable());
        assert_eq!(columns["region"].dtype(), DataType::String);
        assert!(columns["price"].is_nullable());
        assert_eq!(columns["active"].dtype(), DataType::Boolean);
        assert_eq!(columns["sold_at"].dtype(), DataType::Datetime);
    }

    #[test]
    fn test_unreadable_files_are_unknown() {
        assert!(
            FileProbe::default()
                .probe("/definitely/not/here.csv", FileFormat::Csv)
                .is_empty()
        );

        let file = temp_file(".json", "{not json");
        assert!(probe(&file, FileFormat::Json).is_empty());

        let file = temp_file(".xlsx", "binary");
        assert!(probe(&file, FileFormat::Excel).is_empty());

        let file = temp_file(".parquet", "PAR1");
        assert!(probe(&file, FileFormat::Parquet).is_empty());
    }
}
