//! Writing a [`TypedStore`] back out as delimited text.

use std::io;

use csv::QuoteStyle;
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::store::TypedStore;

/// Options for [`write_csv`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Field delimiter; must be ASCII.
    pub delimiter: char,
    /// Write a header line with the field labels.
    pub include_header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

/// Write the schema fields of every row as CSV.
///
/// Data cells that do not read as numbers are always quoted. Quoted text is neither trimmed
/// nor taken for a comment on reload, so padded strings and strings starting with `#` keep
/// their exact text. Null writes as an empty quoted field and integral floats keep their `.0`.
/// Reading the output with default options and the same delimiter yields the values [`parse`]
/// produced; a hand-built `Utf8` cell that looks like a number or boolean reloads as one.
/// Extra source columns are not written.
///
/// [`parse`]: crate::ingestion::parse
pub fn write_csv<W: io::Write>(store: &TypedStore, mut writer: W, options: &ExportOptions) -> IngestionResult<()> {
    let delimiter = u8::try_from(options.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!("export delimiter {:?} is not ASCII", options.delimiter),
        })?;

    if options.include_header {
        let labels: Vec<String> = store.schema().fields.iter().map(|f| f.label()).collect();
        let style = if labels.iter().any(|l| needs_quotes(l)) {
            QuoteStyle::Always
        } else {
            QuoteStyle::Necessary
        };
        let mut header = csv_writer(delimiter, style, &mut writer);
        header.write_record(&labels)?;
        header.flush()?;
    }

    let mut wtr = csv_writer(delimiter, QuoteStyle::NonNumeric, &mut writer);
    for row in store.rows() {
        wtr.write_record(row.fields().iter().map(ToString::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_writer<W: io::Write>(delimiter: u8, style: QuoteStyle, writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(style)
        .has_headers(false)
        .from_writer(writer)
}

/// Text the loader would trim or skip as a comment if written bare.
fn needs_quotes(text: &str) -> bool {
    text.trim() != text || text.starts_with('#')
}

/// [`write_csv`] into a `String`.
pub fn to_csv_string(store: &TypedStore, options: &ExportOptions) -> IngestionResult<String> {
    let mut buf = Vec::new();
    write_csv(store, &mut buf, options)?;
    String::from_utf8(buf).map_err(|e| IngestionError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::{to_csv_string, ExportOptions};
    use crate::error::IngestionError;
    use crate::store::TypedStore;
    use crate::types::{Schema, Value};

    fn store() -> TypedStore {
        TypedStore::from_rows(
            Schema::from_names(["ID", "Name", "Score"]),
            vec![
                vec![Value::Int64(1), Value::from("Smith, J"), Value::Float64(3.0)],
                vec![Value::Int64(2), Value::from("say \"hi\""), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn writes_header_and_quotes_non_numeric_cells() {
        let out = to_csv_string(&store(), &ExportOptions::default()).unwrap();
        assert_eq!(out, "ID,Name,Score\n1,\"Smith, J\",3.0\n2,\"say \"\"hi\"\"\",\"\"\n");
    }

    #[test]
    fn header_can_be_omitted_and_delimiter_changed() {
        let opts = ExportOptions {
            delimiter: '\t',
            include_header: false,
        };
        let out = to_csv_string(&store(), &opts).unwrap();
        assert!(out.starts_with("1\t\"Smith, J\"\t3.0\n"));
    }

    #[test]
    fn padded_and_hash_labels_are_quoted_in_the_header() {
        let store = TypedStore::new(Schema::from_names(["#id", " name"]));
        let out = to_csv_string(&store, &ExportOptions::default()).unwrap();
        assert_eq!(out, "\"#id\",\" name\"\n");
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let opts = ExportOptions {
            delimiter: '§',
            ..Default::default()
        };
        let err = to_csv_string(&store(), &opts).unwrap_err();
        assert!(matches!(err, IngestionError::SchemaMismatch { .. }));
    }
}
