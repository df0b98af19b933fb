//! Codecs: how a record sequence becomes bytes and back.
//!
//! Two formats ship: JSON (array of objects, via serde_json) and delimited
//! text (header row plus one row per record, via the `csv` crate). Implement
//! [`Codec`] if you need something else.

use crate::error::{Error, Result};
use crate::record::ID_FIELD;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts a record sequence to/from bytes for persistence.
///
/// Order matters: `decode(encode(s))` must give back `s` in the same order.
/// The one exception shipped here is an empty sequence given to a
/// [`CsvCodec`] that has never seen a header (see its docs).
pub trait Codec<R>: Send + Sync {
    /// Short format name, used in logs.
    fn name(&self) -> &'static str;

    /// Encode the full sequence.
    fn encode(&self, records: &[R]) -> Result<Vec<u8>>;

    /// Decode bytes into a sequence. Empty input is an error, not an empty
    /// collection.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<R>>;
}

/// On-disk format picked through the builder.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Array of per-record objects.
    #[default]
    Json,
    /// Header row of field names plus one row per record.
    Csv,
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

// ---- JSON ----------------------------------------------------------------

/// JSON codec with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl<R> Codec<R> for JsonCodec
where
    R: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, records: &[R]) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(records)
        } else {
            serde_json::to_vec(records)
        };
        bytes.map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<R>> {
        if is_blank(bytes) {
            return Err(Error::Decode("empty input".into()));
        }
        serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

// ---- CSV -----------------------------------------------------------------

/// Delimited-text codec. Fields are matched to record fields by header name,
/// so column order in the file doesn't matter on read.
///
/// Spaces and tabs around unquoted fields are dropped on read, so hand-edited
/// files may indent rows. Values that start or end with whitespace are kept
/// by quoting every field when writing them.
///
/// The codec remembers the last header row it read or wrote. An empty
/// collection can't produce a header from serde alone, so it is encoded as
/// that remembered header. A codec that never saw one encodes an empty
/// collection as empty bytes, which `decode` rejects. A store always has a
/// header by then because opening decodes the file first.
pub struct CsvCodec {
    delimiter: u8,
    header: Mutex<Option<csv::StringRecord>>,
}

impl CsvCodec {
    /// Comma-separated.
    pub fn new() -> Self {
        Self::with_delimiter(b',')
    }

    /// Custom single-byte delimiter (`b';'`, `b'\t'`, ...).
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            header: Mutex::new(None),
        }
    }

    /// The configured delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Rejects delimiters that would make rows ambiguous.
    pub(crate) fn validate_delimiter(delimiter: u8) -> Result<()> {
        match delimiter {
            b'"' | b'\n' | b'\r' => Err(Error::Config(format!(
                "delimiter {:?} collides with csv quoting or line endings",
                delimiter as char
            ))),
            d if !d.is_ascii() => Err(Error::Config(format!(
                "delimiter must be a single ascii byte, got {d:#04x}"
            ))),
            _ => Ok(()),
        }
    }

    fn reader<'a>(&self, bytes: &'a [u8]) -> csv::Reader<&'a [u8]> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::Headers)
            .from_reader(bytes)
    }

    fn write_rows<R: Serialize>(&self, records: &[R], quote: csv::QuoteStyle) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(quote)
            .from_writer(Vec::new());
        for record in records {
            wtr.serialize(record)
                .map_err(|e| Error::Encode(e.to_string()))?;
        }
        wtr.into_inner().map_err(|e| Error::Encode(e.to_string()))
    }

    /// Header of freshly written bytes, and whether any field starts or ends
    /// with a space or tab. Those only survive a read when quoted.
    fn scan(&self, bytes: &[u8]) -> Result<(csv::StringRecord, bool)> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_reader(bytes);
        let header = rdr
            .headers()
            .map_err(|e| Error::Encode(e.to_string()))?
            .clone();
        for row in rdr.records() {
            let row = row.map_err(|e| Error::Encode(e.to_string()))?;
            if row.iter().any(is_padded) {
                return Ok((header, true));
            }
        }
        Ok((header, false))
    }
}

fn is_padding(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_padded(field: &str) -> bool {
    field.starts_with(is_padding) || field.ends_with(is_padding)
}

/// Drops spaces and tabs around unquoted fields and outside the quotes of
/// quoted ones. Bytes inside quotes are left alone.
fn strip_field_padding(bytes: &[u8], delimiter: u8) -> Vec<u8> {
    let is_pad = |b: u8| (b == b' ' || b == b'\t') && b != delimiter;
    let mut out = Vec::with_capacity(bytes.len());
    let mut pending = Vec::new();
    let mut at_start = true;
    let mut quoted = false;
    let mut iter = bytes.iter().copied().peekable();

    while let Some(b) = iter.next() {
        if quoted {
            out.push(b);
            if b == b'"' {
                if iter.peek() == Some(&b'"') {
                    iter.next();
                    out.push(b'"');
                } else {
                    quoted = false;
                }
            }
            continue;
        }
        if b == delimiter || b == b'\n' || b == b'\r' {
            pending.clear();
            out.push(b);
            at_start = true;
        } else if is_pad(b) {
            if !at_start {
                pending.push(b);
            }
        } else {
            out.append(&mut pending);
            out.push(b);
            quoted = at_start && b == b'"';
            at_start = false;
        }
    }
    out
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CsvCodec {
    fn clone(&self) -> Self {
        Self {
            delimiter: self.delimiter,
            header: Mutex::new(self.header.lock().clone()),
        }
    }
}

impl std::fmt::Debug for CsvCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvCodec")
            .field("delimiter", &(self.delimiter as char))
            .finish_non_exhaustive()
    }
}

impl<R> Codec<R> for CsvCodec
where
    R: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "csv"
    }

    fn encode(&self, records: &[R]) -> Result<Vec<u8>> {
        if records.is_empty() {
            let Some(header) = self.header.lock().clone() else {
                return Ok(Vec::new());
            };
            let mut wtr = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .from_writer(Vec::new());
            wtr.write_record(&header)
                .map_err(|e| Error::Encode(e.to_string()))?;
            return wtr.into_inner().map_err(|e| Error::Encode(e.to_string()));
        }

        let bytes = self.write_rows(records, csv::QuoteStyle::Necessary)?;
        let (header, padded) = self.scan(&bytes)?;
        *self.header.lock() = Some(header);
        if padded {
            // The writer only quotes for delimiters, quotes and newlines.
            return self.write_rows(records, csv::QuoteStyle::Always);
        }
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<R>> {
        if is_blank(bytes) {
            return Err(Error::Decode("empty input".into()));
        }

        let bytes = strip_field_padding(bytes, self.delimiter);
        let mut rdr = self.reader(&bytes);
        let header = rdr
            .headers()
            .map_err(|e| Error::Decode(e.to_string()))?
            .clone();
        if !header.iter().any(|h| h == ID_FIELD) {
            return Err(Error::Decode(format!(
                "header row has no `{ID_FIELD}` column"
            )));
        }

        let mut records = Vec::new();
        for row in rdr.deserialize::<R>() {
            records.push(row.map_err(|e| Error::Decode(e.to_string()))?);
        }

        *self.header.lock() = Some(header);
        Ok(records)
    }
}
