//! XDI decoder
//!
//! A line-oriented state machine:
//!
//! ```text
//!     Version ──> Fields ──"# ///"──> Comments ──"# ---"──> Data
//!                   └──────────────"# ---"──────────────────┘
//! ```
//!
//! Version: the first non-blank line must start with `# XDI`.
//! Fields: `# Namespace.Key: value` or `# Key: value`. `Column.N` fields declare
//!     the data columns and are kept apart from the other fields.
//! Comments: every `#` line is kept verbatim (minus the `#` prefix).
//! Data: numeric rows. `#` lines (such as a column-label line) and blank lines
//!     are skipped.
//!
//! Any header line that fits none of these shapes is an error, as is a
//! non-numeric token in a data row. Rows whose width differs from the number of
//! declared columns are padded with NaN or truncated.

use super::columns::{resolve_alias, split_column_label, AliasNamer, ColumnNamer, ARRAY_ALIASES};
use super::record::{DataTable, XdiRecord, XdiVersion};
use super::tokens::tokenize_row;
use super::values::infer_value;
use crate::error::DecodeError;
use crate::units::{Magnitude, UnitValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::BufRead;

static FIELD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*([\w.]+):\s*(.*)$").expect("valid regex"));
static HEADER_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s*-").expect("valid regex"));
/// Leads a comment that would otherwise read as a marker line.
pub(crate) const COMMENT_ESCAPE: char = '\\';

static FIELDS_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s*///").expect("valid regex"));

/// Marker that opens every XDI file.
pub const VERSION_MARKER: &str = "# XDI";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Version,
    Fields,
    Comments,
    Data,
}

/// Decodes XDI text into an [`XdiRecord`].
pub struct XdiDecoder<N: ColumnNamer = AliasNamer> {
    namer: N,
}

impl XdiDecoder<AliasNamer> {
    pub fn new() -> Self {
        Self { namer: AliasNamer }
    }
}

impl Default for XdiDecoder<AliasNamer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ColumnNamer> XdiDecoder<N> {
    /// Use a custom column namer.
    pub fn with_namer(namer: N) -> Self {
        Self { namer }
    }

    /// Decode a complete XDI text.
    pub fn decode(&self, text: &str) -> Result<XdiRecord, DecodeError> {
        let mut state = DecodeState::new();
        for (index, line) in text.lines().enumerate() {
            state.feed(index + 1, line)?;
        }
        state.finish(&self.namer)
    }

    /// Decode line by line from a reader.
    pub fn decode_reader<R: BufRead>(&self, reader: R) -> Result<XdiRecord, std::io::Error> {
        let mut state = DecodeState::new();
        for (index, line) in reader.lines().enumerate() {
            state.feed(index + 1, &line?).map_err(invalid_data)?;
        }
        state.finish(&self.namer).map_err(invalid_data)
    }
}

fn invalid_data(err: DecodeError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}

/// Whether `text` opens like an XDI file.
pub fn looks_like_xdi(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(VERSION_MARKER))
}

struct DecodeState {
    section: Section,
    record: XdiRecord,
    columns: BTreeMap<usize, String>,
    rows: Vec<(usize, Vec<f64>)>,
}

impl DecodeState {
    fn new() -> Self {
        Self {
            section: Section::Version,
            record: XdiRecord::default(),
            columns: BTreeMap::new(),
            rows: Vec::new(),
        }
    }

    fn feed(&mut self, number: usize, line: &str) -> Result<(), DecodeError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match self.section {
            Section::Version => self.version_line(number, line),
            Section::Fields => self.field_line(number, line),
            Section::Comments => self.comment_line(number, line),
            Section::Data => self.data_line(number, line),
        }
    }

    fn version_line(&mut self, number: usize, line: &str) -> Result<(), DecodeError> {
        if !line.starts_with(VERSION_MARKER) {
            return Err(DecodeError::MissingVersion {
                line: number,
                content: line.to_string(),
            });
        }
        let mut tokens = line[1..].split_whitespace();
        let format = tokens
            .next()
            .and_then(|token| token.strip_prefix("XDI/"))
            .unwrap_or_default()
            .to_string();
        self.record.version = XdiVersion {
            format,
            applications: tokens.map(str::to_string).collect(),
        };
        self.section = Section::Fields;
        Ok(())
    }

    fn field_line(&mut self, number: usize, line: &str) -> Result<(), DecodeError> {
        let invalid = || DecodeError::InvalidHeaderLine {
            line: number,
            content: line.to_string(),
        };
        if !line.starts_with('#') {
            return Err(invalid());
        }
        if HEADER_END.is_match(line) {
            self.section = Section::Data;
            return Ok(());
        }
        if FIELDS_END.is_match(line) {
            self.section = Section::Comments;
            return Ok(());
        }
        if line[1..].trim().is_empty() {
            return Ok(());
        }
        let captures = FIELD_LINE.captures(line).ok_or_else(invalid)?;
        let key = &captures[1];
        let raw_value = captures[2].trim();

        match key.split_once('.') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                let namespace = namespace.to_lowercase();
                let name = name.to_lowercase();
                if namespace == "column" {
                    let index = name.parse::<usize>().map_err(|_| DecodeError::InvalidColumn {
                        line: number,
                        index: name.clone(),
                    })?;
                    self.columns.insert(index, raw_value.to_string());
                } else {
                    self.record
                        .namespace_mut(&namespace)
                        .insert(name, infer_value(raw_value));
                }
            }
            Some(_) => return Err(invalid()),
            None => self.record.fields.insert(key, infer_value(raw_value)),
        }
        Ok(())
    }

    fn comment_line(&mut self, number: usize, line: &str) -> Result<(), DecodeError> {
        let Some(comment) = line.strip_prefix('#') else {
            return Err(DecodeError::InvalidHeaderLine {
                line: number,
                content: line.to_string(),
            });
        };
        if HEADER_END.is_match(line) {
            self.section = Section::Data;
            return Ok(());
        }
        let comment = comment.trim();
        let comment = comment.strip_prefix(COMMENT_ESCAPE).unwrap_or(comment);
        self.record.comments.push(comment.to_string());
        Ok(())
    }

    fn data_line(&mut self, number: usize, line: &str) -> Result<(), DecodeError> {
        if line.starts_with('#') {
            return Ok(());
        }
        let row = tokenize_row(line, number)?;
        if !row.is_empty() {
            self.rows.push((number, row));
        }
        Ok(())
    }

    fn finish(mut self, namer: &dyn ColumnNamer) -> Result<XdiRecord, DecodeError> {
        match self.section {
            Section::Version => return Err(DecodeError::Empty),
            Section::Fields | Section::Comments => return Err(DecodeError::MissingHeaderEnd),
            Section::Data => {}
        }

        resolve_detector_aliases(&mut self.record);

        let labels: Vec<String> = if self.columns.is_empty() {
            let width = self.rows.first().map_or(0, |(_, row)| row.len());
            (1..=width).map(|i| format!("col{i}")).collect()
        } else {
            self.columns.into_values().collect()
        };

        let width = labels.len();
        let mut series = vec![Vec::with_capacity(self.rows.len()); width];
        for (number, mut row) in self.rows {
            if row.len() != width {
                tracing::debug!(
                    line = number,
                    found = row.len(),
                    expected = width,
                    "reconciling ragged data row"
                );
                row.resize(width, f64::NAN);
            }
            for (column, value) in series.iter_mut().zip(row) {
                column.push(value);
            }
        }

        let mut data = DataTable::default();
        for (label, values) in labels.iter().zip(series) {
            let (name, unit) = split_column_label(label);
            let name = unique_column_name(&data, namer.canonical_name(&name));
            data.insert(name, UnitValue::new(Magnitude::Array(values), unit));
        }
        self.record.data = data;
        Ok(self.record)
    }
}

/// `name`, or `name_2`, `name_3`... when an earlier column already took it.
fn unique_column_name(data: &DataTable, name: String) -> String {
    if data.get(&name).is_none() {
        return name;
    }
    let unique = (2..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| data.get(candidate).is_none())
        .unwrap_or_default();
    tracing::warn!(column = %name, renamed = %unique, "duplicate column name");
    unique
}

/// Copy detector fields given under an alias to their dictionary name.
fn resolve_detector_aliases(record: &mut XdiRecord) {
    for (alias, _) in ARRAY_ALIASES {
        if let (Some(value), Some(target)) = (record.detector.get(alias).cloned(), resolve_alias(alias)) {
            record.detector.insert(target, value);
        }
    }
}
