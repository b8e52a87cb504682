//! XDI encoder
//!
//! Renders an [`XdiRecord`] back to text in the layout the decoder reads:
//! version line, namespaced fields, column declarations, `# ///`, comments,
//! `#----`, a column-label line and the data rows. Comments starting with `-`
//! are escaped so they do not end the header.

use super::decoder::COMMENT_ESCAPE;
use super::record::{FieldValue, XdiRecord};
use std::fmt::Write;

/// Render a record as XDI text.
pub fn encode(record: &XdiRecord) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_record(&mut out, record);
    out
}

fn write_record(out: &mut String, record: &XdiRecord) -> std::fmt::Result {
    write!(out, "# XDI/{}", record.version.format)?;
    for application in &record.version.applications {
        write!(out, " {application}")?;
    }
    writeln!(out)?;

    for (index, column) in record.data.columns().iter().enumerate() {
        write!(out, "# Column.{}: {}", index + 1, column.name)?;
        if !column.values.unit().is_dimensionless() {
            write!(out, " {}", column.values.unit())?;
        }
        writeln!(out)?;
    }

    for (name, namespace) in record.namespaces() {
        let title = capitalize(name);
        for (key, value) in namespace.iter() {
            writeln!(out, "# {title}.{key}: {}", single_line(value))?;
        }
    }
    for (key, value) in record.fields.iter() {
        writeln!(out, "# {key}: {}", single_line(value))?;
    }

    writeln!(out, "# ///")?;
    for comment in &record.comments {
        writeln!(out, "# {}", escape_comment(comment))?;
    }
    writeln!(out, "#----")?;

    let names: Vec<&str> = record.data.names().collect();
    if !names.is_empty() {
        writeln!(out, "# {}", names.join(" "))?;
    }
    let columns = record.data.columns();
    for row in 0..record.data.rows() {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| {
                column
                    .values
                    .values()
                    .get(row)
                    .map_or_else(|| "NaN".to_string(), |v| v.to_string())
            })
            .collect();
        writeln!(out, "{}", cells.join(" "))?;
    }
    Ok(())
}

/// Comments that would read as the header end, or as an escaped comment,
/// get a leading backslash. The decoder strips it again.
fn escape_comment(comment: &str) -> String {
    let comment = comment.trim();
    if comment.starts_with(['-', COMMENT_ESCAPE]) {
        format!("{COMMENT_ESCAPE}{comment}")
    } else {
        comment.to_string()
    }
}

fn single_line(value: &FieldValue) -> String {
    value.to_string().replace(['\n', '\r'], " ")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitValue;
    use crate::xdi::XdiDecoder;

    fn sample() -> XdiRecord {
        let mut record = XdiRecord::default();
        record.version.applications = vec!["GSE/1.0".into()];
        record.element.insert("symbol", "Co");
        record.element.insert("edge", "K");
        record
            .facility
            .insert("energy", UnitValue::try_from((7.0, "GeV")).unwrap());
        record.comments = vec!["room temperature".into()];
        record.data.insert(
            "energy",
            UnitValue::try_from((vec![7509.0, 7519.0], "eV")).unwrap(),
        );
        record
            .data
            .insert("mutrans", UnitValue::from(vec![-0.5132917, -0.7849349]));
        record
    }

    #[test]
    fn renders_sections_in_order() {
        let text = encode(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# XDI/1.0 GSE/1.0");
        assert_eq!(lines[1], "# Column.1: energy eV");
        assert_eq!(lines[2], "# Column.2: mutrans");
        assert!(lines.contains(&"# Element.symbol: Co"));
        assert!(lines.contains(&"# Facility.energy: 7 GeV"));
        assert!(lines.contains(&"# ///"));
        assert!(lines.contains(&"# room temperature"));
        assert_eq!(lines[lines.len() - 2], "7509 -0.5132917");
        assert_eq!(lines[lines.len() - 1], "7519 -0.7849349");
    }

    #[test]
    fn decoding_the_output_restores_the_record() {
        let record = sample();
        let decoded = XdiDecoder::new().decode(&encode(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn comments_that_look_like_markers_round_trip() {
        let mut record = sample();
        record.comments = vec![
            "-5 C offset".into(),
            "second note".into(),
            "///".into(),
            "\\escaped".into(),
            "---".into(),
        ];
        let text = encode(&record);
        assert!(text.contains("# \\-5 C offset\n"));
        let decoded = XdiDecoder::new().decode(&text).unwrap();
        assert_eq!(decoded.comments, record.comments);
        assert_eq!(decoded, record);
    }
}
