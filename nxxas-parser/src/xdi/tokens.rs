//! Data-row tokenizer
//!
//! Data rows are numbers separated by whitespace, `,`, `|` or `;`. Two numbers
//! must be separated: `1.2.3` and `1-2` are rejected instead of being read as
//! two values.

use crate::error::DecodeError;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n,|;]+")]
pub enum DataToken {
    #[regex(r"[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[+-]?(nan|NaN|NAN|inf|Inf|INF|infinity|Infinity)", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

/// Split one data row into numbers. `line` is the 1-based line number for errors.
pub fn tokenize_row(row: &str, line: usize) -> Result<Vec<f64>, DecodeError> {
    let mut lexer = DataToken::lexer(row);
    let mut values = Vec::new();
    let mut previous_end = None;

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let invalid = || DecodeError::InvalidDataToken {
            line,
            token: offending_word(row, span.start),
        };
        match token {
            Ok(DataToken::Number(value)) if previous_end != Some(span.start) => {
                values.push(value);
                previous_end = Some(span.end);
            }
            _ => return Err(invalid()),
        }
    }
    Ok(values)
}

/// The whole separator-delimited word around a byte offset.
fn offending_word(row: &str, offset: usize) -> String {
    let is_separator = |c: char| c.is_whitespace() || matches!(c, ',' | '|' | ';');
    let start = row[..offset]
        .char_indices()
        .rev()
        .find(|&(_, c)| is_separator(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let end = row[offset..]
        .find(is_separator)
        .map_or(row.len(), |i| offset + i);
    row[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("7509.0000 -0.51329170 165872.70", vec![7509.0, -0.5132917, 165872.7])]
    #[case("  1,2,3  ", vec![1.0, 2.0, 3.0])]
    #[case("1\t2 | 3", vec![1.0, 2.0, 3.0])]
    #[case("1e3 .5 -2.", vec![1000.0, 0.5, -2.0])]
    #[case("", vec![])]
    fn splits_numbers(#[case] row: &str, #[case] expected: Vec<f64>) {
        assert_eq!(tokenize_row(row, 1).unwrap(), expected);
    }

    #[test]
    fn reads_nan() {
        let values = tokenize_row("1 nan 3", 1).unwrap();
        assert!(values[1].is_nan());
    }

    #[rstest]
    #[case("1.0 abc 3", "abc")]
    #[case("1.2.3", "1.2.3")]
    #[case("1-2", "1-2")]
    #[case("7509.0 12x", "12x")]
    fn rejects_non_numeric_tokens(#[case] row: &str, #[case] token: &str) {
        let err = tokenize_row(row, 12).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidDataToken {
                line: 12,
                token: token.to_string()
            }
        );
    }

    #[test]
    fn words_after_wide_separators_are_cut_on_char_boundaries() {
        assert_eq!(offending_word("1\u{a0}abc 2", 3), "abc");
        assert_eq!(offending_word("1\u{3000}x7", 4), "x7");
        assert!(tokenize_row("1.0\u{a0}2", 4).is_err());
    }
}
