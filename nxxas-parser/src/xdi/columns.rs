//! Column naming
//!
//! Beamlines label their columns in many ways. The decoder hands every raw
//! label to a [`ColumnNamer`], which maps it to a canonical array name. The
//! default [`AliasNamer`] normalizes case and punctuation and folds the common
//! XDI spellings (`i1`, `ifl`, `monitor`, ...) onto the dictionary names.

use crate::units::Unit;

/// Alternate spellings of dictionary array names.
pub const ARRAY_ALIASES: &[(&str, &str)] = &[
    ("monitor", "i0"),
    ("i1", "itrans"),
    ("itransmission", "itrans"),
    ("if", "ifluor"),
    ("ifl", "ifluor"),
    ("ifluo", "ifluor"),
    ("ifluorescence", "ifluor"),
    ("iref", "irefer"),
    ("ir", "irefer"),
];

/// Maps a raw column label to its canonical array name.
pub trait ColumnNamer {
    fn canonical_name(&self, raw: &str) -> String;
}

/// Lower-cases, replaces separators with `_` and resolves [`ARRAY_ALIASES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasNamer;

impl ColumnNamer for AliasNamer {
    fn canonical_name(&self, raw: &str) -> String {
        let normalized = normalize_name(raw);
        resolve_alias(&normalized)
            .map(str::to_string)
            .unwrap_or(normalized)
    }
}

/// Canonical target of an alias, if `name` is one.
pub fn resolve_alias(name: &str) -> Option<&'static str> {
    ARRAY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
}

fn normalize_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    while name.ends_with('_') {
        name.pop();
    }
    name
}

/// Split a `Column.N` value into its label and trailing unit, if the last
/// whitespace-separated word is a known unit.
pub fn split_column_label(label: &str) -> (String, Unit) {
    let label = label.trim();
    if let Some((name, last)) = label.rsplit_once(char::is_whitespace) {
        if let Ok(unit) = last.parse::<Unit>() {
            return (name.trim().to_string(), unit);
        }
    }
    (label.to_string(), Unit::dimensionless())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("energy eV", "energy", "eV")]
    #[case("mutrans", "mutrans", "")]
    #[case("energy  keV", "energy", "keV")]
    #[case("angle deg", "angle", "deg")]
    #[case("sample temperature", "sample temperature", "")]
    fn splits_trailing_unit(#[case] label: &str, #[case] name: &str, #[case] unit: &str) {
        let (parsed_name, parsed_unit) = split_column_label(label);
        assert_eq!(parsed_name, name);
        assert_eq!(parsed_unit.to_string(), unit);
    }

    #[rstest]
    #[case("Energy", "energy")]
    #[case("I1", "itrans")]
    #[case("IFL", "ifluor")]
    #[case("monitor", "i0")]
    #[case("chi.mag", "chi_mag")]
    #[case("sample temperature", "sample_temperature")]
    #[case("mutrans", "mutrans")]
    fn alias_namer(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(AliasNamer.canonical_name(raw), expected);
    }
}
