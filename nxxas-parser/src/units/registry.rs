//! Unit symbol registry
//!
//! Maps every accepted spelling of a unit (symbol, prefixed symbol, long name,
//! plural long name) to its canonical symbol. The table is built once on first
//! use.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// SI prefixes accepted in front of prefixable base symbols.
const PREFIXES: &[(&str, &str)] = &[
    ("T", "tera"),
    ("G", "giga"),
    ("M", "mega"),
    ("k", "kilo"),
    ("c", "centi"),
    ("m", "milli"),
    ("u", "micro"),
    ("µ", "micro"),
    ("n", "nano"),
    ("p", "pico"),
    ("f", "femto"),
];

/// Base symbols that take SI prefixes, with their long names.
const PREFIXABLE: &[(&str, &[&str])] = &[
    ("eV", &["electron_volt", "electronvolt"]),
    ("m", &["meter", "metre"]),
    ("A", &["ampere", "amp"]),
    ("s", &["second"]),
    ("V", &["volt"]),
    ("T", &["tesla"]),
    ("Pa", &["pascal"]),
    ("L", &["liter", "litre"]),
    ("g", &["gram"]),
    ("Hz", &["hertz"]),
    ("W", &["watt"]),
    ("J", &["joule"]),
    ("mol", &["mole"]),
    ("Ohm", &["ohm"]),
    ("C", &["coulomb"]),
    ("Gy", &["gray"]),
];

/// Symbols that never take a prefix.
const PLAIN: &[(&str, &[&str])] = &[
    ("Å", &["angstrom", "Angstrom", "ångström", "AA"]),
    ("K", &["kelvin"]),
    ("degC", &["celsius", "degree_Celsius", "°C"]),
    ("deg", &["degree", "°"]),
    ("rad", &["radian"]),
    ("mrad", &["milliradian"]),
    ("urad", &["microradian", "µrad"]),
    ("min", &["minute"]),
    ("h", &["hour", "hr"]),
    ("bar", &[]),
    ("mbar", &["millibar"]),
    ("atm", &["atmosphere"]),
    ("Torr", &["torr"]),
    ("M", &["molar"]),
    ("mM", &["millimolar"]),
    ("count", &["counts", "cts"]),
    ("%", &["percent"]),
    ("ppm", &[]),
    ("G", &["gauss"]),
    ("cm3", &["cc"]),
];

static REGISTRY: Lazy<HashMap<String, String>> = Lazy::new(build_registry);

fn build_registry() -> HashMap<String, String> {
    let mut table = HashMap::new();

    // Plain symbols are inserted last and win on collision.
    for (base, long_names) in PREFIXABLE {
        for (prefix, long_prefix) in PREFIXES {
            // `µ` and `u` spell the same prefix; `u` is canonical.
            let canonical = format!("{}{base}", prefix.replace('µ', "u"));
            table.insert(format!("{prefix}{base}"), canonical.clone());
            for long in long_names.iter() {
                table.insert(format!("{long_prefix}{long}"), canonical.clone());
                table.insert(format!("{long_prefix}{long}s"), canonical.clone());
            }
        }
    }

    for (base, long_names) in PREFIXABLE.iter().chain(PLAIN.iter()) {
        table.insert(base.to_string(), base.to_string());
        for long in long_names.iter() {
            table.insert(long.to_string(), base.to_string());
            if long.len() > 2 && long.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
                table.insert(format!("{long}s"), base.to_string());
            }
        }
    }

    table
}

/// Resolve a unit spelling to its canonical symbol.
pub fn canonical_symbol(spelling: &str) -> Option<&'static str> {
    REGISTRY.get(spelling).map(String::as_str)
}

/// Whether a spelling is a known unit symbol or name.
pub fn is_known(spelling: &str) -> bool {
    REGISTRY.contains_key(spelling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_symbols_and_long_names() {
        assert_eq!(canonical_symbol("eV"), Some("eV"));
        assert_eq!(canonical_symbol("keV"), Some("keV"));
        assert_eq!(canonical_symbol("GeV"), Some("GeV"));
        assert_eq!(canonical_symbol("electron_volt"), Some("eV"));
        assert_eq!(canonical_symbol("kiloelectron_volts"), Some("keV"));
        assert_eq!(canonical_symbol("angstrom"), Some("Å"));
        assert_eq!(canonical_symbol("meters"), Some("m"));
        assert_eq!(canonical_symbol("degrees"), Some("deg"));
    }

    #[test]
    fn micro_prefix_has_one_canonical_spelling() {
        assert_eq!(canonical_symbol("µm"), Some("um"));
        assert_eq!(canonical_symbol("um"), Some("um"));
        assert_eq!(canonical_symbol("µA"), Some("uA"));
    }

    #[test]
    fn molar_units_are_not_read_as_prefixes() {
        assert_eq!(canonical_symbol("mM"), Some("mM"));
        assert_eq!(canonical_symbol("M"), Some("M"));
    }

    #[test]
    fn unknown_spellings_are_rejected() {
        assert!(!is_known("ev"));
        assert!(!is_known("N2"));
        assert!(!is_known("mutrans"));
        assert!(!is_known(""));
    }
}
