//! Enumerated domains of an XAS entry: element, absorption edge, mode and the
//! entry/sub-entry kind.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Atomic symbols, hydrogen through oganesson.
pub const ATOMIC_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// X-ray absorption edges (core excitation states).
pub const XRAY_EDGES: [&str; 22] = [
    "K", "L1", "L2", "L3", "M1", "M2", "M3", "M4", "M5", "N1", "N2", "N3", "N4", "N5", "N6", "N7",
    "O1", "O2", "O3", "P1", "P2", "P3",
];

/// A chemical element, by atomic symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Element(&'static str);

impl Element {
    pub fn symbol(&self) -> &'static str {
        self.0
    }

    /// Atomic number.
    pub fn number(&self) -> usize {
        ATOMIC_SYMBOLS
            .iter()
            .position(|symbol| *symbol == self.0)
            .map_or(0, |index| index + 1)
    }
}

impl FromStr for Element {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ATOMIC_SYMBOLS
            .iter()
            .find(|symbol| symbol.eq_ignore_ascii_case(s))
            .map(|symbol| Element(*symbol))
            .ok_or_else(|| Error::validation(format!("'{s}' is not an atomic symbol")))
    }
}

/// An absorption edge name such as `K` or `L3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Edge(&'static str);

impl Edge {
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl FromStr for Edge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        XRAY_EDGES
            .iter()
            .find(|edge| edge.eq_ignore_ascii_case(s))
            .map(|edge| Edge(*edge))
            .ok_or_else(|| Error::validation(format!("'{s}' is not an absorption edge")))
    }
}

/// How intensity was derived from the detector signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum XasMode {
    Transmission,
    FluorescenceYield,
}

impl XasMode {
    pub const ALL: [XasMode; 2] = [XasMode::Transmission, XasMode::FluorescenceYield];

    pub fn as_str(&self) -> &'static str {
        match self {
            XasMode::Transmission => "transmission",
            XasMode::FluorescenceYield => "fluorescence yield",
        }
    }

    /// The mode name with spaces replaced, for use in paths and file names.
    pub fn slug(&self) -> String {
        self.as_str().replace(' ', "_")
    }
}

impl FromStr for XasMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', " ").to_lowercase().as_str() {
            "transmission" => Ok(XasMode::Transmission),
            "fluorescence yield" => Ok(XasMode::FluorescenceYield),
            other => Err(Error::validation(format!("'{other}' is not an XAS mode"))),
        }
    }
}

/// Top-level entry or a sub-entry nested in a shared entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    #[default]
    #[serde(rename = "NXentry")]
    Entry,
    #[serde(rename = "NXsubentry")]
    SubEntry,
}

impl EntryKind {
    pub fn nx_class(&self) -> &'static str {
        match self {
            EntryKind::Entry => "NXentry",
            EntryKind::SubEntry => "NXsubentry",
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty => $as_str:ident),* $(,)?) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = Error;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.$as_str().to_string()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.$as_str())
                }
            }
        )*
    };
}

string_conversions!(Element => symbol, Edge => name, XasMode => as_str);

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nx_class())
    }
}
