use crate::core::error::UsageError;
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbol and standard atomic weight (Da) by atomic number. Elements without a stable
/// isotope carry the mass number of their longest-lived one.
#[rustfmt::skip]
static ELEMENTS: [(&str, f64); 118] = [
    ("H", 1.008),      ("He", 4.0026),    ("Li", 6.94),      ("Be", 9.0122),    ("B", 10.81),      ("C", 12.011),
    ("N", 14.007),     ("O", 15.999),     ("F", 18.998),     ("Ne", 20.180),    ("Na", 22.990),    ("Mg", 24.305),
    ("Al", 26.982),    ("Si", 28.085),    ("P", 30.974),     ("S", 32.06),      ("Cl", 35.45),     ("Ar", 39.948),
    ("K", 39.098),     ("Ca", 40.078),    ("Sc", 44.956),    ("Ti", 47.867),    ("V", 50.942),     ("Cr", 51.996),
    ("Mn", 54.938),    ("Fe", 55.845),    ("Co", 58.933),    ("Ni", 58.693),    ("Cu", 63.546),    ("Zn", 65.38),
    ("Ga", 69.723),    ("Ge", 72.630),    ("As", 74.922),    ("Se", 78.971),    ("Br", 79.904),    ("Kr", 83.798),
    ("Rb", 85.468),    ("Sr", 87.62),     ("Y", 88.906),     ("Zr", 91.224),    ("Nb", 92.906),    ("Mo", 95.95),
    ("Tc", 98.0),      ("Ru", 101.07),    ("Rh", 102.91),    ("Pd", 106.42),    ("Ag", 107.87),    ("Cd", 112.41),
    ("In", 114.82),    ("Sn", 118.71),    ("Sb", 121.76),    ("Te", 127.60),    ("I", 126.90),     ("Xe", 131.29),
    ("Cs", 132.91),    ("Ba", 137.33),    ("La", 138.91),    ("Ce", 140.12),    ("Pr", 140.91),    ("Nd", 144.24),
    ("Pm", 145.0),     ("Sm", 150.36),    ("Eu", 151.96),    ("Gd", 157.25),    ("Tb", 158.93),    ("Dy", 162.50),
    ("Ho", 164.93),    ("Er", 167.26),    ("Tm", 168.93),    ("Yb", 173.05),    ("Lu", 174.97),    ("Hf", 178.49),
    ("Ta", 180.95),    ("W", 183.84),     ("Re", 186.21),    ("Os", 190.23),    ("Ir", 192.22),    ("Pt", 195.08),
    ("Au", 196.97),    ("Hg", 200.59),    ("Tl", 204.38),    ("Pb", 207.2),     ("Bi", 208.98),    ("Po", 209.0),
    ("At", 210.0),     ("Rn", 222.0),     ("Fr", 223.0),     ("Ra", 226.0),     ("Ac", 227.0),     ("Th", 232.04),
    ("Pa", 231.04),    ("U", 238.03),     ("Np", 237.0),     ("Pu", 244.0),     ("Am", 243.0),     ("Cm", 247.0),
    ("Bk", 247.0),     ("Cf", 251.0),     ("Es", 252.0),     ("Fm", 257.0),     ("Md", 258.0),     ("No", 259.0),
    ("Lr", 266.0),     ("Rf", 267.0),     ("Db", 268.0),     ("Sg", 269.0),     ("Bh", 270.0),     ("Hs", 277.0),
    ("Mt", 278.0),     ("Ds", 281.0),     ("Rg", 282.0),     ("Cn", 285.0),     ("Nh", 286.0),     ("Fl", 289.0),
    ("Mc", 290.0),     ("Lv", 293.0),     ("Ts", 294.0),     ("Og", 294.0),
];

#[rustfmt::skip]
static SYMBOLS: Map<&'static str, u8> = phf_map! {
    "H" => 1,    "He" => 2,   "Li" => 3,   "Be" => 4,   "B" => 5,    "C" => 6,    "N" => 7,    "O" => 8,    "F" => 9,
    "Ne" => 10,  "Na" => 11,  "Mg" => 12,  "Al" => 13,  "Si" => 14,  "P" => 15,   "S" => 16,   "Cl" => 17,  "Ar" => 18,
    "K" => 19,   "Ca" => 20,  "Sc" => 21,  "Ti" => 22,  "V" => 23,   "Cr" => 24,  "Mn" => 25,  "Fe" => 26,  "Co" => 27,
    "Ni" => 28,  "Cu" => 29,  "Zn" => 30,  "Ga" => 31,  "Ge" => 32,  "As" => 33,  "Se" => 34,  "Br" => 35,  "Kr" => 36,
    "Rb" => 37,  "Sr" => 38,  "Y" => 39,   "Zr" => 40,  "Nb" => 41,  "Mo" => 42,  "Tc" => 43,  "Ru" => 44,  "Rh" => 45,
    "Pd" => 46,  "Ag" => 47,  "Cd" => 48,  "In" => 49,  "Sn" => 50,  "Sb" => 51,  "Te" => 52,  "I" => 53,   "Xe" => 54,
    "Cs" => 55,  "Ba" => 56,  "La" => 57,  "Ce" => 58,  "Pr" => 59,  "Nd" => 60,  "Pm" => 61,  "Sm" => 62,  "Eu" => 63,
    "Gd" => 64,  "Tb" => 65,  "Dy" => 66,  "Ho" => 67,  "Er" => 68,  "Tm" => 69,  "Yb" => 70,  "Lu" => 71,  "Hf" => 72,
    "Ta" => 73,  "W" => 74,   "Re" => 75,  "Os" => 76,  "Ir" => 77,  "Pt" => 78,  "Au" => 79,  "Hg" => 80,  "Tl" => 81,
    "Pb" => 82,  "Bi" => 83,  "Po" => 84,  "At" => 85,  "Rn" => 86,  "Fr" => 87,  "Ra" => 88,  "Ac" => 89,  "Th" => 90,
    "Pa" => 91,  "U" => 92,   "Np" => 93,  "Pu" => 94,  "Am" => 95,  "Cm" => 96,  "Bk" => 97,  "Cf" => 98,  "Es" => 99,
    "Fm" => 100, "Md" => 101, "No" => 102, "Lr" => 103, "Rf" => 104, "Db" => 105, "Sg" => 106, "Bh" => 107, "Hs" => 108,
    "Mt" => 109, "Ds" => 110, "Rg" => 111, "Cn" => 112, "Nh" => 113, "Fl" => 114, "Mc" => 115, "Lv" => 116, "Ts" => 117,
    "Og" => 118,
};

/// A chemical element identified by its atomic number.
///
/// Atomic numbers 1 through 118 are accepted, so every `Element` value can report its
/// symbol and standard atomic weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Element(u8);

impl Element {
    pub const HYDROGEN: Element = Element(1);
    pub const CARBON: Element = Element(6);
    pub const SILICON: Element = Element(14);
    pub const GERMANIUM: Element = Element(32);

    pub fn new(atomic_number: u8) -> Result<Self, UsageError> {
        if (1..=ELEMENTS.len()).contains(&usize::from(atomic_number)) {
            Ok(Self(atomic_number))
        } else {
            Err(UsageError::UnknownElement(atomic_number))
        }
    }

    #[inline]
    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        self.entry().0
    }

    /// Standard atomic weight in Daltons.
    pub fn standard_mass(self) -> f64 {
        self.entry().1
    }

    fn entry(self) -> (&'static str, f64) {
        ELEMENTS[usize::from(self.0) - 1]
    }
}

impl TryFrom<u8> for Element {
    type Error = UsageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Element::new(value)
    }
}

impl From<Element> for u8 {
    fn from(element: Element) -> Self {
        element.0
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses an element symbol. The first letter is matched case-insensitively, the rest
    /// must be lowercase (e.g. "C", "c", "Si", "si").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let first = chars.next().ok_or(())?;
        let mut normalized = String::with_capacity(s.len());
        normalized.push(first.to_ascii_uppercase());
        normalized.extend(chars);
        SYMBOLS.get(normalized.as_str()).map(|&z| Element(z)).ok_or(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
