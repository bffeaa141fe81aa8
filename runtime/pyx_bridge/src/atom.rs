//! Host message atoms.
//!
//! A host message is a selector plus a sequence of [`Atom`]s. Messages are
//! buffered in an [`AtomBuf`], which keeps up to [`INLINE_ATOMS`] atoms
//! inline and spills to the heap beyond that.

use std::fmt;

use pyx_eval::float_repr;
use smallvec::SmallVec;

/// Atoms stored inline before a message buffer allocates.
pub const INLINE_ATOMS: usize = 128;

/// Message buffer.
pub type AtomBuf = SmallVec<[Atom; INLINE_ATOMS]>;

/// One tagged value of a host message.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Symbol(String),
    /// An atom of a type the bridge doesn't understand (objects, pointers).
    Nothing,
}

impl Atom {
    pub fn symbol(name: impl Into<String>) -> Self {
        Atom::Symbol(name.into())
    }

    #[inline]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of an int or float atom.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Atom::Int(n) => Some(*n as f64),
            Atom::Float(x) => Some(*x),
            Atom::Symbol(_) | Atom::Nothing => None,
        }
    }

    /// Parse one whitespace-free word the way the host's text entry does:
    /// integers, then floats, otherwise a symbol.
    pub fn parse(word: &str) -> Self {
        if let Ok(n) = word.parse::<i64>() {
            return Atom::Int(n);
        }
        let numeric = word
            .trim_start_matches(['-', '+'])
            .starts_with(|c: char| c.is_ascii_digit() || c == '.');
        if numeric {
            if let Ok(x) = word.parse::<f64>() {
                return Atom::Float(x);
            }
        }
        Atom::Symbol(word.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Atom::Int(_) => "int",
            Atom::Float(_) => "float",
            Atom::Symbol(_) => "symbol",
            Atom::Nothing => "nothing",
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(n) => write!(f, "{n}"),
            Atom::Float(x) => f.write_str(&float_repr(*x)),
            Atom::Symbol(s) => f.write_str(s),
            Atom::Nothing => Ok(()),
        }
    }
}

/// Split text on whitespace into atoms.
pub fn parse_atoms(text: &str) -> AtomBuf {
    text.split_whitespace().map(Atom::parse).collect()
}

/// Reassemble atoms into source text: symbols verbatim, ints in decimal,
/// floats always with a decimal point, separated by single spaces.
/// [`Atom::Nothing`] contributes nothing.
pub fn atoms_to_text(atoms: &[Atom]) -> String {
    let mut text = String::new();
    for atom in atoms {
        if *atom == Atom::Nothing {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&atom.to_string());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_classifies_words() {
        assert_eq!(Atom::parse("42"), Atom::Int(42));
        assert_eq!(Atom::parse("-3"), Atom::Int(-3));
        assert_eq!(Atom::parse("2.5"), Atom::Float(2.5));
        assert_eq!(Atom::parse(".5"), Atom::Float(0.5));
        assert_eq!(Atom::parse("1e3"), Atom::Float(1000.0));
        assert_eq!(Atom::parse("inf"), Atom::symbol("inf"));
        assert_eq!(Atom::parse("x**2"), Atom::symbol("x**2"));
    }

    #[test]
    fn text_keeps_float_points() {
        let atoms = [
            Atom::symbol("f"),
            Atom::Int(2),
            Atom::Float(3.0),
            Atom::Nothing,
            Atom::Float(0.25),
        ];
        assert_eq!(atoms_to_text(&atoms), "f 2 3.0 0.25");
    }

    #[test]
    fn buffer_spills_past_inline_capacity() {
        let mut buf = AtomBuf::new();
        for n in 0..=INLINE_ATOMS {
            buf.push(Atom::Int(i64::try_from(n).unwrap_or_default()));
        }
        assert!(buf.spilled());
        assert_eq!(buf.len(), INLINE_ATOMS + 1);
    }

    #[test]
    fn parse_atoms_splits_on_whitespace() {
        let atoms = parse_atoms("  eval   2 ** 10 ");
        assert_eq!(
            atoms.as_slice(),
            &[
                Atom::symbol("eval"),
                Atom::Int(2),
                Atom::symbol("**"),
                Atom::Int(10)
            ]
        );
    }
}
