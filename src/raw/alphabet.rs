//! Key alphabets.
//!
//! Each database is bound to one alphabet for its whole life. The alphabet decides the fan-out of
//! the trie nodes and maps every key character onto a dense slot index.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// How many slot indices are kept on the stack before spilling to the heap.
pub(crate) const INLINE_KEY: usize = 32;

/// The slot indices a key walks through, one per character.
pub(crate) type Path = SmallVec<[u8; INLINE_KEY]>;

/// Customization of the [`Raw`][crate::raw::Raw] trie.
///
/// The mapping must be monotone over the canonical symbols (`symbol(i) < symbol(j)` whenever
/// `i < j`), so walking the trie slot by slot yields keys in ascending order.
pub trait Alphabet {
    /// Number of slots in each node.
    const SIZE: usize;

    /// The tag of the alphabet.
    const VARIANT: Variant;

    /// Maps a character to its slot, or `None` if the character is not part of the alphabet.
    fn index(ch: char) -> Option<usize>;

    /// The canonical character of a slot.
    fn symbol(idx: usize) -> char;
}

/// Printable ASCII, code points 32 to 126.
pub struct Ascii;

impl Alphabet for Ascii {
    const SIZE: usize = 95;
    const VARIANT: Variant = Variant::Ascii;

    fn index(ch: char) -> Option<usize> {
        match ch {
            ' '..='~' => Some(ch as usize - ' ' as usize),
            _ => None,
        }
    }

    fn symbol(idx: usize) -> char {
        (b' ' + idx as u8) as char
    }
}

/// Decimal digits.
pub struct Digital;

impl Alphabet for Digital {
    const SIZE: usize = 10;
    const VARIANT: Variant = Variant::Digital;

    fn index(ch: char) -> Option<usize> {
        ch.to_digit(10).map(|d| d as usize)
    }

    fn symbol(idx: usize) -> char {
        (b'0' + idx as u8) as char
    }
}

/// Hexadecimal digits, either case.
///
/// Both cases share the slots, so `"ab"` and `"AB"` are the same key. The canonical form is upper
/// case.
pub struct Hex;

impl Alphabet for Hex {
    const SIZE: usize = 16;
    const VARIANT: Variant = Variant::Hex;

    fn index(ch: char) -> Option<usize> {
        ch.to_digit(16).map(|d| d as usize)
    }

    fn symbol(idx: usize) -> char {
        if idx < 10 {
            (b'0' + idx as u8) as char
        } else {
            (b'A' + (idx - 10) as u8) as char
        }
    }
}

/// Octal digits.
pub struct Octal;

impl Alphabet for Octal {
    const SIZE: usize = 8;
    const VARIANT: Variant = Variant::Octal;

    fn index(ch: char) -> Option<usize> {
        ch.to_digit(8).map(|d| d as usize)
    }

    fn symbol(idx: usize) -> char {
        (b'0' + idx as u8) as char
    }
}

/// Translates a key into the slots it walks through.
///
/// Fails on the first character outside of the alphabet, or if the key is empty.
pub(crate) fn path<A: Alphabet>(key: &str) -> Result<Path> {
    if key.is_empty() {
        return Err(Error::EmptyKey);
    }
    key.chars()
        .enumerate()
        .map(|(position, character)| {
            A::index(character)
                .map(|idx| idx as u8)
                .ok_or(Error::InvalidCharacter {
                    character,
                    position,
                    variant: A::VARIANT,
                })
        })
        .collect()
}

/// Rewrites the key into its canonical spelling.
pub fn canonical<A: Alphabet>(key: &str) -> Result<String> {
    Ok(path::<A>(key)?
        .iter()
        .map(|&idx| A::symbol(idx as usize))
        .collect())
}

/// The alphabet a database is bound to.
///
/// The numeric values are stable and accepted by the `TryFrom<u8>` conversion.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Variant {
    /// See [`Ascii`].
    Ascii = 1,
    /// See [`Digital`].
    Digital = 2,
    /// See [`Hex`].
    Hex = 3,
    /// See [`Octal`].
    Octal = 4,
}

impl Variant {
    /// All the variants.
    pub const ALL: [Variant; 4] = [
        Variant::Ascii,
        Variant::Digital,
        Variant::Hex,
        Variant::Octal,
    ];

    /// Number of slots in each node of a trie of this variant.
    pub fn alphabet_size(self) -> usize {
        match self {
            Variant::Ascii => Ascii::SIZE,
            Variant::Digital => Digital::SIZE,
            Variant::Hex => Hex::SIZE,
            Variant::Octal => Octal::SIZE,
        }
    }

    /// Rewrites the key into its canonical spelling for this variant.
    pub fn canonical(self, key: &str) -> Result<String> {
        match self {
            Variant::Ascii => canonical::<Ascii>(key),
            Variant::Digital => canonical::<Digital>(key),
            Variant::Hex => canonical::<Hex>(key),
            Variant::Octal => canonical::<Octal>(key),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Variant::Ascii => "ascii",
            Variant::Digital => "digital",
            Variant::Hex => "hex",
            Variant::Octal => "octal",
        }
    }
}

impl Display for Variant {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Variant::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownVariant(s.to_owned()))
    }
}

impl TryFrom<u8> for Variant {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        Variant::ALL
            .iter()
            .copied()
            .find(|v| *v as u8 == tag)
            .ok_or_else(|| Error::UnknownVariant(tag.to_string()))
    }
}
