//! The [`Error`][crate::Error] type and the [`Result`][crate::Result] alias.

use std::io;

use thiserror::Error;

use crate::raw::alphabet::Variant;

/// Everything that can go wrong inside the database.
///
/// Misses are not errors. Looking up an absent key yields `None` and deleting one yields
/// [`Removal::NotFound`][crate::Removal::NotFound].
#[derive(Debug, Error)]
pub enum Error {
    /// A trie node could not be allocated (or the configured node limit was reached).
    ///
    /// The partial insertion has been rolled back by the time this is returned.
    #[error("Failed to allocate a trie node")]
    Allocation,

    /// The key contains a character outside of the database's alphabet.
    #[error("Character {character:?} at position {position} is not allowed in {variant} keys")]
    InvalidCharacter {
        character: char,
        position: usize,
        variant: Variant,
    },

    /// Keys must have at least one character.
    #[error("Empty keys can't be stored")]
    EmptyKey,

    /// Values must have at least one byte.
    #[error("Empty values can't be stored")]
    EmptyValue,

    /// There's neither a destination nor a handler to pass the records to.
    #[error("No destination and no record handler provided")]
    MissingCallback,

    /// The search pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Unrecognized database variant name or tag.
    #[error("Unknown database variant {0:?}")]
    UnknownVariant(String),

    /// Writing an export failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A convenience `Result` type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
