//! The [`Insertion`][crate::Insertion] and [`Removal`][crate::Removal] enums.

use std::sync::Arc;

/// The stored value, shared with whoever looked it up.
pub type Value = Arc<[u8]>;

/// A simple enum to make a distinction if an insertion created a new record or overwrote an
/// existing one.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Insertion {
    /// The key was not present before.
    New,
    /// The key already held a value. This is the one that got replaced.
    Updated(Value),
}

impl Insertion {
    /// Checks if the record was newly created.
    pub fn is_new(&self) -> bool {
        match self {
            Insertion::New => true,
            Insertion::Updated(_) => false,
        }
    }

    /// Extracts the previous value, if any.
    pub fn into_previous(self) -> Option<Value> {
        match self {
            Insertion::New => None,
            Insertion::Updated(previous) => Some(previous),
        }
    }
}

/// The result of deleting a key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Removal {
    /// The key was present, this is the value it held.
    Deleted(Value),
    /// There was nothing to delete.
    NotFound,
}

impl Removal {
    /// Checks if something was actually removed.
    pub fn is_deleted(&self) -> bool {
        match self {
            Removal::Deleted(_) => true,
            Removal::NotFound => false,
        }
    }

    /// Extracts the removed value.
    pub fn into_inner(self) -> Option<Value> {
        match self {
            Removal::Deleted(value) => Some(value),
            Removal::NotFound => None,
        }
    }
}
