//! An in-memory key-value store indexed by a trie.
//!
//! Records are stored under string keys drawn from one of four restricted alphabets (see
//! [`Variant`]): printable ASCII, decimal digits, hexadecimal digits or octal digits. They can be
//! retrieved by the exact key, by a regular expression match against the key, or by an ordered
//! traversal. The whole content can be exported into a file or handed to a callback.
//!
//! The core is a trie with a fan-out equal to the alphabet size. Each key character is one step
//! down, the value sits in the node where the key ends. Missing nodes are installed lock-free by a
//! compare-and-swap and the memory is managed through [`crossbeam_epoch`]. On top of that, the
//! [`Database`] keeps a sorted index of the keys for the ordered operations.
//!
//! ```rust
//! use memtrie::{Database, Removal, Variant};
//!
//! let db = Database::new(Variant::Ascii);
//! db.add("wiles", b"Never was here.").unwrap();
//! db.add("kelly", b"Wiles was here.").unwrap();
//! db.add("richard", b"Kelly was here.").unwrap();
//! assert_eq!(3, db.count());
//!
//! let mut out = Vec::new();
//! db.walk_to(&mut out, None).unwrap();
//! assert_eq!(
//!     "kelly,Wiles was here.\nrichard,Kelly was here.\nwiles,Never was here.\n",
//!     String::from_utf8(out).unwrap(),
//! );
//!
//! assert!(db.delete("kelly").unwrap().is_deleted());
//! assert_eq!(Removal::NotFound, db.delete("kelly").unwrap());
//! assert_eq!(2, db.count());
//! ```
//!
//! # Limitations
//!
//! * Deleting a key doesn't free the trie nodes on its path. A workload that keeps inserting and
//!   deleting ever new keys grows. The nodes are released when the database is dropped.
//! * Adding and deleting the same key from multiple threads at once is memory safe, but the sorted
//!   index may end up disagreeing with the trie. Serialize such operations.
//! * The default export format doesn't escape anything. A value containing a comma or a newline
//!   can't be told apart from the record structure.

mod db;
mod error;
mod export;
pub mod key_index;
mod outcome;
pub mod raw;
mod scan;

pub use self::db::{Database, Options};
pub use self::error::{Error, Result};
pub use self::export::Format;
pub use self::outcome::{Insertion, Removal, Value};
pub use self::raw::alphabet::Variant;

#[cfg(any(test, doctest))]
mod tests;
