#![allow(dead_code)] // Allow the unused structs

//! Compile fail tests
//!
//! Implemented in a minimal way, as doc tests in a hidden module.

/// ```compile_fail
/// use memtrie::raw::alphabet::Ascii;
/// use memtrie::raw::Raw;
///
/// let trie = Raw::<Ascii>::new();
/// let pin = crossbeam_epoch::pin();
/// let element = trie.get("hello", &pin).unwrap();
/// drop(pin);
/// // Must not outlive the guard
/// assert!(element.is_none());
/// ```
///
/// Keeping the guard around is fine.
///
/// ```
/// use memtrie::raw::alphabet::Ascii;
/// use memtrie::raw::Raw;
///
/// let trie = Raw::<Ascii>::new();
/// let pin = crossbeam_epoch::pin();
/// let element = trie.get("hello", &pin).unwrap();
/// assert!(element.is_none());
/// ```
struct CantOutliveGuard;

/// ```compile_fail
/// use memtrie::raw::alphabet::Octal;
/// use memtrie::raw::Raw;
///
/// let trie = Raw::<Octal>::new();
/// let pin = crossbeam_epoch::pin();
/// let element = trie.get("17", &pin).unwrap();
/// drop(trie);
/// // Must not outlive the trie
/// assert!(element.is_none());
/// ```
///
/// Dropping the trie makes it impossible to iterate either.
///
/// ```compile_fail
/// use memtrie::raw::alphabet::Octal;
/// use memtrie::raw::Raw;
///
/// let trie = Raw::<Octal>::new();
/// let pin = crossbeam_epoch::pin();
/// let mut iter = trie.iter(&pin);
/// let element = iter.next();
/// drop(trie);
/// assert!(element.is_none());
/// ```
///
/// But if we don't drop anything, everything is fine.
///
/// ```
/// use memtrie::raw::alphabet::Octal;
/// use memtrie::raw::Raw;
///
/// let trie = Raw::<Octal>::new();
/// let pin = crossbeam_epoch::pin();
/// let mut iter = trie.iter(&pin);
/// let element = iter.next();
/// assert!(element.is_none());
/// ```
struct CantExtendBeyondDestroy;

/// Found values are snapshots, nobody gets to write into them.
///
/// ```compile_fail
/// use memtrie::{Database, Variant};
///
/// let db = Database::new(Variant::Ascii);
/// db.add("key", b"value").unwrap();
/// let mut value = db.find("key").unwrap().unwrap();
/// value[0] = b'V';
/// ```
///
/// Reading is fine.
///
/// ```
/// use memtrie::{Database, Variant};
///
/// let db = Database::new(Variant::Ascii);
/// db.add("key", b"value").unwrap();
/// let value = db.find("key").unwrap().unwrap();
/// assert_eq!(b'v', value[0]);
/// ```
struct ValuesAreReadOnly;

/// The database can be both shared and sent between threads.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use memtrie::{Database, Variant};
///
/// let db = Arc::new(Database::new(Variant::Digital));
/// let handles = (0..4)
///     .map(|t| {
///         let db = Arc::clone(&db);
///         thread::spawn(move || {
///             db.add(&t.to_string(), b"x").unwrap();
///         })
///     })
///     .collect::<Vec<_>>();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// let db = Arc::try_unwrap(db).unwrap();
/// thread::spawn(move || assert_eq!(4, db.count())).join().unwrap();
/// ```
struct SendAndSync;
