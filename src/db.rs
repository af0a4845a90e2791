//! The [`Database`] facade and its [`Options`].

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicIsize, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::error::Result;
use crate::key_index::KeyIndex;
use crate::outcome::{Insertion, Removal, Value};
use crate::raw::alphabet::{Ascii, Digital, Hex, Octal, Variant};
use crate::raw::Raw;

/// Configuration of a [`Database`].
///
/// ```rust
/// use memtrie::{Database, Options, Variant};
///
/// let db = Database::with_options(Options::new(Variant::Hex).node_limit(1024));
/// assert_eq!(Variant::Hex, db.variant());
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Options {
    variant: Variant,
    node_limit: Option<usize>,
}

impl Options {
    /// Default options for a database of the given variant.
    pub fn new(variant: Variant) -> Self {
        Options {
            variant,
            node_limit: None,
        }
    }

    /// Caps the number of trie nodes.
    ///
    /// An insert that would need more nodes fails with [`Error::Allocation`][crate::Error].
    pub fn node_limit(self, limit: usize) -> Self {
        Options {
            node_limit: Some(limit),
            ..self
        }
    }

    /// The chosen variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }
}

enum Tree {
    Ascii(Raw<Ascii>),
    Digital(Raw<Digital>),
    Hex(Raw<Hex>),
    Octal(Raw<Octal>),
}

macro_rules! dispatch {
    ($tree: expr, $raw: ident => $body: expr) => {
        match $tree {
            Tree::Ascii($raw) => $body,
            Tree::Digital($raw) => $body,
            Tree::Hex($raw) => $body,
            Tree::Octal($raw) => $body,
        }
    };
}

/// An in-memory key-value store indexed by a trie.
///
/// Keys are restricted to the alphabet of the [`Variant`] chosen on creation. Values are
/// arbitrary non-empty byte strings; the database keeps its own copy.
///
/// Besides the trie, the database keeps a sorted index of the keys, used for ordered traversal
/// ([`walk`][Database::walk], [`save`][Database::save]) and pattern scans
/// ([`find_all`][Database::find_all]).
///
/// All the methods take `&self` and the database can be shared between threads. Inserts of
/// different keys run lock-free through the trie and only touch a lock when a new key enters the
/// index. However, adding and deleting the *same* key concurrently is not coordinated and may
/// leave the index briefly (or, in the worst case, permanently) disagreeing with the trie. Callers
/// doing that need to serialize such operations.
///
/// ```rust
/// use memtrie::{Database, Variant};
///
/// let db = Database::new(Variant::Ascii);
/// db.add("wiles", b"Never was here.").unwrap();
/// db.add("kelly", b"Wiles was here.").unwrap();
///
/// assert_eq!(&b"Wiles was here."[..], &*db.find("kelly").unwrap().unwrap());
/// assert!(db.find("kel").unwrap().is_none());
/// assert_eq!(vec!["kelly", "wiles"], db.keys());
/// ```
pub struct Database {
    variant: Variant,
    tree: Tree,
    keys: Mutex<KeyIndex>,
    // Signed, so a racing delete overtaking its add doesn't wrap around.
    records: AtomicIsize,
}

impl Database {
    /// Creates an empty database bound to the variant.
    pub fn new(variant: Variant) -> Self {
        Self::with_options(Options::new(variant))
    }

    /// Creates an empty database with the given configuration.
    pub fn with_options(options: Options) -> Self {
        let limit = options.node_limit;
        let tree = match options.variant {
            Variant::Ascii => Tree::Ascii(Raw::with_node_limit(limit)),
            Variant::Digital => Tree::Digital(Raw::with_node_limit(limit)),
            Variant::Hex => Tree::Hex(Raw::with_node_limit(limit)),
            Variant::Octal => Tree::Octal(Raw::with_node_limit(limit)),
        };
        debug!(
            "Created {} database (node limit {:?})",
            options.variant, limit
        );
        Database {
            variant: options.variant,
            tree,
            keys: Mutex::new(KeyIndex::new()),
            records: AtomicIsize::new(0),
        }
    }

    /// The variant the database is bound to.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Stores a value under the key, replacing the previous one.
    ///
    /// The key is stored in its canonical spelling. For [`Variant::Hex`] that means upper case
    /// letters: after adding `"a34f"`, [`keys`][Database::keys], the scan and export callbacks all
    /// report `"A34F"`. Lookups and deletes accept either case.
    ///
    /// # Errors
    ///
    /// * [`InvalidCharacter`][crate::Error::InvalidCharacter] if the key doesn't fit the variant.
    /// * [`EmptyKey`][crate::Error::EmptyKey] and [`EmptyValue`][crate::Error::EmptyValue].
    /// * [`Allocation`][crate::Error::Allocation] if the trie can't grow. Nothing is stored
    ///   in that case.
    pub fn add(&self, key: &str, value: &[u8]) -> Result<Insertion> {
        let key = self.variant.canonical(key)?;
        let pin = crossbeam_epoch::pin();
        let inserted = dispatch!(&self.tree, raw => raw.insert(&key, value, &pin))?;
        if inserted.is_new() {
            self.keys.lock().insert(&key);
            self.records.fetch_add(1, Ordering::AcqRel);
        }
        trace!("Added {:?} (new: {})", key, inserted.is_new());
        Ok(inserted)
    }

    /// Looks up the value stored under the key.
    ///
    /// The returned value is a snapshot; later updates of the key don't change it.
    pub fn find(&self, key: &str) -> Result<Option<Value>> {
        let pin = crossbeam_epoch::pin();
        let found = dispatch!(&self.tree, raw => raw.get(key, &pin))?;
        Ok(found.cloned())
    }

    /// Deletes the key, returning the value it held.
    pub fn delete(&self, key: &str) -> Result<Removal> {
        let key = self.variant.canonical(key)?;
        let pin = crossbeam_epoch::pin();
        let removed = dispatch!(&self.tree, raw => raw.remove(&key, &pin))?;
        if removed.is_deleted() {
            self.keys.lock().remove(&key);
            self.records.fetch_sub(1, Ordering::AcqRel);
        }
        trace!("Deleted {:?} (found: {})", key, removed.is_deleted());
        Ok(removed)
    }

    /// Number of records, as counted by the database.
    pub fn count(&self) -> usize {
        self.records.load(Ordering::Acquire).max(0) as usize
    }

    /// Number of records, as counted by the trie itself.
    ///
    /// When no modification is in flight, this is the same as [`count`][Database::count].
    pub fn trie_count(&self) -> usize {
        dispatch!(&self.tree, raw => raw.count())
    }

    /// Checks for emptiness.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// All the keys, in their canonical spelling and ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().iter().map(str::to_owned).collect()
    }

    /// Number of keys in the sorted index.
    pub fn index_len(&self) -> usize {
        self.keys.lock().len()
    }

    /// Live keys as seen by the trie, with their values, in ascending order.
    ///
    /// This is independent of the sorted index and is meant for cross-checking the two.
    pub fn trie_records(&self) -> Vec<(String, Value)> {
        let pin = crossbeam_epoch::pin();
        let records = dispatch!(&self.tree, raw => raw
            .iter(&pin)
            .map(|(key, value)| (key, Value::clone(value)))
            .collect());
        records
    }

    /// The current records in ascending key order.
    ///
    /// The index is snapshotted first and the values are fetched afterwards. Keys deleted in
    /// between are skipped.
    pub(crate) fn records(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.keys().into_iter().filter_map(move |key| {
            let value = self.find(&key).ok().flatten();
            if value.is_none() {
                trace!("Record {:?} disappeared during traversal", key);
            }
            value.map(|value| (key, value))
        })
    }
}

impl Debug for Database {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.debug_struct("Database")
            .field("variant", &self.variant)
            .field("records", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_utils::thread;

    use super::*;
    use crate::error::Error;

    const TEST_THREADS: usize = 4;
    const TEST_BATCH: usize = 1000;

    fn find(db: &Database, key: &str) -> Option<Vec<u8>> {
        db.find(key).unwrap().map(|v| v.to_vec())
    }

    fn assert_counts(db: &Database, expected: usize) {
        assert_eq!(expected, db.count());
        assert_eq!(expected, db.trie_count());
        assert_eq!(expected, db.index_len());
        let from_trie = db
            .trie_records()
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        assert_eq!(db.keys(), from_trie);
    }

    #[test]
    fn create_destroy() {
        for variant in &Variant::ALL {
            let db = Database::new(*variant);
            assert_eq!(*variant, db.variant());
            assert!(db.is_empty());
            assert_counts(&db, 0);
            drop(db);
        }
    }

    #[test]
    fn prefix_keys() {
        let db = Database::new(Variant::Ascii);
        assert!(db.add("kelly", b"A").unwrap().is_new());
        assert!(db.add("kellywiles", b"B").unwrap().is_new());
        assert_eq!(Some(b"A".to_vec()), find(&db, "kelly"));
        assert_eq!(Some(b"B".to_vec()), find(&db, "kellywiles"));
        assert!(find(&db, "kellyw").is_none());
        assert!(find(&db, "kell").is_none());
        assert_counts(&db, 2);
    }

    #[test]
    fn update_keeps_count() {
        let db = Database::new(Variant::Ascii);
        db.add("richard", b"Kelly was here.").unwrap();
        let updated = db.add("richard", b"Updated.").unwrap();
        assert_eq!(
            Insertion::Updated(Value::from(&b"Kelly was here."[..])),
            updated
        );
        assert_eq!(Some(b"Updated.".to_vec()), find(&db, "richard"));
        assert_counts(&db, 1);
    }

    #[test]
    fn delete_and_reinsert() {
        let db = Database::new(Variant::Digital);
        for key in &["012345", "678", "123", "01234"] {
            db.add(key, key.as_bytes()).unwrap();
        }
        assert_counts(&db, 4);

        assert!(db.delete("123").unwrap().is_deleted());
        assert!(find(&db, "123").is_none());
        assert_eq!(Removal::NotFound, db.delete("123").unwrap());
        assert_eq!(Removal::NotFound, db.delete("9").unwrap());
        assert_counts(&db, 3);
        assert_eq!(vec!["01234", "012345", "678"], db.keys());

        assert!(db.add("123", b"back").unwrap().is_new());
        assert_eq!(Some(b"back".to_vec()), find(&db, "123"));
        assert_eq!(vec!["01234", "012345", "123", "678"], db.keys());
        assert_counts(&db, 4);
    }

    #[test]
    fn walk_order() {
        let db = Database::new(Variant::Ascii);
        for key in &["wiles", "kelly", "richard"] {
            db.add(key, b"x").unwrap();
        }
        assert_eq!(vec!["kelly", "richard", "wiles"], db.keys());
    }

    #[test]
    fn invalid_character() {
        let db = Database::new(Variant::Digital);
        db.add("1", b"x").unwrap();
        assert!(matches!(
            db.add("12a", b"x"),
            Err(Error::InvalidCharacter { character: 'a', .. })
        ));
        assert!(matches!(db.find("a"), Err(Error::InvalidCharacter { .. })));
        assert!(matches!(db.delete("a"), Err(Error::InvalidCharacter { .. })));
        assert_counts(&db, 1);
    }

    #[test]
    fn rejected_values() {
        let db = Database::new(Variant::Octal);
        assert!(matches!(db.add("17", b""), Err(Error::EmptyValue)));
        assert!(matches!(db.add("", b"x"), Err(Error::EmptyKey)));
        assert_counts(&db, 0);
    }

    #[test]
    fn hex_case_insensitive() {
        let db = Database::new(Variant::Hex);
        assert!(db.add("a34f", b"A33F was here.").unwrap().is_new());
        assert!(!db.add("A34F", b"again").unwrap().is_new());
        assert_eq!(vec!["A34F"], db.keys());
        let mut reported = Vec::new();
        db.find_all("4", |key, _| reported.push(key.to_owned()))
            .unwrap();
        assert_eq!(vec!["A34F"], reported);
        assert!(db.delete("a34F").unwrap().is_deleted());
        assert_counts(&db, 0);
    }

    /// A key as long as this makes the trie just as deep.
    #[test]
    fn long_key_drop() {
        let key = "7".repeat(100_000);
        let db = Database::new(Variant::Digital);
        assert!(db.add(&key, b"x").unwrap().is_new());
        assert_eq!(Some(b"x".to_vec()), find(&db, &key));
        assert_eq!(vec![key.clone()], db.keys());
        drop(db);
    }

    #[test]
    fn allocation_failure_changes_nothing() {
        let db = Database::with_options(Options::new(Variant::Ascii).node_limit(8));
        db.add("John Doe", b"1").unwrap_err();
        db.add("Jane", b"2").unwrap();
        assert!(matches!(db.add("Jane Doe", b"3"), Err(Error::Allocation)));
        assert!(find(&db, "Jane Doe").is_none());
        assert_eq!(Some(b"2".to_vec()), find(&db, "Jane"));
        assert_counts(&db, 1);
    }

    #[test]
    fn par_add_distinct() {
        let db = Database::new(Variant::Hex);
        thread::scope(|s| {
            for t in 0..TEST_THREADS {
                let db = &db;
                s.spawn(move |_| {
                    for i in 0..TEST_BATCH {
                        let key = format!("{:x}", i * TEST_THREADS + t);
                        assert!(db.add(&key, key.as_bytes()).unwrap().is_new());
                    }
                });
            }
        })
        .unwrap();

        assert_counts(&db, TEST_THREADS * TEST_BATCH);
        for (key, value) in db.trie_records() {
            assert_eq!(key.to_lowercase().as_bytes(), &*value);
        }
    }

    #[test]
    fn par_add_overlapping() {
        let db = Database::new(Variant::Digital);
        thread::scope(|s| {
            for _ in 0..TEST_THREADS {
                let db = &db;
                s.spawn(move |_| {
                    for i in 0..TEST_BATCH {
                        db.add(&i.to_string(), b"x").unwrap();
                    }
                });
            }
        })
        .unwrap();

        assert_counts(&db, TEST_BATCH);
    }
}
