//! Pattern scans over the sorted key index.

use log::{debug, warn};
use regex::Regex;

use crate::db::Database;
use crate::error::{Error, Result};

impl Database {
    /// Calls `on_match` with every record whose key matches the regular expression.
    ///
    /// The match is unanchored: the pattern may match any part of the key. Use `^` and `$` to pin
    /// it down. Keys are matched in their canonical spelling (for hex databases, with uppercase
    /// letters) and visited in ascending order. Returns the number of matches.
    ///
    /// The key index is snapshotted at the start, so the callback may freely modify the database.
    /// Records deleted before their turn are skipped.
    ///
    /// ```rust
    /// use memtrie::{Database, Variant};
    ///
    /// let db = Database::new(Variant::Ascii);
    /// db.add("kelly", b"1").unwrap();
    /// db.add("kellywiles", b"2").unwrap();
    /// db.add("richard", b"3").unwrap();
    ///
    /// let mut seen = Vec::new();
    /// let matched = db
    ///     .find_all("kelly.*", |key, value| seen.push((key.to_owned(), value.to_vec())))
    ///     .unwrap();
    /// assert_eq!(2, matched);
    /// assert_eq!("kellywiles", seen[1].0);
    /// ```
    ///
    /// # Errors
    ///
    /// [`Pattern`][Error::Pattern] if the expression doesn't compile. The callback is not called
    /// at all then.
    pub fn find_all<F>(&self, pattern: &str, mut on_match: F) -> Result<usize>
    where
        F: FnMut(&str, &[u8]),
    {
        let regex = Regex::new(pattern).map_err(|e| {
            warn!("Rejected pattern {:?}: {}", pattern, e);
            Error::from(e)
        })?;
        let mut matched = 0;
        for (key, value) in self.records() {
            if regex.is_match(&key) {
                on_match(&key, &value);
                matched += 1;
            }
        }
        debug!("Pattern {:?} matched {} records", pattern, matched);
        Ok(matched)
    }
}
