//! Ordered traversal and export of the records.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::db::Database;
use crate::error::{Error, Result};

/// Turns one record into a line of text (without the trailing newline).
pub type Format<'a> = &'a dyn Fn(&str, &[u8]) -> String;

fn write_record<W: Write>(
    out: &mut W,
    key: &str,
    value: &[u8],
    format: Option<Format>,
) -> io::Result<()> {
    match format {
        Some(format) => writeln!(out, "{}", format(key, value)),
        None => {
            // The value goes out raw, it need not be text.
            out.write_all(key.as_bytes())?;
            out.write_all(b",")?;
            out.write_all(value)?;
            out.write_all(b"\n")
        }
    }
}

impl Database {
    /// Prints all the records to standard output, in ascending key order.
    ///
    /// Each record is one line, either `key,value` or whatever the formatter makes of it. Returns
    /// the number of records printed.
    pub fn walk(&self, format: Option<Format>) -> Result<usize> {
        let stdout = io::stdout();
        let out = stdout.lock();
        self.walk_to(out, format)
    }

    /// Writes all the records into the writer, in ascending key order.
    ///
    /// Same as [`walk`][Database::walk], but with the destination of choice.
    pub fn walk_to<W: Write>(&self, mut out: W, format: Option<Format>) -> Result<usize> {
        let mut written = 0;
        for (key, value) in self.records() {
            write_record(&mut out, &key, &value, format)?;
            written += 1;
        }
        out.flush()?;
        Ok(written)
    }

    /// Exports all the records, in ascending key order.
    ///
    /// * With a destination, the file is created (or truncated) and every record is written as
    ///   one line, formatted the same way as in [`walk`][Database::walk].
    /// * With only a formatter, it is called once for each record and whatever it returns is
    ///   dropped. Getting the record somewhere is up to the formatter.
    ///
    /// Returns the number of exported records.
    ///
    /// ```rust
    /// use std::cell::RefCell;
    ///
    /// use memtrie::{Database, Variant};
    ///
    /// let db = Database::new(Variant::Digital);
    /// db.add("42", b"answer").unwrap();
    /// db.add("7", b"lucky").unwrap();
    ///
    /// let lines = RefCell::new(Vec::new());
    /// let collect = |key: &str, value: &[u8]| {
    ///     lines.borrow_mut().push(format!("{}={}", key, String::from_utf8_lossy(value)));
    ///     String::new()
    /// };
    /// assert_eq!(2, db.save(None, Some(&collect)).unwrap());
    /// assert_eq!(vec!["42=answer", "7=lucky"], lines.into_inner());
    /// ```
    ///
    /// # Errors
    ///
    /// * [`MissingCallback`][Error::MissingCallback] if there's neither a destination nor a
    ///   formatter.
    /// * [`Io`][Error::Io] if the file can't be created or written.
    pub fn save(&self, destination: Option<&Path>, format: Option<Format>) -> Result<usize> {
        match (destination, format) {
            (Some(path), format) => {
                debug!("Saving {} records into {}", self.count(), path.display());
                let file = File::create(path)?;
                let written = self.walk_to(BufWriter::new(file), format)?;
                debug!("Saved {} records into {}", written, path.display());
                Ok(written)
            }
            (None, Some(format)) => {
                let mut handed = 0;
                for (key, value) in self.records() {
                    // Getting the record anywhere is the formatter's business.
                    let _ = format(&key, &value);
                    handed += 1;
                }
                debug!("Handed {} records to the formatter", handed);
                Ok(handed)
            }
            (None, None) => Err(Error::MissingCallback),
        }
    }
}
