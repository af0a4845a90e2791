//! The [`KeyIndex`] ‒ a sorted list of the stored keys.
//!
//! The trie itself knows nothing about the order the caller wants to see the keys in (apart from
//! the slot order), so the database keeps the keys in this list on the side. It holds only keys,
//! never values.

type Link = Option<Box<Entry>>;

struct Entry {
    key: Box<str>,
    next: Link,
}

/// A singly-linked list of keys, kept in ascending order.
#[derive(Default)]
pub struct KeyIndex {
    head: Link,
    len: usize,
}

impl KeyIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the link where the key belongs: the first one not pointing to a smaller key.
    fn position(&mut self, key: &str) -> &mut Link {
        let mut cursor = &mut self.head;
        while cursor.as_ref().map_or(false, |entry| &*entry.key < key) {
            cursor = &mut cursor.as_mut().expect("Checked by the loop condition").next;
        }
        cursor
    }

    /// Inserts a key at its place.
    ///
    /// Returns false (and changes nothing) if the key is already present.
    pub fn insert(&mut self, key: &str) -> bool {
        let slot = self.position(key);
        if slot.as_ref().map_or(false, |entry| &*entry.key == key) {
            return false;
        }
        let next = slot.take();
        *slot = Some(Box::new(Entry {
            key: key.into(),
            next,
        }));
        self.len += 1;
        true
    }

    /// Removes the key, relinking its predecessor to its successor.
    ///
    /// Returns false if the key wasn't there.
    pub fn remove(&mut self, key: &str) -> bool {
        let slot = self.position(key);
        match slot.take() {
            Some(entry) if &*entry.key == key => {
                *slot = entry.next;
                self.len -= 1;
                true
            }
            other => {
                // Not ours, put it back.
                *slot = other;
                false
            }
        }
    }

    /// Checks if the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.iter()
            .take_while(|k| *k <= key)
            .any(|k| k == key)
    }

    /// Number of keys in the index.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks for emptiness.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterates through the keys in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

impl Drop for KeyIndex {
    fn drop(&mut self) {
        // Unlink one by one, so a long list doesn't overflow the stack by recursive drops.
        let mut cursor = self.head.take();
        while let Some(mut entry) = cursor {
            cursor = entry.next.take();
        }
    }
}

/// Iterator over the keys of a [`KeyIndex`], in ascending order.
pub struct Iter<'a> {
    next: Option<&'a Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.next.map(|entry| {
            self.next = entry.next.as_deref();
            &*entry.key
        })
    }
}

impl<'a> IntoIterator for &'a KeyIndex {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(index: &KeyIndex) -> Vec<&str> {
        index.iter().collect()
    }

    #[test]
    fn sorted_insert() {
        let mut index = KeyIndex::new();
        assert!(index.is_empty());
        for key in &["wiles", "kelly", "richard", "kellywiles", "a", "zz"] {
            assert!(index.insert(key));
        }
        assert_eq!(
            vec!["a", "kelly", "kellywiles", "richard", "wiles", "zz"],
            keys(&index)
        );
        assert_eq!(6, index.len());
        assert!(!index.is_empty());
    }

    #[test]
    fn duplicate_insert() {
        let mut index = KeyIndex::new();
        assert!(index.insert("b"));
        assert!(index.insert("a"));
        assert!(!index.insert("b"));
        assert!(!index.insert("a"));
        assert_eq!(vec!["a", "b"], keys(&index));
        assert_eq!(2, index.len());
    }

    #[test]
    fn remove_head() {
        let mut index = KeyIndex::new();
        index.insert("a");
        index.insert("b");
        assert!(index.remove("a"));
        assert_eq!(vec!["b"], keys(&index));
    }

    /// Removing from the middle must take out exactly the matching entry, not its predecessor.
    #[test]
    fn remove_middle() {
        let mut index = KeyIndex::new();
        for key in &["a", "b", "c", "d"] {
            index.insert(key);
        }
        assert!(index.remove("c"));
        assert_eq!(vec!["a", "b", "d"], keys(&index));
        assert!(index.remove("d"));
        assert_eq!(vec!["a", "b"], keys(&index));
        assert_eq!(2, index.len());
        assert!(index.contains("b"));
        assert!(!index.contains("c"));
    }

    #[test]
    fn remove_missing() {
        let mut index = KeyIndex::new();
        assert!(!index.remove("x"));
        index.insert("a");
        index.insert("c");
        assert!(!index.remove("b"));
        assert!(!index.remove("0"));
        assert!(!index.remove("z"));
        assert_eq!(vec!["a", "c"], keys(&index));
        assert_eq!(2, index.len());
    }

    #[test]
    fn reinsert_after_remove() {
        let mut index = KeyIndex::new();
        index.insert("m");
        index.insert("k");
        index.remove("m");
        assert!(index.insert("m"));
        index.insert("l");
        assert_eq!(vec!["k", "l", "m"], keys(&index));
    }

    #[test]
    fn long_list_drops() {
        let mut index = KeyIndex::new();
        // Descending, so each insert goes to the head and the test stays fast.
        for i in (0..100_000).rev() {
            index.insert(&format!("{:06}", i));
        }
        assert_eq!(100_000, index.len());
        assert_eq!(Some("000000"), index.iter().next());
        drop(index);
    }
}
