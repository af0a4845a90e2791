use std::marker::PhantomData;
use std::sync::atomic::Ordering;

use crossbeam_epoch::Guard;

use super::alphabet::Alphabet;
use super::{Node, Raw};
use crate::outcome::Value;

struct Level<'a> {
    node: &'a Node,
    idx: usize,
}

/// In-order iterator through a [`Raw`] trie.
///
/// Yields the canonical spelling of each live key together with its value. The order is
/// ascending, because each alphabet maps its symbols monotonically onto the slots and a node is
/// visited before its children.
///
/// The nodes and values are protected by the guard the iterator was created with. Keys inserted
/// or deleted during the iteration may or may not be seen.
pub struct Iter<'a, A> {
    pin: &'a Guard,
    levels: Vec<Level<'a>>,
    key: String,
    _alphabet: PhantomData<A>,
}

impl<'a, A: Alphabet> Iter<'a, A> {
    pub(crate) fn new(raw: &'a Raw<A>, pin: &'a Guard) -> Self {
        let mut levels = Vec::new();
        // The root holds no data (there are no empty keys), so it's fine to skip looking at it.
        if let Some(root) = unsafe { raw.root.load(Ordering::Acquire, pin).as_ref() } {
            levels.push(Level { node: root, idx: 0 });
        }
        Iter {
            pin,
            levels,
            key: String::new(),
            _alphabet: PhantomData,
        }
    }
}

impl<'a, A: Alphabet> Iterator for Iter<'a, A> {
    type Item = (String, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.levels.last_mut()?;
            if top.idx < top.node.children.len() {
                let idx = top.idx;
                top.idx += 1;
                let child = top.node.children[idx].load(Ordering::Acquire, self.pin);
                if let Some(child) = unsafe { child.as_ref() } {
                    self.key.push(A::symbol(idx));
                    self.levels.push(Level {
                        node: child,
                        idx: 0,
                    });
                    if let Some(value) = child.value(self.pin) {
                        return Some((self.key.clone(), value));
                    }
                }
            } else {
                self.levels.pop();
                // Every level but the root added one character.
                if !self.levels.is_empty() {
                    self.key.pop();
                }
            }
        }
    }
}
