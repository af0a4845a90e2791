//! The core implementation of the concurrent trie data structure.
//!
//! This module contains the [`Raw`][crate::raw::Raw] type, which is the engine under the
//! [`Database`][crate::Database]. It is exposed to allow wrapping it into further APIs, but is
//! probably not the best thing for general use, as it knows nothing about key ordering or
//! pattern scans.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_epoch::{self, Atomic, Guard, Owned, Shared};
use log::warn;
use smallvec::SmallVec;

pub mod alphabet;
pub mod debug;
pub mod iterator;

use self::alphabet::{Alphabet, Path, INLINE_KEY};
use crate::error::{Error, Result};
use crate::outcome::{Insertion, Removal, Value};

/// One step of the trie.
///
/// A node stands for a prefix shared by one or more keys. It holds a value only if some key
/// terminates exactly here.
struct Node {
    /// The value of the key terminating here, null if there's none.
    data: Atomic<Value>,
    /// Number of live keys terminating at or below this node, plus inserts currently walking
    /// through it.
    use_count: AtomicUsize,
    /// The node represents a complete, non-deleted key.
    in_use: AtomicBool,
    /// One slot per symbol of the alphabet.
    children: Box<[Atomic<Node>]>,
}

impl Node {
    /// The value, if a live key terminates here.
    fn value<'g>(&'g self, pin: &'g Guard) -> Option<&'g Value> {
        if !self.in_use.load(Ordering::Acquire) {
            return None;
        }
        // The delete swaps the pointer to null before clearing the flag, so we may still see a
        // null here. The pointed-to value is protected by the pin.
        unsafe { self.data.load(Ordering::Acquire, pin).as_ref() }
    }
}

impl Node {
    /// Unlinks all the children, handing them over into `out`.
    ///
    /// Must be called only on an unreachable node.
    unsafe fn detach_children(&self, pin: &Guard, out: &mut Vec<Owned<Node>>) {
        for child in self.children.iter() {
            let child = child.swap(Shared::null(), Ordering::Relaxed, pin);
            if !child.is_null() {
                out.push(child.into_owned());
            }
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        /*
         * A node is destroyed only once it is unreachable ‒ either from the destructor of the
         * whole trie, or by the epoch collector after it got unlinked and all the threads that
         * could have seen it unpinned. So nobody else looks inside and unprotected + Relaxed is
         * fine.
         *
         * The trie is as deep as the longest key, so the subtree is torn down through an explicit
         * stack. Each node is emptied of its children before it is dropped, so the nested drops
         * never go deeper than one level.
         */
        unsafe {
            let pin = crossbeam_epoch::unprotected();
            let data = self.data.swap(Shared::null(), Ordering::Relaxed, pin);
            if !data.is_null() {
                drop(data.into_owned());
            }
            let mut pending = Vec::new();
            self.detach_children(pin, &mut pending);
            while let Some(node) = pending.pop() {
                node.detach_children(pin, &mut pending);
                drop(node);
            }
        }
    }
}

/// Counts the nodes hanging at (and including) the given one.
fn subtree_len(node: &Node, pin: &Guard) -> usize {
    let mut len = 0;
    let mut pending = vec![node];
    while let Some(node) = pending.pop() {
        len += 1;
        pending.extend(
            node.children
                .iter()
                .filter_map(|child| unsafe { child.load(Ordering::Acquire, pin).as_ref() }),
        );
    }
    len
}

/// The raw trie data structure.
///
/// This provides the low level data structure, generic over the [`Alphabet`] of the keys. The
/// fan-out of every node is the size of the alphabet and each key character is one step down.
///
/// # Concurrency
///
/// Installing a missing node into an empty slot is lock-free: concurrent inserts racing for the
/// same slot resolve through a compare-and-swap, exactly one node wins and the losers continue
/// through the winner. The per-node use counts are atomic too.
///
/// Values are swapped atomically and old ones are destroyed through [`crossbeam_epoch`], so
/// everything is memory safe in any interleaving. What is *not* promised is a meaningful result
/// of racing a delete against an insert of the same key, or an insert racing with a rollback that
/// reclaims the branch it walks through. Serialize those externally if it matters.
///
/// As a general rule, lookups take the [`crossbeam_epoch`] [`Guard`] and return data borrowed
/// for as long as the guard lives.
///
/// # Memory
///
/// Nodes are never freed on delete. A deleted key leaves its path in place, so re-inserting it
/// doesn't need to allocate and readers walking the path never see it vanish. Nodes are freed
/// only when an insert fails to allocate and rolls back its partial path, or when the whole trie
/// is dropped.
pub struct Raw<A: Alphabet> {
    root: Atomic<Node>,
    nodes: AtomicUsize,
    node_limit: Option<usize>,
    _alphabet: PhantomData<A>,
}

impl<A: Alphabet> Raw<A> {
    /// Constructs an empty trie with no limit on the number of nodes.
    pub fn new() -> Self {
        Self::with_node_limit(None)
    }

    /// Constructs an empty trie that refuses to hold more than `limit` nodes.
    ///
    /// Running into the limit acts just like the allocator refusing the node.
    pub fn with_node_limit(limit: Option<usize>) -> Self {
        Self {
            root: Atomic::null(),
            nodes: AtomicUsize::new(0),
            node_limit: limit,
            _alphabet: PhantomData,
        }
    }

    /// Allocates an empty node, accounting for it.
    fn alloc_node(&self) -> Result<Owned<Node>> {
        let reserved = self.nodes.fetch_add(1, Ordering::Relaxed);
        if self.node_limit.map_or(false, |limit| reserved >= limit) {
            self.nodes.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::Allocation);
        }
        let mut children = Vec::new();
        if children.try_reserve_exact(A::SIZE).is_err() {
            self.nodes.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::Allocation);
        }
        children.extend((0..A::SIZE).map(|_| Atomic::null()));
        Ok(Owned::new(Node {
            data: Atomic::null(),
            use_count: AtomicUsize::new(0),
            in_use: AtomicBool::new(false),
            children: children.into_boxed_slice(),
        }))
    }

    /// Inserts a value under the key, replacing any previous one.
    ///
    /// The value is copied into a buffer owned by the trie. On
    /// [`Updated`][Insertion::Updated], the previous value is returned.
    pub fn insert(&self, key: &str, value: &[u8], pin: &Guard) -> Result<Insertion> {
        if value.is_empty() {
            return Err(Error::EmptyValue);
        }
        // Validate the whole key before touching anything.
        let path = alphabet::path::<A>(key)?;

        let mut spare: Option<Owned<Node>> = None;
        let mut visited: SmallVec<[Shared<Node>; INLINE_KEY]> = SmallVec::new();
        let mut slot = &self.root;
        let mut steps = path.iter();
        let terminal = loop {
            let mut node = slot.load(Ordering::Acquire, pin);
            if node.is_null() {
                let fresh = match spare.take() {
                    Some(fresh) => fresh,
                    None => match self.alloc_node() {
                        Ok(fresh) => fresh,
                        Err(e) => {
                            warn!(
                                "Failed to allocate node {} of key {:?}, rolling back",
                                visited.len(),
                                key
                            );
                            self.rollback(&path, &visited, pin);
                            return Err(e);
                        }
                    },
                };
                // AcqRel ‒ we publish the new node on success. On failure we need to acquire the
                // winner, as we are going to walk through it.
                match slot.compare_exchange(
                    Shared::null(),
                    fresh,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    pin,
                ) {
                    Ok(installed) => node = installed,
                    Err(e) => {
                        // Someone was faster. Keep ours for the next missing slot.
                        spare = Some(e.new);
                        node = e.current;
                    }
                }
            }

            let node_ref = unsafe { node.deref() };
            node_ref.use_count.fetch_add(1, Ordering::AcqRel);
            visited.push(node);
            match steps.next() {
                Some(&idx) => slot = &node_ref.children[idx as usize],
                None => break node_ref,
            }
        };

        if spare.take().is_some() {
            self.nodes.fetch_sub(1, Ordering::Relaxed);
        }

        let fresh = Owned::new(Arc::<[u8]>::from(value));
        let previous = terminal.data.swap(fresh, Ordering::AcqRel, pin);
        terminal.in_use.store(true, Ordering::Release);

        if previous.is_null() {
            Ok(Insertion::New)
        } else {
            // The key was already counted along the whole path when it was first inserted.
            for node in &visited {
                unsafe { node.deref() }
                    .use_count
                    .fetch_sub(1, Ordering::AcqRel);
            }
            let old = Arc::clone(unsafe { previous.deref() });
            unsafe { pin.defer_destroy(previous) };
            Ok(Insertion::Updated(old))
        }
    }

    /// Undoes the use count increments of a failed insert.
    ///
    /// Walks the same path again. The first node whose count drops to zero is unlinked from its
    /// parent slot and destroyed together with everything below it ‒ there's nothing alive down
    /// there.
    fn rollback(&self, path: &Path, visited: &[Shared<Node>], pin: &Guard) {
        let mut slot = &self.root;
        for (depth, &node) in visited.iter().enumerate() {
            let node_ref = unsafe { node.deref() };
            if node_ref.use_count.fetch_sub(1, Ordering::AcqRel) == 1 {
                let unlinked = slot.compare_exchange(
                    node,
                    Shared::null(),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                    pin,
                );
                if unlinked.is_ok() {
                    let released = subtree_len(node_ref, pin);
                    self.nodes.fetch_sub(released, Ordering::Relaxed);
                    unsafe { pin.defer_destroy(node) };
                }
                return;
            }
            slot = &node_ref.children[path[depth] as usize];
        }
    }

    /// Finds the node at the end of the path, if the path exists.
    fn find_node<'r>(&'r self, path: &Path, pin: &'r Guard) -> Option<&'r Node> {
        let mut node = unsafe { self.root.load(Ordering::Acquire, pin).as_ref() }?;
        for &idx in path {
            node = unsafe { node.children[idx as usize].load(Ordering::Acquire, pin).as_ref() }?;
        }
        Some(node)
    }

    /// Looks up a value.
    pub fn get<'r, 's, 'p>(&'s self, key: &str, pin: &'p Guard) -> Result<Option<&'r Value>>
    where
        's: 'r,
        'p: 'r,
    {
        let path = alphabet::path::<A>(key)?;
        Ok(self.find_node(&path, pin).and_then(|node| node.value(pin)))
    }

    /// Removes the value stored under the key, returning it if it was found.
    ///
    /// The nodes on the path stay allocated.
    pub fn remove(&self, key: &str, pin: &Guard) -> Result<Removal> {
        let path = alphabet::path::<A>(key)?;
        let mut visited: SmallVec<[&Node; INLINE_KEY]> = SmallVec::new();
        let mut current = &self.root;
        let mut steps = path.iter();
        let terminal = loop {
            let node = match unsafe { current.load(Ordering::Acquire, pin).as_ref() } {
                Some(node) => node,
                None => return Ok(Removal::NotFound),
            };
            visited.push(node);
            match steps.next() {
                Some(&idx) => current = &node.children[idx as usize],
                None => break node,
            }
        };

        if !terminal.in_use.load(Ordering::Acquire) {
            return Ok(Removal::NotFound);
        }
        let previous = terminal
            .data
            .swap(Shared::null(), Ordering::AcqRel, pin);
        if previous.is_null() {
            // A concurrent delete got here first.
            return Ok(Removal::NotFound);
        }
        terminal.in_use.store(false, Ordering::Release);

        for node in &visited {
            // Floor at zero. The closure refusing is the only error possible.
            let _ = node
                .use_count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cnt| cnt.checked_sub(1));
        }

        let old = Arc::clone(unsafe { previous.deref() });
        unsafe { pin.defer_destroy(previous) };
        Ok(Removal::Deleted(old))
    }

    /// Number of live keys, as counted by the root node.
    pub fn count(&self) -> usize {
        let pin = crossbeam_epoch::pin();
        unsafe { self.root.load(Ordering::Acquire, &pin).as_ref() }
            .map_or(0, |root| root.use_count.load(Ordering::Acquire))
    }

    /// Checks for emptiness.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of allocated nodes, including the ones left behind by deleted keys.
    pub fn node_count(&self) -> usize {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Iterates through the live keys (in canonical spelling) and values, in ascending order.
    pub fn iter<'r, 's, 'p>(&'s self, pin: &'p Guard) -> iterator::Iter<'r, A>
    where
        's: 'r,
        'p: 'r,
    {
        iterator::Iter::new(self, pin)
    }
}

impl<A: Alphabet> Default for Raw<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Alphabet> Drop for Raw<A> {
    fn drop(&mut self) {
        /*
         * We are in a destructor and that one is &mut self. There are no concurrent accesses to
         * this data structure any more, therefore unprotected and Relaxed are fine. The node
         * destructor takes care of the subtree.
         */
        unsafe {
            let root = self
                .root
                .load(Ordering::Relaxed, crossbeam_epoch::unprotected());
            if !root.is_null() {
                drop(root.into_owned());
            }
        }
    }
}
