//! A module containing few debug utilities.
//!
//! In general, they are meant for debugging the *trie itself*, but it is exposed as potentially
//! useful.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::Ordering;

use crossbeam_epoch::{self, Guard};

use super::alphabet::Alphabet;
use super::{Node, Raw};

impl<A: Alphabet> Raw<A> {
    // Hack: &mut to make sure it is not shared between threads and nobody is modifying the thing
    // right now.
    /// Panics if the use counts and flags of the trie don't add up.
    ///
    /// Every node must count exactly the live keys at or below it, and a node is in use exactly
    /// when it holds a value. This holds only when no insert is in flight, which the `&mut`
    /// guarantees.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&mut self) {
        fn check_node(node: &Node, pin: &Guard, depth: usize) -> usize {
            let in_use = node.in_use.load(Ordering::Relaxed);
            let has_data = !node.data.load(Ordering::Relaxed, pin).is_null();
            assert_eq!(in_use, has_data, "In-use flag doesn't match data presence");
            assert!(depth > 0 || !in_use, "The root must not hold data");

            let below = node
                .children
                .iter()
                .filter_map(|child| unsafe { child.load(Ordering::Relaxed, pin).as_ref() })
                .map(|child| check_node(child, pin, depth + 1))
                .sum::<usize>();
            let live = below + in_use as usize;
            assert_eq!(
                live,
                node.use_count.load(Ordering::Relaxed),
                "Use count doesn't match the live keys at depth {}",
                depth
            );
            live
        }

        // Unprotected is fine, we are &mut so nobody else is allowed to do stuff to us at the
        // moment.
        let pin = unsafe { crossbeam_epoch::unprotected() };
        if let Some(root) = unsafe { self.root.load(Ordering::Relaxed, pin).as_ref() } {
            check_node(root, pin, 0);
        }
    }

    fn print_shape_node(node: &Node, fmt: &mut Formatter, pin: &Guard) -> FmtResult {
        write!(fmt, "[{}", node.use_count.load(Ordering::Acquire))?;
        if let Some(value) = node.value(pin) {
            write!(fmt, " {:?}", String::from_utf8_lossy(value))?;
        }
        for (idx, child) in node.children.iter().enumerate() {
            if let Some(child) = unsafe { child.load(Ordering::Acquire, pin).as_ref() } {
                write!(fmt, " {}:", A::symbol(idx))?;
                Self::print_shape_node(child, fmt, pin)?;
            }
        }
        write!(fmt, "]")
    }

    fn print_shape(&self, fmt: &mut Formatter) -> FmtResult {
        let pin = crossbeam_epoch::pin();
        match unsafe { self.root.load(Ordering::Acquire, &pin).as_ref() } {
            Some(root) => Self::print_shape_node(root, fmt, &pin),
            None => write!(fmt, "[]"),
        }
    }
}

/// A pretty-printing wrapper around the raw trie.
///
/// The structure, including the use counts and values, is printed if this is used to wrap the
/// raw trie. Empty slots are skipped.
pub struct PrintShape<'a, A: Alphabet>(pub &'a Raw<A>);

impl<A: Alphabet> Display for PrintShape<'_, A> {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        self.0.print_shape(fmt)
    }
}
