//! Scoped reentrancy flag
//!
//! The engine listens on the same channels it publishes to. While it
//! replays its own commits and notifications the flag is raised, so its
//! handlers can tell self-generated events apart and drop them.

use std::cell::Cell;
use std::rc::Rc;

/// Raises the shared flag for its lifetime and restores the previous value
/// on drop, including during unwinding.
#[derive(Debug)]
pub(crate) struct ReentrancyGuard {
    flag: Rc<Cell<bool>>,
    previous: bool,
}

impl ReentrancyGuard {
    pub(crate) fn enter(flag: &Rc<Cell<bool>>) -> Self {
        let previous = flag.replace(true);
        Self {
            flag: Rc::clone(flag),
            previous,
        }
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}
