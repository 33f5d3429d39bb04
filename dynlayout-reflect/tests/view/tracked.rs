use std::cell::Cell;

use dynlayout_core::{Leaf, LeafKind};

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// Number of `Tracked` values alive on this thread
pub fn live() -> isize {
    LIVE.with(Cell::get)
}

/// A leaf that counts its own constructions and drops
#[derive(Debug, PartialEq)]
pub struct Tracked(pub u32);

impl Default for Tracked {
    fn default() -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Tracked(0)
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Tracked(self.0)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

impl Leaf for Tracked {
    const KIND: LeafKind = LeafKind::Opaque;
}
