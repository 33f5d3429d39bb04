#![cfg(feature = "std")]

mod array;
mod heap;
mod struct_;
mod tracked;
