#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

/// Emits a `log::trace!` record when the `log` feature is enabled; expands to nothing otherwise.
macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        {
            log::trace!($($tt)*);
        }
    };
}

mod error;
pub use error::*;

mod view;
pub use view::*;

mod heap;
pub use heap::*;
