#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

#[macro_use]
mod macros;

// Opaque pointer utilities
mod ptr;
pub use ptr::*;

// Padding, alignment and raw allocation
mod layout;
pub use layout::*;

// Leaf implementations for native types
mod impls;

// Type descriptors
mod types;
#[allow(unused_imports)]
pub use types::*;
