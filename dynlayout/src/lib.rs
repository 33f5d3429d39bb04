#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

pub use dynlayout_core::*;

#[cfg(feature = "reflect")]
pub use dynlayout_reflect::*;

pub use static_assertions;

// descriptors are plain data and can be shared across threads; instances own raw buffers and cannot
static_assertions::assert_impl_all!(TypeDescriptor: Clone, Send, Sync);
static_assertions::assert_not_impl_any!(DynamicArrayStorage: Send, Sync);
