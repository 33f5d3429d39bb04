//! Padding arithmetic and raw buffer allocation

use core::alloc::Layout;
use core::ptr::NonNull;

/// Number of bytes needed after `offset` to reach the next multiple of `align`.
///
/// `align` must be non-zero.
#[inline]
pub const fn padding_needed(offset: usize, align: usize) -> usize {
    let misalignment = offset % align;
    if misalignment > 0 {
        align - misalignment
    } else {
        0
    }
}

/// Rounds `offset` up to the next multiple of `align`, or `None` on overflow.
#[inline]
pub const fn align_up(offset: usize, align: usize) -> Option<usize> {
    offset.checked_add(padding_needed(offset, align))
}

/// Failure to obtain storage for an instance or an array buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AllocError {
    /// The requested element count times the element size does not fit in a valid [`Layout`].
    CapacityOverflow,

    /// The global allocator returned null.
    OutOfMemory {
        /// The layout that could not be satisfied
        layout: Layout,
    },
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocError::CapacityOverflow => write!(f, "Capacity overflow"),
            AllocError::OutOfMemory { layout } => write!(
                f,
                "Out of memory: could not allocate {} bytes aligned to {}",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl core::error::Error for AllocError {}

/// A non-null pointer aligned to `align`, for zero-sized storage.
#[inline]
pub(crate) fn dangling(align: usize) -> NonNull<u8> {
    // SAFETY: a valid alignment is never zero
    unsafe { NonNull::new_unchecked(core::ptr::without_provenance_mut(align)) }
}

/// Allocates uninitialized storage for `layout`; zero-sized layouts get a dangling pointer.
pub(crate) fn allocate(layout: Layout) -> Result<NonNull<u8>, AllocError> {
    if layout.size() == 0 {
        return Ok(dangling(layout.align()));
    }
    // SAFETY: We have checked that layout's size is non-zero
    let ptr = unsafe { alloc::alloc::alloc(layout) };
    NonNull::new(ptr).ok_or(AllocError::OutOfMemory { layout })
}

/// Releases storage obtained from [`allocate`] with the same `layout`.
///
/// # Safety
///
/// `ptr` must come from [`allocate`] called with `layout`, and must not be used afterwards.
pub(crate) unsafe fn deallocate(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() == 0 {
        // Nothing to deallocate
        return;
    }
    unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
}
