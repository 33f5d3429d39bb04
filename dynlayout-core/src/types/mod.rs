//! Type descriptors and their lifecycle operations

use core::alloc::Layout;
use core::any::{Any, TypeId};

use crate::{AllocError, PtrConst, PtrMut, PtrUninit};

mod leaf;
pub use leaf::*;

mod field;
pub use field::*;

mod struct_;
pub use struct_::*;

mod array;
pub use array::*;

/// Schema for a value whose shape is decided at run time.
///
/// A descriptor knows the size and alignment of its instances and how to bring
/// one to life in caller-provided storage ([`Self::construct`]), tear it down
/// ([`Self::destruct`]) and deep-copy it ([`Self::copy_data`]). It never keeps
/// track of the instances it describes: pairing every `construct` with exactly
/// one `destruct` is up to whoever owns the storage.
///
/// Cloning a descriptor is a deep copy, so every owner holds its own schema.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDescriptor {
    /// One native value kind, like `f32` or `String`
    Leaf(LeafType),

    /// Named fields at computed offsets
    Struct(StructType),

    /// A growable, homogeneous collection stored out of line
    Array(DynamicArray),
}

impl TypeDescriptor {
    /// Shorthand for a leaf descriptor of the native type `T`
    pub fn leaf<T: Leaf>() -> Self {
        TypeDescriptor::Leaf(LeafType::of::<T>())
    }

    /// Storage footprint of one instance in bytes, trailing padding included
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            TypeDescriptor::Leaf(leaf) => leaf.size(),
            TypeDescriptor::Struct(st) => st.size(),
            TypeDescriptor::Array(arr) => arr.size(),
        }
    }

    /// Required alignment of an instance's starting address
    #[inline]
    pub fn alignment(&self) -> usize {
        match self {
            TypeDescriptor::Leaf(leaf) => leaf.alignment(),
            TypeDescriptor::Struct(st) => st.alignment(),
            TypeDescriptor::Array(arr) => arr.alignment(),
        }
    }

    /// Size and alignment as a [`Layout`]
    #[inline]
    pub fn layout(&self) -> Layout {
        match self {
            TypeDescriptor::Leaf(leaf) => leaf.layout(),
            TypeDescriptor::Struct(st) => st.layout(),
            TypeDescriptor::Array(arr) => arr.layout(),
        }
    }

    /// Whether tearing down an instance does anything at all
    pub fn needs_drop(&self) -> bool {
        match self {
            TypeDescriptor::Leaf(leaf) => leaf.flags().contains(LeafFlags::NEEDS_DROP),
            TypeDescriptor::Struct(st) => st.fields().any(|field| field.ty.needs_drop()),
            TypeDescriptor::Array(_) => true,
        }
    }

    /// Initializes `ptr` to the default value of this type.
    ///
    /// Leaves are default-constructed, structs construct every field at its
    /// offset, arrays start out empty with no buffer.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of [`Self::size`] bytes, aligned to
    /// [`Self::alignment`], and hold no live value.
    pub unsafe fn construct<'mem>(&self, ptr: PtrUninit<'mem>) -> PtrMut<'mem> {
        match self {
            TypeDescriptor::Leaf(leaf) => unsafe { leaf.construct(ptr) },
            TypeDescriptor::Struct(st) => unsafe { st.construct(ptr) },
            TypeDescriptor::Array(arr) => unsafe { arr.construct(ptr) },
        }
    }

    /// Releases everything the value at `ptr` owns, without freeing `ptr` itself.
    ///
    /// # Safety
    ///
    /// `ptr` must hold a live value of this type, constructed by this
    /// descriptor (or one equal to it). It holds no live value afterwards.
    pub unsafe fn destruct<'mem>(&self, ptr: PtrMut<'mem>) -> PtrUninit<'mem> {
        match self {
            TypeDescriptor::Leaf(leaf) => unsafe { leaf.destruct(ptr) },
            TypeDescriptor::Struct(st) => unsafe { st.destruct(ptr) },
            TypeDescriptor::Array(arr) => unsafe { arr.destruct(ptr) },
        }
    }

    /// Constructs `dest` as a deep copy of the value at `src`.
    ///
    /// `dest` is never assumed to hold a live value. On error `dest` is left
    /// without a live value and nothing it partially acquired is leaked.
    ///
    /// # Safety
    ///
    /// `src` must hold a live value of this type; `dest` must satisfy the
    /// requirements of [`Self::construct`] and must not overlap `src`.
    pub unsafe fn copy_data<'mem>(
        &self,
        dest: PtrUninit<'mem>,
        src: PtrConst<'_>,
    ) -> Result<PtrMut<'mem>, AllocError> {
        match self {
            TypeDescriptor::Leaf(leaf) => Ok(unsafe { leaf.copy_data(dest, src) }),
            TypeDescriptor::Struct(st) => unsafe { st.copy_data(dest, src) },
            TypeDescriptor::Array(arr) => unsafe { arr.copy_data(dest, src) },
        }
    }

    /// Checks that a live value of this type may be read as a native `T`.
    ///
    /// The size of `T` must equal [`Self::size`], and the native type must be
    /// the described one: a leaf only accepts the type with its own `TypeId`,
    /// an array only accepts [`DynamicArrayStorage`], and a struct accepts no
    /// native type at all. The leaf's [`LeafKind`] tag is not consulted; two
    /// leaves of the same kind (two `Opaque` types, say) are still told apart.
    pub fn check_native<T: 'static>(&self) -> Result<(), TypeMismatch> {
        let actual = NativeKind::of::<T>();
        let expected = self.native_kind();
        let mismatch = TypeMismatch {
            expected,
            actual,
            reason: MismatchReason::NativeType,
        };
        if actual.size != expected.size {
            return Err(mismatch);
        }

        let compatible = match self {
            TypeDescriptor::Leaf(leaf) => leaf.type_id() == TypeId::of::<T>(),
            TypeDescriptor::Array(_) => TypeId::of::<DynamicArrayStorage>() == TypeId::of::<T>(),
            TypeDescriptor::Struct(_) => false,
        };
        if compatible { Ok(()) } else { Err(mismatch) }
    }

    /// Checks that a live value of this type may be borrowed mutably as a native `T`.
    ///
    /// Like [`Self::check_native`], except that array storage is never handed
    /// out mutably: swapping in a storage record with other elements would
    /// break the descriptor. Arrays are resized and written through their
    /// element accessors instead.
    pub fn check_native_mut<T: 'static>(&self) -> Result<(), TypeMismatch> {
        self.check_native::<T>()?;
        match self {
            TypeDescriptor::Array(_) => Err(TypeMismatch {
                expected: self.native_kind(),
                actual: NativeKind::of::<T>(),
                reason: MismatchReason::ArrayBorrow,
            }),
            _ => Ok(()),
        }
    }

    /// Checks that `value` may replace a live value of this type.
    ///
    /// Like [`Self::check_native`]; a replacement [`DynamicArrayStorage`] must
    /// also hold elements of this array's element type.
    pub fn check_value<T: 'static>(&self, value: &T) -> Result<(), TypeMismatch> {
        self.check_native::<T>()?;
        let TypeDescriptor::Array(arr) = self else {
            return Ok(());
        };
        let storage = (value as &dyn Any).downcast_ref::<DynamicArrayStorage>();
        match storage {
            Some(storage) if storage.element_type() != arr.element_type() => Err(TypeMismatch {
                expected: self.native_kind(),
                actual: NativeKind::of::<T>(),
                reason: MismatchReason::ElementType,
            }),
            _ => Ok(()),
        }
    }

    /// The native kind instances of this descriptor can be read as
    pub fn native_kind(&self) -> NativeKind {
        match self {
            TypeDescriptor::Leaf(leaf) => NativeKind {
                name: leaf.type_name(),
                size: leaf.size(),
            },
            TypeDescriptor::Struct(st) => NativeKind {
                name: "struct",
                size: st.size(),
            },
            TypeDescriptor::Array(arr) => NativeKind {
                name: "DynamicArrayStorage",
                size: arr.size(),
            },
        }
    }

    /// Allocates uninitialized storage sized and aligned for one instance.
    ///
    /// Zero-sized descriptors get a dangling, well-aligned pointer.
    pub fn allocate(&self) -> Result<PtrUninit<'static>, AllocError> {
        let ptr = crate::layout::allocate(self.layout())?;
        Ok(PtrUninit::new(ptr.as_ptr()))
    }

    /// Frees storage obtained from [`Self::allocate`].
    ///
    /// # Safety
    ///
    /// - `ptr` must come from [`Self::allocate`] on this descriptor (or one
    ///   with the same layout) and hold no live value.
    /// - `ptr` must not be used afterwards.
    pub unsafe fn deallocate_uninit(&self, ptr: PtrUninit<'_>) {
        if let Some(ptr) = core::ptr::NonNull::new(ptr.as_mut_byte_ptr()) {
            unsafe { crate::layout::deallocate(ptr, self.layout()) }
        }
    }
}

impl core::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TypeDescriptor::Leaf(leaf) => core::fmt::Display::fmt(leaf, f),
            TypeDescriptor::Struct(st) => core::fmt::Display::fmt(st, f),
            TypeDescriptor::Array(arr) => core::fmt::Display::fmt(arr, f),
        }
    }
}

impl From<LeafType> for TypeDescriptor {
    fn from(leaf: LeafType) -> Self {
        TypeDescriptor::Leaf(leaf)
    }
}

impl From<StructType> for TypeDescriptor {
    fn from(st: StructType) -> Self {
        TypeDescriptor::Struct(st)
    }
}

impl From<DynamicArray> for TypeDescriptor {
    fn from(arr: DynamicArray) -> Self {
        TypeDescriptor::Array(arr)
    }
}

/// Name and size of a native type, as far as typed access is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeKind {
    /// Type name, for diagnostics
    pub name: &'static str,

    /// `size_of` the type
    pub size: usize,
}

impl NativeKind {
    /// The native kind of `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            name: core::any::type_name::<T>(),
            size: core::mem::size_of::<T>(),
        }
    }
}

impl core::fmt::Display for NativeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({} bytes)", self.name, self.size)
    }
}

/// A typed accessor was asked for a native type that does not match the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    /// What the descriptor holds
    pub expected: NativeKind,

    /// What the caller asked for
    pub actual: NativeKind,

    /// Which check refused the access
    pub reason: MismatchReason,
}

/// Which check a [`TypeMismatch`] comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MismatchReason {
    /// The native type is not the described one (by size or by identity).
    NativeType,

    /// A replacement array storage holds elements of another type.
    ElementType,

    /// Array storage was asked for mutably; it is only reachable through element accessors.
    ArrayBorrow,
}

impl core::fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.reason {
            MismatchReason::NativeType => write!(
                f,
                "Type mismatch: expected {}, got {}",
                self.expected, self.actual
            ),
            MismatchReason::ElementType => write!(
                f,
                "Type mismatch: replacement array storage holds another element type"
            ),
            MismatchReason::ArrayBorrow => write!(
                f,
                "Array storage cannot be borrowed mutably as {}; go through its elements",
                self.actual
            ),
        }
    }
}

impl core::error::Error for TypeMismatch {}
