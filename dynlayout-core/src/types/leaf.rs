use core::alloc::Layout;
use core::any::TypeId;

use bitflags::bitflags;

use crate::{PtrConst, PtrMut, PtrUninit};

/// A native type that can back a [`LeafType`].
///
/// Implementing this for your own type is all it takes to add a new leaf kind:
/// the descriptor derives its layout and lifecycle functions from `Default`,
/// `Clone` and `Drop`.
pub trait Leaf: Default + Clone + 'static {
    /// Tag recorded in the descriptor
    const KIND: LeafKind;
}

/// Runtime tag for the native value kind behind a leaf
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum LeafKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `char`
    Char,
    /// Heap-allocated UTF-8 text
    Text,
    /// Anything else: only its `TypeId` identifies it
    Opaque,
}

bitflags! {
    /// Properties of a leaf's native type, recorded when the descriptor is built
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LeafFlags: u8 {
        /// An empty set of flags
        const EMPTY = 0;

        /// Tearing a value down runs code (`core::mem::needs_drop`)
        const NEEDS_DROP = 1 << 0;
    }
}

/// Function to default-construct a value in place
///
/// # Safety
///
/// The `target` parameter has the correct layout and alignment, but points to
/// uninitialized memory. The function returns the same pointer wrapped in an [`PtrMut`].
pub type DefaultInPlaceFn = for<'mem> unsafe fn(target: PtrUninit<'mem>) -> PtrMut<'mem>;

/// Function to drop a value in place
///
/// # Safety
///
/// The `value` parameter must point to aligned, initialized memory of the correct type.
/// After calling this function, the memory pointed to by `value` should not be accessed again
/// until it is properly reinitialized.
pub type DropInPlaceFn = for<'mem> unsafe fn(value: PtrMut<'mem>) -> PtrUninit<'mem>;

/// Function to clone a value into uninitialized storage
///
/// # Safety
///
/// The `source` parameter must point to aligned, initialized memory of the correct type.
/// The `target` parameter has the correct layout and alignment, but points to
/// uninitialized memory.
pub type CloneIntoFn =
    for<'src, 'dst> unsafe fn(source: PtrConst<'src>, target: PtrUninit<'dst>) -> PtrMut<'dst>;

/// Lifecycle functions for one native type
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct LeafVTable {
    /// cf. [`DefaultInPlaceFn`]
    pub default_in_place: DefaultInPlaceFn,

    /// cf. [`DropInPlaceFn`]
    pub drop_in_place: DropInPlaceFn,

    /// cf. [`CloneIntoFn`]
    pub clone_into: CloneIntoFn,
}

impl LeafVTable {
    /// The vtable for `T`
    pub fn of<T: Leaf>() -> Self {
        Self {
            default_in_place: |target| unsafe { target.put(T::default()) },
            drop_in_place: |value| unsafe { value.drop_in_place::<T>() },
            clone_into: |source, target| unsafe { target.put(source.get::<T>().clone()) },
        }
    }
}

/// Descriptor for one fixed-size native value kind
#[derive(Clone, Copy, Debug)]
pub struct LeafType {
    kind: LeafKind,
    type_id: TypeId,
    type_name: &'static str,
    layout: Layout,
    flags: LeafFlags,
    vtable: LeafVTable,
}

impl LeafType {
    /// The leaf descriptor for the native type `T`
    pub fn of<T: Leaf>() -> Self {
        let mut flags = LeafFlags::EMPTY;
        if core::mem::needs_drop::<T>() {
            flags |= LeafFlags::NEEDS_DROP;
        }
        Self {
            kind: T::KIND,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            layout: Layout::new::<T>(),
            flags,
            vtable: LeafVTable::of::<T>(),
        }
    }

    /// Runtime kind tag
    #[inline]
    pub fn kind(&self) -> LeafKind {
        self.kind
    }

    /// `TypeId` of the native type
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the native type
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `size_of` the native type
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// `align_of` the native type
    #[inline]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Layout of the native type
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Properties of the native type
    #[inline]
    pub fn flags(&self) -> LeafFlags {
        self.flags
    }

    /// Lifecycle functions of the native type
    #[inline]
    pub fn vtable(&self) -> &LeafVTable {
        &self.vtable
    }

    /// Default-constructs the native value at `ptr`.
    ///
    /// # Safety
    ///
    /// See [`crate::TypeDescriptor::construct`].
    #[inline]
    pub unsafe fn construct<'mem>(&self, ptr: PtrUninit<'mem>) -> PtrMut<'mem> {
        unsafe { (self.vtable.default_in_place)(ptr) }
    }

    /// Drops the native value at `ptr`.
    ///
    /// # Safety
    ///
    /// See [`crate::TypeDescriptor::destruct`].
    #[inline]
    pub unsafe fn destruct<'mem>(&self, ptr: PtrMut<'mem>) -> PtrUninit<'mem> {
        unsafe { (self.vtable.drop_in_place)(ptr) }
    }

    /// Clones the native value at `src` into `dest`.
    ///
    /// # Safety
    ///
    /// See [`crate::TypeDescriptor::copy_data`].
    #[inline]
    pub unsafe fn copy_data<'mem>(&self, dest: PtrUninit<'mem>, src: PtrConst<'_>) -> PtrMut<'mem> {
        unsafe { (self.vtable.clone_into)(src, dest) }
    }
}

impl PartialEq for LeafType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for LeafType {}

impl core::fmt::Display for LeafType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = self.type_name;
        if name.contains('<') {
            return write!(f, "{name}");
        }
        // `alloc::string::String` reads better as `String`
        write!(f, "{}", name.rsplit("::").next().unwrap_or(name))
    }
}
