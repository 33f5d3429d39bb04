//! Opaque pointers
//!
//! Descriptors only ever see instance storage through these: [`PtrUninit`]
//! for slots with nothing live in them, [`PtrMut`] and [`PtrConst`] for slots
//! holding a constructed value. The lifetime ties a pointer to the storage it
//! was derived from; what lives behind it is known only to the descriptor.

use core::{marker::PhantomData, ptr::NonNull};

/// Storage that holds no live value
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct PtrUninit<'mem>(*mut u8, PhantomData<&'mem mut ()>);

impl<'mem> PtrUninit<'mem> {
    /// Wraps a raw pointer to a slot
    #[inline]
    pub fn new<T>(ptr: *mut T) -> Self {
        Self(ptr.cast(), PhantomData)
    }

    /// Declares the slot constructed
    ///
    /// # Safety
    ///
    /// The slot must hold a live value, and the pointer must not be null.
    #[inline]
    pub unsafe fn assume_init(self) -> PtrMut<'mem> {
        PtrMut(unsafe { NonNull::new_unchecked(self.0) }, PhantomData)
    }

    /// Moves `value` into the slot
    ///
    /// # Safety
    ///
    /// The slot must be valid for writes of a `T` and aligned for it.
    #[inline]
    pub unsafe fn put<T>(self, value: T) -> PtrMut<'mem> {
        unsafe {
            self.0.cast::<T>().write(value);
            self.assume_init()
        }
    }

    /// Start of the slot, for writing
    #[inline]
    pub fn as_mut_byte_ptr(self) -> *mut u8 {
        self.0
    }

    /// Start of the slot
    #[inline]
    pub fn as_byte_ptr(self) -> *const u8 {
        self.0
    }

    /// The sub-slot `offset` bytes in, such as a struct field
    ///
    /// # Safety
    ///
    /// `offset` must stay within the allocation this pointer belongs to.
    #[inline]
    pub unsafe fn field_uninit_at(self, offset: usize) -> PtrUninit<'mem> {
        PtrUninit(unsafe { self.0.byte_add(offset) }, PhantomData)
    }
}

/// A live value, shared.
///
/// Never null; dangling (but aligned) for zero-sized values.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct PtrConst<'mem>(NonNull<u8>, PhantomData<&'mem ()>);

impl<'mem> PtrConst<'mem> {
    /// Wraps a raw pointer to a live value
    ///
    /// `ptr` must not be null. Only the `unsafe` accessors dereference it.
    #[inline]
    pub const fn new<T>(ptr: *const T) -> Self {
        Self(unsafe { NonNull::new_unchecked(ptr as *mut u8) }, PhantomData)
    }

    /// Start of the value
    #[inline]
    pub const fn as_byte_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Borrows the value as a `T`
    ///
    /// # Safety
    ///
    /// The value must be a live `T`.
    #[inline]
    pub const unsafe fn get<'borrow: 'mem, T>(self) -> &'borrow T {
        unsafe { self.0.cast::<T>().as_ref() }
    }

    /// The sub-value `offset` bytes in
    ///
    /// # Safety
    ///
    /// `offset` must stay within the value's storage.
    #[inline]
    pub const unsafe fn field(self, offset: usize) -> PtrConst<'mem> {
        PtrConst(unsafe { self.0.byte_add(offset) }, PhantomData)
    }
}

/// A live value, exclusively borrowed
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct PtrMut<'mem>(NonNull<u8>, PhantomData<&'mem mut ()>);

impl<'mem> PtrMut<'mem> {
    /// Wraps a raw pointer to a live value
    ///
    /// `ptr` must not be null. Only the `unsafe` accessors dereference it.
    #[inline]
    pub const fn new<T>(ptr: *mut T) -> Self {
        Self(unsafe { NonNull::new_unchecked(ptr.cast()) }, PhantomData)
    }

    /// Start of the value
    #[inline]
    pub const fn as_byte_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Start of the value, for writing
    #[inline]
    pub const fn as_mut_byte_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Borrows the value mutably as a `T`
    ///
    /// # Safety
    ///
    /// The value must be a live `T`, with no other borrow of it alive.
    #[inline]
    pub const unsafe fn as_mut<'borrow: 'mem, T>(self) -> &'borrow mut T {
        unsafe { self.0.cast::<T>().as_mut() }
    }

    /// Borrows the value as a `T`
    ///
    /// # Safety
    ///
    /// The value must be a live `T`, not mutably borrowed while this borrow lives.
    #[inline]
    pub const unsafe fn get<'borrow: 'mem, T>(self) -> &'borrow T {
        unsafe { self.0.cast::<T>().as_ref() }
    }

    /// Downgrades to a shared pointer
    #[inline]
    pub const fn as_const<'borrow: 'mem>(self) -> PtrConst<'borrow> {
        PtrConst(self.0, PhantomData)
    }

    /// Forgets that the slot is constructed, without tearing anything down
    #[inline]
    pub const fn as_uninit(self) -> PtrUninit<'mem> {
        PtrUninit(self.0.as_ptr(), PhantomData)
    }

    /// The sub-value `offset` bytes in
    ///
    /// # Safety
    ///
    /// `offset` must stay within the value's storage.
    #[inline]
    pub unsafe fn field(self, offset: usize) -> PtrMut<'mem> {
        PtrMut(unsafe { self.0.byte_add(offset) }, PhantomData)
    }

    /// Drops the `T` in place, leaving the slot empty
    ///
    /// # Safety
    ///
    /// The value must be a live `T`. The slot must be written again before
    /// it is read.
    #[inline]
    pub unsafe fn drop_in_place<T>(self) -> PtrUninit<'mem> {
        unsafe { self.0.cast::<T>().drop_in_place() };
        self.as_uninit()
    }

    /// Drops the `T` in place and moves `value` into the slot
    ///
    /// # Safety
    ///
    /// The value must be a live `T`.
    #[inline]
    pub unsafe fn replace<T>(self, value: T) -> Self {
        unsafe { self.drop_in_place::<T>().put(value) }
    }
}
