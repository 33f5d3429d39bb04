use alloc::string::String;

use super::TypeDescriptor;

/// A named sub-value of a [`super::StructType`]
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Field {
    /// key for the struct field, unique within its struct
    pub name: String,

    /// the field's own copy of its descriptor
    pub ty: TypeDescriptor,

    /// byte offset of the field from the start of the struct's storage
    pub offset: usize,
}

impl Field {
    /// Offset of the first byte after this field
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.ty.size()
    }
}

/// Errors encountered when adding fields to a struct, or looking them up
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    /// A field was looked up by name, and the struct has no field with that name.
    NoSuchField,

    /// A field was looked up by index, and the index is not below the field count.
    IndexOutOfBounds,

    /// `add_field` was called with a name the struct already has.
    DuplicateField,

    /// Placing the field would push the struct's size past what a [`core::alloc::Layout`] can describe.
    LayoutOverflow,
}

impl core::error::Error for FieldError {}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FieldError::NoSuchField => write!(f, "No such field"),
            FieldError::IndexOutOfBounds => write!(f, "Field index out of bounds"),
            FieldError::DuplicateField => write!(f, "Duplicate field name"),
            FieldError::LayoutOverflow => write!(f, "Struct layout overflows"),
        }
    }
}
