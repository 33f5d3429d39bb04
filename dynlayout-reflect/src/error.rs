use alloc::string::String;

use dynlayout_core::{AllocError, ArrayError, FieldError, MismatchReason, TypeMismatch};
use owo_colors::OwoColorize;

/// Errors that can occur when reading or writing through a view.
///
/// Descriptors are carried in their rendered form (`{ x: f32, y: f32 }`, `[String]`).
#[derive(Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum ReflectError {
    /// A field was looked up by a name the struct does not have
    NoSuchField {
        /// The struct that was searched
        ty: String,
        /// The name that was asked for
        name: String,
    },

    /// An error occurred when attempting to access a field by index.
    FieldError {
        /// The struct containing the field.
        ty: String,
        /// The specific error that occurred with the field.
        field_error: FieldError,
    },

    /// A typed accessor was called with a native type that does not match the descriptor
    TypeMismatch {
        /// The descriptor of the value
        ty: String,
        /// What the value holds, and what was asked for
        mismatch: TypeMismatch,
    },

    /// An error occurred when accessing or resizing an array.
    ArrayError {
        /// The array's element descriptor
        ty: String,
        /// The specific error reported by the array
        array_error: ArrayError,
    },

    /// Attempted to perform an operation that expected a struct or an array on something else
    WasNotA {
        /// What the operation expected
        expected: &'static str,
        /// The descriptor we got instead
        actual: String,
    },

    /// Storage for an instance could not be allocated
    Alloc(AllocError),
}

impl From<AllocError> for ReflectError {
    fn from(err: AllocError) -> Self {
        ReflectError::Alloc(err)
    }
}

impl core::fmt::Display for ReflectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReflectError::NoSuchField { ty, name } => {
                write!(f, "No field '{}' in {}", name.red(), ty.blue())
            }
            ReflectError::FieldError { ty, field_error } => {
                write!(f, "Field error for {}: {}", ty.blue(), field_error)
            }
            ReflectError::TypeMismatch { ty, mismatch }
                if mismatch.reason != MismatchReason::NativeType =>
            {
                write!(f, "Value of type {}: {}", ty.blue(), mismatch.red())
            }
            ReflectError::TypeMismatch { ty, mismatch } => {
                write!(
                    f,
                    "Value of type {} holds {}, but was accessed as {}",
                    ty.blue(),
                    mismatch.expected.green(),
                    mismatch.actual.red()
                )
            }
            ReflectError::ArrayError { ty, array_error } => {
                write!(f, "Array of {}: {}", ty.blue(), array_error)
            }
            ReflectError::WasNotA { expected, actual } => {
                write!(
                    f,
                    "Wrong descriptor: expected {}, but got {}",
                    expected.green(),
                    actual.red()
                )
            }
            ReflectError::Alloc(err) => write!(f, "{}", err.red()),
        }
    }
}

impl core::error::Error for ReflectError {}
