//! jnibridge core types.
//!
//! The data model shared by every stage of the binding generator:
//!
//! - [`TypeDescriptor`] / [`MethodDescriptor`]: JVM descriptors with a lossless
//!   wire encoding
//! - [`BindingTarget`] / [`BindingMethod`]: what the scanner selected
//! - [`OwnershipClass`]: how the emitter must treat a marshalled value
//! - [`Fingerprint`]: deterministic hashing for registration-table stamps
//! - [`error`]: the error taxonomy for a generation run

pub mod binding;
pub mod class_name;
pub mod descriptor;
pub mod error;
pub mod fingerprint;
pub mod naming;
pub mod ownership;
pub mod primitive_kind;

pub use binding::{BindingMethod, BindingTarget, CustomCode, MethodFlags, TargetKind};
pub use class_name::ClassName;
pub use descriptor::{MAX_ARRAY_DIMENSIONS, MethodDescriptor, TypeDescriptor};
pub use error::{
    ClassFormatError, CollisionKind, ConfigError, DescriptorError, DescriptorErrorKind,
    EmptyTableError, GenerationError, ScanError, SignatureCollisionError, UnsupportedReason,
    UnsupportedTypeError,
};
pub use fingerprint::{Fingerprint, hash_constants};
pub use naming::NamingScheme;
pub use ownership::OwnershipClass;
pub use primitive_kind::PrimitiveKind;
