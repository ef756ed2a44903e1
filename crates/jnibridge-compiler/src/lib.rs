//! jnibridge compiler
//!
//! Turns scanned binding targets into native glue.
//!
//! ## Stages
//!
//! - **Map**: every parameter and return type gets a JNI type, a C++ type and
//!   an ownership class; methods with unsupported types are skipped
//! - **Encode**: overloads are numbered and every method gets a JNI
//!   entry-point name, claimed run-wide
//! - **Emit**: stubs are lowered, audited for balanced resource handling and
//!   rendered into one translation unit per target
//!
//! ## Modules
//!
//! - [`mapper`]: descriptor-to-native type mapping
//! - [`signature`]: entry-point naming and overload disambiguation
//! - [`emit`]: stub lowering, auditing and rendering

pub mod emit;
pub mod mapper;
pub mod signature;

pub use emit::{
    BindingEmitter, DEFAULT_EXCEPTION_CLASS, DEFAULT_RUNTIME_HEADER, EmitOptions, EmittedUnit,
    render_runtime_header,
};
pub use mapper::{MappedMethod, MappedTarget, MappedType, Marshal, Position, TypeMapper};
pub use signature::{EncodedSignature, EncodedTarget, SignatureEncoder};

// Re-export the recoverable errors for convenience
pub use jnibridge_core::{SignatureCollisionError, UnsupportedTypeError};
