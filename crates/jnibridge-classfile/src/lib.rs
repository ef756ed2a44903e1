//! JVM class-file reader.
//!
//! Decodes the parts of a `.class` file that binding generation needs:
//!
//! - [`constant_pool`]: every constant-pool tag, with `Long`/`Double` slot
//!   accounting and modified UTF-8 strings
//! - [`access`]: class and method access flags
//! - [`annotation`]: runtime-visible and runtime-invisible annotations with
//!   nested element values
//! - [`class_file`]: the top-level structure
//!
//! Every structural problem is reported as a
//! [`ClassFormatError`](jnibridge_core::ClassFormatError) carrying a byte offset.

pub mod access;
pub mod annotation;
pub mod class_file;
pub mod constant_pool;
pub mod mutf8;
pub mod reader;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use access::{ClassAccess, MethodAccess};
pub use annotation::{Annotation, ElementValue};
pub use class_file::{ClassFile, MAX_MAJOR_VERSION, MIN_MAJOR_VERSION, MethodInfo};
pub use constant_pool::{Constant, ConstantPool, ConstantTag};
