//! Unified error types for jnibridge.
//!
//! Every stage of a generation run reports failures through the types in this
//! module. They fall into two groups:
//!
//! ```text
//! GenerationError (fatal: aborts the run, nothing is written)
//! ├── Config      - ConfigError, invalid configuration
//! ├── Scan        - ScanError, metadata cannot be trusted
//! ├── Strict      - UnsupportedTypeError promoted by strict mode
//! ├── EmptyTable  - EmptyTableError, no candidate methods discovered
//! ├── Unbalanced  - a generated stub failed its resource audit
//! └── Io          - writing artifacts failed
//!
//! Recoverable (accumulated in the generation report)
//! ├── UnsupportedTypeError    - skips one method
//! └── SignatureCollisionError - skips one binding target
//! ```
//!
//! Lower-level errors (`DescriptorError`, `ClassFormatError`) surface through
//! `ScanError`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ClassName;

// ============================================================================
// Descriptor Errors
// ============================================================================

/// Categories of descriptor decoding failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorErrorKind {
    /// Input ended in the middle of a type.
    UnexpectedEnd,
    /// A character that cannot start or continue a type.
    UnexpectedChar(char),
    /// `V` outside return position, or as an array element.
    VoidNotAllowed,
    /// More than 255 array dimensions.
    TooManyDimensions(usize),
    /// An empty or malformed class name between `L` and `;`.
    InvalidClassName(String),
    /// Input continues after a complete descriptor.
    TrailingInput,
}

impl std::fmt::Display for DescriptorErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorErrorKind::UnexpectedEnd => write!(f, "unexpected end of descriptor"),
            DescriptorErrorKind::UnexpectedChar(c) => write!(f, "unexpected character '{c}'"),
            DescriptorErrorKind::VoidNotAllowed => write!(f, "'V' is only valid as a return type"),
            DescriptorErrorKind::TooManyDimensions(n) => {
                write!(f, "{n} array dimensions exceed the limit of 255")
            }
            DescriptorErrorKind::InvalidClassName(name) => write!(f, "invalid class name '{name}'"),
            DescriptorErrorKind::TrailingInput => write!(f, "trailing input after descriptor"),
        }
    }
}

/// A descriptor string that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid descriptor '{descriptor}' at offset {offset}: {kind}")]
pub struct DescriptorError {
    pub descriptor: String,
    pub offset: usize,
    pub kind: DescriptorErrorKind,
}

impl DescriptorError {
    pub fn new(descriptor: &str, offset: usize, kind: DescriptorErrorKind) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            offset,
            kind,
        }
    }
}

// ============================================================================
// Class-File Errors
// ============================================================================

/// Structural errors found while reading a class file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFormatError {
    /// The file does not start with `0xCAFEBABE`.
    #[error("bad magic number {found:#010x}")]
    BadMagic { found: u32 },

    /// The class-file major version is outside the supported range.
    #[error("unsupported class-file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    /// The input ended before a structure was complete.
    #[error("truncated class file: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// A constant-pool entry has an unknown tag.
    #[error("unknown constant-pool tag {tag} at offset {offset}")]
    UnknownConstantTag { tag: u8, offset: usize },

    /// A constant-pool index is zero, out of range, or points into the
    /// unusable second slot of a long/double.
    #[error("invalid constant-pool index {index}")]
    BadConstantIndex { index: u16 },

    /// A constant-pool entry has a different kind than the reference requires.
    #[error("constant-pool entry {index} is {found}, expected {expected}")]
    WrongConstantKind {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    /// A modified UTF-8 string is not well formed.
    #[error("malformed modified UTF-8 at offset {offset}")]
    BadUtf8 { offset: usize },

    /// An annotation element value has an unknown tag.
    #[error("unknown annotation element tag '{tag}' at offset {offset}")]
    UnknownElementTag { tag: char, offset: usize },

    /// Annotation element values nest deeper than the reader accepts.
    #[error("annotation element values nested deeper than {limit} at offset {offset}")]
    NestingTooDeep { limit: usize, offset: usize },

    /// An attribute's declared length disagrees with its contents.
    #[error("attribute '{name}' declares {declared} bytes but its contents use {actual}")]
    AttributeLength {
        name: String,
        declared: usize,
        actual: usize,
    },

    /// Bytes remain after the class structure.
    #[error("{remaining} trailing bytes after class structure")]
    TrailingBytes { remaining: usize },
}

// ============================================================================
// Scan Errors (fatal)
// ============================================================================

/// Metadata scanning failed. Always fatal: a partial scan would silently
/// drop bindings.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A classpath root or class file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A classpath archive could not be opened or read.
    #[error("cannot read archive '{}': {message}", path.display())]
    Archive { path: PathBuf, message: String },

    /// A class file is malformed.
    #[error("malformed class file '{origin}': {source}")]
    Malformed {
        origin: String,
        #[source]
        source: ClassFormatError,
    },

    /// A target inherits metadata from a class that is missing from the
    /// classpath or is not a bridge class.
    #[error("class '{class}' inherits metadata from '{from}', which is not a bridge class on the classpath")]
    InheritFrom { class: ClassName, from: ClassName },

    /// A custom JNI code path names a resource no classpath root contains.
    #[error("class '{class}' references custom JNI code '{path}', which is not on the classpath")]
    MissingResource { class: ClassName, path: String },

    /// A selected method carries an undecodable descriptor.
    #[error("class '{class}' method '{method}': {source}")]
    Descriptor {
        class: ClassName,
        method: String,
        #[source]
        source: DescriptorError,
    },
}

// ============================================================================
// Unsupported Types (recoverable, per method)
// ============================================================================

/// Why a type cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// Arrays with more than one dimension.
    MultiDimensionalArray { dimensions: u8 },
    /// Arrays whose element is a reference type.
    ReferenceArray,
    /// `void` used as a parameter type.
    VoidParameter,
}

impl std::fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedReason::MultiDimensionalArray { dimensions } => {
                write!(f, "{dimensions}-dimensional arrays are not supported")
            }
            UnsupportedReason::ReferenceArray => {
                write!(f, "arrays of reference types are not supported")
            }
            UnsupportedReason::VoidParameter => write!(f, "void is not a valid parameter type"),
        }
    }
}

/// A method that cannot be bound because one of its types has no native
/// mapping. The method is skipped; the rest of its class is still bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class}.{method}{descriptor}: {reason} (offending type '{offending}')")]
pub struct UnsupportedTypeError {
    pub class: ClassName,
    pub method: String,
    /// Full method descriptor.
    pub descriptor: String,
    /// The descriptor of the type that could not be mapped.
    pub offending: String,
    pub reason: UnsupportedReason,
}

// ============================================================================
// Signature Collisions (recoverable, per target)
// ============================================================================

/// How two bindings collided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionKind {
    /// Same name and same erased (parameter-only) descriptor within one class.
    ErasedDescriptor { other_descriptor: String },
    /// The entry-point name was already claimed by another binding in this run.
    EntryPoint { claimed_by: String },
}

/// Two bindings cannot be told apart on the native side. The whole class is
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class}.{method}{descriptor} collides on entry point '{entry_point}'")]
pub struct SignatureCollisionError {
    pub class: ClassName,
    pub method: String,
    pub descriptor: String,
    pub entry_point: String,
    pub kind: CollisionKind,
}

// ============================================================================
// Empty Table (fatal)
// ============================================================================

/// No candidate methods were discovered at all. Treated as a configuration
/// error upstream rather than silently producing an empty artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no bindings discovered on the classpath ({classes_scanned} classes scanned)")]
pub struct EmptyTableError {
    pub classes_scanned: usize,
}

// ============================================================================
// Configuration
// ============================================================================

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(String),

    #[error("invalid config value for '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// A fatal error that aborts a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("strict mode: {0}")]
    Strict(UnsupportedTypeError),

    #[error(transparent)]
    EmptyTable(#[from] EmptyTableError),

    /// Generator bug: a stub acquires something it does not release on some
    /// path.
    #[error("internal error: stub '{symbol}' is unbalanced: {detail}")]
    Unbalanced { symbol: String, detail: String },

    #[error("cannot write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_error_display() {
        let err = DescriptorError::new("(V)V", 1, DescriptorErrorKind::VoidNotAllowed);
        assert_eq!(
            err.to_string(),
            "invalid descriptor '(V)V' at offset 1: 'V' is only valid as a return type"
        );
    }

    #[test]
    fn unsupported_type_display() {
        let err = UnsupportedTypeError {
            class: ClassName::from_internal("com/example/Greeter"),
            method: "greet".into(),
            descriptor: "([[Ljava/lang/String;)Ljava/lang/String;".into(),
            offending: "[[Ljava/lang/String;".into(),
            reason: UnsupportedReason::MultiDimensionalArray { dimensions: 2 },
        };
        let text = err.to_string();
        assert!(text.starts_with("com.example.Greeter.greet("));
        assert!(text.contains("2-dimensional arrays are not supported"));
        assert!(text.contains("[[Ljava/lang/String;"));
    }

    #[test]
    fn strict_wraps_unsupported() {
        let err = GenerationError::Strict(UnsupportedTypeError {
            class: ClassName::from_internal("A"),
            method: "f".into(),
            descriptor: "(V)V".into(),
            offending: "V".into(),
            reason: UnsupportedReason::VoidParameter,
        });
        assert!(err.to_string().starts_with("strict mode: A.f(V)V"));
    }

    #[test]
    fn empty_table_converts() {
        let err: GenerationError = EmptyTableError { classes_scanned: 0 }.into();
        assert!(matches!(err, GenerationError::EmptyTable(_)));
    }
}
