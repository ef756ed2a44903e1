//! JVM type and method descriptors.
//!
//! This module provides [`TypeDescriptor`], the tagged variant every stage of the
//! generator speaks, and [`MethodDescriptor`], an ordered parameter list plus a
//! return type. Both encode to and decode from the wire format of JVMS §4.3:
//!
//! ```text
//! I                      -> Primitive(Int)
//! Ljava/lang/String;     -> StringRef
//! Lcom/example/Point;    -> ObjectRef(com/example/Point)
//! [[J                    -> ArrayRef { element: Primitive(Long), dimensions: 2 }
//! (ILjava/lang/String;)V -> MethodDescriptor { params: [Int, String], ret: Void }
//! ```
//!
//! `java/lang/String` is decoded to [`TypeDescriptor::StringRef`] rather than an
//! `ObjectRef` so the mapper can give it its own ownership rule; encoding writes
//! it back as `Ljava/lang/String;`, so decode/encode is lossless.

use std::fmt::{self, Display, Formatter, Write};

use crate::error::{DescriptorError, DescriptorErrorKind};
use crate::{ClassName, PrimitiveKind};

/// Maximum array dimensions permitted by the class-file format.
pub const MAX_ARRAY_DIMENSIONS: u8 = 255;

/// A single field/parameter/return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// A primitive value, or `void` in return position.
    Primitive(PrimitiveKind),
    /// A reference to any class or interface other than `java.lang.String`.
    ObjectRef(ClassName),
    /// An array. `element` is never itself an array; nesting is carried by
    /// `dimensions` (always >= 1).
    ArrayRef {
        element: Box<TypeDescriptor>,
        dimensions: u8,
    },
    /// `java.lang.String`.
    StringRef,
}

impl TypeDescriptor {
    /// `void`, for return types.
    pub const VOID: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Void);

    /// Shorthand for a primitive descriptor.
    pub const fn primitive(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive(kind)
    }

    /// Build an object reference, folding `java/lang/String` into `StringRef`.
    pub fn object(name: ClassName) -> Self {
        if name.is_string() {
            TypeDescriptor::StringRef
        } else {
            TypeDescriptor::ObjectRef(name)
        }
    }

    /// Build an array type. Array elements are flattened so that
    /// `array(array(I, 1), 1)` equals `array(I, 2)`.
    ///
    /// Dimensions saturate at [`MAX_ARRAY_DIMENSIONS`].
    pub fn array(element: TypeDescriptor, dimensions: u8) -> Self {
        debug_assert!(dimensions >= 1, "arrays have at least one dimension");
        match element {
            TypeDescriptor::ArrayRef {
                element: inner,
                dimensions: inner_dims,
            } => TypeDescriptor::ArrayRef {
                element: inner,
                dimensions: inner_dims.saturating_add(dimensions),
            },
            other => TypeDescriptor::ArrayRef {
                element: Box::new(other),
                dimensions,
            },
        }
    }

    /// Whether this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(PrimitiveKind::Void))
    }

    /// Whether this is a reference (object, string, or array).
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeDescriptor::Primitive(_))
    }

    /// Decode a complete field descriptor.
    ///
    /// `V` is accepted here so return types can be decoded standalone;
    /// [`MethodDescriptor::parse`] rejects it in parameter position.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut parser = DescriptorParser::new(descriptor);
        let ty = parser.parse_type(true)?;
        parser.expect_end()?;
        Ok(ty)
    }

    /// Encode to wire format.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Human-readable Java source spelling (`int[][]`, `java.lang.String`).
    pub fn java_name(&self) -> String {
        match self {
            TypeDescriptor::Primitive(kind) => kind.name().to_string(),
            TypeDescriptor::ObjectRef(name) => name.binary_name(),
            TypeDescriptor::StringRef => "java.lang.String".to_string(),
            TypeDescriptor::ArrayRef {
                element,
                dimensions,
            } => {
                let mut out = element.java_name();
                for _ in 0..*dimensions {
                    out.push_str("[]");
                }
                out
            }
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => f.write_char(kind.code()),
            TypeDescriptor::ObjectRef(name) => write!(f, "L{};", name.internal_name()),
            TypeDescriptor::StringRef => f.write_str("Ljava/lang/String;"),
            TypeDescriptor::ArrayRef {
                element,
                dimensions,
            } => {
                for _ in 0..*dimensions {
                    f.write_char('[')?;
                }
                write!(f, "{element}")
            }
        }
    }
}

/// A method's parameter list and return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<TypeDescriptor>,
    pub ret: TypeDescriptor,
}

impl MethodDescriptor {
    pub fn new(params: Vec<TypeDescriptor>, ret: TypeDescriptor) -> Self {
        Self { params, ret }
    }

    /// Decode a complete method descriptor such as `(I[JLjava/lang/String;)V`.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut parser = DescriptorParser::new(descriptor);
        parser.expect(b'(')?;
        let mut params = Vec::new();
        while parser.peek() != Some(b')') {
            if parser.peek().is_none() {
                return Err(parser.error(DescriptorErrorKind::UnexpectedEnd));
            }
            params.push(parser.parse_type(false)?);
        }
        parser.expect(b')')?;
        let ret = parser.parse_type(true)?;
        parser.expect_end()?;
        Ok(Self { params, ret })
    }

    /// The full wire encoding.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parameter types only, without parentheses (`ILjava/lang/String;`).
    ///
    /// This is the part of the descriptor that survives return-type erasure,
    /// and the part JNI long entry-point names are built from.
    pub fn encode_params(&self) -> String {
        let mut out = String::new();
        for param in &self.params {
            // Writing to a String cannot fail.
            let _ = write!(out, "{param}");
        }
        out
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('(')?;
        for param in &self.params {
            write!(f, "{param}")?;
        }
        write!(f, "){}", self.ret)
    }
}

/// Byte-level recursive-descent decoder shared by both descriptor kinds.
struct DescriptorParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, kind: DescriptorErrorKind) -> DescriptorError {
        DescriptorError::new(self.source, self.pos, kind)
    }

    fn expect(&mut self, byte: u8) -> Result<(), DescriptorError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(DescriptorErrorKind::UnexpectedChar(b as char))),
            None => Err(self.error(DescriptorErrorKind::UnexpectedEnd)),
        }
    }

    fn expect_end(&self) -> Result<(), DescriptorError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error(DescriptorErrorKind::TrailingInput))
        }
    }

    fn parse_type(&mut self, allow_void: bool) -> Result<TypeDescriptor, DescriptorError> {
        let start = self.pos;
        let mut dimensions: usize = 0;
        while self.peek() == Some(b'[') {
            dimensions += 1;
            self.pos += 1;
        }
        if dimensions > usize::from(MAX_ARRAY_DIMENSIONS) {
            return Err(DescriptorError::new(
                self.source,
                start,
                DescriptorErrorKind::TooManyDimensions(dimensions),
            ));
        }

        let element = match self.peek() {
            None => return Err(self.error(DescriptorErrorKind::UnexpectedEnd)),
            Some(b'L') => self.parse_class()?,
            Some(code) => match PrimitiveKind::from_code(code) {
                Some(PrimitiveKind::Void) if !allow_void || dimensions > 0 => {
                    return Err(self.error(DescriptorErrorKind::VoidNotAllowed));
                }
                Some(kind) => {
                    self.pos += 1;
                    TypeDescriptor::Primitive(kind)
                }
                None => {
                    let ch = self.source[self.pos..].chars().next().unwrap_or('?');
                    return Err(self.error(DescriptorErrorKind::UnexpectedChar(ch)));
                }
            },
        };

        Ok(match u8::try_from(dimensions).unwrap_or(MAX_ARRAY_DIMENSIONS) {
            0 => element,
            dims => TypeDescriptor::array(element, dims),
        })
    }

    fn parse_class(&mut self) -> Result<TypeDescriptor, DescriptorError> {
        self.expect(b'L')?;
        let start = self.pos;
        let Some(len) = self.bytes[start..].iter().position(|&b| b == b';') else {
            self.pos = self.bytes.len();
            return Err(self.error(DescriptorErrorKind::UnexpectedEnd));
        };
        let name = &self.source[start..start + len];
        let class = ClassName::from_internal(name);
        if !class.is_valid() {
            return Err(DescriptorError::new(
                self.source,
                start,
                DescriptorErrorKind::InvalidClassName(name.to_string()),
            ));
        }
        self.pos = start + len + 1;
        Ok(TypeDescriptor::object(class))
    }
}
