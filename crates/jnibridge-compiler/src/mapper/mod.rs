//! Type mapping from JVM descriptors to native representations.
//!
//! Every [`TypeDescriptor`] variant is matched in one place, [`TypeMapper::map`],
//! which yields the JNI type the stub receives, the C++ type the
//! implementation sees, and the [`OwnershipClass`] the emitter must honour:
//!
//! | Descriptor  | Parameter                        | Return                       |
//! |-------------|----------------------------------|------------------------------|
//! | primitive   | by value                         | by value                     |
//! | `String`    | `const char*`, owned             | `std::string`, owned         |
//! | object      | `jobject`, borrowed              | `jobject`, borrowed          |
//! | object (*)  | `jnibridge::GlobalRef`, owned    | `jobject`, owned             |
//! | `[prim`     | `jnibridge::Span<jprim>`, owned  | `std::vector<jprim>`, owned  |
//!
//! (*) on methods flagged [`MethodFlags::TAKES_OWNERSHIP`](jnibridge_core::MethodFlags).
//!
//! Anything else is unsupported and skips the method.

pub mod primitive;

use jnibridge_core::{
    BindingMethod, BindingTarget, ClassName, OwnershipClass, PrimitiveKind, TypeDescriptor,
    UnsupportedReason, UnsupportedTypeError,
};

/// Where a type appears in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Param,
    Return,
}

/// How a value is carried across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marshal {
    Primitive(PrimitiveKind),
    String,
    Object { owned: bool },
    PrimitiveArray(PrimitiveKind),
}

/// A descriptor mapped to its native representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappedType {
    pub descriptor: TypeDescriptor,
    pub jni_type: String,
    pub cpp_type: String,
    pub ownership: OwnershipClass,
    pub marshal: Marshal,
}

/// A method whose every type mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedMethod {
    pub method: BindingMethod,
    pub params: Vec<MappedType>,
    pub ret: MappedType,
}

impl MappedMethod {
    /// Indices of parameters the stub must acquire and release.
    pub fn owned_params(&self) -> impl Iterator<Item = (usize, &MappedType)> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.ownership.needs_release())
    }
}

/// The mapping outcome for one target.
#[derive(Debug, Clone)]
pub struct MappedTarget {
    /// The target as scanned, with every candidate method.
    pub target: BindingTarget,
    /// Methods that mapped, in class-file order.
    pub methods: Vec<MappedMethod>,
    /// Methods that did not.
    pub skipped: Vec<UnsupportedTypeError>,
}

/// Stateless descriptor-to-native mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeMapper;

impl TypeMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map one type. Total and deterministic over supported descriptors.
    pub fn map(
        &self,
        ty: &TypeDescriptor,
        position: Position,
        takes_ownership: bool,
    ) -> Result<MappedType, UnsupportedReason> {
        let (jni_type, cpp_type, ownership, marshal) = match ty {
            TypeDescriptor::Primitive(PrimitiveKind::Void) if position == Position::Param => {
                return Err(UnsupportedReason::VoidParameter);
            }
            TypeDescriptor::Primitive(kind) => (
                primitive::jni_type(*kind).to_string(),
                primitive::cpp_type(*kind).to_string(),
                OwnershipClass::ByValue,
                Marshal::Primitive(*kind),
            ),
            TypeDescriptor::StringRef => {
                let cpp = match position {
                    Position::Param => "const char*",
                    Position::Return => "std::string",
                };
                (
                    "jstring".to_string(),
                    cpp.to_string(),
                    OwnershipClass::OwnedRef,
                    Marshal::String,
                )
            }
            TypeDescriptor::ObjectRef(_) => {
                let (cpp, ownership) = match (position, takes_ownership) {
                    (Position::Param, true) => ("jnibridge::GlobalRef", OwnershipClass::OwnedRef),
                    (Position::Return, true) => ("jobject", OwnershipClass::OwnedRef),
                    (_, false) => ("jobject", OwnershipClass::BorrowedRef),
                };
                (
                    "jobject".to_string(),
                    cpp.to_string(),
                    ownership,
                    Marshal::Object {
                        owned: takes_ownership,
                    },
                )
            }
            TypeDescriptor::ArrayRef {
                element,
                dimensions,
            } => {
                if *dimensions > 1 {
                    return Err(UnsupportedReason::MultiDimensionalArray {
                        dimensions: *dimensions,
                    });
                }
                let kind = match element.as_ref() {
                    TypeDescriptor::Primitive(PrimitiveKind::Void) => {
                        return Err(UnsupportedReason::VoidParameter);
                    }
                    TypeDescriptor::Primitive(kind) => *kind,
                    _ => return Err(UnsupportedReason::ReferenceArray),
                };
                let element_jni = primitive::jni_type(kind);
                let cpp = match position {
                    Position::Param => format!("jnibridge::Span<{element_jni}>"),
                    Position::Return => format!("std::vector<{element_jni}>"),
                };
                (
                    primitive::jni_array_type(kind),
                    cpp,
                    OwnershipClass::OwnedRef,
                    Marshal::PrimitiveArray(kind),
                )
            }
        };

        Ok(MappedType {
            descriptor: ty.clone(),
            jni_type,
            cpp_type,
            ownership,
            marshal,
        })
    }

    /// Map every type of a method; the first unsupported type fails the method.
    pub fn map_method(
        &self,
        class: &ClassName,
        method: &BindingMethod,
    ) -> Result<MappedMethod, UnsupportedTypeError> {
        let owning = method.takes_ownership();
        let unsupported = |ty: &TypeDescriptor, reason| UnsupportedTypeError {
            class: class.clone(),
            method: method.name.clone(),
            descriptor: method.descriptor.encode(),
            offending: ty.encode(),
            reason,
        };

        let params = method
            .descriptor
            .params
            .iter()
            .map(|ty| {
                self.map(ty, Position::Param, owning)
                    .map_err(|reason| unsupported(ty, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ret_ty = &method.descriptor.ret;
        let ret = self
            .map(ret_ty, Position::Return, owning)
            .map_err(|reason| unsupported(ret_ty, reason))?;

        Ok(MappedMethod {
            method: method.clone(),
            params,
            ret,
        })
    }

    /// Map a target, splitting its methods into mapped and skipped.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn map_target(&self, target: BindingTarget) -> MappedTarget {
        let mut methods = Vec::with_capacity(target.methods.len());
        let mut skipped = Vec::new();
        for method in &target.methods {
            match self.map_method(&target.name, method) {
                Ok(mapped) => methods.push(mapped),
                Err(err) => {
                    tracing::warn!(
                        class = %err.class,
                        method = %err.method,
                        descriptor = %err.descriptor,
                        offending = %err.offending,
                        "skipping method: {}",
                        err.reason
                    );
                    skipped.push(err);
                }
            }
        }
        MappedTarget {
            target,
            methods,
            skipped,
        }
    }
}
