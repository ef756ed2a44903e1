//! The binding model produced by scanning and consumed by every later stage.
//!
//! A [`BindingTarget`] is one class selected for native exposure; its
//! [`BindingMethod`]s are the native methods that will get stubs and
//! registration entries. Targets are built once per run and never mutated
//! afterwards: later stages consume them by value and produce new records.

use bitflags::bitflags;

use crate::{ClassName, MethodDescriptor};

bitflags! {
    /// Per-method properties that influence mapping and emission.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u8 {
        /// Static method; the stub receives `jclass` instead of `jobject`.
        const STATIC = 1 << 0;
        /// Constructor-style factory: object references passed in or returned
        /// change owner, so they map to owned references.
        const TAKES_OWNERSHIP = 1 << 1;
        /// No null checks on any reference argument.
        const IGNORE_NULLCHECK = 1 << 2;
    }
}

/// One method selected for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMethod {
    /// Java method name.
    pub name: String,
    /// Name of the C++ implementation function the stub calls through to.
    pub native_name: String,
    /// Method-level C++ namespace override.
    pub namespace: Option<String>,
    pub descriptor: MethodDescriptor,
    pub flags: MethodFlags,
    /// Parameters whose null check is suppressed, ascending.
    pub unchecked_params: Vec<usize>,
    /// Position among same-named methods, assigned by the signature encoder.
    /// `None` until encoded, and for methods that are not overloaded.
    pub overload_index: Option<u16>,
}

impl BindingMethod {
    /// Create a method whose implementation shares its Java name.
    pub fn new(name: impl Into<String>, descriptor: MethodDescriptor, flags: MethodFlags) -> Self {
        let name = name.into();
        Self {
            native_name: name.clone(),
            name,
            namespace: None,
            descriptor,
            flags,
            unchecked_params: Vec::new(),
            overload_index: None,
        }
    }

    /// Override the implementation function name.
    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = native_name.into();
        self
    }

    /// Override the implementation namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Suppress the null check on parameter `index`.
    pub fn with_unchecked_param(mut self, index: usize) -> Self {
        if let Err(at) = self.unchecked_params.binary_search(&index) {
            self.unchecked_params.insert(at, index);
        }
        self
    }

    /// Whether the stub rejects a null reference in parameter `index`.
    pub fn null_checked(&self, index: usize) -> bool {
        !self.flags.contains(MethodFlags::IGNORE_NULLCHECK)
            && self.unchecked_params.binary_search(&index).is_err()
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn takes_ownership(&self) -> bool {
        self.flags.contains(MethodFlags::TAKES_OWNERSHIP)
    }

    /// `name` + full descriptor, e.g. `add(II)I`.
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }
}

/// Whether a target binds only static methods or also instance methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Every bound method is static (a utility class).
    Static,
    /// At least one bound method needs a receiver.
    Instance,
}

/// A hand-written JNI fragment copied verbatim into a target's unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCode {
    /// Resource path the fragment was loaded from.
    pub path: String,
    pub contents: String,
}

/// One class selected for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTarget {
    pub name: ClassName,
    pub kind: TargetKind,
    /// Explicit C++ namespace for implementations. When `None` the emitter
    /// derives one from the Java package.
    pub namespace: Option<String>,
    /// Extra headers the generated unit includes.
    pub includes: Vec<String>,
    /// Fragments appended to the unit after the stubs, in declaration order.
    pub custom_code: Vec<CustomCode>,
    pub methods: Vec<BindingMethod>,
}

impl BindingTarget {
    /// Create a target; its kind is derived from the methods.
    pub fn new(name: ClassName, methods: Vec<BindingMethod>) -> Self {
        let kind = Self::kind_of(&methods);
        Self {
            name,
            kind,
            namespace: None,
            includes: Vec::new(),
            custom_code: Vec::new(),
            methods,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_custom_code(mut self, custom_code: Vec<CustomCode>) -> Self {
        self.custom_code = custom_code;
        self
    }

    pub fn is_static(&self) -> bool {
        self.kind == TargetKind::Static
    }

    fn kind_of(methods: &[BindingMethod]) -> TargetKind {
        if methods.iter().all(BindingMethod::is_static) {
            TargetKind::Static
        } else {
            TargetKind::Instance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrimitiveKind, TypeDescriptor};

    fn int() -> TypeDescriptor {
        TypeDescriptor::primitive(PrimitiveKind::Int)
    }

    #[test]
    fn native_name_defaults_to_java_name() {
        let m = BindingMethod::new("add", MethodDescriptor::new(vec![int()], int()), MethodFlags::STATIC);
        assert_eq!(m.native_name, "add");
        assert_eq!(m.signature(), "add(I)I");
        assert!(m.is_static());
        assert!(!m.takes_ownership());

        let renamed = m.with_native_name("addInts");
        assert_eq!(renamed.name, "add");
        assert_eq!(renamed.native_name, "addInts");
    }

    #[test]
    fn null_checks_can_be_suppressed() {
        let desc = || MethodDescriptor::new(vec![TypeDescriptor::StringRef, int()], TypeDescriptor::VOID);
        let m = BindingMethod::new("f", desc(), MethodFlags::empty());
        assert!(m.null_checked(0));

        let m = m.with_unchecked_param(0).with_unchecked_param(0);
        assert_eq!(m.unchecked_params, vec![0]);
        assert!(!m.null_checked(0));
        assert!(m.null_checked(1));

        let all = BindingMethod::new("g", desc(), MethodFlags::IGNORE_NULLCHECK);
        assert!(!all.null_checked(0));
    }

    #[test]
    fn kind_follows_methods() {
        let void = || MethodDescriptor::new(vec![], TypeDescriptor::VOID);
        let stat = BindingMethod::new("f", void(), MethodFlags::STATIC);
        let inst = BindingMethod::new("g", void(), MethodFlags::empty());

        let target = BindingTarget::new(ClassName::from_internal("a/B"), vec![stat.clone()]);
        assert!(target.is_static());

        let target = BindingTarget::new(ClassName::from_internal("a/B"), vec![stat, inst]);
        assert_eq!(target.kind, TargetKind::Instance);
        assert!(!target.is_static());
    }
}
