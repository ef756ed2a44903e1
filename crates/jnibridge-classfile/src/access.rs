//! Access and property flags for classes and methods (JVMS §4.1, §4.6).

use bitflags::bitflags;

bitflags! {
    /// `access_flags` of a `ClassFile`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassAccess: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// `access_flags` of a `method_info`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodAccess: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

impl ClassAccess {
    pub fn is_interface(self) -> bool {
        self.contains(ClassAccess::INTERFACE)
    }
}

impl MethodAccess {
    pub fn is_native(self) -> bool {
        self.contains(MethodAccess::NATIVE)
    }

    pub fn is_static(self) -> bool {
        self.contains(MethodAccess::STATIC)
    }

    /// Compiler-generated: synthetic or bridge.
    pub fn is_generated(self) -> bool {
        self.intersects(MethodAccess::SYNTHETIC | MethodAccess::BRIDGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_retained() {
        // Future class-file versions may define more bits; keep them rather than fail.
        let access = MethodAccess::from_bits_retain(0x0109 | 0x4000);
        assert!(access.is_native());
        assert!(access.is_static());
        assert!(!access.is_generated());
    }

    #[test]
    fn bridge_counts_as_generated() {
        assert!((MethodAccess::BRIDGE | MethodAccess::NATIVE).is_generated());
    }
}
