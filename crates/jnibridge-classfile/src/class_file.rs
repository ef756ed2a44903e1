//! The `ClassFile` structure (JVMS §4.1), reduced to what binding generation
//! needs: names, flags, super types, methods and annotations.
//!
//! Fields and code are walked for structural validation but not kept.

use jnibridge_core::{ClassFormatError, ClassName};

use crate::access::{ClassAccess, MethodAccess};
use crate::annotation::{Annotation, parse_annotations, parse_parameter_annotations};
use crate::constant_pool::ConstantPool;
use crate::reader::ByteReader;

/// `0xCAFEBABE`.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Oldest supported major version (JDK 1.1).
pub const MIN_MAJOR_VERSION: u16 = 45;

/// Newest supported major version (Java 25).
pub const MAX_MAJOR_VERSION: u16 = 69;

const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeInvisibleParameterAnnotations";
const SOURCE_FILE: &str = "SourceFile";

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access: ClassAccess,
    pub this_class: ClassName,
    /// `None` only for `java/lang/Object` and `module-info`.
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub methods: Vec<MethodInfo>,
    /// Visible and invisible annotations, visible first.
    pub annotations: Vec<Annotation>,
    pub source_file: Option<String>,
}

/// One `method_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub access: MethodAccess,
    pub name: String,
    /// Raw method descriptor; decoded later so a bad descriptor can be reported
    /// against its class and method.
    pub descriptor: String,
    pub annotations: Vec<Annotation>,
    /// Annotations per parameter, as declared by the parameter annotation
    /// attributes. Shorter than the descriptor's parameter list when the
    /// compiler omitted synthetic or trailing parameters.
    pub parameter_annotations: Vec<Vec<Annotation>>,
}

impl MethodInfo {
    /// Find an annotation by type.
    pub fn annotation(&self, name: &ClassName) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(name))
    }

    /// Find an annotation on parameter `index`.
    pub fn parameter_annotation(&self, index: usize, name: &ClassName) -> Option<&Annotation> {
        self.parameter_annotations.get(index)?.iter().find(|a| a.is(name))
    }
}

/// Attributes this reader understands.
#[derive(Default)]
struct Attributes {
    visible: Vec<Annotation>,
    invisible: Vec<Annotation>,
    parameters: Vec<Vec<Annotation>>,
    source_file: Option<String>,
}

impl Attributes {
    fn into_annotations(mut self) -> Vec<Annotation> {
        self.visible.append(&mut self.invisible);
        self.visible
    }

    /// Visible and invisible parameter annotations merged by position.
    fn merge_parameters(&mut self, parsed: Vec<Vec<Annotation>>) {
        if self.parameters.len() < parsed.len() {
            self.parameters.resize_with(parsed.len(), Vec::new);
        }
        for (slot, mut annotations) in self.parameters.iter_mut().zip(parsed) {
            slot.append(&mut annotations);
        }
    }
}

impl ClassFile {
    /// Parse a complete class file. Trailing bytes are an error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFormatError> {
        let mut r = ByteReader::new(bytes);

        let magic = r.u4()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic { found: magic });
        }
        let minor_version = r.u2()?;
        let major_version = r.u2()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
            return Err(ClassFormatError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let pool = ConstantPool::parse(&mut r)?;
        let access = ClassAccess::from_bits_retain(r.u2()?);
        let this_class = pool.class_name(r.u2()?)?;
        let super_class = pool.optional_class_name(r.u2()?)?;

        let interface_count = r.u2()?;
        let interfaces = (0..interface_count)
            .map(|_| pool.class_name(r.u2()?))
            .collect::<Result<Vec<_>, _>>()?;

        let field_count = r.u2()?;
        for _ in 0..field_count {
            // access, name, descriptor
            r.skip(6)?;
            Self::parse_attributes(&mut r, &pool)?;
        }

        let method_count = r.u2()?;
        let mut methods = Vec::with_capacity(usize::from(method_count));
        for _ in 0..method_count {
            let access = MethodAccess::from_bits_retain(r.u2()?);
            let name = pool.utf8(r.u2()?)?.to_string();
            let descriptor = pool.utf8(r.u2()?)?.to_string();
            let mut attributes = Self::parse_attributes(&mut r, &pool)?;
            let parameter_annotations = std::mem::take(&mut attributes.parameters);
            methods.push(MethodInfo {
                access,
                name,
                descriptor,
                annotations: attributes.into_annotations(),
                parameter_annotations,
            });
        }

        let attributes = Self::parse_attributes(&mut r, &pool)?;
        let source_file = attributes.source_file.clone();

        if !r.is_eof() {
            return Err(ClassFormatError::TrailingBytes {
                remaining: r.remaining(),
            });
        }

        Ok(Self {
            minor_version,
            major_version,
            access,
            this_class,
            super_class,
            interfaces,
            methods,
            annotations: attributes.into_annotations(),
            source_file,
        })
    }

    fn parse_attributes(
        r: &mut ByteReader<'_>,
        pool: &ConstantPool,
    ) -> Result<Attributes, ClassFormatError> {
        let mut out = Attributes::default();
        let count = r.u2()?;
        for _ in 0..count {
            let name = pool.utf8(r.u2()?)?;
            let declared = r.u4()? as usize;
            let mut body = r.sub_reader(declared)?;

            match name {
                RUNTIME_VISIBLE_ANNOTATIONS | RUNTIME_INVISIBLE_ANNOTATIONS => {
                    let visible = name == RUNTIME_VISIBLE_ANNOTATIONS;
                    let mut parsed = parse_annotations(&mut body, pool, visible)?;
                    Self::check_consumed(name, declared, &body)?;
                    if visible {
                        out.visible.append(&mut parsed);
                    } else {
                        out.invisible.append(&mut parsed);
                    }
                }
                RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS | RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => {
                    let visible = name == RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS;
                    let parsed = parse_parameter_annotations(&mut body, pool, visible)?;
                    Self::check_consumed(name, declared, &body)?;
                    out.merge_parameters(parsed);
                }
                SOURCE_FILE => {
                    out.source_file = Some(pool.utf8(body.u2()?)?.to_string());
                    Self::check_consumed(name, declared, &body)?;
                }
                _ => {}
            }
        }
        Ok(out)
    }

    fn check_consumed(
        name: &str,
        declared: usize,
        body: &ByteReader<'_>,
    ) -> Result<(), ClassFormatError> {
        if body.is_eof() {
            Ok(())
        } else {
            Err(ClassFormatError::AttributeLength {
                name: name.to_string(),
                declared,
                actual: declared - body.remaining(),
            })
        }
    }

    /// Find a class-level annotation by type.
    pub fn annotation(&self, name: &ClassName) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(name))
    }

    /// Whether this is `module-info` or `package-info`.
    pub fn is_descriptor_class(&self) -> bool {
        self.access.contains(ClassAccess::MODULE)
            || matches!(self.this_class.simple_name(), "module-info" | "package-info")
    }

    /// Methods declared `native`.
    pub fn native_methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|m| m.access.is_native())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AnnotationSpec, ClassWriter, MethodSpec};

    #[test]
    fn parses_minimal_class() {
        let bytes = ClassWriter::new("com/example/Math")
            .source_file("Math.java")
            .native_method(MethodAccess::PUBLIC | MethodAccess::STATIC, "add", "(II)I")
            .method(MethodAccess::PUBLIC, "<init>", "()V")
            .to_bytes();

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.this_class.internal_name(), "com/example/Math");
        assert_eq!(class.super_class.as_ref().unwrap().internal_name(), "java/lang/Object");
        assert_eq!(class.source_file.as_deref(), Some("Math.java"));
        assert_eq!(class.methods.len(), 2);

        let natives: Vec<_> = class.native_methods().collect();
        assert_eq!(natives.len(), 1);
        assert_eq!(natives[0].name, "add");
        assert_eq!(natives[0].descriptor, "(II)I");
        assert!(natives[0].access.is_static());
    }

    #[test]
    fn reads_interfaces_and_annotations() {
        let bytes = ClassWriter::new("a/Widget")
            .interface("a/IPointer")
            .class_annotation("La/BridgeClass;", true, &[("namespace", "widgets")])
            .class_annotation("La/Hidden;", false, &[])
            .native_method_annotated(
                MethodAccess::PUBLIC,
                "draw",
                "()V",
                "La/Name;",
                &[("value", "drawWidget")],
            )
            .to_bytes();

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.interfaces, vec![ClassName::from_internal("a/IPointer")]);
        assert_eq!(class.annotations.len(), 2);
        assert!(class.annotations[0].visible);
        assert!(!class.annotations[1].visible);

        let bridge = class.annotation(&ClassName::from_internal("a/BridgeClass")).unwrap();
        assert_eq!(bridge.element("namespace").and_then(|v| v.as_str()), Some("widgets"));

        let draw = &class.methods[0];
        let name = draw.annotation(&ClassName::from_internal("a/Name")).unwrap();
        assert_eq!(name.value().and_then(|v| v.as_str()), Some("drawWidget"));
    }

    #[test]
    fn reads_parameter_annotations() {
        let bytes = ClassWriter::new("a/Widget")
            .method_spec(
                MethodSpec::native(MethodAccess::PUBLIC, "resize", "(Ljava/lang/Object;II)V")
                    .annotate_parameter(2, AnnotationSpec::new("La/Unchecked;"))
                    .annotate_parameter(0, AnnotationSpec::new("La/Hidden;").invisible()),
            )
            .to_bytes();

        let class = ClassFile::parse(&bytes).unwrap();
        let resize = &class.methods[0];
        assert_eq!(resize.parameter_annotations.len(), 3);
        let unchecked = ClassName::from_internal("a/Unchecked");
        assert!(resize.parameter_annotation(2, &unchecked).is_some());
        assert!(resize.parameter_annotation(0, &unchecked).is_none());
        assert!(resize.parameter_annotation(0, &ClassName::from_internal("a/Hidden")).is_some());
        assert!(resize.parameter_annotation(7, &unchecked).is_none());
        assert!(resize.annotations.is_empty());
    }

    #[test]
    fn bad_magic() {
        let mut bytes = ClassWriter::new("A").to_bytes();
        bytes[0] = 0xDE;
        assert!(matches!(
            ClassFile::parse(&bytes),
            Err(ClassFormatError::BadMagic { .. })
        ));
    }

    #[test]
    fn unsupported_version() {
        let bytes = ClassWriter::new("A").version(70, 0).to_bytes();
        assert_eq!(
            ClassFile::parse(&bytes).unwrap_err(),
            ClassFormatError::UnsupportedVersion { major: 70, minor: 0 }
        );
        let bytes = ClassWriter::new("A").version(44, 0).to_bytes();
        assert!(ClassFile::parse(&bytes).is_err());
    }

    #[test]
    fn truncated_and_trailing() {
        let bytes = ClassWriter::new("A").native_method(MethodAccess::NATIVE, "f", "()V").to_bytes();
        for cut in [3, 9, bytes.len() - 1] {
            assert!(
                matches!(
                    ClassFile::parse(&bytes[..cut]),
                    Err(ClassFormatError::Truncated { .. })
                ),
                "cut at {cut}"
            );
        }

        let mut padded = bytes.clone();
        padded.push(0);
        assert_eq!(
            ClassFile::parse(&padded).unwrap_err(),
            ClassFormatError::TrailingBytes { remaining: 1 }
        );
    }

    #[test]
    fn module_info_is_a_descriptor_class() {
        let bytes = ClassWriter::new("module-info").no_super().to_bytes();
        let class = ClassFile::parse(&bytes).unwrap();
        assert!(class.super_class.is_none());
        assert!(class.is_descriptor_class());
    }
}
