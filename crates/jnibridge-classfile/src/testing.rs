//! Assembles small class files for tests and benchmarks.
//!
//! Only the structures the reader cares about are written: the constant pool,
//! class header, methods without code, class/method/parameter annotations and
//! `SourceFile`.

use rustc_hash::FxHashMap;

use crate::access::{ClassAccess, MethodAccess};
use crate::class_file::{MAGIC, MAX_MAJOR_VERSION};
use crate::mutf8;

/// An annotation element to write.
#[derive(Debug, Clone)]
pub enum ElementSpec {
    String(String),
    Strings(Vec<String>),
    Boolean(bool),
    /// Class literals by internal name.
    Classes(Vec<String>),
    Annotation(Box<AnnotationSpec>),
}

/// An annotation to write.
#[derive(Debug, Clone)]
pub struct AnnotationSpec {
    descriptor: String,
    visible: bool,
    elements: Vec<(String, ElementSpec)>,
}

impl AnnotationSpec {
    /// A visible annotation of type `descriptor` (`Lcom/x/Name;`).
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            visible: true,
            elements: Vec::new(),
        }
    }

    /// Emit into `RuntimeInvisibleAnnotations` (class retention).
    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn string(mut self, name: &str, value: &str) -> Self {
        self.elements
            .push((name.to_string(), ElementSpec::String(value.to_string())));
        self
    }

    pub fn strings(mut self, name: &str, values: &[&str]) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.elements.push((name.to_string(), ElementSpec::Strings(values)));
        self
    }

    pub fn boolean(mut self, name: &str, value: bool) -> Self {
        self.elements.push((name.to_string(), ElementSpec::Boolean(value)));
        self
    }

    /// A `Class<?>[]` element; `classes` are internal names.
    pub fn classes(mut self, name: &str, classes: &[&str]) -> Self {
        let classes = classes.iter().map(|c| c.to_string()).collect();
        self.elements.push((name.to_string(), ElementSpec::Classes(classes)));
        self
    }

    /// A nested annotation element.
    pub fn nested(mut self, name: &str, annotation: AnnotationSpec) -> Self {
        self.elements
            .push((name.to_string(), ElementSpec::Annotation(Box::new(annotation))));
        self
    }
}

/// A method to write.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    access: MethodAccess,
    name: String,
    descriptor: String,
    annotations: Vec<AnnotationSpec>,
    /// `(parameter index, annotation)`.
    parameter_annotations: Vec<(usize, AnnotationSpec)>,
}

impl MethodSpec {
    pub fn new(access: MethodAccess, name: &str, descriptor: &str) -> Self {
        Self {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            annotations: Vec::new(),
            parameter_annotations: Vec::new(),
        }
    }

    /// A `native` method.
    pub fn native(access: MethodAccess, name: &str, descriptor: &str) -> Self {
        Self::new(access | MethodAccess::NATIVE, name, descriptor)
    }

    pub fn annotate(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn annotate_parameter(mut self, index: usize, annotation: AnnotationSpec) -> Self {
        self.parameter_annotations.push((index, annotation));
        self
    }
}

/// Builder for a class file. Defaults to a public class extending
/// `java/lang/Object` at the newest supported version.
#[derive(Debug, Clone)]
pub struct ClassWriter {
    name: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    access: ClassAccess,
    major: u16,
    minor: u16,
    methods: Vec<MethodSpec>,
    annotations: Vec<AnnotationSpec>,
    source_file: Option<String>,
}

impl ClassWriter {
    /// A public class extending `java/lang/Object`.
    pub fn new(internal_name: &str) -> Self {
        Self {
            name: internal_name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access: ClassAccess::PUBLIC | ClassAccess::SUPER,
            major: MAX_MAJOR_VERSION,
            minor: 0,
            methods: Vec::new(),
            annotations: Vec::new(),
            source_file: None,
        }
    }

    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.major = major;
        self.minor = minor;
        self
    }

    pub fn access(mut self, access: ClassAccess) -> Self {
        self.access = access;
        self
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = Some(name.to_string());
        self
    }

    pub fn no_super(mut self) -> Self {
        self.super_class = None;
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.to_string());
        self
    }

    pub fn annotate(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Shorthand for a class annotation with string elements.
    pub fn class_annotation(self, descriptor: &str, visible: bool, elements: &[(&str, &str)]) -> Self {
        let mut spec = AnnotationSpec::new(descriptor);
        if !visible {
            spec = spec.invisible();
        }
        for (name, value) in elements {
            spec = spec.string(name, value);
        }
        self.annotate(spec)
    }

    pub fn method_spec(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(self, access: MethodAccess, name: &str, descriptor: &str) -> Self {
        self.method_spec(MethodSpec::new(access, name, descriptor))
    }

    pub fn native_method(self, access: MethodAccess, name: &str, descriptor: &str) -> Self {
        self.method_spec(MethodSpec::native(access, name, descriptor))
    }

    /// Shorthand for a native method carrying one annotation with string elements.
    pub fn native_method_annotated(
        self,
        access: MethodAccess,
        name: &str,
        descriptor: &str,
        annotation: &str,
        elements: &[(&str, &str)],
    ) -> Self {
        let mut spec = AnnotationSpec::new(annotation);
        for (key, value) in elements {
            spec = spec.string(key, value);
        }
        self.method_spec(MethodSpec::native(access, name, descriptor).annotate(spec))
    }

    /// Serialise the class.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pool = PoolWriter::default();
        let mut body = Vec::new();

        put_u2(&mut body, self.access.bits());
        put_u2(&mut body, pool.class(&self.name));
        let super_index = self.super_class.as_deref().map_or(0, |s| pool.class(s));
        put_u2(&mut body, super_index);

        put_u2(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            put_u2(&mut body, pool.class(interface));
        }

        // fields
        put_u2(&mut body, 0);

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u2(&mut body, method.access.bits());
            put_u2(&mut body, pool.utf8(&method.name));
            put_u2(&mut body, pool.utf8(&method.descriptor));
            let mut attributes = annotation_attributes(&mut pool, &method.annotations);
            attributes.extend(parameter_annotation_attributes(
                &mut pool,
                &method.parameter_annotations,
            ));
            write_attributes(&mut body, &attributes);
        }

        let mut attributes = annotation_attributes(&mut pool, &self.annotations);
        if let Some(source) = &self.source_file {
            let mut attr = Vec::new();
            put_u2(&mut attr, pool.utf8(source));
            attributes.push((pool.utf8("SourceFile"), attr));
        }
        write_attributes(&mut body, &attributes);

        let mut out = Vec::with_capacity(10 + pool.bytes.len() + body.len());
        put_u4(&mut out, MAGIC);
        put_u2(&mut out, self.minor);
        put_u2(&mut out, self.major);
        put_u2(&mut out, pool.next_index);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}

/// `(name index, body)` for each non-empty annotations attribute.
fn annotation_attributes(pool: &mut PoolWriter, annotations: &[AnnotationSpec]) -> Vec<(u16, Vec<u8>)> {
    let mut out = Vec::new();
    for (name, visible) in [
        ("RuntimeVisibleAnnotations", true),
        ("RuntimeInvisibleAnnotations", false),
    ] {
        let group: Vec<_> = annotations.iter().filter(|a| a.visible == visible).collect();
        if group.is_empty() {
            continue;
        }
        let mut attr = Vec::new();
        put_u2(&mut attr, group.len() as u16);
        for annotation in group {
            write_annotation(&mut attr, pool, annotation);
        }
        out.push((pool.utf8(name), attr));
    }
    out
}

fn parameter_annotation_attributes(
    pool: &mut PoolWriter,
    annotations: &[(usize, AnnotationSpec)],
) -> Vec<(u16, Vec<u8>)> {
    let mut out = Vec::new();
    for (name, visible) in [
        ("RuntimeVisibleParameterAnnotations", true),
        ("RuntimeInvisibleParameterAnnotations", false),
    ] {
        let group: Vec<_> = annotations.iter().filter(|(_, a)| a.visible == visible).collect();
        let Some(count) = group.iter().map(|(index, _)| index + 1).max() else {
            continue;
        };
        let mut attr = vec![count as u8];
        for index in 0..count {
            let on_param: Vec<_> = group.iter().filter(|(i, _)| *i == index).collect();
            put_u2(&mut attr, on_param.len() as u16);
            for (_, annotation) in on_param {
                write_annotation(&mut attr, pool, annotation);
            }
        }
        out.push((pool.utf8(name), attr));
    }
    out
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[(u16, Vec<u8>)]) {
    put_u2(out, attributes.len() as u16);
    for (name, body) in attributes {
        put_u2(out, *name);
        put_u4(out, body.len() as u32);
        out.extend_from_slice(body);
    }
}

fn write_annotation(out: &mut Vec<u8>, pool: &mut PoolWriter, annotation: &AnnotationSpec) {
    put_u2(out, pool.utf8(&annotation.descriptor));
    put_u2(out, annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        put_u2(out, pool.utf8(name));
        match value {
            ElementSpec::String(s) => {
                out.push(b's');
                put_u2(out, pool.utf8(s));
            }
            ElementSpec::Strings(items) => {
                out.push(b'[');
                put_u2(out, items.len() as u16);
                for s in items {
                    out.push(b's');
                    put_u2(out, pool.utf8(s));
                }
            }
            ElementSpec::Boolean(b) => {
                out.push(b'Z');
                put_u2(out, pool.integer(i32::from(*b)));
            }
            ElementSpec::Classes(classes) => {
                out.push(b'[');
                put_u2(out, classes.len() as u16);
                for class in classes {
                    out.push(b'c');
                    put_u2(out, pool.utf8(&format!("L{class};")));
                }
            }
            ElementSpec::Annotation(nested) => {
                out.push(b'@');
                write_annotation(out, pool, nested);
            }
        }
    }
}

#[derive(Debug)]
struct PoolWriter {
    bytes: Vec<u8>,
    next_index: u16,
    utf8: FxHashMap<String, u16>,
    classes: FxHashMap<String, u16>,
    integers: FxHashMap<i32, u16>,
}

impl Default for PoolWriter {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8: FxHashMap::default(),
            classes: FxHashMap::default(),
            integers: FxHashMap::default(),
        }
    }
}

impl PoolWriter {
    fn push(&mut self, entry: &[u8]) -> u16 {
        let index = self.next_index;
        self.bytes.extend_from_slice(entry);
        self.next_index += 1;
        index
    }

    fn utf8(&mut self, text: &str) -> u16 {
        if let Some(&index) = self.utf8.get(text) {
            return index;
        }
        let encoded = mutf8::encode(text);
        let mut entry = vec![1];
        put_u2(&mut entry, encoded.len() as u16);
        entry.extend_from_slice(&encoded);
        let index = self.push(&entry);
        self.utf8.insert(text.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let mut entry = vec![7];
        put_u2(&mut entry, name_index);
        let index = self.push(&entry);
        self.classes.insert(name.to_string(), index);
        index
    }

    fn integer(&mut self, value: i32) -> u16 {
        if let Some(&index) = self.integers.get(&value) {
            return index;
        }
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        let index = self.push(&entry);
        self.integers.insert(value, index);
        index
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
