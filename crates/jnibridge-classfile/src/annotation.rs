//! `Runtime{Visible,Invisible}Annotations` (JVMS §4.7.16) and
//! `Runtime{Visible,Invisible}ParameterAnnotations` (§4.7.18).
//!
//! Annotations are decoded eagerly into owned values so the scanner never has
//! to keep the constant pool around.

use jnibridge_core::{ClassFormatError, ClassName, TypeDescriptor};
use ordered_float::OrderedFloat;

use crate::constant_pool::{Constant, ConstantPool, wrong_kind};
use crate::reader::ByteReader;

/// Deepest nesting of array and annotation element values accepted. javac
/// output never comes close; the bound keeps recursion off the stack limit.
pub const MAX_ELEMENT_DEPTH: usize = 32;

/// One annotation: its type and its explicitly given elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation type (`Lcom/x/Name;`).
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
    /// Whether the annotation came from the visible attribute.
    pub visible: bool,
}

/// An annotation element value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Boolean(bool),
    String(String),
    Enum { type_descriptor: String, constant: String },
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl Annotation {
    /// The annotation type as a class name, if the descriptor names a class.
    pub fn type_name(&self) -> Option<ClassName> {
        match TypeDescriptor::parse(&self.type_descriptor).ok()? {
            TypeDescriptor::ObjectRef(name) => Some(name),
            TypeDescriptor::StringRef => Some(ClassName::from_internal("java/lang/String")),
            _ => None,
        }
    }

    /// Whether this annotation's type is `name`.
    pub fn is(&self, name: &ClassName) -> bool {
        self.type_name().as_ref() == Some(name)
    }

    /// Look up an element by name.
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The conventional `value` element.
    pub fn value(&self) -> Option<&ElementValue> {
        self.element("value")
    }
}

impl ElementValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// String elements, accepting a single string where an array is expected
    /// (the Java compiler allows `@A("x")` for `String[] value()`).
    pub fn as_string_list(&self) -> Vec<&str> {
        match self {
            ElementValue::String(s) => vec![s.as_str()],
            ElementValue::Array(items) => items.iter().filter_map(ElementValue::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ElementValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// A class literal (`Foo.class`) as a class name. Primitive and array
    /// literals have none.
    pub fn as_class_name(&self) -> Option<ClassName> {
        match self {
            ElementValue::Class(descriptor) => match TypeDescriptor::parse(descriptor).ok()? {
                TypeDescriptor::ObjectRef(name) => Some(name),
                TypeDescriptor::StringRef => Some(ClassName::from_internal("java/lang/String")),
                _ => None,
            },
            _ => None,
        }
    }

    /// Class literals, accepting a single literal where an array is expected.
    pub fn as_class_list(&self) -> Vec<ClassName> {
        match self {
            ElementValue::Array(items) => items.iter().filter_map(ElementValue::as_class_name).collect(),
            other => other.as_class_name().into_iter().collect(),
        }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            ElementValue::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }
}

/// Parse the body of a parameter annotations attribute: one list per
/// declared parameter.
pub fn parse_parameter_annotations(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<Vec<Annotation>>, ClassFormatError> {
    let count = reader.u1()?;
    (0..count)
        .map(|_| parse_annotations(reader, pool, visible))
        .collect()
}

/// Parse the body of an annotations attribute.
pub fn parse_annotations(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<Annotation>, ClassFormatError> {
    let count = reader.u2()?;
    (0..count)
        .map(|_| parse_annotation(reader, pool, visible, 0))
        .collect()
}

fn parse_annotation(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
    depth: usize,
) -> Result<Annotation, ClassFormatError> {
    let type_descriptor = pool.utf8(reader.u2()?)?.to_string();
    let pairs = reader.u2()?;
    let mut elements = Vec::with_capacity(usize::from(pairs));
    for _ in 0..pairs {
        let name = pool.utf8(reader.u2()?)?.to_string();
        let value = parse_element_value(reader, pool, visible, depth)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_descriptor,
        elements,
        visible,
    })
}

fn parse_element_value(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
    depth: usize,
) -> Result<ElementValue, ClassFormatError> {
    let offset = reader.offset();
    if depth >= MAX_ELEMENT_DEPTH {
        return Err(ClassFormatError::NestingTooDeep {
            limit: MAX_ELEMENT_DEPTH,
            offset,
        });
    }
    let tag = reader.u1()?;
    Ok(match tag {
        b'B' => ElementValue::Byte(int_const(pool, reader.u2()?)? as i8),
        b'C' => ElementValue::Char(int_const(pool, reader.u2()?)? as u16),
        b'S' => ElementValue::Short(int_const(pool, reader.u2()?)? as i16),
        b'I' => ElementValue::Int(int_const(pool, reader.u2()?)?),
        b'Z' => ElementValue::Boolean(int_const(pool, reader.u2()?)? != 0),
        b'J' => {
            let index = reader.u2()?;
            match pool.get(index)? {
                Constant::Long(v) => ElementValue::Long(*v),
                other => return Err(wrong_kind(index, "Long", other)),
            }
        }
        b'F' => {
            let index = reader.u2()?;
            match pool.get(index)? {
                Constant::Float(v) => ElementValue::Float(*v),
                other => return Err(wrong_kind(index, "Float", other)),
            }
        }
        b'D' => {
            let index = reader.u2()?;
            match pool.get(index)? {
                Constant::Double(v) => ElementValue::Double(*v),
                other => return Err(wrong_kind(index, "Double", other)),
            }
        }
        b's' => ElementValue::String(pool.utf8(reader.u2()?)?.to_string()),
        b'e' => ElementValue::Enum {
            type_descriptor: pool.utf8(reader.u2()?)?.to_string(),
            constant: pool.utf8(reader.u2()?)?.to_string(),
        },
        b'c' => ElementValue::Class(pool.utf8(reader.u2()?)?.to_string()),
        b'@' => ElementValue::Annotation(Box::new(parse_annotation(
            reader,
            pool,
            visible,
            depth + 1,
        )?)),
        b'[' => {
            let count = reader.u2()?;
            let items = (0..count)
                .map(|_| parse_element_value(reader, pool, visible, depth + 1))
                .collect::<Result<_, _>>()?;
            ElementValue::Array(items)
        }
        other => {
            return Err(ClassFormatError::UnknownElementTag {
                tag: other as char,
                offset,
            });
        }
    })
}

fn int_const(pool: &ConstantPool, index: u16) -> Result<i32, ClassFormatError> {
    match pool.get(index)? {
        Constant::Integer(v) => Ok(*v),
        other => Err(wrong_kind(index, "Integer", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// #1 "Lx/Name;", #2 "value", #3 "nativeAdd", #4 Integer 1, #5 "flag"
    fn pool() -> ConstantPool {
        let mut bytes = vec![0, 6];
        for text in ["Lx/Name;", "value", "nativeAdd"] {
            bytes.push(1);
            bytes.extend_from_slice(&(text.len() as u16).to_be_bytes());
            bytes.extend_from_slice(text.as_bytes());
        }
        bytes.extend_from_slice(&[3, 0, 0, 0, 1]);
        bytes.extend_from_slice(&[1, 0, 4]);
        bytes.extend_from_slice(b"flag");
        ConstantPool::parse(&mut ByteReader::new(&bytes)).unwrap()
    }

    #[test]
    fn string_element() {
        // one annotation: type #1, one pair: #2 = s #3
        let body = [0, 1, 0, 1, 0, 1, 0, 2, b's', 0, 3];
        let anns = parse_annotations(&mut ByteReader::new(&body), &pool(), true).unwrap();
        assert_eq!(anns.len(), 1);
        let ann = &anns[0];
        assert_eq!(ann.type_name().unwrap().internal_name(), "x/Name");
        assert!(ann.is(&ClassName::from_binary_name("x.Name")));
        assert_eq!(ann.value().and_then(ElementValue::as_str), Some("nativeAdd"));
        assert!(ann.visible);
    }

    #[test]
    fn nested_array_and_boolean() {
        // pairs: value = [s #3, s #3], flag = Z #4
        let body = [
            0, 1, 0, 1, 0, 2, //
            0, 2, b'[', 0, 2, b's', 0, 3, b's', 0, 3, //
            0, 5, b'Z', 0, 4,
        ];
        let anns = parse_annotations(&mut ByteReader::new(&body), &pool(), false).unwrap();
        let ann = &anns[0];
        assert_eq!(ann.value().unwrap().as_string_list(), vec!["nativeAdd", "nativeAdd"]);
        assert_eq!(ann.element("flag").and_then(ElementValue::as_bool), Some(true));
        assert!(!ann.visible);
    }

    #[test]
    fn unknown_tag() {
        let body = [0, 1, 0, 1, 0, 1, 0, 2, b'?', 0, 3];
        let err = parse_annotations(&mut ByteReader::new(&body), &pool(), true).unwrap_err();
        assert_eq!(err, ClassFormatError::UnknownElementTag { tag: '?', offset: 8 });
    }

    #[test]
    fn parameter_annotations_per_parameter() {
        // two parameters: first has one annotation (no pairs), second none
        let body = [2, 0, 1, 0, 1, 0, 0, 0, 0];
        let params =
            parse_parameter_annotations(&mut ByteReader::new(&body), &pool(), true).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0][0].type_descriptor, "Lx/Name;");
        assert!(params[1].is_empty());
    }

    #[test]
    fn class_literals() {
        let single = ElementValue::Class("Lcom/x/Base;".into());
        assert_eq!(single.as_class_name(), Some(ClassName::from_internal("com/x/Base")));
        let list = ElementValue::Array(vec![
            ElementValue::Class("La/A;".into()),
            ElementValue::Class("I".into()),
            ElementValue::Class("Lb/B;".into()),
        ]);
        assert_eq!(
            list.as_class_list(),
            vec![ClassName::from_internal("a/A"), ClassName::from_internal("b/B")]
        );
        assert!(ElementValue::Int(1).as_class_list().is_empty());
    }

    #[test]
    fn deeply_nested_arrays_are_rejected() {
        // value = [[[[ ... s #3 ]]]], far deeper than any compiler emits
        let levels = 200_000;
        let mut body = vec![0, 1, 0, 1, 0, 1, 0, 2];
        for _ in 0..levels {
            body.extend_from_slice(&[b'[', 0, 1]);
        }
        body.extend_from_slice(&[b's', 0, 3]);

        let err = parse_annotations(&mut ByteReader::new(&body), &pool(), true).unwrap_err();
        assert_eq!(
            err,
            ClassFormatError::NestingTooDeep {
                limit: MAX_ELEMENT_DEPTH,
                offset: 8 + 3 * MAX_ELEMENT_DEPTH,
            }
        );
    }

    #[test]
    fn nesting_within_the_limit_parses() {
        let mut body = vec![0, 1, 0, 1, 0, 1, 0, 2];
        for _ in 0..MAX_ELEMENT_DEPTH - 1 {
            body.extend_from_slice(&[b'[', 0, 1]);
        }
        body.extend_from_slice(&[b's', 0, 3]);
        let anns = parse_annotations(&mut ByteReader::new(&body), &pool(), true).unwrap();
        let mut value = anns[0].value().unwrap();
        let mut depth = 0;
        while let ElementValue::Array(items) = value {
            value = &items[0];
            depth += 1;
        }
        assert_eq!(depth, MAX_ELEMENT_DEPTH - 1);
        assert_eq!(value.as_str(), Some("nativeAdd"));
    }

    #[test]
    fn const_of_wrong_kind() {
        // I pointing at a Utf8 entry
        let body = [0, 1, 0, 1, 0, 1, 0, 2, b'I', 0, 3];
        let err = parse_annotations(&mut ByteReader::new(&body), &pool(), true).unwrap_err();
        assert!(matches!(err, ClassFormatError::WrongConstantKind { index: 3, .. }));
    }
}
