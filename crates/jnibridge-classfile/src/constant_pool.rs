//! The class-file constant pool (JVMS §4.4).
//!
//! Every entry is decoded, including the ones the scanner never looks at, so
//! that indices stay aligned and malformed pools are caught early. Indices are
//! 1-based; `Long` and `Double` entries occupy two slots, the second of which is
//! [`Constant::Unusable`].

use jnibridge_core::{ClassFormatError, ClassName};
use num_enum::TryFromPrimitive;
use ordered_float::OrderedFloat;

use crate::mutf8;
use crate::reader::ByteReader;

/// Constant-pool tag bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

/// One decoded constant-pool entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Slot 0, and the slot following a `Long`/`Double`.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(OrderedFloat<f32>),
    Long(i64),
    Double(OrderedFloat<f64>),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl Constant {
    /// Kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::Unusable => "unusable",
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class { .. } => "Class",
            Constant::String { .. } => "String",
            Constant::FieldRef { .. } => "Fieldref",
            Constant::MethodRef { .. } => "Methodref",
            Constant::InterfaceMethodRef { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::Dynamic { .. } => "Dynamic",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Module { .. } => "Module",
            Constant::Package { .. } => "Package",
        }
    }
}

/// A decoded constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Read `constant_pool_count` followed by the entries.
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, ClassFormatError> {
        let count = usize::from(reader.u2()?);
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let offset = reader.offset();
            let raw = reader.u1()?;
            let tag = ConstantTag::try_from(raw)
                .map_err(|_| ClassFormatError::UnknownConstantTag { tag: raw, offset })?;
            let constant = Self::parse_entry(tag, reader)?;
            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        // A trailing Long/Double may have pushed one slot past the count.
        if entries.len() > count && count > 0 {
            return Err(ClassFormatError::BadConstantIndex {
                index: u16::try_from(entries.len() - 1).unwrap_or(u16::MAX),
            });
        }

        Ok(Self { entries })
    }

    fn parse_entry(tag: ConstantTag, r: &mut ByteReader<'_>) -> Result<Constant, ClassFormatError> {
        Ok(match tag {
            ConstantTag::Utf8 => {
                let len = usize::from(r.u2()?);
                let base = r.offset();
                Constant::Utf8(mutf8::decode(r.bytes(len)?, base)?)
            }
            ConstantTag::Integer => Constant::Integer(r.u4()? as i32),
            ConstantTag::Float => Constant::Float(OrderedFloat(f32::from_bits(r.u4()?))),
            ConstantTag::Long => Constant::Long(r.u8()? as i64),
            ConstantTag::Double => Constant::Double(OrderedFloat(f64::from_bits(r.u8()?))),
            ConstantTag::Class => Constant::Class { name_index: r.u2()? },
            ConstantTag::String => Constant::String { string_index: r.u2()? },
            ConstantTag::FieldRef => Constant::FieldRef {
                class_index: r.u2()?,
                name_and_type_index: r.u2()?,
            },
            ConstantTag::MethodRef => Constant::MethodRef {
                class_index: r.u2()?,
                name_and_type_index: r.u2()?,
            },
            ConstantTag::InterfaceMethodRef => Constant::InterfaceMethodRef {
                class_index: r.u2()?,
                name_and_type_index: r.u2()?,
            },
            ConstantTag::NameAndType => Constant::NameAndType {
                name_index: r.u2()?,
                descriptor_index: r.u2()?,
            },
            ConstantTag::MethodHandle => Constant::MethodHandle {
                reference_kind: r.u1()?,
                reference_index: r.u2()?,
            },
            ConstantTag::MethodType => Constant::MethodType {
                descriptor_index: r.u2()?,
            },
            ConstantTag::Dynamic => Constant::Dynamic {
                bootstrap_method_attr_index: r.u2()?,
                name_and_type_index: r.u2()?,
            },
            ConstantTag::InvokeDynamic => Constant::InvokeDynamic {
                bootstrap_method_attr_index: r.u2()?,
                name_and_type_index: r.u2()?,
            },
            ConstantTag::Module => Constant::Module { name_index: r.u2()? },
            ConstantTag::Package => Constant::Package { name_index: r.u2()? },
        })
    }

    /// Number of slots including slot 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Look up a usable entry.
    pub fn get(&self, index: u16) -> Result<&Constant, ClassFormatError> {
        match self.entries.get(usize::from(index)) {
            None | Some(Constant::Unusable) => Err(ClassFormatError::BadConstantIndex { index }),
            Some(constant) => Ok(constant),
        }
    }

    /// Resolve a `Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Utf8(text) => Ok(text),
            other => Err(wrong_kind(index, "Utf8", other)),
        }
    }

    /// Resolve a `Class` entry to its name.
    pub fn class_name(&self, index: u16) -> Result<ClassName, ClassFormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(ClassName::from_internal(self.utf8(*name_index)?)),
            other => Err(wrong_kind(index, "Class", other)),
        }
    }

    /// Resolve an optional `Class` entry; index 0 means "none".
    pub fn optional_class_name(&self, index: u16) -> Result<Option<ClassName>, ClassFormatError> {
        if index == 0 {
            Ok(None)
        } else {
            self.class_name(index).map(Some)
        }
    }

    /// Iterate over `(index, constant)` for every usable slot.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (i as u16, c))
    }
}

pub(crate) fn wrong_kind(index: u16, expected: &'static str, found: &Constant) -> ClassFormatError {
    ClassFormatError::WrongConstantKind {
        index,
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(bytes: &[u8]) -> Result<ConstantPool, ClassFormatError> {
        ConstantPool::parse(&mut ByteReader::new(bytes))
    }

    #[test]
    fn utf8_and_class() {
        // count=3: #1 Utf8 "a/B", #2 Class -> #1
        let bytes = [0, 3, 1, 0, 3, b'a', b'/', b'B', 7, 0, 1];
        let pool = pool(&bytes).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.utf8(1).unwrap(), "a/B");
        assert_eq!(pool.class_name(2).unwrap().internal_name(), "a/B");
    }

    #[test]
    fn long_takes_two_slots() {
        // count=4: #1 Long, #2 unusable, #3 Integer
        let bytes = [0, 4, 5, 0, 0, 0, 0, 0, 0, 0, 42, 3, 0, 0, 0, 7];
        let pool = pool(&bytes).unwrap();
        assert_eq!(pool.get(1).unwrap(), &Constant::Long(42));
        assert_eq!(
            pool.get(2).unwrap_err(),
            ClassFormatError::BadConstantIndex { index: 2 }
        );
        assert_eq!(pool.get(3).unwrap(), &Constant::Integer(7));
        assert_eq!(pool.iter().count(), 2);
    }

    #[test]
    fn floats_are_comparable() {
        let nan = f32::NAN.to_bits().to_be_bytes();
        let bytes = [0, 2, 4, nan[0], nan[1], nan[2], nan[3]];
        let a = pool(&bytes).unwrap();
        let b = pool(&bytes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_tag() {
        let bytes = [0, 2, 2, 0, 0];
        assert_eq!(
            pool(&bytes).unwrap_err(),
            ClassFormatError::UnknownConstantTag { tag: 2, offset: 2 }
        );
    }

    #[test]
    fn wrong_kind_and_bad_index() {
        let bytes = [0, 2, 3, 0, 0, 0, 1];
        let pool = pool(&bytes).unwrap();
        assert_eq!(
            pool.utf8(1).unwrap_err(),
            ClassFormatError::WrongConstantKind {
                index: 1,
                expected: "Utf8",
                found: "Integer"
            }
        );
        assert!(matches!(
            pool.utf8(0),
            Err(ClassFormatError::BadConstantIndex { index: 0 })
        ));
        assert!(matches!(
            pool.utf8(9),
            Err(ClassFormatError::BadConstantIndex { index: 9 })
        ));
        assert_eq!(pool.optional_class_name(0).unwrap(), None);
    }

    #[test]
    fn long_overrunning_count_is_rejected() {
        // count=2 leaves room for one slot, but a Long needs two.
        let bytes = [0, 2, 5, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            pool(&bytes),
            Err(ClassFormatError::BadConstantIndex { .. })
        ));
    }

    #[test]
    fn truncated_entry() {
        let bytes = [0, 2, 1, 0, 5, b'a'];
        assert!(matches!(
            pool(&bytes),
            Err(ClassFormatError::Truncated { offset: 5, needed: 5 })
        ));
    }
}
