//! Fixed-width native equivalents of JVM primitives.

use jnibridge_core::PrimitiveKind;

/// The `<jni.h>` typedef for a primitive.
pub const fn jni_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Void => "void",
        PrimitiveKind::Boolean => "jboolean",
        PrimitiveKind::Byte => "jbyte",
        PrimitiveKind::Char => "jchar",
        PrimitiveKind::Short => "jshort",
        PrimitiveKind::Int => "jint",
        PrimitiveKind::Long => "jlong",
        PrimitiveKind::Float => "jfloat",
        PrimitiveKind::Double => "jdouble",
    }
}

/// The C++ type the implementation sees. Same width as the JNI type; no
/// implicit narrowing anywhere.
pub const fn cpp_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Void => "void",
        PrimitiveKind::Boolean => "bool",
        PrimitiveKind::Byte => "std::int8_t",
        PrimitiveKind::Char => "char16_t",
        PrimitiveKind::Short => "std::int16_t",
        PrimitiveKind::Int => "std::int32_t",
        PrimitiveKind::Long => "std::int64_t",
        PrimitiveKind::Float => "float",
        PrimitiveKind::Double => "double",
    }
}

/// The JNI array type for arrays of `kind` (`jintArray`).
pub fn jni_array_type(kind: PrimitiveKind) -> String {
    format!("{}Array", jni_type(kind))
}

/// The capitalised name used in `Get<Name>ArrayElements` and friends.
pub const fn array_function_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Void => "Void",
        PrimitiveKind::Boolean => "Boolean",
        PrimitiveKind::Byte => "Byte",
        PrimitiveKind::Char => "Char",
        PrimitiveKind::Short => "Short",
        PrimitiveKind::Int => "Int",
        PrimitiveKind::Long => "Long",
        PrimitiveKind::Float => "Float",
        PrimitiveKind::Double => "Double",
    }
}

/// Expression converting a JNI value `expr` into the C++ type.
pub fn to_cpp(kind: PrimitiveKind, expr: &str) -> String {
    match kind {
        PrimitiveKind::Boolean => format!("{expr} != JNI_FALSE"),
        PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::Void => expr.to_string(),
        _ => format!("static_cast<{}>({expr})", cpp_type(kind)),
    }
}

/// Expression converting a C++ value `expr` back into the JNI type.
pub fn to_jni(kind: PrimitiveKind, expr: &str) -> String {
    match kind {
        PrimitiveKind::Boolean => format!("{expr} ? JNI_TRUE : JNI_FALSE"),
        PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::Void => expr.to_string(),
        _ => format!("static_cast<{}>({expr})", jni_type(kind)),
    }
}
