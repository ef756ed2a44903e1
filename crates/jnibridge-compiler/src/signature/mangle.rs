//! JNI native-method name mangling.
//!
//! Follows "Resolving Native Method Names" in the JNI specification, the
//! contract the JVM's own symbol lookup uses:
//!
//! ```text
//! /  or  .      ->  _
//! _             ->  _1
//! ;             ->  _2
//! [             ->  _3
//! [A-Za-z0-9]   ->  unchanged
//! anything else ->  _0xxxx   (UTF-16 code unit, lower-case hex)
//! ```
//!
//! Short name: `Java_` + class + `_` + method.
//! Long name: short name + `__` + parameter descriptor.

use std::fmt::Write;

/// Mangle one name component (class binary/internal name, method name, or
/// parameter descriptor).
pub fn mangle(component: &str) -> String {
    let mut out = String::with_capacity(component.len() + 8);
    for unit in component.encode_utf16() {
        match unit {
            0x2F | 0x2E => out.push('_'),
            0x5F => out.push_str("_1"),
            0x3B => out.push_str("_2"),
            0x5B => out.push_str("_3"),
            u if u < 0x80 && (u as u8).is_ascii_alphanumeric() => out.push(u as u8 as char),
            u => {
                // Writing to a String cannot fail.
                let _ = write!(out, "_0{u:04x}");
            }
        }
    }
    out
}

/// `Java_<class>_<method>`.
pub fn short_name(class_internal: &str, method: &str) -> String {
    format!("Java_{}_{}", mangle(class_internal), mangle(method))
}

/// `Java_<class>_<method>__<params>`.
pub fn long_name(class_internal: &str, method: &str, param_descriptor: &str) -> String {
    format!(
        "{}__{}",
        short_name(class_internal, method),
        mangle(param_descriptor)
    )
}
