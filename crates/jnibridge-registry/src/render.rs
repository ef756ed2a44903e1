//! Renders a [`RegistrationTable`] as a C++ translation unit.
//!
//! The unit contains, in order:
//!
//! ```text
//! 1. declarations of every stub (extern "C")
//! 2. the stamp and one JNINativeMethod array per class (anonymous namespace)
//! 3. jnibridge_table_stamp()             - stamp accessor
//! 4. jnibridge_register_natives(JNIEnv*) - the well-known entry point
//! 5. JNI_OnLoad                          - optional, calls (4)
//! ```
//!
//! Output depends only on the table and the options, so regenerating from the
//! same input is byte-identical.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::table::RegistrationTable;

/// JNI version requested from `JavaVM::GetEnv` in `JNI_OnLoad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JniVersion {
    #[serde(rename = "1.6")]
    V1_6,
    #[default]
    #[serde(rename = "1.8")]
    V1_8,
    #[serde(rename = "9")]
    V9,
    #[serde(rename = "10")]
    V10,
    #[serde(rename = "19")]
    V19,
    #[serde(rename = "20")]
    V20,
    #[serde(rename = "21")]
    V21,
}

impl JniVersion {
    /// The `<jni.h>` macro naming this version.
    pub const fn macro_name(self) -> &'static str {
        match self {
            JniVersion::V1_6 => "JNI_VERSION_1_6",
            JniVersion::V1_8 => "JNI_VERSION_1_8",
            JniVersion::V9 => "JNI_VERSION_9",
            JniVersion::V10 => "JNI_VERSION_10",
            JniVersion::V19 => "JNI_VERSION_19",
            JniVersion::V20 => "JNI_VERSION_20",
            JniVersion::V21 => "JNI_VERSION_21",
        }
    }
}

/// Options for the registration unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationOptions {
    /// File name of the registration unit.
    pub unit_name: String,
    /// Header providing `jnibridge::TableStamp`.
    pub runtime_header: String,
    /// Also define `JNI_OnLoad`.
    pub emit_on_load: bool,
    pub jni_version: JniVersion,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self {
            unit_name: "jnibridge_registration.cpp".to_string(),
            runtime_header: "jnibridge_runtime.hpp".to_string(),
            emit_on_load: true,
            jni_version: JniVersion::default(),
        }
    }
}

/// Quote `text` as a C++ narrow string literal holding its modified UTF-8
/// encoding, the form JNI expects for names and signatures.
///
/// Printable ASCII is kept; everything else becomes a three-digit octal
/// escape, which cannot run into a following digit the way `\x` can.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for unit in text.encode_utf16() {
        match unit {
            0x22 => out.push_str("\\\""),
            0x5C => out.push_str("\\\\"),
            // `??x` could form a trigraph
            0x3F => out.push_str("\\?"),
            0x20..=0x7E => out.push(unit as u8 as char),
            _ => {
                for byte in mutf8_unit(unit) {
                    // Writing to a String cannot fail.
                    let _ = write!(out, "\\{byte:03o}");
                }
            }
        }
    }
    out.push('"');
    out
}

fn mutf8_unit(unit: u16) -> Vec<u8> {
    match unit {
        0x0001..=0x007F => vec![unit as u8],
        0x0000 | 0x0080..=0x07FF => vec![0xC0 | (unit >> 6) as u8, 0x80 | (unit & 0x3F) as u8],
        _ => vec![
            0xE0 | (unit >> 12) as u8,
            0x80 | ((unit >> 6) & 0x3F) as u8,
            0x80 | (unit & 0x3F) as u8,
        ],
    }
}

/// Render the registration unit.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn render_registration_unit(table: &RegistrationTable, options: &RegistrationOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail; the results below are discarded.
    let _ = write_unit(&mut out, table, options);
    out
}

fn write_unit(
    out: &mut String,
    table: &RegistrationTable,
    options: &RegistrationOptions,
) -> std::fmt::Result {
    let stamp = table.stamp();
    writeln!(out, "// Generated by jnibridge {}. Do not edit.", stamp.generator_version)?;
    writeln!(out, "#include <jni.h>")?;
    writeln!(out)?;
    writeln!(out, "#include \"{}\"", options.runtime_header)?;
    writeln!(out)?;

    if !table.is_empty() {
        writeln!(out, "extern \"C\" {{")?;
        for entry in table.entries() {
            writeln!(out, "{};", entry.function.declaration())?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;
    }

    let groups = table.by_class();

    writeln!(out, "namespace {{")?;
    writeln!(out)?;
    writeln!(
        out,
        "constexpr jnibridge::TableStamp kStamp{{{}, {}u, {:#018x}ull}};",
        string_literal(stamp.generator_version),
        stamp.entry_count,
        stamp.fingerprint.as_u64()
    )?;

    for (index, (class, entries)) in groups.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "// {class}")?;
        writeln!(out, "JNINativeMethod kMethods{index}[] = {{")?;
        for entry in entries.iter() {
            writeln!(
                out,
                "    {{const_cast<char*>({}), const_cast<char*>({}), reinterpret_cast<void*>(&{})}},",
                string_literal(&entry.method),
                string_literal(&entry.descriptor),
                entry.function.symbol
            )?;
        }
        writeln!(out, "}};")?;
    }

    if !groups.is_empty() {
        writeln!(out)?;
        writeln!(out, "struct ClassRegistration {{")?;
        writeln!(out, "    const char* name;")?;
        writeln!(out, "    JNINativeMethod* methods;")?;
        writeln!(out, "    jint count;")?;
        writeln!(out, "}};")?;
        writeln!(out)?;
        writeln!(out, "const ClassRegistration kClasses[] = {{")?;
        for (index, (class, entries)) in groups.iter().enumerate() {
            writeln!(
                out,
                "    {{{}, kMethods{index}, {}}},",
                string_literal(class.internal_name()),
                entries.len()
            )?;
        }
        writeln!(out, "}};")?;
    }

    writeln!(out)?;
    writeln!(out, "}}  // namespace")?;
    writeln!(out)?;

    writeln!(out, "extern \"C\" const jnibridge::TableStamp* jnibridge_table_stamp() {{")?;
    writeln!(out, "    return &kStamp;")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "extern \"C\" jint jnibridge_register_natives(JNIEnv* env) {{")?;
    if groups.is_empty() {
        writeln!(out, "    (void)env;")?;
    } else {
        writeln!(out, "    for (const ClassRegistration& cls : kClasses) {{")?;
        writeln!(out, "        jclass clazz = env->FindClass(cls.name);")?;
        writeln!(out, "        if (clazz == nullptr) {{")?;
        writeln!(out, "            return JNI_ERR;")?;
        writeln!(out, "        }}")?;
        writeln!(out, "        jint rc = env->RegisterNatives(clazz, cls.methods, cls.count);")?;
        writeln!(out, "        env->DeleteLocalRef(clazz);")?;
        writeln!(out, "        if (rc != JNI_OK) {{")?;
        writeln!(out, "            return rc;")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "    return JNI_OK;")?;
    writeln!(out, "}}")?;

    if options.emit_on_load {
        let version = options.jni_version.macro_name();
        writeln!(out)?;
        writeln!(out, "extern \"C\" JNIEXPORT jint JNICALL JNI_OnLoad(JavaVM* vm, void*) {{")?;
        writeln!(out, "    JNIEnv* env = nullptr;")?;
        writeln!(
            out,
            "    if (vm->GetEnv(reinterpret_cast<void**>(&env), {version}) != JNI_OK) {{"
        )?;
        writeln!(out, "        return JNI_ERR;")?;
        writeln!(out, "    }}")?;
        writeln!(
            out,
            "    return jnibridge_register_natives(env) == JNI_OK ? {version} : JNI_ERR;"
        )?;
        writeln!(out, "}}")?;
    }

    Ok(())
}
