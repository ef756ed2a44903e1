//! C++ namespaces for implementation prototypes.
//!
//! A method's namespace comes from, in order: its own annotation, its
//! target's annotation, or the Java package (`com.example` becomes
//! `com::example`). Segments that are C++ keywords or not identifiers are
//! sanitised.

use jnibridge_core::{BindingMethod, BindingTarget};

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept",
    "const", "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await",
    "co_return", "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "requires", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
    // reserved by the generated code itself
    "jnibridge", "std",
];

/// Turn one segment into a valid, non-reserved C++ identifier.
pub fn sanitize_segment(segment: &str) -> String {
    let mut ident: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if CPP_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Normalise an annotated namespace (`a.b`, `a::b` or `::a::b`) into segments.
fn split_annotated(namespace: &str) -> Vec<String> {
    namespace
        .split("::")
        .flat_map(|part| part.split('.'))
        .filter(|part| !part.is_empty())
        .map(sanitize_segment)
        .collect()
}

/// The namespace segments for a method's implementation. Empty means the
/// global namespace.
pub fn resolve(target: &BindingTarget, method: &BindingMethod) -> Vec<String> {
    match method.namespace.as_deref().or(target.namespace.as_deref()) {
        Some(annotated) => split_annotated(annotated),
        None => target
            .name
            .package_segments()
            .into_iter()
            .map(sanitize_segment)
            .collect(),
    }
}

/// `a::b`, or empty for the global namespace.
pub fn join(segments: &[String]) -> String {
    segments.join("::")
}

/// Fully-qualified reference to `name` in `segments`: `::a::b::name`.
pub fn qualify(segments: &[String], name: &str) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push_str("::");
        out.push_str(segment);
    }
    out.push_str("::");
    out.push_str(name);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_core::{ClassName, MethodDescriptor, MethodFlags};

    fn method() -> BindingMethod {
        BindingMethod::new("f", MethodDescriptor::parse("()V").unwrap(), MethodFlags::STATIC)
    }

    #[test]
    fn derived_from_package() {
        let target = BindingTarget::new(ClassName::from_internal("com/example/Math"), vec![]);
        assert_eq!(resolve(&target, &method()), vec!["com", "example"]);
        assert_eq!(qualify(&resolve(&target, &method()), "add"), "::com::example::add");
    }

    #[test]
    fn keywords_and_odd_segments() {
        let target = BindingTarget::new(ClassName::from_internal("org/new/int/2d/a$b"), vec![]);
        assert_eq!(resolve(&target, &method()), vec!["org", "new_", "int_", "_2d"]);
        assert_eq!(sanitize_segment("std"), "std_");
        assert_eq!(sanitize_segment("a-b"), "a_b");
    }

    #[test]
    fn annotations_take_precedence() {
        let target = BindingTarget::new(ClassName::from_internal("com/example/Math"), vec![])
            .with_namespace("mathlib");
        assert_eq!(resolve(&target, &method()), vec!["mathlib"]);
        let m = method().with_namespace("::fast::ops");
        assert_eq!(resolve(&target, &m), vec!["fast", "ops"]);
        assert_eq!(join(&resolve(&target, &m)), "fast::ops");
    }

    #[test]
    fn default_package_is_global() {
        let target = BindingTarget::new(ClassName::from_internal("Top"), vec![]);
        let segments = resolve(&target, &method());
        assert!(segments.is_empty());
        assert_eq!(qualify(&segments, "f"), "::f");
    }
}
