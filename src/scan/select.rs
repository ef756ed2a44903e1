//! Selecting binding targets from the class index.
//!
//! Class metadata comes from the bridge class annotation and the metadata
//! annotation, either on the class itself or nested in the bridge class
//! annotation's `metadata` element. `inheritFrom` pulls in the includes and
//! custom code paths of other bridge classes, transitively.

use rustc_hash::FxHashSet;

use jnibridge_classfile::{Annotation, ClassFile, ElementValue, MethodInfo};
use jnibridge_core::{
    BindingMethod, BindingTarget, ClassName, MethodDescriptor, MethodFlags, ScanError,
};

use super::index::ClassIndex;
use crate::config::{GeneratorConfig, MarkerSelector};

const NAMESPACE: &str = "namespace";
const CLASS_CODE_PATHS: &str = "customJniCodePaths";
const NESTED_METADATA: &str = "metadata";
const INCLUDES: &str = "includes";
const METADATA_CODE_PATHS: &str = "customJNICodePaths";
const INHERIT_FROM: &str = "inheritFrom";
const NATIVE_NAME: &str = "nativeName";
const METHOD_NAMESPACE: &str = "value";

/// A selected target plus the resources it still needs loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub target: BindingTarget,
    /// Custom JNI code resources, own paths first, without duplicates.
    pub custom_code_paths: Vec<String>,
}

/// Includes and code paths gathered from one class and its `inheritFrom`
/// chain.
#[derive(Debug, Default)]
struct Metadata {
    includes: Vec<String>,
    custom_code_paths: Vec<String>,
}

impl Metadata {
    fn add(list: &mut Vec<String>, values: Option<&ElementValue>) {
        for value in values.map(ElementValue::as_string_list).unwrap_or_default() {
            if !value.is_empty() && !list.iter().any(|v| v == value) {
                list.push(value.to_string());
            }
        }
    }
}

/// Annotation and marker names, resolved once.
#[derive(Debug, Clone)]
pub struct Selector {
    marker: MarkerSelector,
    marker_class: Option<ClassName>,
    bridge_class: ClassName,
    metadata: ClassName,
    native_name: ClassName,
    method_namespace: ClassName,
    takes_ownership: ClassName,
    ignore_nullcheck: ClassName,
    exclude_methods: Vec<String>,
}

impl Selector {
    pub fn new(config: &GeneratorConfig) -> Self {
        let names = &config.annotations;
        Self {
            marker_class: config.marker.class_name(),
            marker: config.marker.clone(),
            bridge_class: ClassName::from_binary_name(&names.bridge_class),
            metadata: ClassName::from_binary_name(&names.metadata),
            native_name: ClassName::from_binary_name(&names.native_name),
            method_namespace: ClassName::from_binary_name(&names.method_namespace),
            takes_ownership: ClassName::from_binary_name(&names.takes_ownership),
            ignore_nullcheck: ClassName::from_binary_name(&names.ignore_nullcheck),
            exclude_methods: config.exclude_methods.clone(),
        }
    }

    /// Whether `class` carries the binding marker.
    pub fn is_marked(&self, index: &ClassIndex, class: &ClassFile) -> bool {
        if class.access.is_interface() {
            return false;
        }
        match (&self.marker, &self.marker_class) {
            (MarkerSelector::Annotation { .. }, Some(name)) => class.annotation(name).is_some(),
            (MarkerSelector::Interface { .. }, Some(name)) => index.implements(class, name),
            (MarkerSelector::NativeMethods, _) => class.native_methods().next().is_some(),
            _ => false,
        }
    }

    /// Whether `method` is bound: native, written by hand, not excluded.
    pub fn is_candidate(&self, method: &MethodInfo) -> bool {
        method.access.is_native()
            && !method.access.is_generated()
            && !self.exclude_methods.iter().any(|name| *name == method.name)
    }

    /// Build the target for a marked class. `None` when it has no candidate
    /// methods.
    pub fn target(
        &self,
        index: &ClassIndex,
        class: &ClassFile,
    ) -> Result<Option<Selection>, ScanError> {
        let methods = class
            .methods
            .iter()
            .filter(|m| self.is_candidate(m))
            .map(|m| self.method(&class.this_class, m))
            .collect::<Result<Vec<_>, _>>()?;
        if methods.is_empty() {
            tracing::debug!(class = %class.this_class, "marked class has no native methods");
            return Ok(None);
        }

        let mut target = BindingTarget::new(class.this_class.clone(), methods);
        let bridge = class.annotation(&self.bridge_class);
        if let Some(namespace) = bridge.and_then(|a| element_string(a, NAMESPACE)) {
            target = target.with_namespace(namespace);
        }

        let mut metadata = Metadata::default();
        Metadata::add(
            &mut metadata.custom_code_paths,
            bridge.and_then(|a| a.element(CLASS_CODE_PATHS)),
        );
        let mut visited = FxHashSet::default();
        visited.insert(class.this_class.clone());
        self.collect_metadata(index, class, &mut metadata, &mut visited)?;

        Ok(Some(Selection {
            target: target.with_includes(metadata.includes),
            custom_code_paths: metadata.custom_code_paths,
        }))
    }

    /// The metadata annotations `class` carries directly.
    fn metadata_annotations<'a>(&self, class: &'a ClassFile) -> Vec<&'a Annotation> {
        let nested = class
            .annotation(&self.bridge_class)
            .and_then(|a| a.element(NESTED_METADATA))
            .and_then(ElementValue::as_annotation);
        nested
            .into_iter()
            .chain(class.annotation(&self.metadata))
            .collect()
    }

    /// Merge `class`'s metadata, then each `inheritFrom` class's, depth first.
    /// Cycles are cut by `visited`.
    fn collect_metadata(
        &self,
        index: &ClassIndex,
        class: &ClassFile,
        metadata: &mut Metadata,
        visited: &mut FxHashSet<ClassName>,
    ) -> Result<(), ScanError> {
        let annotations = self.metadata_annotations(class);
        for annotation in &annotations {
            Metadata::add(&mut metadata.includes, annotation.element(INCLUDES));
            Metadata::add(
                &mut metadata.custom_code_paths,
                annotation.element(METADATA_CODE_PATHS),
            );
        }

        let parents: Vec<ClassName> = annotations
            .iter()
            .filter_map(|a| a.element(INHERIT_FROM))
            .flat_map(ElementValue::as_class_list)
            .collect();
        for parent in parents {
            if !visited.insert(parent.clone()) {
                continue;
            }
            let inherited = index
                .get(&parent)
                .filter(|c| c.annotation(&self.bridge_class).is_some())
                .ok_or_else(|| ScanError::InheritFrom {
                    class: class.this_class.clone(),
                    from: parent.clone(),
                })?;
            self.collect_metadata(index, inherited, metadata, visited)?;
        }
        Ok(())
    }

    fn method(&self, class: &ClassName, info: &MethodInfo) -> Result<BindingMethod, ScanError> {
        let descriptor =
            MethodDescriptor::parse(&info.descriptor).map_err(|source| ScanError::Descriptor {
                class: class.clone(),
                method: info.name.clone(),
                source,
            })?;

        let mut flags = MethodFlags::empty();
        if info.access.is_static() {
            flags |= MethodFlags::STATIC;
        }
        if info.annotation(&self.takes_ownership).is_some() {
            flags |= MethodFlags::TAKES_OWNERSHIP;
        }
        if info.annotation(&self.ignore_nullcheck).is_some() {
            flags |= MethodFlags::IGNORE_NULLCHECK;
        }

        let params = descriptor.params.len();
        let mut method = BindingMethod::new(info.name.clone(), descriptor, flags);
        for index in 0..params {
            if info.parameter_annotation(index, &self.ignore_nullcheck).is_some() {
                method = method.with_unchecked_param(index);
            }
        }
        if let Some(name) = info
            .annotation(&self.native_name)
            .and_then(|a| element_string(a, NATIVE_NAME))
        {
            method = method.with_native_name(name);
        }
        if let Some(namespace) = info
            .annotation(&self.method_namespace)
            .and_then(|a| element_string(a, METHOD_NAMESPACE))
        {
            method = method.with_namespace(namespace);
        }
        Ok(method)
    }
}

fn element_string<'a>(annotation: &'a Annotation, element: &str) -> Option<&'a str> {
    annotation
        .element(element)?
        .as_str()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::classpath::ClassSource;
    use jnibridge_classfile::testing::{AnnotationSpec, ClassWriter, MethodSpec};
    use jnibridge_classfile::{ClassFile, MethodAccess};
    use jnibridge_core::TargetKind;

    const MARKER: &str = "Lcom/jnibridge/annotations/BridgeClass;";
    const METADATA: &str = "Lcom/jnibridge/annotations/BridgeMetadata;";
    const IGNORE_NULLCHECK: &str = "Lcom/jnibridge/annotations/modifiers/IgnoreNullcheck;";
    const STATIC_NATIVE: MethodAccess = MethodAccess::PUBLIC.union(MethodAccess::STATIC);

    fn parse(writer: ClassWriter) -> ClassFile {
        ClassFile::parse(&writer.to_bytes()).unwrap()
    }

    fn index(writers: Vec<ClassWriter>) -> ClassIndex {
        let sources = writers
            .iter()
            .map(|w| ClassSource {
                origin: "t".into(),
                bytes: w.to_bytes(),
            })
            .collect();
        ClassIndex::build(vec![sources]).unwrap()
    }

    fn selector() -> Selector {
        Selector::new(&GeneratorConfig::default())
    }

    fn select(class: &ClassFile) -> Result<Option<Selection>, ScanError> {
        selector().target(&ClassIndex::default(), class)
    }

    #[test]
    fn reads_annotations_into_the_target() {
        let class = parse(
            ClassWriter::new("com/example/Math")
                .annotate(
                    AnnotationSpec::new(MARKER)
                        .string("namespace", "mathlib")
                        .strings("customJniCodePaths", &["jni/math.cpp"]),
                )
                .annotate(
                    AnnotationSpec::new(METADATA)
                        .invisible()
                        .strings("includes", &["mathlib/ops.hpp", "mathlib/types.hpp"]),
                )
                .native_method_annotated(
                    STATIC_NATIVE,
                    "add",
                    "(II)I",
                    "Lcom/jnibridge/annotations/Name;",
                    &[("nativeName", "add_ints")],
                )
                .method_spec(
                    MethodSpec::native(MethodAccess::PUBLIC, "adopt", "(Ljava/lang/Object;)V")
                        .annotate(AnnotationSpec::new(
                            "Lcom/jnibridge/annotations/lifecycle/Allocate;",
                        ))
                        .annotate(
                            AnnotationSpec::new(
                                "Lcom/jnibridge/annotations/mapping/MethodNamespace;",
                            )
                            .string("value", "mathlib::own"),
                        ),
                )
                .native_method(MethodAccess::PUBLIC, "destruct", "()V")
                .method(STATIC_NATIVE, "helper", "()V"),
        );

        let selector = selector();
        assert!(selector.is_marked(&ClassIndex::default(), &class));
        let selection = selector.target(&ClassIndex::default(), &class).unwrap().unwrap();
        assert_eq!(selection.custom_code_paths, vec!["jni/math.cpp"]);
        let target = selection.target;
        assert_eq!(target.kind, TargetKind::Instance);
        assert_eq!(target.namespace.as_deref(), Some("mathlib"));
        assert_eq!(target.includes, vec!["mathlib/ops.hpp", "mathlib/types.hpp"]);

        let names: Vec<_> = target.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["add", "adopt"]);
        assert_eq!(target.methods[0].native_name, "add_ints");
        assert!(target.methods[0].is_static());
        assert!(target.methods[1].takes_ownership());
        assert!(!target.methods[1].is_static());
        assert_eq!(target.methods[1].namespace.as_deref(), Some("mathlib::own"));
    }

    #[test]
    fn nested_metadata_and_class_metadata_merge() {
        let class = parse(
            ClassWriter::new("a/Both")
                .annotate(AnnotationSpec::new(MARKER).nested(
                    "metadata",
                    AnnotationSpec::new(METADATA)
                        .strings("includes", &["a.hpp", "b.hpp"])
                        .strings("customJNICodePaths", &["a.cpp"]),
                ))
                .annotate(
                    AnnotationSpec::new(METADATA)
                        .strings("includes", &["b.hpp", "c.hpp"])
                        .strings("customJNICodePaths", &["a.cpp", "c.cpp"]),
                )
                .native_method(STATIC_NATIVE, "f", "()V"),
        );
        let selection = select(&class).unwrap().unwrap();
        assert_eq!(selection.target.includes, vec!["a.hpp", "b.hpp", "c.hpp"]);
        assert_eq!(selection.custom_code_paths, vec!["a.cpp", "c.cpp"]);
    }

    #[test]
    fn metadata_is_inherited_transitively() {
        let index = index(vec![
            ClassWriter::new("a/Child")
                .class_annotation(MARKER, true, &[])
                .annotate(
                    AnnotationSpec::new(METADATA)
                        .strings("includes", &["child.hpp"])
                        .classes("inheritFrom", &["a/Parent"]),
                )
                .native_method(STATIC_NATIVE, "f", "()V"),
            ClassWriter::new("a/Parent")
                .annotate(AnnotationSpec::new(MARKER).nested(
                    "metadata",
                    AnnotationSpec::new(METADATA)
                        .strings("includes", &["parent.hpp"])
                        .strings("customJNICodePaths", &["parent.cpp"])
                        .classes("inheritFrom", &["a/Root", "a/Child"]),
                )),
            ClassWriter::new("a/Root")
                .class_annotation(MARKER, true, &[])
                .annotate(
                    AnnotationSpec::new(METADATA)
                        .strings("includes", &["root.hpp", "child.hpp"])
                        .classes("inheritFrom", &["a/Parent"]),
                ),
        ]);
        let child = index.get(&ClassName::from_internal("a/Child")).unwrap();
        let selection = selector().target(&index, child).unwrap().unwrap();
        assert_eq!(
            selection.target.includes,
            vec!["child.hpp", "parent.hpp", "root.hpp"]
        );
        assert_eq!(selection.custom_code_paths, vec!["parent.cpp"]);
    }

    #[test]
    fn inheriting_from_a_plain_or_missing_class_fails() {
        for parent in ["a/Plain", "a/Missing"] {
            let index = index(vec![
                ClassWriter::new("a/Child")
                    .annotate(AnnotationSpec::new(MARKER).nested(
                        "metadata",
                        AnnotationSpec::new(METADATA).classes("inheritFrom", &[parent]),
                    ))
                    .native_method(STATIC_NATIVE, "f", "()V"),
                ClassWriter::new("a/Plain"),
            ]);
            let child = index.get(&ClassName::from_internal("a/Child")).unwrap();
            let err = selector().target(&index, child).unwrap_err();
            assert!(
                matches!(err, ScanError::InheritFrom { ref from, .. } if from.internal_name() == parent),
                "{err:?}"
            );
        }
    }

    #[test]
    fn null_checks_suppressed_per_method_and_parameter() {
        let class = parse(
            ClassWriter::new("a/Lenient")
                .class_annotation(MARKER, true, &[])
                .method_spec(
                    MethodSpec::native(STATIC_NATIVE, "all", "(Ljava/lang/String;)V")
                        .annotate(AnnotationSpec::new(IGNORE_NULLCHECK)),
                )
                .method_spec(
                    MethodSpec::native(STATIC_NATIVE, "second", "(Ljava/lang/String;[I)V")
                        .annotate_parameter(1, AnnotationSpec::new(IGNORE_NULLCHECK)),
                ),
        );
        let target = select(&class).unwrap().unwrap().target;
        let all = &target.methods[0];
        assert!(all.flags.contains(MethodFlags::IGNORE_NULLCHECK));
        assert!(!all.null_checked(0));

        let second = &target.methods[1];
        assert!(!second.flags.contains(MethodFlags::IGNORE_NULLCHECK));
        assert_eq!(second.unchecked_params, vec![1]);
        assert!(second.null_checked(0));
        assert!(!second.null_checked(1));
    }

    #[test]
    fn static_only_class_is_a_static_target() {
        let class = parse(
            ClassWriter::new("a/Util")
                .class_annotation(MARKER, true, &[])
                .native_method(STATIC_NATIVE, "f", "()V"),
        );
        let target = select(&class).unwrap().unwrap().target;
        assert_eq!(target.kind, TargetKind::Static);
        assert!(target.namespace.is_none());
    }

    #[test]
    fn unmarked_and_method_less_classes() {
        let selector = selector();
        let plain = parse(ClassWriter::new("a/Plain").native_method(STATIC_NATIVE, "f", "()V"));
        assert!(!selector.is_marked(&ClassIndex::default(), &plain));

        let empty = parse(ClassWriter::new("a/Empty").class_annotation(MARKER, false, &[]));
        assert!(select(&empty).unwrap().is_none());
    }

    #[test]
    fn interface_marker() {
        let config = GeneratorConfig {
            marker: MarkerSelector::Interface {
                name: "a.Bridged".into(),
            },
            ..GeneratorConfig::default()
        };
        let index = index(vec![ClassWriter::new("a/Impl")
            .interface("a/Bridged")
            .native_method(STATIC_NATIVE, "f", "()V")]);
        let class = index.get(&ClassName::from_internal("a/Impl")).unwrap();
        assert!(Selector::new(&config).is_marked(&index, class));
    }

    #[test]
    fn bad_descriptor_is_a_scan_error() {
        let class = parse(
            ClassWriter::new("a/Bad")
                .class_annotation(MARKER, true, &[])
                .native_method(STATIC_NATIVE, "f", "(V)V"),
        );
        let err = select(&class).unwrap_err();
        assert!(matches!(err, ScanError::Descriptor { ref method, .. } if method == "f"));
    }
}
