//! End-to-end generation runs over class files written to a scratch classpath.

mod common;

use std::fs;

use common::{STATIC, Workspace, bridge_class};
use jnibridge::{GenerationError, Generator, NamingScheme};
use jnibridge_classfile::MethodAccess;
use jnibridge_compiler::emit::ir::ExitKind;
use jnibridge_compiler::{BindingEmitter, EmitOptions, SignatureEncoder, TypeMapper};
use jnibridge_registry::EntryPointRegistry;
use pretty_assertions::assert_eq;

fn entry_points(workspace: &Workspace) -> Vec<(String, String)> {
    let plan = Generator::new(workspace.config()).unwrap().plan().unwrap();
    plan.table
        .entries()
        .iter()
        .map(|e| (e.entry_point.clone(), e.descriptor.clone()))
        .collect()
}

#[test]
fn single_static_method() {
    let workspace = Workspace::new();
    workspace.add(
        "com/example/Math",
        bridge_class("com/example/Math").native_method(STATIC, "add", "(II)I"),
    );

    let report = Generator::new(workspace.config()).unwrap().run().unwrap();
    assert_eq!(report.entry_count, 1);
    assert!(!report.has_skips());
    assert_eq!(
        workspace.output_files(),
        vec![
            "com_example_Math.jni.cpp",
            "jnibridge_registration.cpp",
            "jnibridge_runtime.hpp"
        ]
    );

    let unit = workspace.read_output("com_example_Math.jni.cpp");
    assert!(unit.contains("std::int32_t add(JNIEnv* env, std::int32_t a0, std::int32_t a1);"));
    assert!(unit.contains("JNICALL Java_com_example_Math_add(JNIEnv* env, jclass, jint a0, jint a1)"));

    let registration = workspace.read_output("jnibridge_registration.cpp");
    assert!(registration.contains("reinterpret_cast<void*>(&Java_com_example_Math_add)"));
    assert!(registration.contains("\"(II)I\""));
    assert!(registration.contains("jnibridge_register_natives"));

    assert_eq!(
        entry_points(&workspace),
        vec![("Java_com_example_Math_add".to_string(), "(II)I".to_string())]
    );
}

#[test]
fn nested_array_is_skipped_and_the_run_succeeds() {
    let workspace = Workspace::new();
    workspace.add(
        "com/example/Greeter",
        bridge_class("com/example/Greeter").native_method(
            STATIC,
            "greet",
            "([[Ljava/lang/String;)Ljava/lang/String;",
        ),
    );

    let report = Generator::new(workspace.config()).unwrap().run().unwrap();
    assert_eq!(report.entry_count, 0);
    assert_eq!(report.skipped_methods.len(), 1);
    let skip = &report.skipped_methods[0];
    assert_eq!(skip.class, "com.example.Greeter");
    assert_eq!(skip.method, "greet");
    assert_eq!(skip.offending, "[[Ljava/lang/String;");

    // the table is still produced, just empty
    assert_eq!(
        workspace.output_files(),
        vec!["jnibridge_registration.cpp", "jnibridge_runtime.hpp"]
    );
}

#[test]
fn strict_mode_aborts_without_writing() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Strict",
        bridge_class("a/Strict")
            .native_method(STATIC, "fine", "()V")
            .native_method(STATIC, "grid", "([[I)V"),
    );
    let mut config = workspace.config();
    config.strict = true;

    let err = Generator::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, GenerationError::Strict(ref e) if e.method == "grid"));
    assert!(!workspace.output().exists());
}

#[test]
fn overloads_get_descriptor_qualified_names() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Over",
        bridge_class("a/Over")
            .native_method(STATIC, "foo", "(I)V")
            .native_method(STATIC, "foo", "(Ljava/lang/String;)V")
            .native_method(STATIC, "bar", "()V"),
    );

    let names: Vec<String> = entry_points(&workspace).into_iter().map(|(e, _)| e).collect();
    assert_eq!(
        names,
        vec!["Java_a_Over_foo__I", "Java_a_Over_foo__Ljava_lang_String_2", "Java_a_Over_bar"]
    );
}

#[test]
fn static_and_instance_methods_with_one_native_signature() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Dup",
        bridge_class("a/Dup")
            .native_method(STATIC, "f", "(Ljava/lang/Object;)I")
            .native_method(MethodAccess::PUBLIC, "f", "()V"),
    );

    Generator::new(workspace.config()).unwrap().run().unwrap();
    let unit = workspace.read_output("a_Dup.jni.cpp");
    assert!(unit.contains("std::int32_t f_0(JNIEnv* env, jobject a0);"));
    assert!(unit.contains("void f_1(JNIEnv* env, jobject self);"));
    assert!(!unit.contains(" f(JNIEnv* env"));
}

#[test]
fn overloads_under_each_naming_scheme() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Over",
        bridge_class("a/Over")
            .native_method(STATIC, "foo", "(Ljava/lang/String;)V")
            .native_method(STATIC, "foo", "(I)V")
            .native_method(STATIC, "bar", "()V"),
    );

    let names = |naming: NamingScheme| -> Vec<String> {
        let mut config = workspace.config();
        config.naming = naming;
        let plan = Generator::new(config).unwrap().plan().unwrap();
        plan.table.entries().iter().map(|e| e.entry_point.clone()).collect()
    };

    assert_eq!(
        names(NamingScheme::Indexed),
        vec!["Java_a_Over_foo__1", "Java_a_Over_foo__0", "Java_a_Over_bar"]
    );
    assert_eq!(
        names(NamingScheme::JniLong),
        vec![
            "Java_a_Over_foo__Ljava_lang_String_2",
            "Java_a_Over_foo__I",
            "Java_a_Over_bar__"
        ]
    );
}

#[test]
fn return_type_only_overloads_skip_the_target() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Clash",
        bridge_class("a/Clash")
            .native_method(STATIC, "f", "(I)I")
            .native_method(STATIC, "f", "(I)J"),
    );
    workspace.add("a/Fine", bridge_class("a/Fine").native_method(STATIC, "g", "()V"));

    let report = Generator::new(workspace.config()).unwrap().run().unwrap();
    assert_eq!(report.skipped_targets.len(), 1);
    assert_eq!(report.skipped_targets[0].class, "a.Clash");
    assert_eq!(report.entry_count, 1);
    assert!(!workspace.output().join("a_Clash.jni.cpp").exists());
    assert!(workspace.output().join("a_Fine.jni.cpp").exists());
}

#[test]
fn string_and_array_stub_is_balanced() {
    let workspace = Workspace::new();
    workspace.add(
        "com/example/Text",
        bridge_class("com/example/Text").native_method(
            MethodAccess::PUBLIC,
            "count",
            "(Ljava/lang/String;[I)I",
        ),
    );

    let config = workspace.config();
    let scan = jnibridge::Scanner::new(&config).scan().unwrap();
    let mapped = TypeMapper::new().map_target(scan.targets[0].clone());
    let encoded = SignatureEncoder::new(NamingScheme::Jni)
        .encode_target(mapped, &mut EntryPointRegistry::new())
        .unwrap();
    let unit = BindingEmitter::new(EmitOptions::new("test")).emit_target(&encoded);
    unit.check_balanced().unwrap();

    let (symbol, audit) = &unit.audits[0];
    assert_eq!(symbol, "Java_com_example_Text_count");
    for path in audit
        .paths_of(ExitKind::Normal)
        .chain(audit.paths_of(ExitKind::NativeException))
    {
        assert_eq!((path.acquired, path.released), (2, 2));
        assert!(path.leaked.is_empty());
    }
    assert!(audit.paths_of(ExitKind::Unwind).next().is_none());

    assert!(unit.contents.contains("JNICALL Java_com_example_Text_count(JNIEnv* env, jobject self"));
    assert!(unit.contents.contains("env->ReleaseStringUTFChars(a0, s0);"));
    assert!(unit.contents.contains("env->ReleaseIntArrayElements(a1, e1, 0);"));
    assert!(unit.contents.contains("env->ReleaseIntArrayElements(a1, e1, JNI_ABORT);"));
}

#[test]
fn nothing_discovered_writes_nothing() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Plain",
        common::ClassWriter::new("a/Plain").native_method(STATIC, "f", "()V"),
    );

    let err = Generator::new(workspace.config()).unwrap().run().unwrap_err();
    match err {
        GenerationError::EmptyTable(empty) => assert_eq!(empty.classes_scanned, 1),
        other => panic!("expected EmptyTable, got {other}"),
    }
    assert!(!workspace.output().exists());
}

#[test]
fn reruns_are_byte_identical_and_clean_up() {
    let workspace = Workspace::new();
    workspace
        .add("a/One", bridge_class("a/One").native_method(STATIC, "f", "()V"))
        .add("a/Two", bridge_class("a/Two").native_method(STATIC, "g", "(J)J"));
    let generator = Generator::new(workspace.config()).unwrap();

    let first = generator.run().unwrap();
    assert_eq!(first.output.written.len(), 4);
    let snapshot: Vec<(String, Vec<u8>)> = workspace
        .output_files()
        .into_iter()
        .map(|name| {
            let bytes = fs::read(workspace.output().join(&name)).unwrap();
            (name, bytes)
        })
        .collect();

    let second = generator.run().unwrap();
    assert!(second.output.written.is_empty());
    assert_eq!(second.output.unchanged.len(), 4);
    for (name, bytes) in &snapshot {
        assert_eq!(&fs::read(workspace.output().join(name)).unwrap(), bytes, "{name}");
    }
    assert_eq!(first.fingerprint, second.fingerprint);

    // a class that stops being a target leaves its unit behind as stale
    fs::remove_file(workspace.classes().join("a/Two.class")).unwrap();
    let third = generator.run().unwrap();
    assert_eq!(third.output.removed, vec!["a_Two.jni.cpp"]);
    assert!(third.output.written.contains(&"jnibridge_registration.cpp".to_string()));
    assert_ne!(third.fingerprint, first.fingerprint);
}

#[test]
fn json_report_lists_skips() {
    let workspace = Workspace::new();
    workspace.add(
        "a/Mixed",
        bridge_class("a/Mixed")
            .native_method(STATIC, "ok", "(D)D")
            .native_method(STATIC, "objects", "([Ljava/lang/Object;)V"),
    );
    let mut config = workspace.config();
    config.report = Some(workspace.root().join("report.json"));

    Generator::new(config).unwrap().run().unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(workspace.root().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(json["entry_count"], 1);
    assert_eq!(json["skipped_methods"][0]["method"], "objects");
    assert_eq!(json["targets"][0]["unit"], "a_Mixed.jni.cpp");
}
