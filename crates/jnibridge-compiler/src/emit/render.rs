//! Rendering lowered stubs as C++ text.

use jnibridge_core::BindingTarget;
use jnibridge_registry::string_literal;

use super::ir::{CatchKind, ReleaseMode, ResourceKind, ReturnValue, Slot, Stmt, StubIr};
use super::lower::LoweredStub;
use super::namespace;
use super::writer::CodeWriter;
use crate::mapper::primitive;

const STANDARD_INCLUDES: &[&str] = &[
    "cstddef", "cstdint", "exception", "string", "utility", "vector",
];

/// Render one target's translation unit. Custom JNI fragments follow the
/// stubs verbatim.
pub fn render_unit(
    target: &BindingTarget,
    generator_version: &str,
    runtime_header: &str,
    stubs: &[LoweredStub],
) -> String {
    let class = &target.name;
    let mut w = CodeWriter::new();
    w.line(format!(
        "// Generated by jnibridge {generator_version} from {class}. Do not edit."
    ));
    w.line("#include <jni.h>");
    w.blank();
    for header in STANDARD_INCLUDES {
        w.line(format!("#include <{header}>"));
    }
    w.blank();
    w.line(format!("#include \"{runtime_header}\""));
    for include in &target.includes {
        w.line(format!("#include \"{include}\""));
    }
    w.blank();

    write_prototypes(&mut w, stubs);

    for (index, lowered) in stubs.iter().enumerate() {
        if index > 0 {
            w.blank();
        }
        write_stub(&mut w, &lowered.stub);
    }

    for fragment in &target.custom_code {
        w.blank();
        w.line(format!("// Custom JNI code from {}", fragment.path));
        w.raw(&fragment.contents);
    }
    w.finish()
}

/// Implementation prototypes, grouped by namespace in first-use order.
fn write_prototypes(w: &mut CodeWriter, stubs: &[LoweredStub]) {
    let mut groups: Vec<(&[String], Vec<&str>)> = Vec::new();
    for lowered in stubs {
        let ns = lowered.namespace.as_slice();
        let index = match groups.iter().position(|(g, _)| *g == ns) {
            Some(index) => index,
            None => {
                groups.push((ns, Vec::new()));
                groups.len() - 1
            }
        };
        let protos = &mut groups[index].1;
        if !protos.contains(&lowered.prototype.as_str()) {
            protos.push(&lowered.prototype);
        }
    }

    for (ns, protos) in groups {
        if ns.is_empty() {
            for proto in protos {
                w.line(format!("{proto};"));
            }
        } else {
            let joined = namespace::join(ns);
            w.line(format!("namespace {joined} {{"));
            w.blank();
            for proto in protos {
                w.line(format!("{proto};"));
            }
            w.blank();
            w.line(format!("}}  // namespace {joined}"));
        }
        w.blank();
    }
}

fn write_stub(w: &mut CodeWriter, stub: &StubIr) {
    let params: Vec<String> = stub
        .params
        .iter()
        .map(|(ty, name)| {
            if name.is_empty() {
                ty.clone()
            } else {
                format!("{ty} {name}")
            }
        })
        .collect();
    w.open(format!(
        "extern \"C\" JNIEXPORT {} JNICALL {}({})",
        stub.jni_return,
        stub.symbol,
        params.join(", ")
    ));
    write_stmts(w, stub, &stub.body);
    w.close("");
}

fn write_stmts(w: &mut CodeWriter, stub: &StubIr, stmts: &[Stmt]) {
    for stmt in stmts {
        match stmt {
            Stmt::Line(text) | Stmt::Call(text) => w.line(text),
            Stmt::Acquire { slot, on_failure } => {
                let slot = &stub.slots[*slot];
                w.line(acquire(slot));
                if !on_failure.is_empty() {
                    w.open(if slot.nullable {
                        format!("if ({} != nullptr && {} == nullptr)", slot.source, slot.var)
                    } else {
                        format!("if ({} == nullptr)", slot.var)
                    });
                    write_stmts(w, stub, on_failure);
                    w.close("");
                }
            }
            Stmt::Release { slot, mode } => w.line(release(&stub.slots[*slot], *mode)),
            Stmt::Transfer { slot, into } => {
                let slot = &stub.slots[*slot];
                if let (Some(wrapper), ResourceKind::GlobalRef) = (into, slot.kind) {
                    w.line(format!("jnibridge::GlobalRef {wrapper}(env, {});", slot.var));
                }
            }
            Stmt::If { condition, body } => {
                w.open(format!("if ({condition})"));
                write_stmts(w, stub, body);
                w.close("");
            }
            Stmt::Try { body, handlers } => {
                w.open("try");
                write_stmts(w, stub, body);
                for handler in handlers {
                    w.reopen(match handler.catch {
                        CatchKind::Std => "catch (const std::exception& e)",
                        CatchKind::Any => "catch (...)",
                    });
                    write_stmts(w, stub, &handler.body);
                }
                w.close("");
            }
            Stmt::Throw { class, message } => w.line(format!(
                "jnibridge::throwJava(env, {}, {message});",
                string_literal(class)
            )),
            Stmt::Return { value, .. } => match value {
                ReturnValue::Void => w.line("return;"),
                ReturnValue::Default => w.line(format!(
                    "return jnibridge::defaultReturn<{}>();",
                    stub.jni_return
                )),
                ReturnValue::Expr(expr) => w.line(format!("return {expr};")),
            },
        }
    }
}

fn acquire(slot: &Slot) -> String {
    let Slot {
        var, source, kind, ..
    } = slot;
    let call = |ty: &str, expr: String| {
        if slot.nullable {
            format!("{ty} {var} = {source} != nullptr ? {expr} : nullptr;")
        } else {
            format!("{ty} {var} = {expr};")
        }
    };
    match kind {
        ResourceKind::StringChars => call(
            "const char*",
            format!("env->GetStringUTFChars({source}, nullptr)"),
        ),
        ResourceKind::ArrayElements(k) => call(
            &format!("{}*", primitive::jni_type(*k)),
            format!(
                "env->Get{}ArrayElements({source}, nullptr)",
                primitive::array_function_name(*k)
            ),
        ),
        ResourceKind::GlobalRef => call("jobject", format!("env->NewGlobalRef({source})")),
        ResourceKind::LocalString => {
            format!("jstring {var} = env->NewStringUTF({source}.c_str());")
        }
        ResourceKind::LocalArray(k) => format!(
            "{} {var} = env->New{}Array(static_cast<jsize>({source}.size()));",
            primitive::jni_array_type(*k),
            primitive::array_function_name(*k)
        ),
    }
}

fn release(slot: &Slot, mode: ReleaseMode) -> String {
    let Slot {
        var, source, kind, ..
    } = slot;
    let call = match kind {
        ResourceKind::StringChars => format!("env->ReleaseStringUTFChars({source}, {var});"),
        ResourceKind::ArrayElements(k) => format!(
            "env->Release{}ArrayElements({source}, {var}, {});",
            primitive::array_function_name(*k),
            match mode {
                ReleaseMode::Commit => "0",
                ReleaseMode::Abort => "JNI_ABORT",
            }
        ),
        ResourceKind::GlobalRef => format!("env->DeleteGlobalRef({var});"),
        ResourceKind::LocalString | ResourceKind::LocalArray(_) => {
            format!("env->DeleteLocalRef({var});")
        }
    };
    if slot.nullable {
        format!("if ({var} != nullptr) {call}")
    } else {
        call
    }
}
