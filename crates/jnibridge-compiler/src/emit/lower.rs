//! Lowering a mapped method into a stub body.
//!
//! Every stub has the same shape:
//!
//! ```text
//! null checks       each reference argument the stub must acquire, unless
//!                   its null check is suppressed (then acquisition is
//!                   guarded and the implementation may see null);
//!                   throws NullPointerException and returns the default
//! acquisitions      in parameter order; a failed acquisition releases
//!                   everything acquired before it (JNI_ABORT) and returns
//!                   with the JVM's OutOfMemoryError pending
//! try {
//!     transfers     owned objects move into GlobalRef wrappers
//!     call          the user's implementation
//!     releases      reverse order, arrays committed (mode 0)
//!     return        converted result
//! } catch ...       reverse releases (JNI_ABORT), rethrown as a Java
//!                   exception, default return
//! ```

use jnibridge_core::{BindingTarget, PrimitiveKind};
use jnibridge_registry::{NativeFunction, string_literal};

use super::ir::{
    CatchKind, ExitKind, Handler, ReleaseMode, ResourceKind, ReturnValue, Slot, SlotId, Stmt,
    StubIr,
};
use super::namespace;
use crate::mapper::{MappedMethod, Marshal, primitive};
use crate::signature::EncodedSignature;

const NULL_POINTER_EXCEPTION: &str = "java/lang/NullPointerException";

/// A stub together with the implementation it calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredStub {
    pub stub: StubIr,
    /// Namespace of the implementation; empty for the global namespace.
    pub namespace: Vec<String>,
    /// Unqualified implementation prototype, without the trailing `;`.
    pub prototype: String,
    pub function: NativeFunction,
}

/// Lower one method. `impl_name` is the unqualified implementation name.
pub fn lower(
    target: &BindingTarget,
    mapped: &MappedMethod,
    signature: &EncodedSignature,
    impl_name: &str,
    exception_class: &str,
) -> LoweredStub {
    let method = &mapped.method;
    let namespace = namespace::resolve(target, method);

    // ========================================================================
    // Signatures
    // ========================================================================

    let mut params = vec![("JNIEnv*".to_string(), "env".to_string())];
    if method.is_static() {
        params.push(("jclass".to_string(), String::new()));
    } else {
        params.push(("jobject".to_string(), "self".to_string()));
    }
    for (i, p) in mapped.params.iter().enumerate() {
        params.push((p.jni_type.clone(), arg(i)));
    }

    let function = NativeFunction {
        symbol: signature.entry_point.clone(),
        return_type: mapped.ret.jni_type.clone(),
        params: params.iter().map(|(ty, _)| ty.clone()).collect(),
    };

    let mut impl_params = vec!["JNIEnv* env".to_string()];
    if !method.is_static() {
        impl_params.push("jobject self".to_string());
    }
    for (i, p) in mapped.params.iter().enumerate() {
        impl_params.push(format!("{} {}", p.cpp_type, arg(i)));
    }
    let prototype = format!("{} {impl_name}({})", mapped.ret.cpp_type, impl_params.join(", "));

    // ========================================================================
    // Slots
    // ========================================================================

    let mut slots = Vec::new();
    // (param index, slot) for every acquired argument, in parameter order
    let mut acquired: Vec<(usize, SlotId)> = Vec::new();
    for (i, p) in mapped.owned_params() {
        let (var, kind) = match p.marshal {
            Marshal::String => (format!("s{i}"), ResourceKind::StringChars),
            Marshal::PrimitiveArray(k) => (format!("e{i}"), ResourceKind::ArrayElements(k)),
            Marshal::Object { .. } => (format!("g{i}"), ResourceKind::GlobalRef),
            Marshal::Primitive(_) => continue,
        };
        acquired.push((i, slots.len()));
        slots.push(Slot {
            var,
            source: arg(i),
            kind,
            nullable: !method.null_checked(i),
        });
    }

    let default_return = |kind| Stmt::Return {
        value: if mapped.ret.jni_type == "void" {
            ReturnValue::Void
        } else {
            ReturnValue::Default
        },
        kind,
    };
    let release_all = |ids: &[SlotId], mode| -> Vec<Stmt> {
        ids.iter()
            .rev()
            .map(|&slot| Stmt::Release { slot, mode })
            .collect()
    };

    let mut body = Vec::new();

    // ========================================================================
    // Null checks and acquisitions
    // ========================================================================

    for &(i, slot) in &acquired {
        if slots[slot].nullable {
            continue;
        }
        let message = format!(
            "argument {i} of {}.{} is null",
            target.name.binary_name(),
            method.name
        );
        body.push(Stmt::If {
            condition: format!("{} == nullptr", arg(i)),
            body: vec![
                Stmt::Throw {
                    class: NULL_POINTER_EXCEPTION.to_string(),
                    message: string_literal(&message),
                },
                default_return(ExitKind::NullArgument),
            ],
        });
    }

    let mut held: Vec<SlotId> = Vec::new();
    for &(i, slot) in &acquired {
        if matches!(slots[slot].kind, ResourceKind::ArrayElements(_)) {
            let length = format!("env->GetArrayLength({})", arg(i));
            body.push(Stmt::Line(if slots[slot].nullable {
                format!("const jsize n{i} = {} != nullptr ? {length} : 0;", arg(i))
            } else {
                format!("const jsize n{i} = {length};")
            }));
        }
        let mut on_failure = release_all(&held, ReleaseMode::Abort);
        on_failure.push(default_return(ExitKind::AcquireFailed));
        body.push(Stmt::Acquire { slot, on_failure });
        held.push(slot);
    }

    // ========================================================================
    // Call
    // ========================================================================

    let mut try_body = Vec::new();
    let mut call_args = vec!["env".to_string()];
    if !method.is_static() {
        call_args.push("self".to_string());
    }
    for (i, p) in mapped.params.iter().enumerate() {
        let slot = acquired.iter().find(|(idx, _)| *idx == i).map(|&(_, s)| s);
        let expr = match (p.marshal, slot) {
            (Marshal::Primitive(k), _) => primitive::to_cpp(k, &arg(i)),
            (Marshal::String, Some(slot)) => slots[slot].var.clone(),
            (Marshal::PrimitiveArray(k), Some(slot)) => format!(
                "jnibridge::Span<{}>{{{}, static_cast<std::size_t>(n{i})}}",
                primitive::jni_type(k),
                slots[slot].var
            ),
            (Marshal::Object { owned: true }, Some(slot)) => {
                let wrapper = format!("r{i}");
                try_body.push(Stmt::Transfer {
                    slot,
                    into: Some(wrapper.clone()),
                });
                held.retain(|&s| s != slot);
                format!("std::move({wrapper})")
            }
            _ => arg(i),
        };
        call_args.push(expr);
    }

    let callee = namespace::qualify(&namespace, impl_name);
    let call = if mapped.ret.jni_type == "void" {
        format!("{callee}({});", call_args.join(", "))
    } else {
        format!("auto result = {callee}({});", call_args.join(", "))
    };
    try_body.push(Stmt::Call(call));
    try_body.extend(release_all(&held, ReleaseMode::Commit));

    // ========================================================================
    // Return conversion
    // ========================================================================

    match mapped.ret.marshal {
        Marshal::Primitive(PrimitiveKind::Void) => try_body.push(Stmt::Return {
            value: ReturnValue::Void,
            kind: ExitKind::Normal,
        }),
        Marshal::Primitive(k) => try_body.push(Stmt::Return {
            value: ReturnValue::Expr(primitive::to_jni(k, "result")),
            kind: ExitKind::Normal,
        }),
        Marshal::Object { .. } => try_body.push(Stmt::Return {
            value: ReturnValue::Expr("result".to_string()),
            kind: ExitKind::Normal,
        }),
        Marshal::String | Marshal::PrimitiveArray(_) => {
            let kind = match mapped.ret.marshal {
                Marshal::PrimitiveArray(k) => ResourceKind::LocalArray(k),
                _ => ResourceKind::LocalString,
            };
            let slot = slots.len();
            slots.push(Slot {
                var: "out".to_string(),
                source: "result".to_string(),
                kind,
                nullable: false,
            });
            // A null `out` is returned as is, with OutOfMemoryError pending.
            try_body.push(Stmt::Acquire {
                slot,
                on_failure: Vec::new(),
            });
            if let ResourceKind::LocalArray(k) = kind {
                try_body.push(Stmt::If {
                    condition: "out != nullptr".to_string(),
                    body: vec![Stmt::Line(format!(
                        "env->Set{}ArrayRegion(out, 0, static_cast<jsize>(result.size()), result.data());",
                        primitive::array_function_name(k)
                    ))],
                });
            }
            try_body.push(Stmt::Transfer { slot, into: None });
            try_body.push(Stmt::Return {
                value: ReturnValue::Expr("out".to_string()),
                kind: ExitKind::Normal,
            });
        }
    }

    let handler = |catch, message: String| {
        let mut body = release_all(&held, ReleaseMode::Abort);
        body.push(Stmt::Throw {
            class: exception_class.to_string(),
            message,
        });
        body.push(default_return(ExitKind::NativeException));
        Handler { catch, body }
    };
    body.push(Stmt::Try {
        body: try_body,
        handlers: vec![
            handler(CatchKind::Std, "e.what()".to_string()),
            handler(CatchKind::Any, string_literal("unknown native exception")),
        ],
    });

    LoweredStub {
        stub: StubIr {
            symbol: signature.entry_point.clone(),
            jni_return: mapped.ret.jni_type.clone(),
            params,
            slots,
            body,
        },
        namespace,
        prototype,
        function,
    }
}

fn arg(index: usize) -> String {
    format!("a{index}")
}
