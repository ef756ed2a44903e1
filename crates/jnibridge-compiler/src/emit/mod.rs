//! C++ stub emission.
//!
//! Each encoded target becomes one translation unit named after its mangled
//! class (`com_example_Math.jni.cpp`) containing:
//!
//! - prototypes of the implementation functions the library author writes
//! - one `extern "C"` stub per bound method, which marshals arguments, calls
//!   the implementation, and converts the result and any native exception
//!
//! Stubs are lowered to [`ir::StubIr`], audited by [`audit::audit`], and only
//! then rendered.

pub mod audit;
pub mod ir;
pub mod lower;
pub mod namespace;
pub mod render;
pub mod runtime;
pub mod writer;

use rustc_hash::{FxHashMap, FxHashSet};

use jnibridge_core::{ClassName, GenerationError};
use jnibridge_registry::RegistrationEntry;

use crate::signature::{EncodedTarget, mangle};
use audit::AuditReport;
use lower::LoweredStub;

pub use runtime::{DEFAULT_RUNTIME_HEADER, render_runtime_header};

/// Java exception raised for native exceptions when not configured otherwise.
pub const DEFAULT_EXCEPTION_CLASS: &str = "com/jnibridge/exception/JniBridgeException";

/// Emitter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    pub generator_version: &'static str,
    /// Internal name of the Java exception native exceptions become.
    pub exception_class: String,
    pub runtime_header: String,
}

impl EmitOptions {
    pub fn new(generator_version: &'static str) -> Self {
        Self {
            generator_version,
            exception_class: DEFAULT_EXCEPTION_CLASS.to_string(),
            runtime_header: DEFAULT_RUNTIME_HEADER.to_string(),
        }
    }
}

/// One generated translation unit and its registration entries.
#[derive(Debug, Clone)]
pub struct EmittedUnit {
    pub class: ClassName,
    pub file_name: String,
    pub contents: String,
    /// In method order.
    pub entries: Vec<RegistrationEntry>,
    /// `(entry point, audit)` per stub.
    pub audits: Vec<(String, AuditReport)>,
}

impl EmittedUnit {
    /// Fail if any stub's audit found a violation.
    pub fn check_balanced(&self) -> Result<(), GenerationError> {
        match self.audits.iter().find(|(_, report)| !report.is_clean()) {
            Some((symbol, report)) => Err(GenerationError::Unbalanced {
                symbol: symbol.clone(),
                detail: report
                    .violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
            None => Ok(()),
        }
    }
}

/// What makes two implementation prototypes indistinguishable to C++.
#[derive(Debug, PartialEq, Eq, Hash)]
struct ImplKey<'a> {
    namespace: Vec<String>,
    name: String,
    params: Vec<&'a str>,
}

/// Emits translation units for encoded targets.
#[derive(Debug, Clone)]
pub struct BindingEmitter {
    options: EmitOptions,
}

impl BindingEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// `<mangled class>.jni.cpp`.
    pub fn unit_file_name(class: &ClassName) -> String {
        format!("{}.jni.cpp", mangle::mangle(class.internal_name()))
    }

    /// The runtime header's contents.
    pub fn runtime_header(&self) -> String {
        render_runtime_header(self.options.generator_version)
    }

    /// Lower every mapped method of a target.
    ///
    /// Implementation names are the sanitised native names. Methods whose
    /// C++ parameter lists would be identical (the receiver counts as a
    /// `jobject` parameter, the return type does not) get a `_<n>` suffix so
    /// each stub calls its own function. Suffixed names skip any name already
    /// used in the same namespace.
    pub fn lower_target(&self, encoded: &EncodedTarget) -> Vec<LoweredStub> {
        let target = &encoded.target.target;
        let keys: Vec<ImplKey> = encoded
            .target
            .methods
            .iter()
            .map(|m| {
                let mut params = Vec::with_capacity(m.params.len() + 1);
                if !m.method.is_static() {
                    params.push("jobject");
                }
                params.extend(m.params.iter().map(|p| p.cpp_type.as_str()));
                ImplKey {
                    namespace: namespace::resolve(target, &m.method),
                    name: namespace::sanitize_segment(&m.method.native_name),
                    params,
                }
            })
            .collect();

        let mut totals: FxHashMap<&ImplKey, usize> = FxHashMap::default();
        for key in &keys {
            *totals.entry(key).or_default() += 1;
        }

        // (namespace, name) pairs taken by methods that keep their base name
        let mut taken: FxHashSet<(&[String], String)> = keys
            .iter()
            .filter(|key| totals.get(key).copied() == Some(1))
            .map(|key| (key.namespace.as_slice(), key.name.clone()))
            .collect();

        let mut next: FxHashMap<&ImplKey, usize> = FxHashMap::default();
        let impl_names: Vec<String> = keys
            .iter()
            .map(|key| {
                if totals.get(key).copied() == Some(1) {
                    return key.name.clone();
                }
                let n = next.entry(key).or_default();
                loop {
                    let candidate = format!("{}_{}", key.name, *n);
                    *n += 1;
                    if taken.insert((key.namespace.as_slice(), candidate.clone())) {
                        break candidate;
                    }
                }
            })
            .collect();

        encoded
            .target
            .methods
            .iter()
            .zip(&encoded.signatures)
            .zip(&impl_names)
            .map(|((mapped, signature), impl_name)| {
                lower::lower(
                    target,
                    mapped,
                    signature,
                    impl_name,
                    &self.options.exception_class,
                )
            })
            .collect()
    }

    /// Emit one target's unit.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit_target(&self, encoded: &EncodedTarget) -> EmittedUnit {
        let class = encoded.class().clone();
        let stubs = self.lower_target(encoded);

        let audits = stubs
            .iter()
            .map(|lowered| {
                let report = audit::audit(&lowered.stub);
                if !report.is_clean() {
                    tracing::error!(
                        symbol = %lowered.stub.symbol,
                        violations = ?report.violations,
                        "stub failed resource audit"
                    );
                }
                (lowered.stub.symbol.clone(), report)
            })
            .collect();

        let entries = encoded
            .target
            .methods
            .iter()
            .zip(&encoded.signatures)
            .zip(&stubs)
            .map(|((mapped, signature), lowered)| RegistrationEntry {
                class: class.clone(),
                method: mapped.method.name.clone(),
                descriptor: signature.descriptor.clone(),
                entry_point: signature.entry_point.clone(),
                function: lowered.function.clone(),
            })
            .collect();

        let contents = render::render_unit(
            &encoded.target.target,
            self.options.generator_version,
            &self.options.runtime_header,
            &stubs,
        );

        tracing::debug!(class = %class, stubs = stubs.len(), "emitted unit");

        EmittedUnit {
            file_name: Self::unit_file_name(&class),
            class,
            contents,
            entries,
            audits,
        }
    }
}
