//! Signature encoding and overload disambiguation.
//!
//! For each target the encoder:
//!
//! 1. groups every candidate method by name (skipped methods included, so a
//!    skipped overload still forces its siblings onto disambiguated names)
//! 2. rejects the target if two methods in a group share a parameter
//!    descriptor; JNI long names erase the return type, so those two are
//!    indistinguishable on the native side
//! 3. numbers each overloaded group by descriptor order
//! 4. derives an entry-point name per mapped method under the configured
//!    [`NamingScheme`]
//! 5. claims every entry point in the run's [`EntryPointRegistry`], rejecting
//!    the target if any was claimed by an earlier target

pub mod mangle;

use rustc_hash::FxHashMap;

use jnibridge_core::{
    BindingMethod, ClassName, CollisionKind, MethodDescriptor, NamingScheme,
    SignatureCollisionError,
};
use jnibridge_registry::{Claim, EntryPointRegistry};

use crate::mapper::MappedTarget;

/// A method's canonical descriptor and derived entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedSignature {
    pub descriptor: String,
    pub entry_point: String,
    pub overload_index: Option<u16>,
}

/// A target whose surviving methods all have entry points.
#[derive(Debug, Clone)]
pub struct EncodedTarget {
    pub target: MappedTarget,
    /// Parallel to `target.methods`.
    pub signatures: Vec<EncodedSignature>,
}

impl EncodedTarget {
    pub fn class(&self) -> &ClassName {
        &self.target.target.name
    }
}

/// Derives entry-point names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureEncoder {
    naming: NamingScheme,
}

impl SignatureEncoder {
    pub fn new(naming: NamingScheme) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    /// The entry-point name of one method.
    pub fn entry_point(
        &self,
        class: &ClassName,
        method: &str,
        descriptor: &MethodDescriptor,
        overload_index: Option<u16>,
    ) -> String {
        let class = class.internal_name();
        match (self.naming, overload_index) {
            (NamingScheme::JniLong, _) | (NamingScheme::Jni, Some(_)) => {
                mangle::long_name(class, method, &descriptor.encode_params())
            }
            (NamingScheme::Jni, None) | (NamingScheme::Indexed, None) => {
                mangle::short_name(class, method)
            }
            (NamingScheme::Indexed, Some(index)) => {
                format!("{}__{index}", mangle::short_name(class, method))
            }
        }
    }

    /// Assign overload indices to every candidate method, or report the first
    /// erased-descriptor collision.
    pub fn overload_indices(
        &self,
        class: &ClassName,
        methods: &[BindingMethod],
    ) -> Result<FxHashMap<(String, String), Option<u16>>, SignatureCollisionError> {
        let mut groups: FxHashMap<&str, Vec<&BindingMethod>> = FxHashMap::default();
        for method in methods {
            groups.entry(method.name.as_str()).or_default().push(method);
        }

        let mut indices = FxHashMap::default();
        // Visit groups in first-declaration order so the reported collision is stable.
        let mut names: Vec<&str> = Vec::new();
        for method in methods {
            if !names.contains(&method.name.as_str()) {
                names.push(&method.name);
            }
        }

        for name in names {
            let Some(group) = groups.get_mut(name) else {
                continue;
            };
            group.sort_by_cached_key(|m| m.descriptor.encode());

            for pair in group.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if a.descriptor.params == b.descriptor.params {
                    let params = b.descriptor.encode_params();
                    return Err(SignatureCollisionError {
                        class: class.clone(),
                        method: b.name.clone(),
                        descriptor: b.descriptor.encode(),
                        entry_point: mangle::long_name(class.internal_name(), &b.name, &params),
                        kind: CollisionKind::ErasedDescriptor {
                            other_descriptor: a.descriptor.encode(),
                        },
                    });
                }
            }

            let overloaded = group.len() > 1;
            for (position, method) in group.iter().enumerate() {
                let index = overloaded.then(|| u16::try_from(position).unwrap_or(u16::MAX));
                indices.insert((method.name.clone(), method.descriptor.encode()), index);
            }
        }
        Ok(indices)
    }

    /// Encode one target and claim its entry points.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn encode_target(
        &self,
        mut mapped: MappedTarget,
        registry: &mut EntryPointRegistry,
    ) -> Result<EncodedTarget, SignatureCollisionError> {
        let class = mapped.target.name.clone();
        let indices = self.overload_indices(&class, &mapped.target.methods)?;
        let index_of = |m: &BindingMethod| {
            indices
                .get(&(m.name.clone(), m.descriptor.encode()))
                .copied()
                .flatten()
        };

        for method in &mut mapped.target.methods {
            method.overload_index = index_of(method);
        }

        let mut signatures = Vec::with_capacity(mapped.methods.len());
        for m in &mut mapped.methods {
            let overload_index = index_of(&m.method);
            m.method.overload_index = overload_index;
            let entry_point =
                self.entry_point(&class, &m.method.name, &m.method.descriptor, overload_index);
            signatures.push(EncodedSignature {
                descriptor: m.method.descriptor.encode(),
                entry_point,
                overload_index,
            });
        }

        let claims = mapped
            .methods
            .iter()
            .zip(&signatures)
            .map(|(m, sig)| {
                (
                    sig.entry_point.clone(),
                    Claim::new(class.clone(), m.method.name.clone(), sig.descriptor.clone()),
                )
            })
            .collect();

        if let Err(conflict) = registry.claim_all(claims) {
            return Err(SignatureCollisionError {
                class: class.clone(),
                method: conflict.rejected.method,
                descriptor: conflict.rejected.descriptor,
                entry_point: conflict.entry_point,
                kind: CollisionKind::EntryPoint {
                    claimed_by: conflict.existing.to_string(),
                },
            });
        }

        Ok(EncodedTarget {
            target: mapped,
            signatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::TypeMapper;
    use jnibridge_core::{BindingTarget, MethodFlags};

    fn method(name: &str, desc: &str) -> BindingMethod {
        BindingMethod::new(name, MethodDescriptor::parse(desc).unwrap(), MethodFlags::STATIC)
    }

    fn mapped(class: &str, methods: Vec<BindingMethod>) -> MappedTarget {
        TypeMapper::new().map_target(BindingTarget::new(ClassName::from_internal(class), methods))
    }

    fn encode(
        naming: NamingScheme,
        target: MappedTarget,
    ) -> Result<EncodedTarget, SignatureCollisionError> {
        SignatureEncoder::new(naming).encode_target(target, &mut EntryPointRegistry::new())
    }

    #[test]
    fn single_method_uses_short_name() {
        let encoded = encode(
            NamingScheme::Jni,
            mapped("com/example/Math", vec![method("add", "(II)I")]),
        )
        .unwrap();
        let sig = &encoded.signatures[0];
        assert_eq!(sig.entry_point, "Java_com_example_Math_add");
        assert_eq!(sig.descriptor, "(II)I");
        assert_eq!(sig.overload_index, None);
    }

    #[test]
    fn overloads_get_distinct_names() {
        let encoded = encode(
            NamingScheme::Jni,
            mapped(
                "com/example/Foo",
                vec![method("foo", "(I)V"), method("foo", "(Ljava/lang/String;)V")],
            ),
        )
        .unwrap();
        let names: Vec<_> = encoded.signatures.iter().map(|s| s.entry_point.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Java_com_example_Foo_foo__I",
                "Java_com_example_Foo_foo__Ljava_lang_String_2"
            ]
        );
        // "(I)V" sorts before "(Ljava/lang/String;)V"
        assert_eq!(encoded.signatures[0].overload_index, Some(0));
        assert_eq!(encoded.signatures[1].overload_index, Some(1));
        assert_eq!(encoded.target.methods[1].method.overload_index, Some(1));
    }

    #[test]
    fn indexed_scheme() {
        let encoded = encode(
            NamingScheme::Indexed,
            mapped("a/B", vec![method("f", "(J)V"), method("f", "(I)V"), method("g", "()V")]),
        )
        .unwrap();
        let names: Vec<_> = encoded.signatures.iter().map(|s| s.entry_point.as_str()).collect();
        assert_eq!(names, vec!["Java_a_B_f__1", "Java_a_B_f__0", "Java_a_B_g"]);
    }

    #[test]
    fn jni_long_scheme_always_long() {
        let encoded = encode(NamingScheme::JniLong, mapped("a/B", vec![method("g", "()V")])).unwrap();
        assert_eq!(encoded.signatures[0].entry_point, "Java_a_B_g__");
    }

    #[test]
    fn erased_descriptor_collision_rejects_target() {
        let err = encode(
            NamingScheme::Jni,
            mapped("a/B", vec![method("f", "(I)I"), method("f", "(I)J")]),
        )
        .unwrap_err();
        assert_eq!(err.method, "f");
        assert_eq!(err.entry_point, "Java_a_B_f__I");
        assert!(matches!(err.kind, CollisionKind::ErasedDescriptor { .. }));
    }

    #[test]
    fn skipped_overload_still_forces_long_names() {
        let encoded = encode(
            NamingScheme::Jni,
            mapped("a/B", vec![method("f", "(I)V"), method("f", "([[I)V")]),
        )
        .unwrap();
        assert_eq!(encoded.target.skipped.len(), 1);
        assert_eq!(encoded.signatures.len(), 1);
        assert_eq!(encoded.signatures[0].entry_point, "Java_a_B_f__I");
    }

    #[test]
    fn cross_target_entry_point_collision() {
        let encoder = SignatureEncoder::new(NamingScheme::Jni);
        let mut registry = EntryPointRegistry::new();
        encoder
            .encode_target(mapped("a/B", vec![method("f", "()V")]), &mut registry)
            .unwrap();

        let err = encoder
            .encode_target(mapped("a/B", vec![method("f", "()V")]), &mut registry)
            .unwrap_err();
        match err.kind {
            CollisionKind::EntryPoint { claimed_by } => assert_eq!(claimed_by, "a.B.f()V"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.len(), 1);
    }
}
