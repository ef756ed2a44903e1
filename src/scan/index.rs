//! The per-run class index.
//!
//! Every class on the classpath is parsed exactly once into a [`ClassFile`];
//! selection then runs as a plain visitor over the index.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use jnibridge_classfile::ClassFile;
use jnibridge_core::{ClassName, ScanError};

use super::classpath::ClassSource;

/// Parsed classes by name.
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: Vec<ClassFile>,
    by_name: FxHashMap<ClassName, usize>,
}

impl ClassIndex {
    /// Parse every source. `roots` is in classpath order; a class defined by
    /// an earlier root shadows later definitions.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(roots: Vec<Vec<ClassSource>>) -> Result<Self, ScanError> {
        let mut index = ClassIndex::default();
        for sources in roots {
            let parsed = sources
                .par_iter()
                .map(|source| {
                    ClassFile::parse(&source.bytes).map_err(|err| ScanError::Malformed {
                        origin: source.origin.clone(),
                        source: err,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            for (class, source) in parsed.into_iter().zip(&sources) {
                if class.is_descriptor_class() {
                    continue;
                }
                if index.by_name.contains_key(&class.this_class) {
                    tracing::debug!(
                        class = %class.this_class,
                        origin = %source.origin,
                        "shadowed by an earlier classpath entry"
                    );
                    continue;
                }
                index.insert(class);
            }
        }
        Ok(index)
    }

    fn insert(&mut self, class: ClassFile) {
        self.by_name.insert(class.this_class.clone(), self.classes.len());
        self.classes.push(class);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, name: &ClassName) -> Option<&ClassFile> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    /// Classes sorted by name.
    pub fn sorted(&self) -> Vec<&ClassFile> {
        let mut classes: Vec<&ClassFile> = self.classes.iter().collect();
        classes.sort_by(|a, b| a.this_class.cmp(&b.this_class));
        classes
    }

    /// Whether `class` implements `interface` through its own interfaces,
    /// their superinterfaces, or any superclass on the classpath. Types
    /// missing from the index end the search along that branch and are
    /// logged, since an absent dependency hides the marker.
    pub fn implements(&self, class: &ClassFile, interface: &ClassName) -> bool {
        let (found, missing) = self.walk_supertypes(class, Some(interface));
        if !found && !missing.is_empty() {
            tracing::debug!(
                class = %class.this_class,
                interface = %interface,
                missing = ?missing.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "supertypes missing from the classpath; interface marker not resolved"
            );
        }
        found
    }

    /// Supertypes of `class` that the index cannot resolve, in discovery
    /// order. `java/lang/Object` is never reported.
    pub fn unresolved_supertypes<'a>(&'a self, class: &'a ClassFile) -> Vec<&'a ClassName> {
        self.walk_supertypes(class, None).1
    }

    fn walk_supertypes<'a>(
        &'a self,
        class: &'a ClassFile,
        interface: Option<&ClassName>,
    ) -> (bool, Vec<&'a ClassName>) {
        let mut visited: FxHashSet<&ClassName> = FxHashSet::default();
        let mut missing = Vec::new();
        let mut pending: Vec<&ClassName> = Vec::new();
        pending.extend(class.super_class.iter().rev());
        pending.extend(class.interfaces.iter().rev());

        while let Some(name) = pending.pop() {
            if Some(name) == interface {
                return (true, missing);
            }
            if !visited.insert(name) {
                continue;
            }
            match self.get(name) {
                Some(next) => {
                    pending.extend(next.super_class.iter().rev());
                    pending.extend(next.interfaces.iter().rev());
                }
                None if name.internal_name() != "java/lang/Object" => missing.push(name),
                None => {}
            }
        }
        (false, missing)
    }
}
