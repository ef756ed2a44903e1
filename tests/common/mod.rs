//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use jnibridge::GeneratorConfig;
pub use jnibridge_classfile::MethodAccess;
pub use jnibridge_classfile::testing::{AnnotationSpec, ClassWriter, MethodSpec};

pub const MARKER: &str = "Lcom/jnibridge/annotations/BridgeClass;";
pub const METADATA: &str = "Lcom/jnibridge/annotations/BridgeMetadata;";
pub const IGNORE_NULLCHECK: &str = "Lcom/jnibridge/annotations/modifiers/IgnoreNullcheck;";
pub const STATIC: MethodAccess = MethodAccess::PUBLIC.union(MethodAccess::STATIC);

/// A class carrying the default binding marker.
pub fn bridge_class(internal_name: &str) -> ClassWriter {
    ClassWriter::new(internal_name).class_annotation(MARKER, false, &[])
}

/// A scratch directory with a `classes/` classpath root and an `out/`
/// output directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("classes")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn classes(&self) -> PathBuf {
        self.dir.path().join("classes")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Write `class` as `classes/<internal name>.class`.
    pub fn add(&self, internal_name: &str, class: ClassWriter) -> &Self {
        let path = self.classes().join(format!("{internal_name}.class"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, class.to_bytes()).unwrap();
        self
    }

    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            classpath: vec![self.classes()],
            output_dir: self.output(),
            ..GeneratorConfig::default()
        }
    }

    /// File names in the output directory, sorted.
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.output())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn read_output(&self, file_name: &str) -> String {
        fs::read_to_string(self.output().join(file_name)).unwrap()
    }
}
