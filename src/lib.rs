//! jnibridge
//!
//! Generates C++/JNI glue and a registration table from JVM class files.
//!
//! ## Pipeline
//!
//! | Stage    | Crate / module           | Output                          |
//! |----------|--------------------------|---------------------------------|
//! | Scan     | [`scan`]                 | `BindingTarget`s                |
//! | Map      | `jnibridge-compiler`     | native types per parameter      |
//! | Encode   | `jnibridge-compiler`     | entry-point names               |
//! | Emit     | `jnibridge-compiler`     | one `.jni.cpp` unit per target  |
//! | Register | `jnibridge-registry`     | stamped table and its C++ unit  |
//!
//! [`Generator`] drives the stages for one [`GeneratorConfig`] and returns a
//! [`GenerationReport`].

pub mod config;
pub mod generator;
pub mod report;
pub mod scan;

pub use config::{AnnotationNames, GeneratorConfig, MarkerSelector};
pub use generator::{Artifact, GENERATOR_VERSION, GenerationPlan, Generator, UNIT_SUFFIX};
pub use report::{GenerationReport, OutputSummary, SkippedMethod, SkippedTarget, TargetSummary};
pub use scan::{ScanResult, Scanner};

pub use jnibridge_core::{GenerationError, NamingScheme};
pub use jnibridge_registry::{JniVersion, RegistrationOptions};
