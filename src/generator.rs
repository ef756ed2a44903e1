//! The generation pipeline.
//!
//! ```text
//! scan ──▶ map ──▶ encode ──▶ emit (rayon) ──▶ table ──▶ write
//!           │        │
//!           │        └─ SignatureCollisionError: target skipped
//!           └─ UnsupportedTypeError: method skipped (fatal in strict mode)
//! ```
//!
//! Every artifact is rendered in memory by [`Generator::plan`]; only a plan
//! that survived every fatal check reaches [`Generator::write`].
//!
//! # Example
//!
//! ```ignore
//! use jnibridge::{Generator, GeneratorConfig};
//!
//! let config = GeneratorConfig::load("jnibridge.toml".as_ref())?;
//! let report = Generator::new(config)?.run()?;
//! println!("{report}");
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tempfile::NamedTempFile;

use jnibridge_compiler::{
    BindingEmitter, EmitOptions, EmittedUnit, EncodedTarget, MappedTarget, SignatureEncoder,
    TypeMapper,
};
use jnibridge_core::{BindingTarget, GenerationError};
use jnibridge_registry::{
    EntryPointRegistry, RegistrationTable, RegistrationTableBuilder, render_registration_unit,
};

use crate::config::GeneratorConfig;
use crate::report::{GenerationReport, OutputSummary, TargetSummary};
use crate::scan::{ScanResult, Scanner};

/// Stamped into every artifact and the registration table.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Suffix of per-target units. Files with it that a run did not produce are
/// removed from the output directory.
pub const UNIT_SUFFIX: &str = ".jni.cpp";

/// One file destined for the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

/// A fully rendered run that has not been written yet.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub table: RegistrationTable,
    /// Units in target order, then the runtime header, then the
    /// registration unit.
    pub artifacts: Vec<Artifact>,
    pub report: GenerationReport,
}

impl GenerationPlan {
    pub fn artifact(&self, file_name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }
}

/// Runs the pipeline for one configuration.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    emitter: BindingEmitter,
}

impl Generator {
    /// Validate `config` and prepare a generator for it.
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        config.validate()?;
        let options = EmitOptions {
            generator_version: GENERATOR_VERSION,
            exception_class: config.exception_class_name().internal_name().to_string(),
            runtime_header: config.registration.runtime_header.clone(),
        };
        Ok(Self {
            emitter: BindingEmitter::new(options),
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Scan, plan and write.
    pub fn run(&self) -> Result<GenerationReport, GenerationError> {
        let plan = self.plan()?;
        self.write(plan)
    }

    /// Scan the classpath and render every artifact in memory.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn plan(&self) -> Result<GenerationPlan, GenerationError> {
        let scan = Scanner::new(&self.config).scan()?;
        self.plan_scan(scan)
    }

    /// Render every artifact for an existing scan.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn plan_scan(&self, scan: ScanResult) -> Result<GenerationPlan, GenerationError> {
        let mut report =
            GenerationReport::new(GENERATOR_VERSION, self.config.naming, scan.classes_scanned);
        let mut builder = RegistrationTableBuilder::new(GENERATOR_VERSION);
        builder.record_discovered(scan.method_count(), scan.classes_scanned);

        let mapped = self.map(scan.targets, &mut report)?;
        let encoded = self.encode(mapped, &mut report);
        let units = self.emit(&encoded)?;

        for unit in &units {
            builder.push_target(unit.entries.iter().cloned());
            report.targets.push(TargetSummary {
                class: unit.class.to_string(),
                unit: unit.file_name.clone(),
                entries: unit.entries.len(),
            });
        }
        let table = builder.build()?;
        report.set_table(&table);

        let mut artifacts: Vec<Artifact> = units
            .into_iter()
            .map(|unit| Artifact {
                file_name: unit.file_name,
                contents: unit.contents,
            })
            .collect();
        artifacts.push(Artifact {
            file_name: self.config.registration.runtime_header.clone(),
            contents: self.emitter.runtime_header(),
        });
        artifacts.push(Artifact {
            file_name: self.config.registration.unit_name.clone(),
            contents: render_registration_unit(&table, &self.config.registration),
        });

        tracing::info!(
            entries = table.len(),
            targets = report.targets.len(),
            skipped_methods = report.skipped_methods.len(),
            skipped_targets = report.skipped_targets.len(),
            fingerprint = %table.stamp().fingerprint,
            "generation planned"
        );
        Ok(GenerationPlan {
            table,
            artifacts,
            report,
        })
    }

    fn map(
        &self,
        targets: Vec<BindingTarget>,
        report: &mut GenerationReport,
    ) -> Result<Vec<MappedTarget>, GenerationError> {
        let mapper = TypeMapper::new();
        let mut mapped = Vec::with_capacity(targets.len());
        for target in targets {
            let target = mapper.map_target(target);
            if self.config.strict {
                if let Some(first) = target.skipped.first() {
                    return Err(GenerationError::Strict(first.clone()));
                }
            }
            for skip in &target.skipped {
                report.skip_method(skip);
            }
            mapped.push(target);
        }
        Ok(mapped)
    }

    fn encode(&self, mapped: Vec<MappedTarget>, report: &mut GenerationReport) -> Vec<EncodedTarget> {
        let encoder = SignatureEncoder::new(self.config.naming);
        let mut registry = EntryPointRegistry::new();
        let mut encoded = Vec::with_capacity(mapped.len());
        for target in mapped {
            if target.methods.is_empty() {
                tracing::debug!(class = %target.target.name, "no bindable methods left");
                continue;
            }
            match encoder.encode_target(target, &mut registry) {
                Ok(target) => encoded.push(target),
                Err(err) => {
                    tracing::warn!(
                        class = %err.class,
                        method = %err.method,
                        descriptor = %err.descriptor,
                        entry_point = %err.entry_point,
                        "skipping target: signature collision"
                    );
                    report.skip_target(&err);
                }
            }
        }
        tracing::debug!(
            targets = encoded.len(),
            entry_points = registry.len(),
            "signatures encoded"
        );
        encoded
    }

    fn emit(&self, encoded: &[EncodedTarget]) -> Result<Vec<EmittedUnit>, GenerationError> {
        let units: Vec<EmittedUnit> = encoded
            .par_iter()
            .map(|target| self.emitter.emit_target(target))
            .collect();
        for unit in &units {
            unit.check_balanced()?;
        }
        Ok(units)
    }

    /// Write a plan into the output directory.
    ///
    /// Unchanged files are left alone and stale units are removed. The JSON
    /// report goes wherever the configuration asks.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write(&self, plan: GenerationPlan) -> Result<GenerationReport, GenerationError> {
        let GenerationPlan {
            artifacts,
            mut report,
            ..
        } = plan;
        let dir = self.config.output_dir.as_path();
        fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;

        let mut output = OutputSummary::default();
        for artifact in &artifacts {
            let path = dir.join(&artifact.file_name);
            if write_if_changed(&path, artifact.contents.as_bytes())? {
                output.written.push(artifact.file_name.clone());
            } else {
                output.unchanged.push(artifact.file_name.clone());
            }
        }
        output.removed = remove_stale_units(dir, &artifacts)?;
        report.output = output;

        if let Some(path) = &self.config.report {
            let json = report
                .to_json()
                .map_err(|err| io_error(path, io::Error::other(err)))?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
            }
            write_if_changed(path, json.as_bytes())?;
        }

        tracing::info!(
            dir = %dir.display(),
            written = report.output.written.len(),
            unchanged = report.output.unchanged.len(),
            removed = report.output.removed.len(),
            "artifacts written"
        );
        Ok(report)
    }
}

/// Atomically replace `path` unless it already holds `contents`. Returns
/// whether the file was written.
fn write_if_changed(path: &Path, contents: &[u8]) -> Result<bool, GenerationError> {
    if let Ok(existing) = fs::read(path) {
        if existing == contents {
            return Ok(false);
        }
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(|source| io_error(path, source))?;
    file.write_all(contents)
        .map_err(|source| io_error(path, source))?;
    file.persist(path).map_err(|err| io_error(path, err.error))?;
    Ok(true)
}

fn remove_stale_units(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<String>, GenerationError> {
    let keep: FxHashSet<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    let mut removed = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| io_error(dir, source))? {
        let entry = entry.map_err(|source| io_error(dir, source))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.ends_with(UNIT_SUFFIX) || keep.contains(name) {
            continue;
        }
        let file_type = entry.file_type().map_err(|source| io_error(&entry.path(), source))?;
        if !file_type.is_file() {
            continue;
        }
        fs::remove_file(entry.path()).map_err(|source| io_error(&entry.path(), source))?;
        tracing::debug!(file = name, "removed stale unit");
        removed.push(name.to_string());
    }
    removed.sort();
    Ok(removed)
}

fn io_error(path: &Path, source: io::Error) -> GenerationError {
    GenerationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_core::{BindingMethod, ClassName, MethodDescriptor, MethodFlags};

    fn method(name: &str, descriptor: &str) -> BindingMethod {
        BindingMethod::new(
            name,
            MethodDescriptor::parse(descriptor).unwrap(),
            MethodFlags::STATIC,
        )
    }

    fn scan(targets: Vec<(&str, Vec<BindingMethod>)>) -> ScanResult {
        ScanResult {
            classes_scanned: targets.len(),
            targets: targets
                .into_iter()
                .map(|(name, methods)| BindingTarget::new(ClassName::from_internal(name), methods))
                .collect(),
        }
    }

    fn generator(output: &Path) -> Generator {
        Generator::new(GeneratorConfig {
            classpath: vec![output.join("classes")],
            output_dir: output.to_path_buf(),
            ..GeneratorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let err = Generator::new(GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn plans_units_header_and_registration() {
        let dir = tempfile::tempdir().unwrap();
        let plan = generator(dir.path())
            .plan_scan(scan(vec![
                ("a/B", vec![method("f", "(I)I")]),
                ("a/A", vec![method("g", "()V")]),
            ]))
            .unwrap();

        let names: Vec<_> = plan.artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "a_B.jni.cpp",
                "a_A.jni.cpp",
                "jnibridge_runtime.hpp",
                "jnibridge_registration.cpp"
            ]
        );
        assert_eq!(plan.table.len(), 2);
        assert_eq!(plan.report.entry_count, 2);
        assert!(
            plan.artifact("jnibridge_registration.cpp")
                .unwrap()
                .contents
                .contains("Java_a_B_f")
        );
        assert!(!plan.report.has_skips());
    }

    #[test]
    fn strict_mode_fails_on_first_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = generator(dir.path()).config().clone();
        config.strict = true;
        let err = Generator::new(config)
            .unwrap()
            .plan_scan(scan(vec![(
                "a/A",
                vec![method("ok", "()V"), method("bad", "([[I)V")],
            )]))
            .unwrap_err();
        assert!(matches!(err, GenerationError::Strict(ref e) if e.method == "bad"));
    }

    #[test]
    fn all_skipped_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let plan = generator(dir.path())
            .plan_scan(scan(vec![("a/A", vec![method("bad", "([[I)V")])]))
            .unwrap();
        assert!(plan.table.is_empty());
        assert_eq!(plan.report.skipped_methods.len(), 1);
        assert!(plan.artifact("a_A.jni.cpp").is_none());
    }

    #[test]
    fn nothing_discovered_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = generator(dir.path()).plan_scan(scan(vec![])).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyTable(_)));
    }

    #[test]
    fn collision_skips_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let plan = generator(dir.path())
            .plan_scan(scan(vec![
                ("a/A", vec![method("f", "(I)I"), method("f", "(I)J")]),
                ("a/B", vec![method("g", "()V")]),
            ]))
            .unwrap();
        assert_eq!(plan.report.skipped_targets.len(), 1);
        assert_eq!(plan.report.skipped_targets[0].class, "a.A");
        assert_eq!(plan.table.len(), 1);
        assert!(plan.artifact("a_A.jni.cpp").is_none());
    }

    #[test]
    fn write_skips_unchanged_and_removes_stale_units() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path());
        let targets = || scan(vec![("a/A", vec![method("f", "()V")])]);
        fs::write(dir.path().join("old_Gone.jni.cpp"), "stale").unwrap();
        fs::write(dir.path().join("notes.txt"), "kept").unwrap();

        let first = generator.write(generator.plan_scan(targets()).unwrap()).unwrap();
        assert_eq!(first.output.written.len(), 3);
        assert_eq!(first.output.removed, vec!["old_Gone.jni.cpp"]);
        assert!(dir.path().join("notes.txt").exists());

        let second = generator.write(generator.plan_scan(targets()).unwrap()).unwrap();
        assert!(second.output.written.is_empty());
        assert_eq!(second.output.unchanged.len(), 3);
        assert!(second.output.removed.is_empty());
    }

    #[test]
    fn writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = generator(dir.path()).config().clone();
        config.report = Some(dir.path().join("reports/run.json"));
        let generator = Generator::new(config).unwrap();
        generator
            .write(generator.plan_scan(scan(vec![("a/A", vec![method("f", "()V")])])).unwrap())
            .unwrap();

        let json = fs::read_to_string(dir.path().join("reports/run.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entry_count"], 1);
        assert_eq!(value["targets"][0]["unit"], "a_A.jni.cpp");
    }
}
