//! The generation report.
//!
//! Accumulates every recoverable problem of a run so one run reports all of
//! them. Renders as text for the terminal and serialises to JSON.

use std::fmt;

use serde::Serialize;

use jnibridge_core::{CollisionKind, NamingScheme, SignatureCollisionError, UnsupportedTypeError};
use jnibridge_registry::RegistrationTable;

/// A target that produced a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    pub class: String,
    pub unit: String,
    pub entries: usize,
}

/// A method skipped for an unsupported type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMethod {
    pub class: String,
    pub method: String,
    pub descriptor: String,
    pub offending: String,
    pub reason: String,
}

impl From<&UnsupportedTypeError> for SkippedMethod {
    fn from(err: &UnsupportedTypeError) -> Self {
        Self {
            class: err.class.to_string(),
            method: err.method.clone(),
            descriptor: err.descriptor.clone(),
            offending: err.offending.clone(),
            reason: err.reason.to_string(),
        }
    }
}

/// A target skipped for a signature collision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    pub class: String,
    pub method: String,
    pub descriptor: String,
    pub entry_point: String,
    pub reason: String,
}

impl From<&SignatureCollisionError> for SkippedTarget {
    fn from(err: &SignatureCollisionError) -> Self {
        let reason = match &err.kind {
            CollisionKind::ErasedDescriptor { other_descriptor } => format!(
                "same parameters as {}{other_descriptor}; JNI names ignore the return type",
                err.method
            ),
            CollisionKind::EntryPoint { claimed_by } => {
                format!("entry point already claimed by {claimed_by}")
            }
        };
        Self {
            class: err.class.to_string(),
            method: err.method.clone(),
            descriptor: err.descriptor.clone(),
            entry_point: err.entry_point.clone(),
            reason,
        }
    }
}

/// What happened to the files in the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputSummary {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub generator_version: String,
    pub naming: NamingScheme,
    pub classes_scanned: usize,
    pub entry_count: usize,
    /// Hex table fingerprint.
    pub fingerprint: String,
    pub targets: Vec<TargetSummary>,
    pub skipped_methods: Vec<SkippedMethod>,
    pub skipped_targets: Vec<SkippedTarget>,
    pub output: OutputSummary,
}

impl GenerationReport {
    pub fn new(generator_version: &str, naming: NamingScheme, classes_scanned: usize) -> Self {
        Self {
            generator_version: generator_version.to_string(),
            naming,
            classes_scanned,
            entry_count: 0,
            fingerprint: String::new(),
            targets: Vec::new(),
            skipped_methods: Vec::new(),
            skipped_targets: Vec::new(),
            output: OutputSummary::default(),
        }
    }

    pub fn skip_method(&mut self, err: &UnsupportedTypeError) {
        self.skipped_methods.push(err.into());
    }

    pub fn skip_target(&mut self, err: &SignatureCollisionError) {
        self.skipped_targets.push(err.into());
    }

    /// Record the final table.
    pub fn set_table(&mut self, table: &RegistrationTable) {
        self.entry_count = table.len();
        self.fingerprint = table.stamp().fingerprint.to_string();
    }

    /// Whether anything was skipped.
    pub fn has_skips(&self) -> bool {
        !self.skipped_methods.is_empty() || !self.skipped_targets.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "jnibridge {}: {} entries from {} targets ({} classes scanned, naming {})",
            self.generator_version,
            self.entry_count,
            self.targets.len(),
            self.classes_scanned,
            self.naming
        )?;
        writeln!(f, "table fingerprint {}", self.fingerprint)?;
        for target in &self.targets {
            writeln!(f, "  {} -> {} ({} entries)", target.class, target.unit, target.entries)?;
        }

        if !self.skipped_methods.is_empty() {
            writeln!(f, "skipped methods ({}):", self.skipped_methods.len())?;
            for skip in &self.skipped_methods {
                writeln!(
                    f,
                    "  {}.{}{}: {} (offending type '{}')",
                    skip.class, skip.method, skip.descriptor, skip.reason, skip.offending
                )?;
            }
        }
        if !self.skipped_targets.is_empty() {
            writeln!(f, "skipped targets ({}):", self.skipped_targets.len())?;
            for skip in &self.skipped_targets {
                writeln!(
                    f,
                    "  {}: {}{} on '{}': {}",
                    skip.class, skip.method, skip.descriptor, skip.entry_point, skip.reason
                )?;
            }
        }

        let out = &self.output;
        write!(
            f,
            "files: {} written, {} unchanged, {} removed",
            out.written.len(),
            out.unchanged.len(),
            out.removed.len()
        )
    }
}
