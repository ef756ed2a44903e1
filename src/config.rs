//! Generator configuration.
//!
//! Loaded from TOML; every field has a default. Spec-style camelCase keys
//! (`outputDirectory`, `namingScheme`, `strictMode`, `markerSelector`) are
//! accepted as aliases.
//!
//! ```toml
//! classpath = ["build/classes", "lib/model.jar"]
//! output_dir = "build/generated/jni"
//! naming = "jni"
//! strict = false
//! exclude_methods = ["destruct"]
//!
//! [marker]
//! kind = "annotation"
//! name = "com.jnibridge.annotations.BridgeClass"
//!
//! [registration]
//! emit_on_load = true
//! jni_version = "1.8"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use jnibridge_compiler::DEFAULT_EXCEPTION_CLASS;
use jnibridge_core::{ClassName, ConfigError, NamingScheme};
use jnibridge_registry::RegistrationOptions;

/// Which classes are binding targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum MarkerSelector {
    /// Classes carrying the named annotation.
    Annotation { name: String },
    /// Classes implementing the named interface, directly or through
    /// supertypes found on the classpath.
    Interface { name: String },
    /// Every class declaring a native method.
    NativeMethods,
}

impl Default for MarkerSelector {
    fn default() -> Self {
        MarkerSelector::Annotation {
            name: "com.jnibridge.annotations.BridgeClass".to_string(),
        }
    }
}

impl MarkerSelector {
    /// The named type, normalised to a class name.
    pub fn class_name(&self) -> Option<ClassName> {
        match self {
            MarkerSelector::Annotation { name } | MarkerSelector::Interface { name } => {
                Some(ClassName::from_binary_name(name))
            }
            MarkerSelector::NativeMethods => None,
        }
    }
}

impl fmt::Display for MarkerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerSelector::Annotation { name } => write!(f, "annotation:{name}"),
            MarkerSelector::Interface { name } => write!(f, "interface:{name}"),
            MarkerSelector::NativeMethods => f.write_str("native-methods"),
        }
    }
}

impl FromStr for MarkerSelector {
    type Err = String;

    /// `annotation:<name>`, `interface:<name>` or `native-methods`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("annotation", name)) if !name.is_empty() => Ok(MarkerSelector::Annotation {
                name: name.to_string(),
            }),
            Some(("interface", name)) if !name.is_empty() => Ok(MarkerSelector::Interface {
                name: name.to_string(),
            }),
            None if s == "native-methods" => Ok(MarkerSelector::NativeMethods),
            _ => Err(format!(
                "invalid marker '{s}', expected annotation:<name>, interface:<name> or native-methods"
            )),
        }
    }
}

/// Annotation types the scanner reads, as binary names. Element names are
/// those of the jnibridge annotation library.
///
/// | Field              | Target            | Elements read                                      |
/// |--------------------|-------------------|----------------------------------------------------|
/// | `bridge_class`     | class             | `namespace`, `customJniCodePaths`, `metadata`      |
/// | `metadata`         | class, nested     | `includes`, `customJNICodePaths`, `inheritFrom`    |
/// | `native_name`      | method            | `nativeName`                                       |
/// | `method_namespace` | method            | `value`                                            |
/// | `takes_ownership`  | method            | (presence)                                         |
/// | `ignore_nullcheck` | method, parameter | (presence)                                         |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationNames {
    pub bridge_class: String,
    pub metadata: String,
    pub native_name: String,
    pub method_namespace: String,
    /// Marks an allocating factory: object arguments and results change
    /// owner.
    pub takes_ownership: String,
    pub ignore_nullcheck: String,
}

impl Default for AnnotationNames {
    fn default() -> Self {
        Self {
            bridge_class: "com.jnibridge.annotations.BridgeClass".to_string(),
            metadata: "com.jnibridge.annotations.BridgeMetadata".to_string(),
            native_name: "com.jnibridge.annotations.Name".to_string(),
            method_namespace: "com.jnibridge.annotations.mapping.MethodNamespace".to_string(),
            takes_ownership: "com.jnibridge.annotations.lifecycle.Allocate".to_string(),
            ignore_nullcheck: "com.jnibridge.annotations.modifiers.IgnoreNullcheck".to_string(),
        }
    }
}

impl AnnotationNames {
    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("annotations.bridge_class", &self.bridge_class),
            ("annotations.metadata", &self.metadata),
            ("annotations.native_name", &self.native_name),
            ("annotations.method_namespace", &self.method_namespace),
            ("annotations.takes_ownership", &self.takes_ownership),
            ("annotations.ignore_nullcheck", &self.ignore_nullcheck),
        ]
    }
}

/// Everything a generation run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Directories and `.jar`/`.zip` archives, searched in order.
    pub classpath: Vec<PathBuf>,
    #[serde(alias = "outputDirectory")]
    pub output_dir: PathBuf,
    #[serde(alias = "namingScheme")]
    pub naming: NamingScheme,
    /// Fail the run on the first unsupported type instead of skipping.
    #[serde(alias = "strictMode")]
    pub strict: bool,
    #[serde(alias = "markerSelector")]
    pub marker: MarkerSelector,
    pub annotations: AnnotationNames,
    /// Method names never bound.
    pub exclude_methods: Vec<String>,
    /// Java exception native exceptions are rethrown as.
    pub exception_class: String,
    pub registration: RegistrationOptions,
    /// Where to write the JSON report, if anywhere.
    pub report: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            classpath: Vec::new(),
            output_dir: PathBuf::from("generated"),
            naming: NamingScheme::default(),
            strict: false,
            marker: MarkerSelector::default(),
            annotations: AnnotationNames::default(),
            exclude_methods: vec!["destruct".to_string()],
            exception_class: DEFAULT_EXCEPTION_CLASS.to_string(),
            registration: RegistrationOptions::default(),
            report: None,
        }
    }
}

impl GeneratorConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a TOML file. Relative paths in it are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&source)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.classpath.iter_mut().for_each(resolve);
        resolve(&mut self.output_dir);
        if let Some(report) = &mut self.report {
            resolve(report);
        }
    }

    /// The exception class in internal form.
    pub fn exception_class_name(&self) -> ClassName {
        ClassName::from_binary_name(&self.exception_class)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classpath.is_empty() {
            return Err(invalid("classpath", "at least one entry is required"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(invalid("output_dir", "must not be empty"));
        }
        if let Some(name) = self.marker.class_name() {
            if !name.is_valid() {
                return Err(invalid("marker", format!("'{name}' is not a class name")));
            }
        }
        for (field, name) in self.annotations.fields() {
            if !ClassName::from_binary_name(name).is_valid() {
                return Err(invalid(field, format!("'{name}' is not a class name")));
            }
        }
        if !self.exception_class_name().is_valid() {
            return Err(invalid(
                "exception_class",
                format!("'{}' is not a class name", self.exception_class),
            ));
        }

        let unit = &self.registration.unit_name;
        if !is_plain_file_name(unit) || !unit.ends_with(".cpp") {
            return Err(invalid("registration.unit_name", "must be a plain *.cpp file name"));
        }
        // Would be removed as a stale stub unit on the next run.
        if unit.ends_with(".jni.cpp") {
            return Err(invalid("registration.unit_name", "must not end in .jni.cpp"));
        }
        if !is_plain_file_name(&self.registration.runtime_header) {
            return Err(invalid("registration.runtime_header", "must be a plain file name"));
        }
        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}
