//! Metadata scanning.
//!
//! ```text
//! classpath roots ──read──▶ ClassSource* ──parse (rayon)──▶ ClassIndex
//!                                                              │
//!                              BindingTarget* ◀──select───────┘
//!                                    ▲
//!                                    └── custom JNI code (classpath resources)
//! ```
//!
//! Any unreadable root, malformed class or undecodable descriptor aborts the
//! scan: a partial scan would silently drop bindings.

pub mod classpath;
pub mod index;
pub mod select;

use std::path::PathBuf;

use jnibridge_core::{BindingTarget, CustomCode, ScanError};

use crate::config::GeneratorConfig;
pub use classpath::ClassSource;
pub use index::ClassIndex;
pub use select::{Selection, Selector};

/// What a scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Sorted by class name; methods in class-file order.
    pub targets: Vec<BindingTarget>,
    pub classes_scanned: usize,
}

impl ScanResult {
    /// Candidate methods across all targets.
    pub fn method_count(&self) -> usize {
        self.targets.iter().map(|t| t.methods.len()).sum()
    }
}

/// Scans a classpath for binding targets.
#[derive(Debug, Clone)]
pub struct Scanner {
    classpath: Vec<PathBuf>,
    selector: Selector,
}

impl Scanner {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            classpath: config.classpath.clone(),
            selector: Selector::new(config),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        let roots = self
            .classpath
            .iter()
            .map(|root| classpath::read_root(root))
            .collect::<Result<Vec<_>, _>>()?;
        let index = ClassIndex::build(roots)?;
        self.select(&index)
    }

    /// Select targets from an already built index.
    pub fn select(&self, index: &ClassIndex) -> Result<ScanResult, ScanError> {
        let mut targets = Vec::new();
        for class in index.sorted() {
            if !self.selector.is_marked(index, class) {
                continue;
            }
            if let Some(selection) = self.selector.target(index, class)? {
                let target = self.attach_custom_code(selection)?;
                tracing::debug!(
                    class = %target.name,
                    methods = target.methods.len(),
                    kind = ?target.kind,
                    "discovered binding target"
                );
                targets.push(target);
            }
        }

        let result = ScanResult {
            targets,
            classes_scanned: index.len(),
        };
        tracing::info!(
            classes = result.classes_scanned,
            targets = result.targets.len(),
            methods = result.method_count(),
            "scan complete"
        );
        Ok(result)
    }

    /// Load each custom code path from the classpath, in declaration order.
    fn attach_custom_code(&self, selection: Selection) -> Result<BindingTarget, ScanError> {
        let target = selection.target;
        let mut custom_code = Vec::with_capacity(selection.custom_code_paths.len());
        for path in selection.custom_code_paths {
            let Some(contents) = classpath::read_resource(&self.classpath, &path)? else {
                return Err(ScanError::MissingResource {
                    class: target.name.clone(),
                    path,
                });
            };
            tracing::debug!(class = %target.name, %path, "loaded custom JNI code");
            custom_code.push(CustomCode { path, contents });
        }
        Ok(target.with_custom_code(custom_code))
    }
}
