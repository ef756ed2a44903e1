//! The registration table: every binding the generated library registers.

use serde::Serialize;

use jnibridge_core::{ClassName, EmptyTableError, Fingerprint};

/// Placeholder for the native function a registration entry points at.
///
/// The table is rendered as source, so the "pointer" is the stub's symbol
/// plus enough of its signature to declare it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeFunction {
    pub symbol: String,
    /// JNI return type (`jint`, `void`, ...).
    pub return_type: String,
    /// JNI parameter types including `JNIEnv*` and the receiver.
    pub params: Vec<String>,
}

impl NativeFunction {
    /// The C declaration of the stub.
    pub fn declaration(&self) -> String {
        format!(
            "JNIEXPORT {} JNICALL {}({})",
            self.return_type,
            self.symbol,
            self.params.join(", ")
        )
    }
}

/// One `(class, method, descriptor) -> function` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationEntry {
    pub class: ClassName,
    pub method: String,
    pub descriptor: String,
    pub entry_point: String,
    pub function: NativeFunction,
}

impl RegistrationEntry {
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_entry(
            self.class.internal_name(),
            &self.method,
            &self.descriptor,
            &self.entry_point,
        )
    }
}

/// Compatibility stamp checked by the loader before registering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableStamp {
    pub generator_version: &'static str,
    pub entry_count: u32,
    #[serde(serialize_with = "serialize_fingerprint")]
    pub fingerprint: Fingerprint,
}

fn serialize_fingerprint<S: serde::Serializer>(fp: &Fingerprint, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&fp.to_string())
}

/// An ordered, stamped registration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationTable {
    stamp: TableStamp,
    entries: Vec<RegistrationEntry>,
}

impl RegistrationTable {
    pub fn stamp(&self) -> &TableStamp {
        &self.stamp
    }

    pub fn entries(&self) -> &[RegistrationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by class, in table order.
    pub fn by_class(&self) -> Vec<(&ClassName, &[RegistrationEntry])> {
        self.entries
            .chunk_by(|a, b| a.class == b.class)
            .map(|group| (&group[0].class, group))
            .collect()
    }
}

/// Accumulates entries target by target.
///
/// ```
/// use jnibridge_registry::RegistrationTableBuilder;
///
/// let mut builder = RegistrationTableBuilder::new("0.1.0");
/// builder.record_discovered(1, 1);
/// // every method was skipped, but one was discovered: an empty table is fine
/// let table = builder.build().unwrap();
/// assert!(table.is_empty());
///
/// // nothing discovered at all is a configuration problem
/// assert!(RegistrationTableBuilder::new("0.1.0").build().is_err());
/// ```
#[derive(Debug)]
pub struct RegistrationTableBuilder {
    generator_version: &'static str,
    entries: Vec<RegistrationEntry>,
    methods_discovered: usize,
    classes_scanned: usize,
}

impl RegistrationTableBuilder {
    pub fn new(generator_version: &'static str) -> Self {
        Self {
            generator_version,
            entries: Vec::new(),
            methods_discovered: 0,
            classes_scanned: 0,
        }
    }

    /// Record how much the scan found, whether or not it survives mapping.
    pub fn record_discovered(&mut self, methods: usize, classes_scanned: usize) {
        self.methods_discovered += methods;
        self.classes_scanned += classes_scanned;
    }

    /// Append one target's entries. Targets must be pushed in target order.
    pub fn push_target(&mut self, entries: impl IntoIterator<Item = RegistrationEntry>) {
        self.entries.extend(entries);
    }

    /// Stamp and finish the table.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(self) -> Result<RegistrationTable, EmptyTableError> {
        if self.methods_discovered == 0 {
            return Err(EmptyTableError {
                classes_scanned: self.classes_scanned,
            });
        }

        let fingerprint = self
            .entries
            .iter()
            .fold(Fingerprint::EMPTY, |acc, entry| acc.chain(entry.fingerprint()));

        let stamp = TableStamp {
            generator_version: self.generator_version,
            entry_count: u32::try_from(self.entries.len()).unwrap_or(u32::MAX),
            fingerprint,
        };

        Ok(RegistrationTable {
            stamp,
            entries: self.entries,
        })
    }
}
