use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully-qualified JVM class name, stored in internal form (`com/example/Math`).
///
/// Used as the primary key for targets and as the payload of object-reference
/// descriptors. Ordering is lexicographic on the internal form, which is what
/// the scanner sorts targets by.
///
/// # Examples
///
/// ```
/// use jnibridge_core::ClassName;
///
/// let math = ClassName::from_binary_name("com.example.Math");
/// assert_eq!(math.internal_name(), "com/example/Math");
/// assert_eq!(math.simple_name(), "Math");
/// assert_eq!(math.package(), Some("com/example"));
///
/// // Nested classes keep their `$` separator
/// let inner = ClassName::from_internal("com/example/Outer$Inner");
/// assert_eq!(inner.binary_name(), "com.example.Outer$Inner");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName {
    internal: String,
}

impl ClassName {
    /// Create from an internal name (`java/lang/String`).
    pub fn from_internal(internal: impl Into<String>) -> Self {
        Self {
            internal: internal.into(),
        }
    }

    /// Create from a binary name (`java.lang.String`).
    pub fn from_binary_name(binary: &str) -> Self {
        Self {
            internal: binary.replace('.', "/"),
        }
    }

    /// The internal form, `/`-separated.
    pub fn internal_name(&self) -> &str {
        &self.internal
    }

    /// The binary form, `.`-separated.
    pub fn binary_name(&self) -> String {
        self.internal.replace('/', ".")
    }

    /// The name without its package.
    pub fn simple_name(&self) -> &str {
        self.internal
            .rsplit_once('/')
            .map_or(self.internal.as_str(), |(_, name)| name)
    }

    /// The package in internal form, `None` for the unnamed package.
    pub fn package(&self) -> Option<&str> {
        self.internal.rsplit_once('/').map(|(package, _)| package)
    }

    /// Package segments (`["com", "example"]`).
    pub fn package_segments(&self) -> Vec<&str> {
        self.package()
            .map(|p| p.split('/').collect())
            .unwrap_or_default()
    }

    /// Whether this names `java.lang.String`.
    pub fn is_string(&self) -> bool {
        self.internal == "java/lang/String"
    }

    /// Whether the name is a syntactically valid internal name: non-empty
    /// segments with none of `.`, `;`, `[` (JVMS §4.2.1).
    pub fn is_valid(&self) -> bool {
        !self.internal.is_empty()
            && self
                .internal
                .split('/')
                .all(|seg| !seg.is_empty() && !seg.contains(['.', ';', '[']))
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_name())
    }
}

impl From<&str> for ClassName {
    /// Accepts either form; `.` is normalised to `/`.
    fn from(s: &str) -> Self {
        Self::from_binary_name(s)
    }
}
