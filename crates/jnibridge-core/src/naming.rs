//! Entry-point naming schemes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How native entry-point names are derived.
///
/// | Scheme     | Non-overloaded            | Overloaded                                 |
/// |------------|---------------------------|--------------------------------------------|
/// | `jni`      | `Java_pkg_Cls_m`          | `Java_pkg_Cls_m__<params>`                 |
/// | `jni-long` | `Java_pkg_Cls_m__<params>`| `Java_pkg_Cls_m__<params>`                 |
/// | `indexed`  | `Java_pkg_Cls_m`          | `Java_pkg_Cls_m__<overload index>`         |
///
/// `jni` and `jni-long` names are resolvable by the JVM's own symbol lookup.
/// `indexed` names are only reachable through dynamic registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingScheme {
    #[default]
    Jni,
    JniLong,
    Indexed,
}

impl NamingScheme {
    pub const ALL: [NamingScheme; 3] = [NamingScheme::Jni, NamingScheme::JniLong, NamingScheme::Indexed];

    pub const fn as_str(self) -> &'static str {
        match self {
            NamingScheme::Jni => "jni",
            NamingScheme::JniLong => "jni-long",
            NamingScheme::Indexed => "indexed",
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NamingScheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| format!("unknown naming scheme '{s}' (expected jni, jni-long or indexed)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for scheme in NamingScheme::ALL {
            assert_eq!(scheme.to_string().parse::<NamingScheme>(), Ok(scheme));
        }
        assert!("long".parse::<NamingScheme>().is_err());
    }

    #[test]
    fn default_is_jni() {
        assert_eq!(NamingScheme::default(), NamingScheme::Jni);
    }
}
