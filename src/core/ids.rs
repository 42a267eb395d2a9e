use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LineageError, Result};

pub const PACKAGE_PREFIX: &str = "0Ho";
pub const VERSION_PREFIX: &str = "04t";
pub const REQUEST_PREFIX: &str = "08c";

pub const VERSION_BEING_BUILT: &str = "VERSION_BEING_BUILT";

macro_rules! id_type {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn parse(raw: &str) -> Option<Self> {
                static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
                let shape = SHAPE.get_or_init(|| shape_for($prefix));
                if shape.as_ref().is_some_and(|re| re.is_match(raw)) {
                    Some(Self(raw.to_string()))
                } else {
                    None
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(PackageId, PACKAGE_PREFIX);
id_type!(VersionId, VERSION_PREFIX);
id_type!(RequestId, REQUEST_PREFIX);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Package(PackageId),
    Version(VersionId),
    Request(RequestId),
}

impl Anchor {
    pub fn classify(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(id) = PackageId::parse(raw) {
            return Ok(Anchor::Package(id));
        }
        if let Some(id) = VersionId::parse(raw) {
            return Ok(Anchor::Version(id));
        }
        if let Some(id) = RequestId::parse(raw) {
            return Ok(Anchor::Request(id));
        }
        Err(LineageError::UnsupportedIdentifier(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Anchor::Package(id) => id.as_str(),
            Anchor::Version(id) => id.as_str(),
            Anchor::Request(id) => id.as_str(),
        }
    }
}

pub fn is_sentinel(key: &str) -> bool {
    key == VERSION_BEING_BUILT
}

fn shape_for(prefix: &str) -> Option<Regex> {
    Regex::new(&format!("^{}[A-Za-z0-9]+$", regex::escape(prefix))).ok()
}

#[cfg(test)]
mod tests {
    use crate::core::ids::{is_sentinel, Anchor, PackageId, RequestId, VersionId, VERSION_BEING_BUILT};
    use crate::error::LineageError;

    #[test]
    fn classifies_by_prefix() {
        assert!(matches!(
            Anchor::classify("0HoB00000004CzQKAU"),
            Ok(Anchor::Package(_))
        ));
        assert!(matches!(Anchor::classify("04tAAA"), Ok(Anchor::Version(_))));
        assert!(matches!(
            Anchor::classify(" 08c3i000000fylXAAQ "),
            Ok(Anchor::Request(_))
        ));
    }

    #[test]
    fn rejects_unknown_shapes() {
        for raw in ["", "04t", "04t-bad", "MyPackage@1.0.0-1", "05iAAA"] {
            let err = Anchor::classify(raw).expect_err("shape should be rejected");
            assert!(matches!(err, LineageError::UnsupportedIdentifier(_)), "{raw}");
        }
    }

    #[test]
    fn each_id_kind_keeps_its_own_shape_across_calls() {
        for _ in 0..3 {
            assert!(VersionId::parse("04tAAA").is_some());
            assert!(VersionId::parse("0HoAAA").is_none());
            assert!(PackageId::parse("0HoAAA").is_some());
            assert!(RequestId::parse("04tAAA").is_none());
        }
    }

    #[test]
    fn sentinel_is_not_a_version_id() {
        assert!(is_sentinel(VERSION_BEING_BUILT));
        assert!(VersionId::parse(VERSION_BEING_BUILT).is_none());
    }
}
