use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildKeyword {
    Latest,
    Next,
    Released,
    Highest,
    None,
}

impl BuildKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildKeyword::Latest => "LATEST",
            BuildKeyword::Next => "NEXT",
            BuildKeyword::Released => "RELEASED",
            BuildKeyword::Highest => "HIGHEST",
            BuildKeyword::None => "NONE",
        }
    }
}

pub fn parse_build_keyword(input: &str) -> Option<BuildKeyword> {
    match input {
        "LATEST" => Some(BuildKeyword::Latest),
        "NEXT" => Some(BuildKeyword::Next),
        "RELEASED" => Some(BuildKeyword::Released),
        "HIGHEST" => Some(BuildKeyword::Highest),
        "NONE" => Some(BuildKeyword::None),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildNumber {
    Number(u32),
    Keyword(BuildKeyword),
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildNumber::Number(value) => write!(f, "{value}"),
            BuildNumber::Keyword(keyword) => f.write_str(keyword.as_str()),
        }
    }
}

/// A four part package version: `major.minor.patch.build`.
///
/// Equality is structural. Ordering goes through [`VersionNumber::compare_to`],
/// which treats any two keyword builds as equal, so it is deliberately not
/// exposed as `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: BuildNumber,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version number '{0}' does not have the expected number of parts")]
    Format(String),
    #[error("invalid number '{part}' in version number '{input}'")]
    InvalidNumber { input: String, part: String },
    #[error("invalid build token '{0}': expected a number or one of LATEST, NEXT, RELEASED, HIGHEST, NONE")]
    InvalidBuildToken(String),
}

pub type VersionResult<T> = std::result::Result<T, VersionError>;

impl VersionNumber {
    pub fn new(major: u32, minor: u32, patch: u32, build: BuildNumber) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    pub fn numeric(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self::new(major, minor, patch, BuildNumber::Number(build))
    }

    pub fn parse(input: &str) -> VersionResult<Self> {
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 4 {
            return Err(VersionError::Format(input.to_string()));
        }
        let major = parse_part(input, parts[0])?;
        let minor = parse_part(input, parts[1])?;
        let patch = parse_part(input, parts[2])?;
        let build = match parts[3].parse::<u32>() {
            Ok(value) => BuildNumber::Number(value),
            Err(_) => parse_build_keyword(parts[3])
                .map(BuildNumber::Keyword)
                .ok_or_else(|| VersionError::InvalidBuildToken(parts[3].to_string()))?,
        };
        Ok(Self::new(major, minor, patch, build))
    }

    pub fn is_build_keyword(&self) -> bool {
        matches!(self.build, BuildNumber::Keyword(_))
    }

    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.build, other.build) {
                (BuildNumber::Keyword(_), BuildNumber::Keyword(_)) => Ordering::Equal,
                (BuildNumber::Keyword(_), BuildNumber::Number(_)) => Ordering::Greater,
                (BuildNumber::Number(_), BuildNumber::Keyword(_)) => Ordering::Less,
                (BuildNumber::Number(a), BuildNumber::Number(b)) => a.cmp(&b),
            })
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

impl FromStr for VersionNumber {
    type Err = VersionError;

    fn from_str(s: &str) -> VersionResult<Self> {
        Self::parse(s)
    }
}

pub fn parse_major_minor(input: Option<&str>) -> VersionResult<Option<(u32, u32)>> {
    let Some(input) = input else {
        return Ok(None);
    };
    let parts: Vec<&str> = input.split('.').collect();
    if parts.len() != 2 {
        return Err(VersionError::Format(input.to_string()));
    }
    let major = parse_part(input, parts[0])?;
    let minor = parse_part(input, parts[1])?;
    Ok(Some((major, minor)))
}

pub fn sort_by_version<T, F>(items: &mut [T], version_of: F)
where
    F: Fn(&T) -> Option<VersionNumber>,
{
    items.sort_by(|a, b| match (version_of(a), version_of(b)) {
        (Some(left), Some(right)) => left.compare_to(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn parse_part(input: &str, part: &str) -> VersionResult<u32> {
    part.parse::<u32>().map_err(|_| VersionError::InvalidNumber {
        input: input.to_string(),
        part: part.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use proptest::prelude::*;

    use crate::core::version::{
        parse_major_minor, sort_by_version, BuildKeyword, BuildNumber, VersionError,
        VersionNumber,
    };

    #[test]
    fn parses_numeric_and_keyword_builds() {
        let numeric = VersionNumber::parse("1.2.3.4").expect("parse numeric");
        assert_eq!(numeric, VersionNumber::numeric(1, 2, 3, 4));
        assert!(!numeric.is_build_keyword());

        let keyword: VersionNumber = "2.0.0.NEXT".parse().expect("parse keyword");
        assert_eq!(keyword.build, BuildNumber::Keyword(BuildKeyword::Next));
        assert!(keyword.is_build_keyword());
        assert_eq!(keyword.to_string(), "2.0.0.NEXT");
    }

    #[test]
    fn rejects_malformed_versions() {
        assert_eq!(
            VersionNumber::parse("1.2.3"),
            Err(VersionError::Format("1.2.3".to_string()))
        );
        assert!(matches!(
            VersionNumber::parse("1.x.3.4"),
            Err(VersionError::InvalidNumber { .. })
        ));
        assert_eq!(
            VersionNumber::parse("1.2.3.latest"),
            Err(VersionError::InvalidBuildToken("latest".to_string()))
        );
    }

    #[test]
    fn major_minor_helper_handles_absent_and_malformed_input() {
        assert_eq!(parse_major_minor(None), Ok(None));
        assert_eq!(parse_major_minor(Some("3.1")), Ok(Some((3, 1))));
        assert!(matches!(
            parse_major_minor(Some("3.1.0")),
            Err(VersionError::Format(_))
        ));
    }

    #[test]
    fn keyword_builds_sort_after_numeric_builds() {
        let released = VersionNumber::parse("1.0.0.RELEASED").expect("parse");
        let numbered = VersionNumber::numeric(1, 0, 0, 99);
        let latest = VersionNumber::parse("1.0.0.LATEST").expect("parse");
        assert_eq!(released.compare_to(&numbered), Ordering::Greater);
        assert_eq!(numbered.compare_to(&released), Ordering::Less);
        assert_eq!(released.compare_to(&latest), Ordering::Equal);
        assert_eq!(
            VersionNumber::numeric(1, 0, 1, 0).compare_to(&released),
            Ordering::Greater
        );
    }

    #[test]
    fn sort_helper_orders_siblings_ascending() {
        let mut items = vec!["2.0.0.0", "1.10.0.0", "1.2.0.5", "1.2.0.NEXT", "1.2.0.1"];
        sort_by_version(&mut items, |raw| VersionNumber::parse(raw).ok());
        assert_eq!(
            items,
            vec!["1.2.0.1", "1.2.0.5", "1.2.0.NEXT", "1.10.0.0", "2.0.0.0"]
        );
    }

    fn build_strategy() -> impl Strategy<Value = BuildNumber> {
        prop_oneof![
            (0u32..50).prop_map(BuildNumber::Number),
            prop_oneof![
                Just(BuildKeyword::Latest),
                Just(BuildKeyword::Next),
                Just(BuildKeyword::Released),
                Just(BuildKeyword::Highest),
                Just(BuildKeyword::None),
            ]
            .prop_map(BuildNumber::Keyword),
        ]
    }

    fn version_strategy() -> impl Strategy<Value = VersionNumber> {
        (0u32..4, 0u32..4, 0u32..4, build_strategy())
            .prop_map(|(major, minor, patch, build)| VersionNumber::new(major, minor, patch, build))
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
            prop_assert_eq!(a.compare_to(&b), b.compare_to(&a).reverse());
        }

        #[test]
        fn compare_is_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            if a.compare_to(&b) != Ordering::Greater && b.compare_to(&c) != Ordering::Greater {
                prop_assert_ne!(a.compare_to(&c), Ordering::Greater);
            }
        }

        #[test]
        fn numeric_strings_round_trip(
            major in 0u32..1000,
            minor in 0u32..1000,
            patch in 0u32..1000,
            build in 0u32..1000,
        ) {
            let raw = format!("{major}.{minor}.{patch}.{build}");
            let parsed = VersionNumber::parse(&raw).expect("parse generated version");
            prop_assert_eq!(parsed.to_string(), raw);
        }
    }
}
