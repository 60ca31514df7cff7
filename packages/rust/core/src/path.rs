//! Dotted path expressions addressing a unit and an optional accessor chain.
//!
//! Grammar: `name[.accessor...]`, ASCII only, no `{` or `}` (reserved for
//! templating). The leading segment may be wrapped in parentheses, as in
//! `(Bar).count`, which is the conventional spelling for meta-addressing.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use stocklab_shared::{Result, StocklabError};

/// Characters a path may never contain.
const RESERVED: [char; 2] = ['{', '}'];

static UNIT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Whether `name` is usable as a unit name (and therefore as an artifact stem).
pub fn is_unit_name(name: &str) -> bool {
    UNIT_NAME_RE.is_match(name)
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPath {
    raw: String,
    unit: String,
    wrapped: bool,
    accessors: Vec<String>,
}

impl UnitPath {
    /// Parse a path expression.
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(c) = raw.chars().find(|c| RESERVED.contains(c)) {
            return Err(StocklabError::invalid_path(
                raw,
                format!("reserved character '{c}'"),
            ));
        }
        if !raw.is_ascii() {
            return Err(StocklabError::invalid_path(raw, "path must be ASCII"));
        }

        let mut segments = raw.split('.');
        let head = segments.next().unwrap_or_default();
        let unit = head.trim_matches(|c| c == '(' || c == ')');
        if !is_unit_name(unit) {
            return Err(StocklabError::invalid_path(
                raw,
                format!("{unit:?} is not a valid unit name"),
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            unit: unit.to_string(),
            wrapped: head.starts_with('(') && head.ends_with(')'),
            accessors: segments.map(str::to_string).collect(),
        })
    }

    /// The full path as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Unit name with any wrapping parentheses stripped.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Whether the leading segment was written as `(Name)`.
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Segments after the unit name.
    pub fn accessors(&self) -> &[String] {
        &self.accessors
    }

    pub fn accessor(&self, index: usize) -> Option<&str> {
        self.accessors.get(index).map(String::as_str)
    }

    /// Parse the accessor at `index` as `T`.
    pub fn parse_accessor<T>(&self, index: usize) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let segment = self.accessor(index).ok_or_else(|| {
            StocklabError::invalid_path(&self.raw, format!("missing accessor #{index}"))
        })?;
        segment.parse().map_err(|e| {
            StocklabError::invalid_path(&self.raw, format!("accessor {segment:?}: {e}"))
        })
    }
}

impl FromStr for UnitPath {
    type Err = StocklabError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for UnitPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_path() {
        let path = UnitPath::parse("Foo.bar.2020").expect("parse");
        assert_eq!(path.unit(), "Foo");
        assert!(!path.is_wrapped());
        assert_eq!(path.accessors(), ["bar", "2020"]);
        assert_eq!(path.parse_accessor::<u32>(1).expect("year"), 2020);
        assert_eq!(path.as_str(), "Foo.bar.2020");
    }

    #[test]
    fn strips_wrapping_parentheses() {
        let path = UnitPath::parse("(Bar).count").expect("parse");
        assert_eq!(path.unit(), "Bar");
        assert!(path.is_wrapped());
        assert_eq!(path.accessor(0), Some("count"));
    }

    #[test]
    fn bare_unit_name_has_no_accessors() {
        let path: UnitPath = "Foo".parse().expect("parse");
        assert_eq!(path.unit(), "Foo");
        assert!(path.accessors().is_empty());
    }

    #[test]
    fn reserved_characters_are_rejected() {
        for raw in ["a{b}", "{a}.b", "Foo.}"] {
            let err = UnitPath::parse(raw).unwrap_err();
            assert!(matches!(err, StocklabError::InvalidPath { .. }), "{raw}");
        }
    }

    #[test]
    fn invalid_unit_names_are_rejected() {
        for raw in ["", ".bar", "()", "../etc.passwd", "9lives.x", "Café.x"] {
            assert!(UnitPath::parse(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn parse_accessor_reports_bad_segments() {
        let path = UnitPath::parse("Foo.abc").expect("parse");
        let err = path.parse_accessor::<i64>(0).unwrap_err();
        assert!(err.to_string().contains("\"abc\""));
        assert!(path.parse_accessor::<i64>(3).is_err());
    }
}
