//! Culture tags and the request-scoped culture context.
//!
//! A culture tag is a hierarchical locale identifier such as `fr-CH`. Dropping the
//! last subtag yields the parent (`fr-CH` -> `fr`); a tag with a single subtag is
//! neutral and has no parent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CultureError;

/// Hierarchical locale identifier.
///
/// The original spelling is preserved because it is part of the stored key
/// (`{namespace}.{culture}.{key}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CultureTag(String);

impl CultureTag {
    /// Parse and validate a culture tag.
    pub fn parse(tag: &str) -> Result<Self, CultureError> {
        let tag = tag.trim();
        let mut subtags = tag.split('-');

        let valid_language = subtags
            .next()
            .is_some_and(|lang| (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_alphabetic()));
        let valid_rest = subtags.all(|sub| (1..=8).contains(&sub.len()) && sub.chars().all(|c| c.is_ascii_alphanumeric()));

        if valid_language && valid_rest {
            Ok(Self(tag.to_string()))
        } else {
            Err(CultureError(tag.to_string()))
        }
    }

    /// The tag as written.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// A neutral culture names a language only (`fr`, `zh`).
    pub fn is_neutral(&self) -> bool {
        !self.0.contains('-')
    }

    /// Parent culture, or `None` for neutral cultures.
    pub fn parent(&self) -> Option<CultureTag> {
        self.0
            .rsplit_once('-')
            .map(|(parent, _)| CultureTag(parent.to_string()))
    }
}

impl fmt::Display for CultureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CultureTag {
    type Err = CultureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CultureTag {
    type Error = CultureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CultureTag> for String {
    fn from(tag: CultureTag) -> Self {
        tag.0
    }
}

/// Supplies the ambient cultures of the current request.
///
/// Implemented by whatever request-scoped context the host builds; the resolver only
/// reads from it.
pub trait CultureProvider {
    /// Culture used for formatting (dates, numbers).
    fn current_culture(&self) -> &CultureTag;

    /// Culture used for resource lookup.
    fn current_ui_culture(&self) -> &CultureTag;
}

/// Cultures negotiated for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCulture {
    culture: CultureTag,
    ui_culture: CultureTag,
}

impl RequestCulture {
    /// Use the same culture for formatting and lookup.
    pub fn new(culture: CultureTag) -> Self {
        Self {
            ui_culture: culture.clone(),
            culture,
        }
    }

    /// Use a distinct UI culture for lookups.
    #[must_use]
    pub fn with_ui_culture(mut self, ui_culture: CultureTag) -> Self {
        self.ui_culture = ui_culture;
        self
    }
}

impl CultureProvider for RequestCulture {
    fn current_culture(&self) -> &CultureTag {
        &self.culture
    }

    fn current_ui_culture(&self) -> &CultureTag {
        &self.ui_culture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_chain() {
        let tag = CultureTag::parse("zh-Hant-TW").unwrap();
        assert!(!tag.is_neutral());

        let parent = tag.parent().unwrap();
        assert_eq!(parent.name(), "zh-Hant");

        let root = parent.parent().unwrap();
        assert_eq!(root.name(), "zh");
        assert!(root.is_neutral());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_rejects_malformed_tags() {
        assert!(CultureTag::parse("").is_err());
        assert!(CultureTag::parse("f").is_err());
        assert!(CultureTag::parse("fr-").is_err());
        assert!(CultureTag::parse("fr_CH").is_err());
        assert!(CultureTag::parse("json").is_err());
        assert!(CultureTag::parse("fr-CH").is_ok());
    }

    #[test]
    fn test_request_culture_ui_override() {
        let ctx = RequestCulture::new("de-CH".parse().unwrap()).with_ui_culture("fr".parse().unwrap());
        assert_eq!(ctx.current_culture().name(), "de-CH");
        assert_eq!(ctx.current_ui_culture().name(), "fr");
    }
}
