//! FHIR resource reference parsing
//!
//! Grammar: `[absolute-base/]Type/id[/_history/vid]` where the base is an http(s) URL,
//! `Type` starts with an upper-case letter and `id`/`vid` follow the FHIR id rules.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<base>https?://.+?/)?(?P<type>[A-Z][A-Za-z0-9]*)/(?P<id>[A-Za-z0-9\-.]{1,64})(?:/_history/(?P<vid>[A-Za-z0-9\-.]{1,64}))?$",
    )
    .expect("reference pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Malformed resource reference: {reference:?}")]
    Malformed { reference: String },

    #[error("Reference {reference:?} has an invalid base: {reason}")]
    InvalidBase { reference: String, reason: String },
}

/// A reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    /// Service base the reference is resolved against; always ends with `/`.
    pub base: Option<Url>,
    pub resource_type: String,
    pub id: String,
    pub version_id: Option<String>,
}

impl ParsedReference {
    /// `Type/id`, relative to `base`.
    pub fn relative(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }

    pub fn is_absolute(&self) -> bool {
        self.base.is_some()
    }

    /// Fail unless the reference names a resource of `expected` type.
    pub fn expect_type(self, expected: &str) -> Result<Self, ReferenceError> {
        if self.resource_type == expected {
            Ok(self)
        } else {
            Err(ReferenceError::Malformed {
                reference: self.to_string(),
            })
        }
    }
}

impl fmt::Display for ParsedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(base) = &self.base {
            write!(f, "{}", base)?;
        }
        write!(f, "{}/{}", self.resource_type, self.id)?;
        if let Some(vid) = &self.version_id {
            write!(f, "/_history/{}", vid)?;
        }
        Ok(())
    }
}

/// Parse a literal reference (`Bundle/123`, `https://host/fhir/Bundle/123`, ...).
pub fn parse_reference(reference: &str) -> Result<ParsedReference, ReferenceError> {
    let trimmed = reference.trim();
    let captures = REFERENCE_PATTERN
        .captures(trimmed)
        .ok_or_else(|| ReferenceError::Malformed {
            reference: reference.to_string(),
        })?;

    let base = match captures.name("base") {
        Some(m) => Some(Url::parse(m.as_str()).map_err(|e| ReferenceError::InvalidBase {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    Ok(ParsedReference {
        base,
        resource_type: captures["type"].to_string(),
        id: captures["id"].to_string(),
        version_id: captures.name("vid").map(|m| m.as_str().to_string()),
    })
}
