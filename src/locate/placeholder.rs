//! Placeholder names and tokens.

use crate::error::{Error, Result};
use crate::model::{utf16_len, DocumentOffset, OffsetRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opening delimiter of a placeholder token.
pub const TOKEN_OPEN: &str = "{{";

/// Closing delimiter of a placeholder token.
pub const TOKEN_CLOSE: &str = "}}";

/// A named placeholder, matched literally as `{{name}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placeholder {
    name: String,
    token: String,
}

impl Placeholder {
    /// Create a placeholder for `name`.
    ///
    /// Names must be non-empty and may not contain braces, whitespace or
    /// control characters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_field(name, "placeholder name is empty"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| *c == '{' || *c == '}' || c.is_whitespace() || c.is_control())
        {
            return Err(Error::invalid_field(
                name.clone(),
                format!("placeholder name contains {:?}", c),
            ));
        }
        let token = format!("{}{}{}", TOKEN_OPEN, name, TOKEN_CLOSE);
        Ok(Self { name, token })
    }

    /// The bare field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The literal token searched for in the document.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Length of the token in offset units.
    pub fn unit_len(&self) -> usize {
        utf16_len(&self.token)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl TryFrom<&str> for Placeholder {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        Self::new(name)
    }
}

/// One located match of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Occurrence {
    /// Offset of the first token unit
    pub start: DocumentOffset,

    /// Offset one past the last token unit
    pub end: DocumentOffset,
}

impl Occurrence {
    /// Create an occurrence covering `[start, end)`.
    pub fn new(start: DocumentOffset, end: DocumentOffset) -> Self {
        Self { start, end }
    }

    /// The occurrence as an offset range.
    pub fn range(&self) -> OffsetRange {
        OffsetRange::new(self.start, self.end)
    }

    /// Number of units covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the occurrence covers nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Occurrence> for OffsetRange {
    fn from(o: Occurrence) -> Self {
        o.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_token() {
        let p = Placeholder::new("main_image").unwrap();
        assert_eq!(p.name(), "main_image");
        assert_eq!(p.token(), "{{main_image}}");
        assert_eq!(p.unit_len(), 14);
        assert_eq!(p.to_string(), "{{main_image}}");
    }

    #[test]
    fn test_placeholder_rejects_bad_names() {
        assert!(Placeholder::new("").is_err());
        assert!(Placeholder::new("a b").is_err());
        assert!(Placeholder::new("{x}").is_err());

        match Placeholder::new("tab\there") {
            Err(Error::InvalidInput { field, .. }) => assert_eq!(field, "tab\there"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_occurrence_range() {
        let o = Occurrence::new(10, 19);
        assert_eq!(o.len(), 9);
        assert_eq!(OffsetRange::from(o), OffsetRange::new(10, 19));
    }
}
