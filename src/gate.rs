//! Idempotency gate for the similarity analysis.
//!
//! The content-management system records whether a document's gallery was
//! already populated, plus the ids of the attached gallery items. The flag is
//! stored loosely (`"1"`, `1`, `true`, `"true"` all occur), so it is parsed
//! leniently.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gallery state read from the external system once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryState {
    /// Gallery already populated
    #[serde(default, alias = "_gallery_populated", deserialize_with = "lenient_flag")]
    pub populated: bool,

    /// Identifiers of gallery items already attached
    #[serde(
        default,
        alias = "existing_ids",
        alias = "googlevision",
        deserialize_with = "lenient_ids"
    )]
    pub existing_ids: Vec<String>,
}

impl GalleryState {
    /// Create a state.
    pub fn new(populated: bool, existing_ids: impl IntoIterator<Item = impl ToString>) -> Self {
        Self {
            populated,
            existing_ids: existing_ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Whether the expensive analysis has to run.
///
/// Returns `false` only when the flag is set and items are already attached.
pub fn should_populate_gallery(state: &GalleryState) -> bool {
    !(state.populated && !state.existing_ids.is_empty())
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean, number or string flag")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
            Ok(v != 0.0)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            Ok(matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ))
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

fn lenient_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    let ids: Option<Vec<Id>> = Option::deserialize(deserializer)?;
    Ok(ids
        .unwrap_or_default()
        .into_iter()
        .map(|id| match id {
            Id::Text(s) => s,
            Id::Number(n) => n.to_string(),
        })
        .filter(|id| !id.is_empty())
        .collect())
}
