//! Data model shared by the catalog, renderer, and orchestrator.
//!
//! Campaign and stats records arrive as JSON from the remote exports and are
//! read-only for the whole run. Everything here is rebuilt from scratch on
//! every generation; nothing is persisted between runs.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A civic-participation campaign as published in the catalog export.
///
/// Only `slug` is mandatory. Fields the generator does not interpret
/// (message templates, contact numbers, …) land in `extra` and are handed to
/// the campaign template untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// URL path segment and output directory name.
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Symbolic icon name, rendered by the client-side icon library.
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
    /// Presentation sort key (ascending). Fractional keys are allowed.
    #[serde(default, deserialize_with = "lenient_order")]
    pub order: f64,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub active: bool,
    /// When set, the campaign is an off-site link with no local page.
    #[serde(default)]
    pub external_url: Option<String>,
    /// Uploaded preview-image descriptors; only the first one is used.
    #[serde(default)]
    pub social_preview_img: Option<Vec<PreviewImage>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Cleared cells come through the export as `null` rather than missing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any JSON number, a numeric string, or `null` (sorts as 0).
fn lenient_order<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("order {n} is out of range"))),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| de::Error::custom(format!("order \"{s}\" is not a number"))),
        other => Err(de::Error::custom(format!("order {other} is not a number"))),
    }
}

/// Spreadsheet-style flag: `true`, a non-zero number, or one of the strings
/// `true`/`1`/`yes`/`si`/`sí`. Everything else reads as `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "si" | "sí"
        ),
        _ => false,
    })
}

impl Campaign {
    /// The off-site target, if this is a redirect-only campaign.
    ///
    /// Blank strings count as absent: the catalog export emits `""` for
    /// cleared fields.
    pub fn external_link(&self) -> Option<&str> {
        self.external_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn is_external(&self) -> bool {
        self.external_link().is_some()
    }
}

/// An uploaded-file descriptor as exported by the catalog backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewImage {
    /// Path relative to the uploads base URL.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Aggregate participation counters for one campaign.
///
/// Every field defaults, so a partially populated export still parses and
/// [`Stats::default`] is the documented zeroed substitute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub totales: Totals,
    /// Weekly totals in chronological order.
    pub historico_semanal: Vec<WeekTotal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Totals {
    pub total_reclamaciones: u64,
    pub total_barrios: u64,
    /// Submissions per neighbourhood.
    pub barrios: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekTotal {
    pub week_label: String,
    pub total: u64,
}

/// A non-fatal problem absorbed during a run.
///
/// Warnings never abort generation; they are logged as they happen and
/// collected into the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The stats resource could not be used; zeroed stats were substituted.
    StatsDefaulted { slug: String, cause: String },
    /// An asset could not be read; a timestamp tag was used instead.
    AssetUnversioned { asset: String, cause: String },
    /// The slug cannot be used as a directory name.
    UnsafeSlug { slug: String },
    /// A later campaign reused an already claimed slug.
    DuplicateSlug { slug: String },
    /// A stale directory did not look like generated output and was kept.
    DirectoryFlagged { name: String },
    /// A catalog row could not be read as a campaign and was skipped.
    InvalidRecord { index: usize, cause: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::StatsDefaulted { slug, cause } => {
                write!(f, "stats for '{slug}' unavailable, using zeroed stats: {cause}")
            }
            Warning::AssetUnversioned { asset, cause } => {
                write!(f, "asset '{asset}' unreadable, using timestamp version: {cause}")
            }
            Warning::UnsafeSlug { slug } => {
                write!(f, "campaign slug '{slug}' is not a safe path segment, skipped")
            }
            Warning::DuplicateSlug { slug } => {
                write!(f, "campaign slug '{slug}' appears more than once, later entry skipped")
            }
            Warning::DirectoryFlagged { name } => {
                write!(f, "directory '{name}/' is not generated output, left for review")
            }
            Warning::InvalidRecord { index, cause } => {
                write!(f, "catalog record #{index} skipped: {cause}")
            }
        }
    }
}
